//! pharmalit — category-based relevance ranking for biomedical literature.
//! Entry point for the command-line binary.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pharmalit_common::{articles_from_json, Article, KeywordHierarchy, StudyType};
use pharmalit_ranker::{
    CategoryNames, KeywordResolver, KeywordSet, RankRequest, Ranker, ScoreResult, SearchQuery,
};

#[derive(Parser)]
#[command(name = "pharmalit")]
#[command(about = "Rank literature search results against a drug-research category hierarchy")]
#[command(version)]
struct Cli {
    /// Path to pharmalit.toml (overrides PHARMALIT_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keyword hierarchy file (overrides hierarchy.path from the config)
    #[arg(long, global = true)]
    hierarchy: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank a JSON file of articles and print the ordered report
    Rank {
        /// JSON array of articles, or an object with an "articles" array
        #[arg(long)]
        articles: PathBuf,
        /// "animal" or "human"
        #[arg(long)]
        study_type: String,
        /// Comma-separated category paths, e.g. "efficacy,pharmacokinetics.absorption"
        #[arg(long)]
        categories: String,
        /// Drug query term
        #[arg(long, default_value = "")]
        query: String,
        /// Maximum number of results (defaults to ranking.top_n)
        #[arg(long)]
        top_n: Option<usize>,
    },

    /// Show the keyword set and names resolved for a category path
    Keywords {
        #[arg(long)]
        study_type: String,
        #[arg(long)]
        category: String,
    },

    /// Build the external search string for a drug and category
    Query {
        #[arg(long)]
        study_type: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        query: String,
        /// Comma-separated keywords replacing the category's primary keywords
        #[arg(long)]
        custom_keywords: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct RankReport {
    generated_at: String,
    study_type: StudyType,
    categories: Vec<String>,
    query: String,
    total_candidates: usize,
    results: Vec<ReportEntry>,
}

#[derive(Debug, Serialize)]
struct ReportEntry {
    rank: usize,
    article: Article,
    score: ScoreResult,
    categories: Vec<String>,
}

#[derive(Debug, Serialize)]
struct KeywordReport {
    study_type: StudyType,
    category: String,
    keywords: KeywordSet,
    primary_search_keywords: Vec<String>,
    names: Option<CategoryNames>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, source) = config::Config::load(cli.config.as_deref())?;

    // Initialise structured logging; RUST_LOG wins over the configured filter.
    // Logs go to stderr so stdout stays a clean JSON document.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    info!("pharmalit {}", env!("CARGO_PKG_VERSION"));
    match &source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("No config file found, using built-in defaults"),
    }

    let hierarchy_path = cli.hierarchy.as_deref().unwrap_or(&config.hierarchy.path);
    let hierarchy = Arc::new(
        KeywordHierarchy::from_path(hierarchy_path)
            .with_context(|| {
                format!("loading keyword hierarchy from {}", hierarchy_path.display())
            })?,
    );

    let output = match cli.command {
        Command::Rank { articles, study_type, categories, query, top_n } => {
            let request = RankRequest::new(
                &study_type,
                &categories,
                &query,
                top_n.unwrap_or(config.ranking.top_n),
            )
            .validate()?;
            if request.query.is_empty() {
                warn!("No drug query given; ranking on category evidence only");
            }

            let candidates = read_articles(&articles)?;
            let ranker = Ranker::new(hierarchy).with_weights(config.scoring.clone());
            let ranked = ranker.rank_request(&candidates, &request);

            let report = RankReport {
                generated_at: chrono::Utc::now().to_rfc3339(),
                study_type: request.study_type,
                categories: request.category_paths,
                query: request.query,
                total_candidates: candidates.len(),
                results: ranked
                    .into_iter()
                    .enumerate()
                    .map(|(i, r)| ReportEntry {
                        rank: i + 1,
                        article: r.article,
                        score: r.result,
                        categories: r.categories,
                    })
                    .collect(),
            };
            serde_json::to_string_pretty(&report)?
        }

        Command::Keywords { study_type, category } => {
            let study: StudyType = study_type.parse()?;
            let resolver = KeywordResolver::new(hierarchy);
            let report = KeywordReport {
                study_type: study,
                keywords: resolver.resolve_keywords(study, &category),
                primary_search_keywords: resolver.resolve_primary_search_keywords(study, &category),
                names: resolver.resolve_category_names(study, &category),
                category,
            };
            serde_json::to_string_pretty(&report)?
        }

        Command::Query { study_type, category, query, custom_keywords } => {
            let study: StudyType = study_type.parse()?;
            let resolver = KeywordResolver::new(hierarchy);
            let search = SearchQuery::build(
                &resolver,
                study,
                &category,
                &query,
                custom_keywords.as_deref(),
            )?;
            serde_json::to_string_pretty(&search)?
        }
    };

    println!("{output}");
    Ok(())
}

fn read_articles(path: &Path) -> anyhow::Result<Vec<Article>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading articles from {}", path.display()))?;
    let articles = articles_from_json(&raw)?;
    info!(path = %path.display(), count = articles.len(), "Loaded candidate articles");
    Ok(articles)
}
