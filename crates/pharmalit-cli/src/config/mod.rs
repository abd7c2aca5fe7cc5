//! Configuration loading for pharmalit.
//! Reads pharmalit.toml from `--config`, the path in PHARMALIT_CONFIG, or the current
//! directory. With none of those present the built-in defaults apply.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use pharmalit_ranker::ScoringWeights;

pub const CONFIG_ENV: &str = "PHARMALIT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "pharmalit.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hierarchy: HierarchyConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scoring: ScoringWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    #[serde(default = "default_hierarchy_path")]
    pub path: PathBuf,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self { path: default_hierarchy_path() }
    }
}

fn default_hierarchy_path() -> PathBuf { PathBuf::from("config/keyword_hierarchy.yaml") }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self { top_n: default_top_n() }
    }
}

fn default_top_n() -> usize { 50 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter() }
    }
}

fn default_log_filter() -> String { "pharmalit=info,warn".to_string() }

impl Config {
    /// Load configuration, returning it with the file it came from (if any).
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let env = std::env::var(CONFIG_ENV).ok();
        Self::load_from(explicit, env.as_deref(), Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Resolution order: explicit path, env path, `fallback` if it exists, defaults.
    /// An explicit or env path that does not exist is an error.
    pub fn load_from(
        explicit: Option<&Path>,
        env: Option<&str>,
        fallback: &Path,
    ) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let requested = explicit
            .map(Path::to_path_buf)
            .or_else(|| env.filter(|p| !p.trim().is_empty()).map(PathBuf::from));

        let path = match requested {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!(
                        "Config file not found: {}\n\
                         Copy pharmalit.example.toml to pharmalit.toml and edit it.",
                        path.display()
                    );
                }
                path
            }
            None if fallback.exists() => fallback.to_path_buf(),
            None => return Ok((Self::default(), None)),
        };

        let config = Self::from_file(&path)?;
        Ok((config, Some(path)))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.ranking.top_n == 0 {
            anyhow::bail!("ranking.top_n must be greater than zero");
        }
        if !self.scoring.validate() {
            anyhow::bail!(
                "scoring weights are inconsistent: multipliers must be at least 100 \
                 and mention bonuses non-decreasing"
            );
        }
        Ok(())
    }
}
