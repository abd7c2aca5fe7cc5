//! Relevance scoring of one article against one category and one drug query.
//!
//! Scoring is an ordered pipeline of named stages. Each stage returns the points it
//! adds to one running total and records its evidence on a draft; all point values come
//! from [`ScoringWeights`]. The drug-presence stage runs first, then the category
//! stages (locality, MeSH, title, abstract, article keywords). The match-type
//! multiplier scales the whole running total into the filter score, and a final stage
//! adds the drug/filter combination bonus on top.

use serde::{Deserialize, Serialize};

use pharmalit_common::{Article, StudyType};

use crate::keywords::{CategoryNames, KeywordResolver, KeywordSet};
use crate::text::{mesh_heading, normalise_term, push_unique, TermPattern};
use crate::weights::ScoringWeights;

/// Separators tried when looking for the full category path in a title.
const PATH_SEPARATORS: &[&str] = &[" > ", ": ", " - ", " "];

/// Drug queries shorter than this never fall back to substring matching.
const DRUG_SUBSTRING_MIN_LEN: usize = 4;

/// Terms that produced each kind of match. Sets with first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvidence {
    pub mesh_matches: Vec<String>,
    pub title_matches: Vec<String>,
    pub abstract_matches: Vec<String>,
    pub keyword_matches: Vec<String>,
    pub drug_matches: Vec<String>,
}

impl MatchEvidence {
    /// Number of non-empty evidence kinds among MeSH, title, abstract and keywords (0–4).
    pub fn match_types(&self) -> usize {
        [
            &self.mesh_matches,
            &self.title_matches,
            &self.abstract_matches,
            &self.keyword_matches,
        ]
        .iter()
        .filter(|m| !m.is_empty())
        .count()
    }

    pub fn union(&self, other: &MatchEvidence) -> MatchEvidence {
        fn merge(a: &[String], b: &[String]) -> Vec<String> {
            let mut out = a.to_vec();
            for s in b {
                push_unique(&mut out, s.clone());
            }
            out
        }
        MatchEvidence {
            mesh_matches: merge(&self.mesh_matches, &other.mesh_matches),
            title_matches: merge(&self.title_matches, &other.title_matches),
            abstract_matches: merge(&self.abstract_matches, &other.abstract_matches),
            keyword_matches: merge(&self.keyword_matches, &other.keyword_matches),
            drug_matches: merge(&self.drug_matches, &other.drug_matches),
        }
    }
}

/// Outcome of scoring one article against one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u32,
    pub matches: MatchEvidence,
    pub match_types: usize,
    pub has_drug_and_filter: bool,
    pub has_drug: bool,
    pub drug_in_title: bool,
    pub drug_in_abstract: bool,
    pub drug_mention_count: usize,
    /// Running total after the multiplier, before the combination bonus.
    pub filter_score: u32,
    pub title_has_full_path: bool,
    pub title_has_inner_keywords: bool,
    pub title_has_parent_only: bool,
    pub should_reject_parent_only: bool,
}

impl ScoreResult {
    /// Combine results for the same article qualifying under two categories.
    pub fn merge(&self, other: &ScoreResult, multi_category_bonus: u32) -> ScoreResult {
        let matches = self.matches.union(&other.matches);
        ScoreResult {
            score: self.score.max(other.score) + multi_category_bonus,
            match_types: matches.match_types(),
            matches,
            has_drug_and_filter: self.has_drug_and_filter || other.has_drug_and_filter,
            has_drug: self.has_drug || other.has_drug,
            drug_in_title: self.drug_in_title || other.drug_in_title,
            drug_in_abstract: self.drug_in_abstract || other.drug_in_abstract,
            drug_mention_count: self.drug_mention_count.max(other.drug_mention_count),
            filter_score: self.filter_score.max(other.filter_score),
            title_has_full_path: self.title_has_full_path || other.title_has_full_path,
            title_has_inner_keywords: self.title_has_inner_keywords
                || other.title_has_inner_keywords,
            title_has_parent_only: self.title_has_parent_only && other.title_has_parent_only,
            should_reject_parent_only: self.should_reject_parent_only
                && other.should_reject_parent_only,
        }
    }
}

/// Everything about one (category, query) pair that does not depend on the article.
/// Build once per category and reuse across all articles of a request.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    keywords: KeywordSet,
    terms: Vec<TermPattern>,
    mesh_terms: Vec<String>,
    names: Option<CategoryNames>,
    path_variants: Vec<String>,
    drug: Option<TermPattern>,
}

impl ScoringContext {
    pub fn new(keywords: KeywordSet, names: Option<CategoryNames>, drug_query: &str) -> Self {
        let terms = keywords.all_terms().iter().filter_map(|t| TermPattern::new(t)).collect();
        let mut mesh_terms = Vec::new();
        for m in &keywords.mesh_terms {
            let t = normalise_term(m);
            if !t.is_empty() {
                push_unique(&mut mesh_terms, t);
            }
        }
        let path_variants = names
            .as_ref()
            .map(|n| {
                let lower: Vec<String> = n.segments.iter().map(|s| s.to_lowercase()).collect();
                let mut variants = Vec::new();
                for sep in PATH_SEPARATORS.iter().copied() {
                    push_unique(&mut variants, lower.join(sep));
                }
                variants.retain(|v| !v.trim().is_empty());
                variants
            })
            .unwrap_or_default();

        Self {
            keywords,
            terms,
            mesh_terms,
            names,
            path_variants,
            drug: TermPattern::new(drug_query),
        }
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    pub fn names(&self) -> Option<&CategoryNames> {
        self.names.as_ref()
    }

    pub fn drug_term(&self) -> Option<&str> {
        self.drug.as_ref().map(TermPattern::term)
    }
}

/// Lowercased article text, computed once per scoring call.
struct ArticleText<'a> {
    article: &'a Article,
    title: String,
    abstract_text: String,
    combined: String,
}

impl<'a> ArticleText<'a> {
    fn new(article: &'a Article) -> Self {
        Self {
            article,
            title: article.title.to_lowercase(),
            abstract_text: article.abstract_text.to_lowercase(),
            combined: article.combined_text_lower(),
        }
    }
}

/// Mutable state threaded through the stages of one scoring call.
#[derive(Debug, Default)]
struct Draft {
    matches: MatchEvidence,
    has_drug: bool,
    drug_in_title: bool,
    drug_in_abstract: bool,
    drug_mentions: usize,
    title_has_full_path: bool,
    title_has_inner_keywords: bool,
    title_has_parent_only: bool,
}

type Stage = fn(&ScoringWeights, &ScoringContext, &ArticleText<'_>, &mut Draft) -> u32;

/// Category-evidence stages, in order. They add to the running total after drug presence.
const FILTER_STAGES: &[(&str, Stage)] = &[
    ("full_path_locality", full_path_locality),
    ("inner_keyword_locality", inner_keyword_locality),
    ("mesh_terms", mesh_terms),
    ("title_keywords", title_keywords),
    ("title_mesh_cross", title_mesh_cross),
    ("abstract_keywords", abstract_keywords),
    ("article_keywords", article_keywords),
];

#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    resolver: KeywordResolver,
    weights: ScoringWeights,
}

impl RelevanceScorer {
    pub fn new(resolver: KeywordResolver, weights: ScoringWeights) -> Self {
        Self { resolver, weights }
    }

    pub fn resolver(&self) -> &KeywordResolver {
        &self.resolver
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Resolve keywords and category names for a path into a reusable context.
    pub fn context(
        &self,
        study: StudyType,
        category_path: &str,
        drug_query: &str,
    ) -> ScoringContext {
        ScoringContext::new(
            self.resolver.resolve_keywords(study, category_path),
            self.resolver.resolve_category_names(study, category_path),
            drug_query,
        )
    }

    /// Score one article against an explicit keyword set. Title-locality stages only
    /// apply when both `study` and `category_path` are given and the path resolves.
    pub fn score(
        &self,
        article: &Article,
        keywords: &KeywordSet,
        drug_query: &str,
        study: Option<StudyType>,
        category_path: Option<&str>,
    ) -> ScoreResult {
        let names = match (study, category_path) {
            (Some(s), Some(p)) => self.resolver.resolve_category_names(s, p),
            _ => None,
        };
        let ctx = ScoringContext::new(keywords.clone(), names, drug_query);
        self.score_in(article, &ctx)
    }

    pub fn score_in(&self, article: &Article, ctx: &ScoringContext) -> ScoreResult {
        let w = &self.weights;
        let text = ArticleText::new(article);
        let mut draft = Draft::default();

        let drug_base = drug_presence(w, ctx, &text, &mut draft);

        let raw_filter: u32 = FILTER_STAGES
            .iter()
            .map(|(name, stage)| {
                let points = stage(w, ctx, &text, &mut draft);
                tracing::trace!(pmid = %article.pmid, stage = *name, points, "Scoring stage");
                points
            })
            .sum();

        let match_types = draft.matches.match_types();
        let filter_score = w.apply_multiplier(drug_base + raw_filter, match_types);
        let should_reject_parent_only = draft.title_has_parent_only && filter_score == 0;

        let (combo, has_drug_and_filter) = drug_filter_combination(w, &draft, filter_score);

        ScoreResult {
            score: filter_score + combo,
            matches: draft.matches,
            match_types,
            has_drug_and_filter,
            has_drug: draft.has_drug,
            drug_in_title: draft.drug_in_title,
            drug_in_abstract: draft.drug_in_abstract,
            drug_mention_count: draft.drug_mentions,
            filter_score,
            title_has_full_path: draft.title_has_full_path,
            title_has_inner_keywords: draft.title_has_inner_keywords,
            title_has_parent_only: draft.title_has_parent_only,
            should_reject_parent_only,
        }
    }
}

// ── Stages ───────────────────────────────────────────────────────────────────

/// Query term in title/abstract: word boundary first, substring for longer queries.
fn drug_presence(
    w: &ScoringWeights,
    ctx: &ScoringContext,
    text: &ArticleText<'_>,
    d: &mut Draft,
) -> u32 {
    let Some(drug) = &ctx.drug else {
        return 0;
    };

    let mut in_title = drug.count_words(&text.title);
    let mut in_abstract = drug.count_words(&text.abstract_text);
    if in_title + in_abstract == 0 && drug.char_len() >= DRUG_SUBSTRING_MIN_LEN {
        in_title = drug.count_substrings(&text.title);
        in_abstract = drug.count_substrings(&text.abstract_text);
    }

    d.drug_in_title = in_title > 0;
    d.drug_in_abstract = in_abstract > 0;
    d.has_drug = d.drug_in_title || d.drug_in_abstract;
    d.drug_mentions = in_title + in_abstract;
    if !d.has_drug {
        return 0;
    }
    push_unique(&mut d.matches.drug_matches, drug.term().to_string());

    let base = if d.drug_in_title { w.drug_in_title } else { w.drug_in_abstract };
    base + w.frequency_bonus(d.drug_mentions)
}

/// The category's full display path appears in the title.
fn full_path_locality(
    w: &ScoringWeights,
    ctx: &ScoringContext,
    text: &ArticleText<'_>,
    d: &mut Draft,
) -> u32 {
    if !ctx.path_variants.iter().any(|v| text.title.contains(v.as_str())) {
        return 0;
    }
    d.title_has_full_path = true;
    if d.has_drug {
        w.full_path_with_drug
    } else {
        w.full_path_without_drug
    }
}

/// For subheadings without a full-path hit: inner keywords anywhere in title + abstract.
/// Also notes text that names the parent category but none of the inner keywords.
fn inner_keyword_locality(
    w: &ScoringWeights,
    ctx: &ScoringContext,
    text: &ArticleText<'_>,
    d: &mut Draft,
) -> u32 {
    let Some(names) = &ctx.names else {
        return 0;
    };
    if d.title_has_full_path || !names.is_subheading {
        return 0;
    }

    let matched = names
        .inner_keywords
        .iter()
        .any(|k| text.combined.contains(k.as_str()));
    if !matched {
        let parent = names.parent_name.to_lowercase();
        d.title_has_parent_only = !parent.is_empty() && text.combined.contains(&parent);
        return 0;
    }

    d.title_has_inner_keywords = true;
    if d.has_drug {
        w.inner_keyword_with_drug
    } else {
        w.inner_keyword_without_drug
    }
}

/// Article MeSH headings against the category's MeSH terms; each heading scores once,
/// at its best tier (exact, then substring, then word overlap).
fn mesh_terms(
    w: &ScoringWeights,
    ctx: &ScoringContext,
    text: &ArticleText<'_>,
    d: &mut Draft,
) -> u32 {
    if ctx.mesh_terms.is_empty() {
        return 0;
    }

    let mut points = 0;
    for original in &text.article.mesh_terms {
        let heading = mesh_heading(original);
        if heading.is_empty() {
            continue;
        }

        let tier = if ctx.mesh_terms.iter().any(|f| *f == heading) {
            w.mesh_exact
        } else if ctx
            .mesh_terms
            .iter()
            .any(|f| f.contains(heading.as_str()) || heading.contains(f.as_str()))
        {
            w.mesh_substring
        } else if ctx
            .mesh_terms
            .iter()
            .any(|f| words_overlap(f, &heading, w.mesh_overlap_min_word_len))
        {
            w.mesh_word_overlap
        } else {
            continue;
        };

        points += tier;
        push_unique(&mut d.matches.mesh_matches, original.clone());
    }
    points
}

fn title_keywords(
    w: &ScoringWeights,
    ctx: &ScoringContext,
    text: &ArticleText<'_>,
    d: &mut Draft,
) -> u32 {
    let mut points = 0;
    for term in &ctx.terms {
        let hit = if term.matches_word(&text.title) {
            w.title_word
        } else if term.matches_substring(&text.title) {
            w.title_substring
        } else {
            continue;
        };
        points += hit;
        push_unique(&mut d.matches.title_matches, term.term().to_string());
    }
    points
}

fn title_mesh_cross(
    w: &ScoringWeights,
    _ctx: &ScoringContext,
    _text: &ArticleText<'_>,
    d: &mut Draft,
) -> u32 {
    if !d.matches.title_matches.is_empty() && !d.matches.mesh_matches.is_empty() {
        w.title_mesh_cross
    } else {
        0
    }
}

fn abstract_keywords(
    w: &ScoringWeights,
    ctx: &ScoringContext,
    text: &ArticleText<'_>,
    d: &mut Draft,
) -> u32 {
    if text.abstract_text.is_empty() {
        return 0;
    }
    let mut points = 0;
    for term in &ctx.terms {
        let hit = if term.matches_word(&text.abstract_text) {
            w.abstract_word
        } else if term.char_len() > w.abstract_substring_min_len
            && term.matches_substring(&text.abstract_text)
        {
            w.abstract_substring
        } else {
            continue;
        };
        points += hit;
        push_unique(&mut d.matches.abstract_matches, term.term().to_string());
    }
    points
}

/// The article's own keyword field against any category term, either direction.
fn article_keywords(
    w: &ScoringWeights,
    ctx: &ScoringContext,
    text: &ArticleText<'_>,
    d: &mut Draft,
) -> u32 {
    let mut points = 0;
    for original in &text.article.keywords {
        let kw = original.trim().to_lowercase();
        if kw.is_empty() || d.matches.keyword_matches.contains(original) {
            continue;
        }
        let hit = ctx
            .terms
            .iter()
            .any(|t| kw.contains(t.term()) || t.term().contains(kw.as_str()));
        if hit {
            points += w.article_keyword;
            d.matches.keyword_matches.push(original.clone());
        }
    }
    points
}

/// Bonus for a drug hit on a non-zero filter score, or a small consolation when the
/// filter score is zero. The consolation only triggers when the drug base weights are
/// configured to zero. Returns the points and the `has_drug_and_filter` flag.
fn drug_filter_combination(w: &ScoringWeights, d: &Draft, filter_score: u32) -> (u32, bool) {
    if !d.has_drug {
        return (0, false);
    }
    if filter_score > 0 {
        let base = if d.drug_in_title {
            w.combo_drug_in_title
        } else {
            w.combo_drug_in_abstract
        };
        (base + w.frequency_bonus(d.drug_mentions), true)
    } else if d.drug_in_title {
        (w.consolation_drug_in_title, false)
    } else {
        (w.consolation_drug_in_abstract, false)
    }
}

fn words_overlap(a: &str, b: &str, min_len: usize) -> bool {
    let long_words = |s: &str| -> Vec<String> {
        s.split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .filter(|w| w.chars().count() >= min_len)
            .collect()
    };
    let (wa, wb) = (long_words(a), long_words(b));
    wa.iter()
        .any(|x| wb.iter().any(|y| x.contains(y.as_str()) || y.contains(x.as_str())))
}
