//! Ranking and cross-category merging.
//!
//! One `rank` call is one search request: classify once, score every surviving article
//! against every requested category, keep the accepted pairs, merge by PMID and sort.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use pharmalit_common::{Article, KeywordHierarchy, StudyType};

use crate::classifier::StudyTypeClassifier;
use crate::keywords::KeywordResolver;
use crate::observer::{ScoringEvent, ScoringObserver, TracingObserver};
use crate::request::{dedup_paths, ValidatedRankRequest};
use crate::scorer::{RelevanceScorer, ScoreResult, ScoringContext};
use crate::weights::ScoringWeights;

/// Candidate batches larger than this are scored on the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 64;

/// One entry of the ranked output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedArticle {
    pub article: Article,
    #[serde(rename = "relevance")]
    pub result: ScoreResult,
    /// Category paths under which the article qualified, in request order.
    pub categories: Vec<String>,
}

/// Outcome of the acceptance policy for one (article, category) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept(&'static str),
    Reject(&'static str),
}

/// Acceptance policy, first matching rule wins.
pub fn decide(result: &ScoreResult, weights: &ScoringWeights) -> Decision {
    if !result.has_drug_and_filter && result.should_reject_parent_only && !result.has_drug {
        return Decision::Reject("parent_only");
    }
    if result.has_drug {
        return Decision::Accept("drug_present");
    }
    if result.filter_score >= weights.accept_min_filter_score
        || result.match_types >= weights.accept_min_match_types
    {
        return Decision::Accept("filter_evidence");
    }
    Decision::Reject("insufficient_evidence")
}

/// Total order over ranked results, best first.
pub fn compare(a: &RankedArticle, b: &RankedArticle) -> Ordering {
    let (x, y) = (&a.result, &b.result);
    (y.title_has_full_path && y.has_drug)
        .cmp(&(x.title_has_full_path && x.has_drug))
        .then_with(|| {
            (y.title_has_inner_keywords && y.has_drug)
                .cmp(&(x.title_has_inner_keywords && x.has_drug))
        })
        .then_with(|| y.score.cmp(&x.score))
        .then_with(|| y.has_drug_and_filter.cmp(&x.has_drug_and_filter))
        .then_with(|| y.drug_in_title.cmp(&x.drug_in_title))
        .then_with(|| y.drug_mention_count.cmp(&x.drug_mention_count))
        .then_with(|| y.match_types.cmp(&x.match_types))
        .then_with(|| a.article.pmid.cmp(&b.article.pmid))
}

pub struct Ranker {
    classifier: StudyTypeClassifier,
    scorer: RelevanceScorer,
    observer: Arc<dyn ScoringObserver>,
}

impl Ranker {
    /// Ranker with default weights reporting to `tracing`.
    pub fn new(hierarchy: Arc<KeywordHierarchy>) -> Self {
        Self {
            classifier: StudyTypeClassifier::new(),
            scorer: RelevanceScorer::new(
                KeywordResolver::new(hierarchy),
                ScoringWeights::default(),
            ),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.scorer = RelevanceScorer::new(self.scorer.resolver().clone(), weights);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ScoringObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn resolver(&self) -> &KeywordResolver {
        self.scorer.resolver()
    }

    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    pub fn classifier(&self) -> &StudyTypeClassifier {
        &self.classifier
    }

    pub fn rank_request(
        &self,
        articles: &[Article],
        request: &ValidatedRankRequest,
    ) -> Vec<RankedArticle> {
        self.rank(
            articles,
            request.study_type,
            &request.category_paths,
            &request.query,
            request.top_n,
        )
    }

    /// Rank `articles` for the given categories and drug query, returning at most
    /// `top_n` results. Duplicate category paths and duplicate PMIDs count once.
    pub fn rank<S: AsRef<str>>(
        &self,
        articles: &[Article],
        study: StudyType,
        category_paths: &[S],
        drug_query: &str,
        top_n: usize,
    ) -> Vec<RankedArticle> {
        let paths = dedup_paths(category_paths.iter().map(AsRef::as_ref));
        let weights = self.scorer.weights();

        let mut seen: HashSet<&str> = HashSet::with_capacity(articles.len());
        let survivors: Vec<&Article> = articles
            .iter()
            .filter(|a| seen.insert(a.pmid.as_str()))
            .filter(|a| {
                let c = self.classifier.classify(a, study);
                match &c.exclusion {
                    Some(reason) => {
                        self.observer.on_event(&ScoringEvent::Excluded {
                            pmid: &a.pmid,
                            study,
                            reason,
                        });
                        false
                    }
                    None => true,
                }
            })
            .collect();

        let mut merged: Vec<RankedArticle> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for path in &paths {
            let ctx = self.scorer.context(study, path, drug_query);
            if ctx.names().is_none() {
                self.observer.on_event(&ScoringEvent::CategoryUnresolved { category_path: path });
            }

            let results = self.score_all(&survivors, &ctx);
            for (article, result) in survivors.iter().zip(results) {
                self.observer.on_event(&ScoringEvent::Scored {
                    pmid: &article.pmid,
                    category_path: path,
                    score: result.score,
                    filter_score: result.filter_score,
                    match_types: result.match_types,
                });

                match decide(&result, weights) {
                    Decision::Reject(rule) => {
                        self.observer.on_event(&ScoringEvent::Rejected {
                            pmid: &article.pmid,
                            category_path: path,
                            rule,
                        });
                        continue;
                    }
                    Decision::Accept(rule) => {
                        self.observer.on_event(&ScoringEvent::Accepted {
                            pmid: &article.pmid,
                            category_path: path,
                            rule,
                        });
                    }
                }

                match index.get(&article.pmid) {
                    Some(&i) => {
                        let entry = &mut merged[i];
                        entry.result = entry.result.merge(&result, weights.multi_category_bonus);
                        entry.categories.push(path.clone());
                        self.observer.on_event(&ScoringEvent::Merged {
                            pmid: &article.pmid,
                            category_path: path,
                            score: entry.result.score,
                        });
                    }
                    None => {
                        index.insert(article.pmid.clone(), merged.len());
                        merged.push(RankedArticle {
                            article: (*article).clone(),
                            result,
                            categories: vec![path.clone()],
                        });
                    }
                }
            }
        }

        let accepted = merged.len();
        merged.sort_by(compare);
        merged.truncate(top_n);

        info!(
            %study,
            categories = paths.len(),
            candidates = articles.len(),
            survivors = survivors.len(),
            accepted,
            returned = merged.len(),
            "Ranked literature results"
        );
        merged
    }

    /// Score every survivor against one category, in input order.
    /// With the `parallel` feature, batches above [`PARALLEL_THRESHOLD`] use rayon.
    fn score_all(&self, articles: &[&Article], ctx: &ScoringContext) -> Vec<ScoreResult> {
        #[cfg(feature = "parallel")]
        {
            if articles.len() > PARALLEL_THRESHOLD {
                use rayon::prelude::*;
                return articles
                    .par_iter()
                    .map(|a| self.scorer.score_in(a, ctx))
                    .collect();
            }
        }
        articles.iter().map(|a| self.scorer.score_in(a, ctx)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;
    use pharmalit_test_utils::{sample_hierarchy, ArticleBuilder};

    fn result() -> ScoreResult {
        ScoreResult::default()
    }

    #[test]
    fn test_decide_rules() {
        let w = ScoringWeights::default();

        let parent_only = ScoreResult { should_reject_parent_only: true, ..result() };
        assert_eq!(decide(&parent_only, &w), Decision::Reject("parent_only"));

        let drug = ScoreResult { has_drug: true, should_reject_parent_only: true, ..result() };
        assert_eq!(decide(&drug, &w), Decision::Accept("drug_present"));

        let strong = ScoreResult { filter_score: 10, ..result() };
        assert_eq!(decide(&strong, &w), Decision::Accept("filter_evidence"));

        let varied = ScoreResult { filter_score: 4, match_types: 2, ..result() };
        assert_eq!(decide(&varied, &w), Decision::Accept("filter_evidence"));

        let weak = ScoreResult { filter_score: 9, match_types: 1, ..result() };
        assert_eq!(decide(&weak, &w), Decision::Reject("insufficient_evidence"));
    }

    #[test]
    fn test_compare_prefers_full_path_with_drug_over_score() {
        let a = RankedArticle {
            article: ArticleBuilder::new("a").build(),
            result: ScoreResult { score: 100, has_drug: true, title_has_full_path: true, ..result() },
            categories: vec![],
        };
        let b = RankedArticle {
            article: ArticleBuilder::new("b").build(),
            result: ScoreResult { score: 900, has_drug: false, title_has_full_path: true, ..result() },
            categories: vec![],
        };
        assert_eq!(compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_compare_falls_through_tie_breaks() {
        let base = ScoreResult { score: 200, has_drug: true, ..result() };
        let mk = |pmid: &str, r: ScoreResult| RankedArticle {
            article: ArticleBuilder::new(pmid).build(),
            result: r,
            categories: vec![],
        };
        let a = mk("a", ScoreResult { drug_mention_count: 4, ..base.clone() });
        let b = mk("b", ScoreResult { drug_mention_count: 2, ..base.clone() });
        assert_eq!(compare(&a, &b), Ordering::Less);

        let c = mk("c", ScoreResult { match_types: 3, ..base.clone() });
        let d = mk("d", ScoreResult { match_types: 1, ..base.clone() });
        assert_eq!(compare(&c, &d), Ordering::Less);

        let e = mk("e", base.clone());
        let f = mk("f", base);
        assert_eq!(compare(&e, &f), Ordering::Less);
    }

    #[test]
    fn test_duplicate_pmids_in_input_count_once() {
        let ranker = Ranker::new(sample_hierarchy());
        let a = ArticleBuilder::new("1").title("Augmentin efficacy in otitis media").build();
        let out = ranker.rank(&[a.clone(), a], StudyType::Human, &["efficacy"], "augmentin", 10);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].categories, vec!["efficacy".to_string()]);
    }

    #[test]
    fn test_noop_observer_leaves_results_unchanged() {
        let articles = vec![
            ArticleBuilder::new("1").title("Augmentin efficacy in otitis media").build(),
            ArticleBuilder::new("2").title("Efficacy of amoxicillin").build(),
        ];
        let traced = Ranker::new(sample_hierarchy())
            .rank(&articles, StudyType::Human, &["efficacy"], "augmentin", 10);
        let quiet = Ranker::new(sample_hierarchy())
            .with_observer(Arc::new(NoopObserver))
            .rank(&articles, StudyType::Human, &["efficacy"], "augmentin", 10);
        assert_eq!(traced, quiet);
        assert_eq!(quiet.len(), 2);
    }

    #[test]
    fn test_top_n_truncates() {
        let ranker = Ranker::new(sample_hierarchy());
        let articles: Vec<Article> = (0..5)
            .map(|i| ArticleBuilder::new(&i.to_string()).title("Augmentin safety").build())
            .collect();
        let out = ranker.rank(&articles, StudyType::Human, &["safety"], "augmentin", 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].article.pmid, "0");
    }
}
