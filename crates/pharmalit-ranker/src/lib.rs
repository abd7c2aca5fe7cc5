//! pharmalit-ranker — Category-based relevance ranking for literature search results.
//!
//! Pipeline per request: resolve keyword sets for each category path, drop articles
//! whose species context conflicts with the study type, score every remaining
//! (article, category) pair, then merge and order the accepted results.

pub mod text;
pub mod keywords;
pub mod classifier;
pub mod weights;
pub mod scorer;
pub mod observer;
pub mod ranker;
pub mod request;

pub use classifier::{Classification, ExclusionReason, StudyTypeClassifier};
pub use keywords::{CategoryNames, KeywordResolver, KeywordSet};
pub use observer::{NoopObserver, ScoringEvent, ScoringObserver, TracingObserver};
pub use ranker::{RankedArticle, Ranker};
pub use request::{RankRequest, SearchQuery, ValidatedRankRequest};
pub use scorer::{MatchEvidence, RelevanceScorer, ScoreResult, ScoringContext};
pub use weights::ScoringWeights;
