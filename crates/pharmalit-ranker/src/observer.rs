//! Optional observability for ranking decisions.
//!
//! The ranker reports each decision to an injected [`ScoringObserver`]. Observers only
//! watch; nothing they do can change a score or an ordering.

use pharmalit_common::StudyType;
use tracing::debug;

use crate::classifier::ExclusionReason;

#[derive(Debug, Clone, PartialEq)]
pub enum ScoringEvent<'a> {
    /// Dropped by the study-type classifier before scoring.
    Excluded {
        pmid: &'a str,
        study: StudyType,
        reason: &'a ExclusionReason,
    },
    /// A requested category path did not resolve.
    CategoryUnresolved { category_path: &'a str },
    Scored {
        pmid: &'a str,
        category_path: &'a str,
        score: u32,
        filter_score: u32,
        match_types: usize,
    },
    Accepted { pmid: &'a str, category_path: &'a str, rule: &'static str },
    Rejected { pmid: &'a str, category_path: &'a str, rule: &'static str },
    /// The same article qualified under another category and was combined.
    Merged { pmid: &'a str, category_path: &'a str, score: u32 },
}

pub trait ScoringObserver: Send + Sync {
    fn on_event(&self, event: &ScoringEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ScoringObserver for NoopObserver {
    fn on_event(&self, _event: &ScoringEvent<'_>) {}
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ScoringObserver for TracingObserver {
    fn on_event(&self, event: &ScoringEvent<'_>) {
        match event {
            ScoringEvent::Excluded { pmid, study, reason } => {
                debug!(pmid, %study, reason = reason.as_str(), "Excluded by study type");
            }
            ScoringEvent::CategoryUnresolved { category_path } => {
                debug!(category_path, "Category unresolved");
            }
            ScoringEvent::Scored { pmid, category_path, score, filter_score, match_types } => {
                debug!(pmid, category_path, score, filter_score, match_types, "Scored");
            }
            ScoringEvent::Accepted { pmid, category_path, rule } => {
                debug!(pmid, category_path, rule, "Accepted");
            }
            ScoringEvent::Rejected { pmid, category_path, rule } => {
                debug!(pmid, category_path, rule, "Rejected");
            }
            ScoringEvent::Merged { pmid, category_path, score } => {
                debug!(pmid, category_path, score, "Merged across categories");
            }
        }
    }
}
