//! pharmalit-common — Shared types, errors, and the keyword hierarchy used across all
//! pharmalit crates.

pub mod error;
pub mod study_type;
pub mod article;
pub mod hierarchy;

// Re-export commonly used types
pub use article::{articles_from_json, Article};
pub use error::{PharmalitError, Result};
pub use hierarchy::{CategoryNode, KeywordHierarchy};
pub use study_type::StudyType;
