use thiserror::Error;

#[derive(Debug, Error)]
pub enum PharmalitError {
    #[error("Invalid study type: {0:?} (expected \"animal\" or \"human\")")]
    InvalidStudyType(String),

    #[error("At least one category path is required")]
    MissingCategoryPath,

    #[error("A search query is required")]
    MissingQuery,

    #[error("top_n must be a positive integer, got {0}")]
    InvalidTopN(usize),

    #[error("Malformed article: {0}")]
    MalformedArticle(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PharmalitError>;
