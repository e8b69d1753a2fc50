use thiserror::Error;

/// Recoverable problems met while normalizing raw records. None of these
/// abort a load; the offending record or category is skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("{time_point}: item #{position} in category '{category}' is malformed: {reason}")]
    MalformedRecord {
        time_point: String,
        category: String,
        position: usize,
        reason: String,
    },
    #[error("{time_point}: category '{category}' has no usable items")]
    EmptyCategory { time_point: String, category: String },
    #[error("{time_point}: category '{category}' appears more than once; later copy skipped")]
    DuplicateCategory { time_point: String, category: String },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("dataset is not a JSON array of time points: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
