use thiserror::Error;

/// Main error type for a Widen search run
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search space error: {0}")]
    Space(#[from] SpaceError),

    #[error(
        "No best value recorded for parameter {param}; the initialization round must run first"
    )]
    Lookup { param: String },

    #[error("Subrange has no entry for parameter {param}")]
    SubrangeMismatch { param: String },

    #[error("Best value {value} for parameter {param} is not part of its domain")]
    ValueNotInDomain { param: String, value: String },

    #[error("Learner failed: {0}")]
    Learner(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("Learner returned no result for checkpoint {checkpoint}")]
    MissingCheckpoint { checkpoint: String },

    #[error("Invalid search configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while building or validating a parameter space
#[derive(Error, Debug)]
pub enum SpaceError {
    #[error("Invalid domain for parameter {param}: {message}")]
    InvalidDomain { param: String, message: String },

    #[error("Search space has no `num_epochs` entry")]
    MissingNumEpochs,

    #[error("`num_epochs` must be an ordered sequence of checkpoints")]
    UnorderedNumEpochs,

    #[error("Domain for parameter {param} is empty")]
    EmptyDomain { param: String },

    #[error("Ordered domain for parameter {param} lists {value} more than once")]
    DuplicateValue { param: String, value: String },

    #[error("Search space must be a JSON object mapping parameter names to domains")]
    NotAnObject,

    #[error("Malformed search space: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Widen operations
pub type WdResult<T> = Result<T, SearchError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::SearchError::InvalidConfig(format!($($arg)*))
    };
}
