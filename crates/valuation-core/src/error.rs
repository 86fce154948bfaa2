use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValuationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported tier: {0}")]
    UnsupportedTier(String),

    #[error("Unknown analysis type: {0}")]
    UnknownAnalysisType(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task failed: {0}")]
    Task(String),
}

pub type ValuationResult<T> = Result<T, ValuationError>;
