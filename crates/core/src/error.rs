use thiserror::Error;

pub type NeuroAdsResult<T> = Result<T, NeuroAdsError>;

#[derive(Error, Debug)]
pub enum NeuroAdsError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
