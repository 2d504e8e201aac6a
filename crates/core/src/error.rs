use thiserror::Error;

pub type PodAdsResult<T> = Result<T, PodAdsError>;

#[derive(Error, Debug)]
pub enum PodAdsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("Request validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for PodAdsError {
    fn from(err: config::ConfigError) -> Self {
        PodAdsError::Config(err.to_string())
    }
}
