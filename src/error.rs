use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkySettleError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No flight checked yet. Submit a flight number and date first.")]
    MissingQuery,

    #[error("Request failed: Status {status}, Error: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("{0} is already in progress")]
    Busy(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for SkySettleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SkySettleError::Decode(err.to_string())
        } else {
            SkySettleError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, SkySettleError>;
