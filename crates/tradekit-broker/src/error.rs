use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Broker returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid broker response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
