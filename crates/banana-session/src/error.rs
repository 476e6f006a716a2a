//! Session errors

use thiserror::Error;

/// Standard session result type
pub type Result<T> = std::result::Result<T, BananaError>;

/// Errors talking to the type-checking backend
#[derive(Debug, Error)]
pub enum BananaError {
    /// Connection refused, reset, or the request never completed
    #[error("transport error: {0}")]
    Transport(String),
    /// Backend answered with a non-2xx status
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    /// Response body was not the expected JSON
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// No response within the configured timeout
    #[error("request timed out after {0} ms")]
    Timeout(u64),
    #[error("configuration error: {0}")]
    Config(String),
}

impl BananaError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        BananaError::Status {
            status,
            body: body.into(),
        }
    }
}

impl From<hyper_util::client::legacy::Error> for BananaError {
    fn from(e: hyper_util::client::legacy::Error) -> Self {
        BananaError::Transport(e.to_string())
    }
}

impl From<hyper::Error> for BananaError {
    fn from(e: hyper::Error) -> Self {
        BananaError::Transport(e.to_string())
    }
}

impl From<hyper::http::Error> for BananaError {
    fn from(e: hyper::http::Error) -> Self {
        BananaError::Transport(e.to_string())
    }
}
