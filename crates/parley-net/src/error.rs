use thiserror::Error;

use parley_shared::constants::GENERIC_REQUEST_ERROR;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request never produced a response (DNS, connect, timeout...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// A 2xx response whose body did not match the expected shape.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The configured base URL cannot be joined with an endpoint path.
    #[error("Invalid URL: {0}")]
    Url(String),
}

impl ApiError {
    /// Text to put on the error banner for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            _ => GENERIC_REQUEST_ERROR.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}
