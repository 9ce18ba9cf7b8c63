//! Error types for remote optimization

use crate::retry::RetryPolicy;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizeError {
    /// The service could not be reached or did not answer in time
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Key rejected or monthly limit reached
    #[error("Account error ({status}): {message}")]
    Account { status: u16, message: String },

    /// The service refused the submitted picture
    #[error("Client error ({status}): {message}")]
    Client { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OptimizeError {
    /// Classify an error response by HTTP status.
    ///
    /// Only retriable statuses (5xx) count as server errors; anything else
    /// unexpected is a client error and is not retried.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 429 => Self::Account { status, message },
            s if RetryPolicy::is_retriable_status(s) => Self::Server { status, message },
            _ => Self::Client { status, message },
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Server { .. })
    }
}

impl From<reqwest::Error> for OptimizeError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::from_status(status.as_u16(), err.to_string()),
            None => Self::Connection(err.to_string()),
        }
    }
}
