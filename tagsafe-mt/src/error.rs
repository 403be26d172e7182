//! Error types for machine translation and batch processing

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MtError {
    /// Missing API key, rejected credentials or another request the provider refuses
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    /// The request never got a response
    #[error("Network error: {0}")]
    Network(String),

    /// A single provider call took longer than the configured timeout
    #[error("Translation call timed out after {0} ms")]
    Timeout(u64),

    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    /// The provider answered with a server error or an unusable body
    #[error("Provider error: {0}")]
    Provider(String),

    /// A source file could not be read or parsed
    #[error("Cannot read input '{}': {reason}", path.display())]
    Input { path: PathBuf, reason: String },

    /// The destination could not be written
    #[error("Cannot write output '{}': {reason}", path.display())]
    Output { path: PathBuf, reason: String },
}

impl MtError {
    /// Whether repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MtError::Network(_) | MtError::Timeout(_) | MtError::RateLimited(_) | MtError::Provider(_)
        )
    }

    pub(crate) fn input(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        MtError::Input {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn output(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        MtError::Output {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MtError::Network(format!("request timed out: {}", err))
        } else if err.is_decode() {
            MtError::Provider(format!("failed to decode response: {}", err))
        } else {
            MtError::Network(err.to_string())
        }
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;
