//! Errors raised by the GitHub adapter.

use pipeline::{Timestamp, TrackerError};
use thiserror::Error;

/// Failures talking to GitHub or obtaining credentials.
#[derive(Debug, Error)]
pub enum GithubError {
    /// The GitHub CLI is not installed.
    #[error("GitHub CLI is not installed. Please install it from https://cli.github.com")]
    CliNotInstalled,

    /// The GitHub CLI ran but did not print a token.
    #[error("GitHub CLI did not return an auth token ({0}); run `gh auth login`")]
    NoToken(String),

    /// Running the GitHub CLI failed for another reason.
    #[error("Failed to run the GitHub CLI: {0}")]
    CliFailed(#[source] std::io::Error),

    /// The HTTP request could not be completed.
    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// GitHub answered with a non-success status.
    #[error("GitHub returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The rate limit did not lift within the retry budget.
    #[error("GitHub rate limit still in effect after {attempts} attempts (resets at {reset})")]
    RateLimited { reset: Timestamp, attempts: u32 },

    /// A response body did not have the expected shape.
    #[error("Unexpected GitHub response: {0}")]
    Decode(String),

    /// The configured API base URL is unusable.
    #[error("Invalid GitHub API URL '{0}'")]
    InvalidApiUrl(String),
}

impl From<GithubError> for TrackerError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::RateLimited { reset, attempts } => {
                TrackerError::RateLimited { reset, attempts }
            }
            GithubError::Api { status, message } => TrackerError::Api { status, message },
            GithubError::Decode(message) => TrackerError::Decode(message),
            other => TrackerError::Transport(other.to_string()),
        }
    }
}
