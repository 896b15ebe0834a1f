//! Error and retry-policy types for the review-comment filing domain.
//!
//! Errors come in two tiers:
//!
//! - [`ValidationError`] aborts the whole run. It covers malformed documents,
//!   unknown label codes, and malformed repository locators.
//! - Row-level outcomes (filtered, duplicate, internal, no comment) are not
//!   errors at all; they are [`crate::SkipReason`] values and processing
//!   continues with the next row.
//!
//! [`TrackerError`] is what the [`crate::IssueTracker`] port reports. Any error
//! that participates in retry decisions must be able to produce a
//! [`RetryPolicy`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Timestamp;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Safety margin added on top of the server-provided rate-limit reset time.
pub const RATE_LIMIT_MARGIN: Duration = Duration::from_secs(1);

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable` errors: rate-limit responses carrying a reset timestamp.
/// - `NonRetryable` errors: every other API failure, transport failure, or
///   malformed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    ///
    /// `after` is the minimum delay before retrying, derived from the
    /// `X-RateLimit-Reset` response header.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means retry
        /// immediately.
        after: Option<Duration>,
    },
    /// The operation must not be retried; the run aborts.
    NonRetryable,
}

impl RetryPolicy {
    /// Builds the policy for a rate-limited response.
    ///
    /// The wait is `reset - now + 1s`, floored at zero. The server's reset time
    /// is authoritative; no client-side back-off curve is applied.
    pub fn until_reset(reset: Timestamp, now: Timestamp) -> Self {
        let remaining = reset.as_datetime() - now.as_datetime();
        let margin = chrono::Duration::seconds(RATE_LIMIT_MARGIN.as_secs() as i64);
        let wait = (remaining + margin).to_std().unwrap_or(Duration::ZERO);
        RetryPolicy::Retryable { after: Some(wait) }
    }
}

// ---------------------------------------------------------------------------
// Fatal validation errors
// ---------------------------------------------------------------------------

/// Conditions that abort the whole run before or during planning.
///
/// None of these are retried and none of them are scoped to a single row:
/// the run stops and no issue is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The document does not contain exactly one comments table.
    #[error("Document should have exactly one table, found {found}")]
    TableCount {
        /// Number of top-level tables found.
        found: usize,
    },

    /// The comments table does not have exactly six columns.
    #[error("Table should have exactly 6 columns, found {found}")]
    ColumnCount {
        /// Number of grid columns found.
        found: usize,
    },

    /// The comments table has a header row but no data rows.
    #[error("Table should have at least one row below the header")]
    NoDataRows,

    /// A label token did not map to any known code.
    ///
    /// This aborts the run rather than skipping the row: every revision of the
    /// filing logic treats an unknown label as a broken document.
    #[error("Invalid label: {code}")]
    UnknownLabel {
        /// The offending token, trimmed.
        code: String,
    },

    /// The document header does not contain a `github.com/<owner>/<repo>` locator.
    #[error("Malformed repository locator in document header: '{text}'")]
    RepositoryLocator {
        /// The header text that was searched.
        text: String,
    },

    /// The document header could not be found or has an unexpected shape.
    #[error("Document header is missing or malformed: {reason}")]
    Header {
        /// Description of what was missing.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Tracker errors
// ---------------------------------------------------------------------------

/// Failures reported by an [`crate::IssueTracker`] implementation.
///
/// Rate limiting is handled inside the infrastructure adapter; a
/// [`TrackerError::RateLimited`] reaching the caller means the retry budget
/// was exhausted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    /// The tracker kept rate-limiting requests past the retry budget.
    #[error("Rate limit still in effect after {attempts} attempts (resets at {reset})")]
    RateLimited {
        /// When the server said the limit resets.
        reset: Timestamp,
        /// Number of attempts made.
        attempts: u32,
    },

    /// The tracker answered with a non-success status.
    #[error("Issue tracker returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The request never produced a response.
    #[error("Issue tracker transport failure: {0}")]
    Transport(String),

    /// The response could not be decoded.
    #[error("Unexpected issue tracker response: {0}")]
    Decode(String),
}

impl TrackerError {
    /// Returns whether the failed operation may be retried.
    pub fn retry_policy(&self, now: Timestamp) -> RetryPolicy {
        match self {
            TrackerError::RateLimited { reset, .. } => RetryPolicy::until_reset(*reset, now),
            _ => RetryPolicy::NonRetryable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> Timestamp {
        Timestamp::from_epoch_seconds(seconds).expect("valid epoch")
    }

    #[test]
    fn wait_is_reset_minus_now_plus_margin() {
        let policy = RetryPolicy::until_reset(at(1_700_000_030), at(1_700_000_000));
        assert_eq!(
            policy,
            RetryPolicy::Retryable {
                after: Some(Duration::from_secs(31))
            }
        );
    }

    #[test]
    fn wait_is_floored_at_zero_when_reset_has_passed() {
        let policy = RetryPolicy::until_reset(at(1_700_000_000), at(1_700_000_010));
        assert_eq!(
            policy,
            RetryPolicy::Retryable {
                after: Some(Duration::ZERO)
            }
        );
    }

    #[test]
    fn reset_equal_to_now_waits_only_the_margin() {
        let policy = RetryPolicy::until_reset(at(1_700_000_000), at(1_700_000_000));
        assert_eq!(
            policy,
            RetryPolicy::Retryable {
                after: Some(Duration::from_secs(1))
            }
        );
    }

    #[test]
    fn only_rate_limits_are_retryable() {
        let now = at(1_700_000_000);
        let api = TrackerError::Api {
            status: 422,
            message: "Validation Failed".into(),
        };
        assert_eq!(api.retry_policy(now), RetryPolicy::NonRetryable);

        let limited = TrackerError::RateLimited {
            reset: at(1_700_000_004),
            attempts: 10,
        };
        assert_eq!(
            limited.retry_policy(now),
            RetryPolicy::Retryable {
                after: Some(Duration::from_secs(5))
            }
        );
    }
}
