//! Port traits implemented by infrastructure crates.
//!
//! The `github` crate implements [`IssueTracker`] over the GitHub REST API.
//! Tests implement it in memory.

use async_trait::async_trait;

use crate::{IssueDraft, IssueUrl, TrackerError};

/// The remote issue tracker a run files into.
///
/// Implementations own authentication, pagination, and rate-limit retries.
/// Callers see only completed operations or a final [`TrackerError`].
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Returns the body of every issue in the repository, whatever its state.
    ///
    /// Issues without a body are omitted.
    async fn list_issue_bodies(&self) -> Result<Vec<String>, TrackerError>;

    /// Creates an issue and returns its browser URL.
    async fn create_issue(&self, draft: &IssueDraft) -> Result<IssueUrl, TrackerError>;
}
