//! GitHub infrastructure adapter.
//!
//! Implements the [`pipeline::IssueTracker`] port over the GitHub REST API and
//! obtains the access token from the GitHub CLI.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! All GitHub API details (rate limiting, pagination, authentication) are handled
//! here; the [`pipeline`] crate never sees them.
//!
//! ## Rate limits
//!
//! A request rejected for rate limiting is retried after the server's reset
//! time plus one second, up to [`GithubConfig::max_retries`] times. Every other
//! failure is returned immediately.

mod client;
mod credentials;
mod error;
mod rate_limit;

pub use client::{GithubClient, GithubConfig, DEFAULT_API_URL, DEFAULT_MAX_RETRIES};
pub use credentials::{AuthToken, GhCli};
pub use error::GithubError;
