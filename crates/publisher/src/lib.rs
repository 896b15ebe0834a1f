//! Run orchestration for filing review comments.
//!
//! A run has three phases:
//!
//! 1. **Index.** The bodies of all existing issues are fetched once and
//!    reduced to an [`pipeline::ExistingIssueIndex`]. The snapshot is not
//!    updated with issues created later in the same run.
//! 2. **Plan.** [`pipeline::RowProcessor::plan`] decides every row. Planning
//!    is pure, so a validation failure stops the run before any remote write.
//! 3. **Publish.** Each create decision becomes an issue, or a logged preview
//!    in dry-run mode.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** This crate sequences calls between business logic
//! in the [`pipeline`] crate and the [`pipeline::IssueTracker`] port. It contains
//! no domain rules of its own.

mod error;
mod run;

pub use error::PublishError;
pub use run::{Publisher, RunReport, RunSummary};
