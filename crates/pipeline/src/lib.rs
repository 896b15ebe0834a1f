//! Core domain for filing review comments as tracker issues.
//!
//! This crate contains every domain concept, newtype identifier, and error
//! type used to turn a review-comments table into issues. Infrastructure
//! crates implement the traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`IdentityHash`, `RepositoryId`, `RunId`, ...) |
//! | [`types`] | Value types (`Label`, `CommentRow`, `ClauseRef`, `Timestamp`, ...) |
//! | [`markup`] | Styled-text model and the Row Extractor |
//! | [`filters`] | Type and clause filters |
//! | [`issue_body`] | Body rendering and the existing-issue index |
//! | [`processor`] | The Row Processor and run planning |
//! | [`header`] | Repository locator parsing |
//! | [`ports`] | The [`IssueTracker`] trait |
//! | [`errors`] | Error and retry-policy types |

pub mod errors;
pub mod filters;
pub mod header;
pub mod identifiers;
pub mod issue_body;
pub mod markup;
pub mod ports;
pub mod processor;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{RetryPolicy, TrackerError, ValidationError};
pub use filters::{ClauseFilter, RunFilters, TypeFilter};
pub use header::{contains_repository_locator, parse_repository_locator};
pub use identifiers::{IdentityHash, IssueUrl, RepositoryId, RunId};
pub use issue_body::{extract_identity, render_body, ExistingIssueIndex};
pub use markup::{extract_rows, StyledCell, StyledParagraph, StyledRun, StyledTable};
pub use ports::IssueTracker;
pub use processor::{Decision, IssueDraft, Plan, PlannedRow, RowProcessor, SkipReason};
pub use types::{ClauseRef, CommentRow, DocumentHeader, Label, Timestamp};
