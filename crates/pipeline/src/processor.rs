//! The Row Processor: turns each comment row into a publish decision.
//!
//! Planning is pure. It never talks to the tracker; it only consults the
//! [`ExistingIssueIndex`] snapshot taken before the run started. Rows are
//! processed in document order and the creation limit relies on that order.
//!
//! ## Decision order
//!
//! 1. Labels are parsed. An unknown code aborts the run (see [`RowProcessor::plan`]).
//! 2. Type filter.
//! 3. Clause display string and title.
//! 4. Clause filter.
//! 5. Internal-marker check.
//! 6. Source defaults to `Unknown`.
//! 7. Identity hash checked against the index.
//! 8. Empty comment body.
//! 9. Body rendering.
//! 10. Creation limit.

use serde::Serialize;
use tracing::{info, warn};

use crate::issue_body::{render_body, BodyParts};
use crate::{
    ClauseRef, CommentRow, ExistingIssueIndex, IdentityHash, Label, RunFilters, ValidationError,
};

/// Source recorded for rows that do not name one.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Why a row was not published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Rejected by the type filter.
    FilteredByType,
    /// Rejected by the clause filter.
    FilteredByClause,
    /// The clause carries the internal marker.
    Internal,
    /// An issue with the same identity already exists.
    Duplicate,
    /// The row has no comment body.
    NoComment,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::FilteredByType => "filtered by type",
            SkipReason::FilteredByClause => "filtered by clause",
            SkipReason::Internal => "internal comment",
            SkipReason::Duplicate => "duplicate",
            SkipReason::NoComment => "no comment",
        };
        f.write_str(text)
    }
}

/// An issue ready to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    /// Clause-qualified title.
    pub title: String,
    /// Rendered markdown body, identity marker first.
    pub body: String,
    /// Labels to apply.
    pub labels: Vec<Label>,
    /// Identity of the row.
    pub hash: IdentityHash,
}

/// Outcome of processing one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The row is not published.
    Skip(SkipReason),
    /// The row becomes an issue.
    Create(IssueDraft),
}

/// A row together with its decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRow {
    /// Table position of the source row.
    pub position: usize,
    /// Title the row would carry (unqualified comment title if the row was
    /// skipped before the title was built).
    pub title: String,
    /// What to do with it.
    pub decision: Decision,
}

/// Every decision of a run, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Decided rows. Rows after the limit stop are absent.
    pub rows: Vec<PlannedRow>,
    /// `true` if planning stopped because the creation limit was reached.
    pub limit_reached: bool,
}

impl Plan {
    /// Number of create decisions.
    pub fn create_count(&self) -> usize {
        self.creates().count()
    }

    /// Number of skip decisions.
    pub fn skip_count(&self) -> usize {
        self.rows.len() - self.create_count()
    }

    /// Iterates over the create decisions with their table positions.
    pub fn creates(&self) -> impl Iterator<Item = (usize, &IssueDraft)> {
        self.rows.iter().filter_map(|r| match &r.decision {
            Decision::Create(draft) => Some((r.position, draft)),
            Decision::Skip(_) => None,
        })
    }
}

/// Applies filters, deduplication, and rendering to comment rows.
#[derive(Debug, Clone, Copy)]
pub struct RowProcessor<'a> {
    index: &'a ExistingIssueIndex,
    version: &'a str,
    filters: &'a RunFilters,
}

impl<'a> RowProcessor<'a> {
    /// Creates a processor over an index snapshot, the document version, and
    /// the run filters.
    pub fn new(index: &'a ExistingIssueIndex, version: &'a str, filters: &'a RunFilters) -> Self {
        Self {
            index,
            version,
            filters,
        }
    }

    /// Decides what to do with one row, ignoring the creation limit.
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnknownLabel`] if the label field holds an unknown
    /// code.
    pub fn process(&self, row: &CommentRow) -> Result<Decision, ValidationError> {
        let labels = Label::parse_list(&row.label_tags)?;
        let title_for_log = &row.comment_title;

        if let Some(filter) = &self.filters.type_filter {
            if !filter.matches(&row.label_tags) {
                info!(title = %title_for_log, filter = %filter, "Skipping row not in type filter");
                return Ok(Decision::Skip(SkipReason::FilteredByType));
            }
        }

        let clause = ClauseRef::parse(&row.clauses);
        let title = qualified_title(clause.as_ref(), &row.comment_title);

        if let Some(filter) = &self.filters.clause_filter {
            if !filter.matches(clause.as_ref().map(ClauseRef::as_str)) {
                info!(
                    title = %title_for_log,
                    filter = %filter,
                    "Skipping row not in clause filter"
                );
                return Ok(Decision::Skip(SkipReason::FilteredByClause));
            }
        }

        if clause.as_ref().is_some_and(ClauseRef::is_internal) {
            warn!(title = %title_for_log, "Skipping internal comment");
            return Ok(Decision::Skip(SkipReason::Internal));
        }

        let source = if row.source.is_empty() {
            warn!(title = %title, "No source, setting to '{UNKNOWN_SOURCE}'");
            UNKNOWN_SOURCE
        } else {
            row.source.as_str()
        };

        let hash = IdentityHash::compute(&title, &row.comment_body, &row.suggestion_body);
        if self.index.contains(&hash) {
            info!(title = %title, %hash, "Skipping existing issue");
            return Ok(Decision::Skip(SkipReason::Duplicate));
        }

        if row.comment_body.is_empty() {
            warn!(title = %title, "No comment, skipping");
            return Ok(Decision::Skip(SkipReason::NoComment));
        }

        let body = render_body(&BodyParts {
            hash: &hash,
            version: self.version,
            source,
            clause: clause.as_ref().map(ClauseRef::as_str),
            comment: &row.comment_body,
            suggestion: &row.suggestion_body,
        });

        Ok(Decision::Create(IssueDraft {
            title,
            body,
            labels,
            hash,
        }))
    }

    /// Decides every row of a document, in order.
    ///
    /// Labels of *all* rows are validated before the first decision is made:
    /// an unknown code anywhere in the document aborts the run before anything
    /// is published. This fail-fast policy is deliberate and applies even when
    /// the offending row would be filtered out.
    ///
    /// Planning stops at the first row that would be created once the limit
    /// has been reached; later rows are not decided at all.
    pub fn plan(&self, rows: &[CommentRow]) -> Result<Plan, ValidationError> {
        for row in rows {
            Label::parse_list(&row.label_tags)?;
        }

        let mut plan = Plan::default();
        let mut creates = 0usize;
        for row in rows {
            let decision = self.process(row)?;
            if let Decision::Create(_) = decision {
                if self.filters.limit.is_some_and(|limit| creates >= limit) {
                    info!(limit = creates, "Reached issue limit");
                    plan.limit_reached = true;
                    break;
                }
                creates += 1;
            }
            let title = match &decision {
                Decision::Create(draft) => draft.title.clone(),
                Decision::Skip(_) => row.comment_title.clone(),
            };
            plan.rows.push(PlannedRow {
                position: row.position,
                title,
                decision,
            });
        }
        Ok(plan)
    }
}

fn qualified_title(clause: Option<&ClauseRef>, comment_title: &str) -> String {
    match clause {
        Some(clause) => format!("{clause}: {comment_title}"),
        None => comment_title.to_string(),
    }
}
