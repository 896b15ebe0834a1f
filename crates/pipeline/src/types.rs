//! Shared value types for the review-comment filing domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (labels come from a closed vocabulary,
//! clause references always carry the section marker) and participate in
//! row processing.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::ValidationError;

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// The closed label vocabulary of a review-comments document.
///
/// Documents use short codes (`ed`, `ge`, `te`, `?`); the tracker receives the
/// full label name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// `ed`
    Editorial,
    /// `ge`
    General,
    /// `te`
    Technical,
    /// `?`
    Question,
}

impl Label {
    /// Maps a trimmed short code to its label.
    ///
    /// Codes are matched exactly; an unknown code is a [`ValidationError`].
    pub fn from_code(code: &str) -> Result<Self, ValidationError> {
        match code {
            "ed" => Ok(Label::Editorial),
            "ge" => Ok(Label::General),
            "te" => Ok(Label::Technical),
            "?" => Ok(Label::Question),
            other => Err(ValidationError::UnknownLabel {
                code: other.to_string(),
            }),
        }
    }

    /// Returns the short code used in documents.
    pub fn code(self) -> &'static str {
        match self {
            Label::Editorial => "ed",
            Label::General => "ge",
            Label::Technical => "te",
            Label::Question => "?",
        }
    }

    /// Returns the label name applied in the tracker.
    pub fn name(self) -> &'static str {
        match self {
            Label::Editorial => "editorial",
            Label::General => "general",
            Label::Technical => "technical",
            Label::Question => "question",
        }
    }

    /// Parses a raw comma-separated label field.
    ///
    /// An empty field yields no labels. Any unrecognised token fails the whole
    /// field.
    pub fn parse_list(raw: &str) -> Result<Vec<Label>, ValidationError> {
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        raw.split(',').map(|code| Label::from_code(code.trim())).collect()
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Comment rows
// ---------------------------------------------------------------------------

/// One data row of the comments table.
///
/// Fields are plain text extracted from the six cells in column order. The
/// empty string means "absent". Rows are produced once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommentRow {
    /// Index of the row within the table, header included (first data row is 1).
    ///
    /// Used to find the row again when writing links back into a document.
    pub position: usize,
    /// Raw comma-separated label codes.
    pub label_tags: String,
    /// Who raised the comment.
    pub source: String,
    /// Raw comma-separated clause numbers.
    pub clauses: String,
    /// Short title of the comment.
    pub comment_title: String,
    /// Comment text.
    pub comment_body: String,
    /// Proposed change.
    pub suggestion_body: String,
}

impl CommentRow {
    /// Builds a row from the six cell texts in column order.
    pub fn from_cells(position: usize, cells: [String; 6]) -> Self {
        let [label_tags, source, clauses, comment_title, comment_body, suggestion_body] = cells;
        Self {
            position,
            label_tags,
            source,
            clauses,
            comment_title,
            comment_body,
            suggestion_body,
        }
    }

    /// Returns `true` if every field is empty.
    pub fn is_blank(&self) -> bool {
        [
            &self.label_tags,
            &self.source,
            &self.clauses,
            &self.comment_title,
            &self.comment_body,
            &self.suggestion_body,
        ]
        .iter()
        .all(|f| f.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Clause references
// ---------------------------------------------------------------------------

/// Section marker prefixed to every clause number.
pub const SECTION_MARKER: char = '§';

/// Marks a clause as editorial-internal; such rows are never published.
pub const INTERNAL_MARKER: char = '!';

/// Display form of a row's clause field, e.g. `"§5, §6.2"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClauseRef(String);

impl ClauseRef {
    /// Builds the display string from a raw clause field.
    ///
    /// Returns `None` for an empty field.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        let joined = raw
            .split(',')
            .map(|c| format!("{SECTION_MARKER}{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        Some(Self(joined))
    }

    /// Returns the display string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the clause carries the internal marker.
    pub fn is_internal(&self) -> bool {
        self.0.contains(INTERNAL_MARKER)
    }
}

impl std::fmt::Display for ClauseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Document header
// ---------------------------------------------------------------------------

/// Repository and version read from the document header region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHeader {
    /// Target repository for created issues.
    pub repository: crate::RepositoryId,
    /// Free-text version label of the reviewed specification.
    pub version: String,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from seconds since the Unix epoch.
    ///
    /// Returns `None` if the value is out of range.
    pub fn from_epoch_seconds(seconds: i64) -> Option<Self> {
        Utc.timestamp_opt(seconds, 0).single().map(Self)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_codes_map_to_names() {
        assert_eq!(Label::from_code("ed"), Ok(Label::Editorial));
        assert_eq!(Label::from_code("ge"), Ok(Label::General));
        assert_eq!(Label::from_code("te"), Ok(Label::Technical));
        assert_eq!(Label::from_code("?"), Ok(Label::Question));
        assert_eq!(Label::Technical.name(), "technical");
        assert_eq!(Label::Question.code(), "?");
    }

    #[test]
    fn unknown_label_code_is_an_error() {
        assert_eq!(
            Label::from_code("xx"),
            Err(ValidationError::UnknownLabel { code: "xx".into() })
        );
        // Codes are case-sensitive.
        assert!(Label::from_code("TE").is_err());
    }

    #[test]
    fn label_list_is_split_and_trimmed() {
        assert_eq!(Label::parse_list(""), Ok(vec![]));
        assert_eq!(
            Label::parse_list("te, ed"),
            Ok(vec![Label::Technical, Label::Editorial])
        );
        assert!(Label::parse_list("te,,ed").is_err());
    }

    #[test]
    fn clause_ref_prefixes_and_joins() {
        assert_eq!(ClauseRef::parse(""), None);
        assert_eq!(
            ClauseRef::parse("5, 6.2 ,7").map(|c| c.to_string()),
            Some("§5, §6.2, §7".to_string())
        );
    }

    #[test]
    fn internal_marker_is_detected_anywhere_in_the_clause() {
        assert!(ClauseRef::parse("5, !").expect("non-empty").is_internal());
        assert!(ClauseRef::parse("!5").expect("non-empty").is_internal());
        assert!(!ClauseRef::parse("5").expect("non-empty").is_internal());
    }

    #[test]
    fn blank_row_detection() {
        assert!(CommentRow::default().is_blank());
        let row = CommentRow {
            source: "Acme".into(),
            ..CommentRow::default()
        };
        assert!(!row.is_blank());
    }
}
