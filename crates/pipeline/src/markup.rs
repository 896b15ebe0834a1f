//! Styled-text model and the Row Extractor.
//!
//! The document reader hands over tables as nested [`StyledTable`] values:
//! rows of cells, cells of paragraphs, paragraphs of runs, each carrying its
//! resolved style *name*. Turning that into markdown is a pure function here,
//! so the markup policy does not depend on any concrete document format.
//!
//! ## Markup rules
//!
//! | Style name contains | Rendering |
//! |---------------------|-----------|
//! | `spec` (paragraph)  | `<blockquote>` block |
//! | `code` (paragraph)  | fenced code block |
//! | `code` (run)        | inline code |
//! | otherwise           | plain text |

use crate::{CommentRow, ValidationError};

/// Number of columns a comments table must have.
pub const COMMENT_COLUMNS: usize = 6;

const SPEC_STYLE_MARKER: &str = "spec";
const CODE_STYLE_MARKER: &str = "code";

/// A run of text sharing one character style.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledRun {
    /// Resolved character style name.
    pub style: String,
    /// Text content.
    pub text: String,
}

/// A paragraph and its runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledParagraph {
    /// Resolved paragraph style name.
    pub style: String,
    /// Runs in document order.
    pub runs: Vec<StyledRun>,
}

impl StyledParagraph {
    /// Plain text of the paragraph (all runs concatenated).
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    fn render(&self, out: &mut String) {
        if self.style.contains(SPEC_STYLE_MARKER) {
            out.push_str("<blockquote>\n");
            out.push_str(&self.text());
            out.push_str("\n</blockquote>\n\n");
            return;
        }
        if self.style.contains(CODE_STYLE_MARKER) {
            out.push_str("\n```\n");
            out.push_str(&self.text());
            out.push_str("\n```\n");
            return;
        }
        for run in &self.runs {
            if run.style.contains(CODE_STYLE_MARKER) {
                out.push('`');
                out.push_str(&run.text);
                out.push('`');
            } else {
                out.push_str(&run.text);
            }
        }
        out.push('\n');
    }
}

/// A table cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledCell {
    /// Paragraphs directly inside the cell.
    pub paragraphs: Vec<StyledParagraph>,
}

impl StyledCell {
    /// Renders the cell as markdown, trimmed.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for paragraph in &self.paragraphs {
            paragraph.render(&mut out);
        }
        out.trim().to_string()
    }

    /// Plain text of the cell: paragraph texts joined by newlines.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(StyledParagraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A table as laid out on the grid.
///
/// Each row holds one [`StyledCell`] per grid column; a cell spanning several
/// columns appears once per column it covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledTable {
    /// Number of grid columns.
    pub columns: usize,
    /// Rows in document order, header row first.
    pub rows: Vec<Vec<StyledCell>>,
}

/// Extracts the comment rows of a comments table.
///
/// Skips the header row and every row whose six fields are all empty.
///
/// # Errors
///
/// [`ValidationError::ColumnCount`] unless the table has exactly six columns;
/// [`ValidationError::NoDataRows`] if it has no row below the header.
pub fn extract_rows(table: &StyledTable) -> Result<Vec<CommentRow>, ValidationError> {
    if table.columns != COMMENT_COLUMNS {
        return Err(ValidationError::ColumnCount {
            found: table.columns,
        });
    }
    if table.rows.len() <= 1 {
        return Err(ValidationError::NoDataRows);
    }

    let rows = table
        .rows
        .iter()
        .enumerate()
        .skip(1)
        .map(|(position, cells)| {
            let field = |i: usize| cells.get(i).map(StyledCell::to_markdown).unwrap_or_default();
            CommentRow::from_cells(position, std::array::from_fn(field))
        })
        .filter(|row| !row.is_blank())
        .collect();
    Ok(rows)
}
