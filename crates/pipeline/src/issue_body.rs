//! Issue body rendering and the existing-issue index.
//!
//! The first line of every published body is an HTML comment carrying the
//! row's [`IdentityHash`]. It is invisible in the rendered issue and it is the
//! only deduplication ledger: the next run rebuilds its index by scanning
//! issue bodies for that marker.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::IdentityHash;

static MARKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!-- id: (.+) -->").expect("marker pattern is valid"));

/// Renders the hidden identity marker line.
pub fn identity_marker(hash: &IdentityHash) -> String {
    format!("<!-- id: {hash} -->")
}

/// Extracts the identity hash embedded in an issue body, if any.
pub fn extract_identity(body: &str) -> Option<IdentityHash> {
    MARKER_PATTERN
        .captures(body)
        .and_then(|c| c.get(1))
        .and_then(|m| IdentityHash::new(m.as_str()))
}

// ---------------------------------------------------------------------------
// Existing issue index
// ---------------------------------------------------------------------------

/// Identity hashes of every issue already in the tracker.
///
/// Built once before any issue is created and never updated during the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingIssueIndex {
    hashes: HashSet<IdentityHash>,
}

impl ExistingIssueIndex {
    /// Builds the index from issue bodies. Bodies without a marker are ignored.
    pub fn from_bodies<I, S>(bodies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hashes = bodies
            .into_iter()
            .filter_map(|b| extract_identity(b.as_ref()))
            .collect();
        Self { hashes }
    }

    /// Returns `true` if an issue with this identity already exists.
    pub fn contains(&self, hash: &IdentityHash) -> bool {
        self.hashes.contains(hash)
    }

    /// Number of distinct identities in the index.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Returns `true` if no existing issue carried a marker.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Body rendering
// ---------------------------------------------------------------------------

/// Inputs to [`render_body`].
#[derive(Debug, Clone, Copy)]
pub struct BodyParts<'a> {
    /// Identity of the row.
    pub hash: &'a IdentityHash,
    /// Document version label.
    pub version: &'a str,
    /// Comment source (already defaulted).
    pub source: &'a str,
    /// Clause display string, or `None` for "all".
    pub clause: Option<&'a str>,
    /// Comment text; never empty for a published row.
    pub comment: &'a str,
    /// Suggestion text; the section is omitted when empty.
    pub suggestion: &'a str,
}

fn table_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

/// Renders the metadata pipe-table (version, source, clause).
pub fn metadata_table(version: &str, source: &str, clause: Option<&str>) -> String {
    let header = ["Version", "Source", "Clause(s)"];
    let values = [version, source, clause.unwrap_or("all")].map(table_cell);
    format!(
        "|{}|\n|{}|\n|{}|\n",
        header.join("|"),
        [":---:"; 3].join("|"),
        values.join("|")
    )
}

/// Renders a complete issue body.
pub fn render_body(parts: &BodyParts<'_>) -> String {
    let mut body = identity_marker(parts.hash);
    body.push('\n');
    body.push_str(&metadata_table(parts.version, parts.source, parts.clause));
    body.push('\n');
    body.push_str(&format!("\n#### Comment:\n{}\n", parts.comment));
    if !parts.suggestion.is_empty() {
        body.push_str(&format!("\n-----\n#### Suggestion:\n{}\n", parts.suggestion));
    }
    body
}
