//! Word document adapter for review-comments documents.
//!
//! Reads a `.docx` package into the [`pipeline`] styled-text model and writes
//! issue links back into a copy of it.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Zip container handling, WordprocessingML parsing, style
//! resolution, and relationship bookkeeping all live here. The [`pipeline`]
//! crate sees only [`pipeline::StyledTable`] and [`pipeline::DocumentHeader`].
//!
//! ## Document shape
//!
//! - exactly one top-level table with six columns: labels, source, clauses,
//!   title, comment, suggestion; the first row is a header;
//! - the first section's default header names the target repository (and
//!   usually the version), see [`header`].

mod error;
pub mod header;
pub mod hyperlinks;
mod package;
mod reader;
mod relationships;
mod styles;

#[cfg(test)]
mod test_support;

use std::collections::BTreeMap;
use std::path::Path;

use pipeline::{
    extract_rows, CommentRow, DocumentHeader, IssueUrl, StyledTable, ValidationError,
};

pub use error::DocumentError;
pub use hyperlinks::{link_titles, TITLE_COLUMN};
pub use package::DocxPackage;
pub use reader::PartContent;

use package::{DOCUMENT_PART, STYLES_PART};
use styles::StyleSheet;

pub(crate) fn load_styles(package: &DocxPackage) -> Result<StyleSheet, DocumentError> {
    match package.part(STYLES_PART) {
        Some(_) => StyleSheet::parse(&package.xml_part(STYLES_PART)?),
        None => Ok(StyleSheet::default()),
    }
}

/// A loaded review-comments document.
#[derive(Debug, Clone)]
pub struct CommentsDocument {
    package: DocxPackage,
    styles: StyleSheet,
    body: PartContent,
}

impl CommentsDocument {
    /// Opens and parses the document at `path`.
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        Self::from_package(DocxPackage::open(path)?)
    }

    /// Parses an already loaded package.
    pub fn from_package(package: DocxPackage) -> Result<Self, DocumentError> {
        let styles = load_styles(&package)?;
        let xml = package.xml_part(DOCUMENT_PART)?;
        let body = reader::read_part(DOCUMENT_PART, &xml, &styles)?;
        Ok(Self {
            package,
            styles,
            body,
        })
    }

    /// Repository and version from the header region.
    pub fn header(&self) -> Result<DocumentHeader, DocumentError> {
        let content = header::read_header_content(&self.package, &self.styles)?;
        header::interpret_header(&content)
    }

    /// The single comments table.
    ///
    /// # Errors
    ///
    /// [`ValidationError::TableCount`] unless the body holds exactly one
    /// top-level table.
    pub fn comment_table(&self) -> Result<&StyledTable, DocumentError> {
        match self.body.tables.as_slice() {
            [table] => Ok(table),
            tables => Err(ValidationError::TableCount {
                found: tables.len(),
            }
            .into()),
        }
    }

    /// The non-empty data rows of the comments table.
    pub fn comment_rows(&self) -> Result<Vec<CommentRow>, DocumentError> {
        Ok(extract_rows(self.comment_table()?)?)
    }

    /// Links issue URLs into the titles of `output` and saves it.
    ///
    /// An existing `output` is extended, keeping links written by earlier
    /// runs; otherwise this document is the starting point. `links` is keyed
    /// by table position. Returns the number of titles linked.
    pub fn link_into(
        self,
        output: &Path,
        links: &BTreeMap<usize, IssueUrl>,
    ) -> Result<usize, DocumentError> {
        let mut package = if output.is_file() {
            DocxPackage::open(output)?
        } else {
            self.package
        };
        let linked = link_titles(&mut package, links)?;
        package.save(output)?;
        Ok(linked)
    }
}
