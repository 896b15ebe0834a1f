//! Repository and version from the first section's default header.
//!
//! Two header layouts are understood:
//!
//! - a small table whose cell (0, 2) holds the `github.com/<owner>/<repo>`
//!   locator and whose cell (1, 1) holds the version label;
//! - a single line of text containing the locator, with no version.

use pipeline::{
    contains_repository_locator, parse_repository_locator, DocumentHeader, ValidationError,
};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

use crate::package::DOCUMENT_PART;
use crate::reader::{attr, read_part, PartContent};
use crate::relationships::DocumentRelationships;
use crate::styles::StyleSheet;
use crate::{DocumentError, DocxPackage};

/// Version recorded when the header does not carry one.
pub const UNKNOWN_VERSION: &str = "Unknown";

const LOCATOR_CELL: (usize, usize) = (0, 2);
const VERSION_CELL: (usize, usize) = (1, 1);

/// Finds the relationship id of the first section's default header.
fn default_header_id(document_xml: &str) -> Result<Option<String>, DocumentError> {
    let mut reader = Reader::from_str(document_xml);
    let mut in_section = false;
    loop {
        match reader
            .read_event()
            .map_err(|e| DocumentError::xml(DOCUMENT_PART, e))?
        {
            Event::Start(e) if e.name().as_ref() == b"w:sectPr" => in_section = true,
            Event::Empty(e) if e.name().as_ref() == b"w:sectPr" => return Ok(None),
            Event::End(e) if e.name().as_ref() == b"w:sectPr" => return Ok(None),
            Event::Empty(e) | Event::Start(e)
                if in_section && e.name().as_ref() == b"w:headerReference" =>
            {
                if attr(&e, "w:type").as_deref() == Some("default") {
                    return Ok(attr(&e, "r:id"));
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn header_error(reason: impl Into<String>) -> DocumentError {
    DocumentError::Validation(ValidationError::Header {
        reason: reason.into(),
    })
}

pub(crate) fn read_header_content(
    package: &DocxPackage,
    styles: &StyleSheet,
) -> Result<PartContent, DocumentError> {
    let document_xml = package.xml_part(DOCUMENT_PART)?;
    let id = default_header_id(&document_xml)?
        .ok_or_else(|| header_error("first section has no default header"))?;
    let rels = DocumentRelationships::load(package)?;
    let part = rels
        .part_name(&id)
        .ok_or_else(|| header_error(format!("header relationship '{id}' is not defined")))?;
    let xml = package.xml_part(&part)?;
    read_part(&part, &xml, styles)
}

/// Interprets header content as repository and version.
pub(crate) fn interpret_header(content: &PartContent) -> Result<DocumentHeader, DocumentError> {
    if let Some(table) = content.tables.first() {
        let cell_text = |(r, c): (usize, usize)| {
            table
                .rows
                .get(r)
                .and_then(|row| row.get(c))
                .map(|cell| cell.plain_text().trim().to_string())
                .ok_or_else(|| {
                    header_error(format!("header table has no cell at row {r}, column {c}"))
                })
        };
        let repository = parse_repository_locator(&cell_text(LOCATOR_CELL)?)?;
        let version = cell_text(VERSION_CELL)?;
        return Ok(DocumentHeader {
            repository,
            version,
        });
    }

    let line = content
        .paragraphs
        .iter()
        .map(|p| p.text())
        .find(|text| contains_repository_locator(text));
    match line {
        Some(line) => {
            let repository = parse_repository_locator(&line)?;
            warn!(%repository, "Header carries no version, using '{UNKNOWN_VERSION}'");
            Ok(DocumentHeader {
                repository,
                version: UNKNOWN_VERSION.to_string(),
            })
        }
        None => {
            let text = content
                .paragraphs
                .iter()
                .map(|p| p.text())
                .collect::<Vec<_>>()
                .join("\n");
            Err(ValidationError::RepositoryLocator { text }.into())
        }
    }
}
