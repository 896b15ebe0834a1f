//! Hyperlink Back-Writer: turns comment titles into links to their issues.
//!
//! The first paragraph of each linked title cell is replaced by a single
//! hyperlink run showing the cell's full text. Paragraph properties are kept;
//! everything else in that paragraph is dropped.

use std::collections::{BTreeMap, HashMap};

use pipeline::{IssueUrl, ValidationError};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, warn};

use crate::package::{DOCUMENT_PART, DOCUMENT_RELS_PART};
use crate::reader::{grid_span, read_part};
use crate::relationships::DocumentRelationships;
use crate::styles::StyleSheet;
use crate::{DocumentError, DocxPackage};

/// Column of the comment title in the comments table.
pub const TITLE_COLUMN: usize = 3;

const LINK_COLOR: &str = "0000FF";
const LINK_SIZE_HALF_POINTS: &str = "20";

struct LinkTarget {
    relationship: String,
    text: String,
}

/// Links the title cell of each listed table row to its issue.
///
/// `links` is keyed by row position within the first table (header row is 0).
/// Returns the number of cells rewritten.
pub fn link_titles(
    package: &mut DocxPackage,
    links: &BTreeMap<usize, IssueUrl>,
) -> Result<usize, DocumentError> {
    if links.is_empty() {
        return Ok(0);
    }

    let styles = crate::load_styles(package)?;
    let xml = package.xml_part(DOCUMENT_PART)?;
    let (targets, rels) = plan_targets(package, &xml, &styles, links)?;

    let (rewritten, linked) = rewrite_document(&xml, &targets)?;
    package.set_part(DOCUMENT_PART, rewritten);
    package.set_part(DOCUMENT_RELS_PART, rels.to_xml()?);
    debug!(linked, "Linked comment titles");
    Ok(linked)
}

fn plan_targets(
    package: &DocxPackage,
    xml: &str,
    styles: &StyleSheet,
    links: &BTreeMap<usize, IssueUrl>,
) -> Result<(HashMap<usize, LinkTarget>, DocumentRelationships), DocumentError> {
    let content = read_part(DOCUMENT_PART, xml, styles)?;
    let table = content
        .tables
        .first()
        .ok_or(ValidationError::TableCount { found: 0 })?;

    let mut rels = DocumentRelationships::load(package)?;
    let mut targets = HashMap::new();
    for (&position, url) in links {
        let Some(cell) = table.rows.get(position).and_then(|r| r.get(TITLE_COLUMN)) else {
            warn!(position, %url, "Row not found in output document, not linking");
            continue;
        };
        targets.insert(
            position,
            LinkTarget {
                relationship: rels.add_hyperlink(url.as_str()),
                text: cell.plain_text(),
            },
        );
    }
    Ok((targets, rels))
}

fn hyperlink_events(target: &LinkTarget) -> Vec<Event<'static>> {
    let mut events = vec![
        Event::Start(
            BytesStart::new("w:hyperlink")
                .with_attributes([("r:id", target.relationship.as_str()), ("w:history", "1")])
                .into_owned(),
        ),
        Event::Start(BytesStart::new("w:r")),
        Event::Start(BytesStart::new("w:rPr")),
        Event::Empty(BytesStart::new("w:color").with_attributes([("w:val", LINK_COLOR)])),
        Event::Empty(BytesStart::new("w:sz").with_attributes([("w:val", LINK_SIZE_HALF_POINTS)])),
        Event::Empty(BytesStart::new("w:u").with_attributes([("w:val", "single")])),
        Event::End(BytesEnd::new("w:rPr")),
    ];
    for (i, line) in target.text.split('\n').enumerate() {
        if i > 0 {
            events.push(Event::Empty(BytesStart::new("w:br")));
        }
        events.push(Event::Start(
            BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
        ));
        events.push(Event::Text(BytesText::new(line).into_owned()));
        events.push(Event::End(BytesEnd::new("w:t")));
    }
    events.push(Event::End(BytesEnd::new("w:r")));
    events.push(Event::End(BytesEnd::new("w:hyperlink")));
    events
}

/// Position inside the first table while streaming the body.
#[derive(Default)]
struct Cursor {
    table_depth: usize,
    tables_seen: usize,
    row: Option<usize>,
    column: usize,
    cell_start: usize,
    cell_span: usize,
    in_cell: bool,
    paragraphs_in_cell: usize,
}

impl Cursor {
    fn in_first_table(&self) -> bool {
        self.table_depth == 1 && self.tables_seen == 1
    }

    fn cell_end(&self) -> usize {
        self.cell_start.saturating_add(self.cell_span.max(1))
    }

    fn covers_title(&self) -> bool {
        (self.cell_start..self.cell_end()).contains(&TITLE_COLUMN)
    }

    fn in_cell_properties(&self) -> bool {
        self.in_first_table() && self.in_cell && self.paragraphs_in_cell == 0
    }
}

/// State while the first paragraph of a title cell is being replaced.
struct Replacement<'t> {
    target: &'t LinkTarget,
    depth: usize,
    keep_until: Option<usize>,
}

fn rewrite_document(
    xml: &str,
    targets: &HashMap<usize, LinkTarget>,
) -> Result<(Vec<u8>, usize), DocumentError> {
    let err = |e: &dyn std::fmt::Display| DocumentError::xml(DOCUMENT_PART, e);
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut cursor = Cursor::default();
    let mut replacing: Option<Replacement<'_>> = None;
    let mut linked = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| err(&e))?;
        if let Event::Eof = event {
            break;
        }

        if let Some(rep) = replacing.as_mut() {
            match &event {
                Event::Start(e) => {
                    rep.depth += 1;
                    if rep.keep_until.is_none() && rep.depth == 1 && e.name().as_ref() == b"w:pPr" {
                        rep.keep_until = Some(1);
                    }
                    if rep.keep_until.is_some() {
                        writer.write_event(event.clone()).map_err(|e| err(&e))?;
                    }
                }
                Event::End(_) if rep.depth == 0 => {
                    for link in hyperlink_events(rep.target) {
                        writer.write_event(link).map_err(|e| err(&e))?;
                    }
                    writer.write_event(event.clone()).map_err(|e| err(&e))?;
                    replacing = None;
                    linked += 1;
                }
                Event::End(_) => {
                    if rep.keep_until.is_some() {
                        writer.write_event(event.clone()).map_err(|e| err(&e))?;
                    }
                    if rep.keep_until == Some(rep.depth) {
                        rep.keep_until = None;
                    }
                    rep.depth -= 1;
                }
                Event::Empty(e) => {
                    let own_properties = rep.depth == 0 && e.name().as_ref() == b"w:pPr";
                    if rep.keep_until.is_some() || own_properties {
                        writer.write_event(event.clone()).map_err(|e| err(&e))?;
                    }
                }
                _ => {
                    if rep.keep_until.is_some() {
                        writer.write_event(event.clone()).map_err(|e| err(&e))?;
                    }
                }
            }
            continue;
        }

        match &event {
            Event::Start(e) | Event::Empty(e) => {
                let empty = matches!(event, Event::Empty(_));
                match e.name().as_ref() {
                    b"w:tbl" if !empty => {
                        cursor.table_depth += 1;
                        if cursor.table_depth == 1 {
                            cursor.tables_seen += 1;
                            cursor.row = None;
                        }
                    }
                    b"w:tr" if !empty && cursor.in_first_table() => {
                        cursor.row = Some(cursor.row.map_or(0, |r| r + 1));
                        cursor.column = 0;
                    }
                    b"w:tc" if !empty && cursor.in_first_table() => {
                        cursor.in_cell = true;
                        cursor.cell_start = cursor.column;
                        cursor.cell_span = 1;
                        cursor.paragraphs_in_cell = 0;
                    }
                    b"w:gridSpan" if cursor.in_cell_properties() => {
                        if let Some(span) = grid_span(e) {
                            cursor.cell_span = span;
                        }
                    }
                    b"w:p" if cursor.in_first_table() && cursor.in_cell => {
                        cursor.paragraphs_in_cell += 1;
                        let target = cursor
                            .row
                            .filter(|_| cursor.paragraphs_in_cell == 1 && cursor.covers_title())
                            .and_then(|row| targets.get(&row));
                        if let Some(target) = target {
                            if empty {
                                writer
                                    .write_event(Event::Start(e.to_owned()))
                                    .map_err(|e| err(&e))?;
                                for link in hyperlink_events(target) {
                                    writer.write_event(link).map_err(|e| err(&e))?;
                                }
                                writer
                                    .write_event(Event::End(e.to_end().into_owned()))
                                    .map_err(|e| err(&e))?;
                                linked += 1;
                            } else {
                                writer.write_event(event.clone()).map_err(|e| err(&e))?;
                                replacing = Some(Replacement {
                                    target,
                                    depth: 0,
                                    keep_until: None,
                                });
                            }
                            continue;
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" => cursor.table_depth = cursor.table_depth.saturating_sub(1),
                b"w:tc" if cursor.in_first_table() => {
                    cursor.in_cell = false;
                    cursor.column = cursor.cell_end();
                }
                _ => {}
            },
            _ => {}
        }
        writer.write_event(event).map_err(|e| err(&e))?;
    }
    Ok((writer.into_inner(), linked))
}
