//! WordprocessingML reader producing the pipeline styled-text model.
//!
//! Only top-level tables are collected; tables nested inside cells and text
//! boxes are skipped. Cells spanning several grid columns (`w:gridSpan`) are
//! repeated once per column so positional field access stays aligned with the
//! grid. A cell continuing a vertical merge (`w:vMerge` without `restart`)
//! reads as the cell above it, so merged columns repeat their value on every
//! row they cover.
//!
//! The column count comes from the direct `w:gridCol` children of
//! `w:tblGrid`; the previous grid recorded under `w:tblGridChange` by change
//! tracking is ignored.

use pipeline::{StyledCell, StyledParagraph, StyledRun, StyledTable};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::styles::StyleSheet;
use crate::DocumentError;

/// Tables and loose paragraphs of one XML part (body or header).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartContent {
    /// Top-level tables in document order.
    pub tables: Vec<StyledTable>,
    /// Paragraphs that are not inside any table.
    pub paragraphs: Vec<StyledParagraph>,
}

/// Word's limit on table columns; bounds spans read from corrupt files.
pub(crate) const MAX_GRID_COLUMNS: usize = 63;

pub(crate) fn attr(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Reads a `w:gridSpan` value, clamped to `1..=MAX_GRID_COLUMNS`.
pub(crate) fn grid_span(e: &BytesStart<'_>) -> Option<usize> {
    let span = attr(e, "w:val")?.trim().parse::<u64>().ok()?;
    Some(usize::try_from(span).unwrap_or(MAX_GRID_COLUMNS).clamp(1, MAX_GRID_COLUMNS))
}

struct CellBuilder {
    cell: StyledCell,
    span: usize,
    continues_merge: bool,
}

impl Default for CellBuilder {
    fn default() -> Self {
        Self {
            cell: StyledCell::default(),
            span: 1,
            continues_merge: false,
        }
    }
}

#[derive(Default)]
struct TableBuilder {
    grid_columns: usize,
    in_grid_change: bool,
    rows: Vec<Vec<StyledCell>>,
    row: Option<Vec<StyledCell>>,
    cell: Option<CellBuilder>,
}

impl TableBuilder {
    fn close_cell(&mut self) {
        let (Some(builder), Some(row)) = (self.cell.take(), self.row.as_mut()) else {
            return;
        };
        let start = row.len();
        let remaining = match self.grid_columns {
            0 => MAX_GRID_COLUMNS,
            grid => grid.saturating_sub(start).max(1),
        };
        let span = builder.span.min(remaining);
        let above = self
            .rows
            .last()
            .filter(|_| builder.continues_merge)
            .and_then(|previous| previous.get(start..start + span));
        match above {
            Some(cells) => row.extend_from_slice(cells),
            None => row.extend(std::iter::repeat(builder.cell).take(span)),
        }
    }

    fn finish(self) -> StyledTable {
        let columns = if self.grid_columns > 0 {
            self.grid_columns
        } else {
            self.rows.iter().map(Vec::len).max().unwrap_or(0)
        };
        StyledTable {
            columns,
            rows: self.rows,
        }
    }
}

struct PartReader<'s> {
    styles: &'s StyleSheet,
    content: PartContent,
    table_depth: usize,
    text_box_depth: usize,
    table: Option<TableBuilder>,
    paragraph: Option<StyledParagraph>,
    run: Option<StyledRun>,
    in_text: bool,
}

impl<'s> PartReader<'s> {
    fn new(styles: &'s StyleSheet) -> Self {
        Self {
            styles,
            content: PartContent::default(),
            table_depth: 0,
            text_box_depth: 0,
            table: None,
            paragraph: None,
            run: None,
            in_text: false,
        }
    }

    /// Nested tables and text boxes are opaque.
    fn tracking(&self) -> bool {
        self.table_depth <= 1 && self.text_box_depth == 0
    }

    fn in_cell(&self) -> bool {
        self.table.as_ref().is_some_and(|t| t.cell.is_some())
    }

    fn cell_builder(&mut self) -> Option<&mut CellBuilder> {
        self.table.as_mut().and_then(|t| t.cell.as_mut())
    }

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        match e.name().as_ref() {
            b"w:tbl" if !empty => {
                self.table_depth += 1;
                if self.table_depth == 1 && self.text_box_depth == 0 {
                    self.table = Some(TableBuilder::default());
                }
            }
            b"w:txbxContent" if !empty => self.text_box_depth += 1,
            _ if !self.tracking() => {}
            b"w:tblGridChange" if self.table_depth == 1 && !empty => {
                if let Some(table) = self.table.as_mut() {
                    table.in_grid_change = true;
                }
            }
            b"w:gridCol" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut().filter(|t| !t.in_grid_change) {
                    table.grid_columns += 1;
                }
            }
            b"w:tr" if self.table_depth == 1 && !empty => {
                if let Some(table) = self.table.as_mut() {
                    table.row = Some(Vec::new());
                }
            }
            b"w:tc" if self.table_depth == 1 && !empty => {
                if let Some(table) = self.table.as_mut() {
                    table.cell = Some(CellBuilder::default());
                }
            }
            b"w:gridSpan" if self.paragraph.is_none() => {
                if let (Some(span), Some(builder)) = (grid_span(e), self.cell_builder()) {
                    builder.span = span;
                }
            }
            b"w:vMerge" if self.paragraph.is_none() => {
                let continues = attr(e, "w:val").map_or(true, |v| v == "continue");
                if let Some(builder) = self.cell_builder() {
                    builder.continues_merge = continues;
                }
            }
            b"w:p" => {
                if self.table_depth == 0 || self.in_cell() {
                    let paragraph = StyledParagraph {
                        style: self.styles.paragraph_name(None),
                        runs: Vec::new(),
                    };
                    if empty {
                        self.finish_paragraph(paragraph);
                    } else {
                        self.paragraph = Some(paragraph);
                    }
                }
            }
            b"w:pStyle" if self.run.is_none() => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.style = self.styles.paragraph_name(attr(e, "w:val").as_deref());
                }
            }
            b"w:r" if !empty && self.paragraph.is_some() => {
                self.run = Some(StyledRun {
                    style: self.styles.character_name(None),
                    text: String::new(),
                });
            }
            b"w:rStyle" => {
                if let Some(run) = self.run.as_mut() {
                    run.style = self.styles.character_name(attr(e, "w:val").as_deref());
                }
            }
            b"w:t" if !empty && self.run.is_some() => self.in_text = true,
            b"w:tab" => self.push_run_text("\t"),
            b"w:br" | b"w:cr" => self.push_run_text("\n"),
            b"w:noBreakHyphen" => self.push_run_text("-"),
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"w:tbl" => {
                if self.table_depth == 1 && self.text_box_depth == 0 {
                    if let Some(table) = self.table.take() {
                        self.content.tables.push(table.finish());
                    }
                }
                self.table_depth = self.table_depth.saturating_sub(1);
            }
            b"w:txbxContent" => self.text_box_depth = self.text_box_depth.saturating_sub(1),
            _ if !self.tracking() => {}
            b"w:tblGridChange" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    table.in_grid_change = false;
                }
            }
            b"w:t" => self.in_text = false,
            b"w:r" => {
                if let (Some(run), Some(paragraph)) = (self.run.take(), self.paragraph.as_mut()) {
                    paragraph.runs.push(run);
                }
            }
            b"w:p" => {
                if let Some(paragraph) = self.paragraph.take() {
                    self.finish_paragraph(paragraph);
                }
            }
            b"w:tc" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    table.close_cell();
                }
            }
            b"w:tr" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    if let Some(row) = table.row.take() {
                        table.rows.push(row);
                    }
                }
            }
            _ => {}
        }
    }

    fn finish_paragraph(&mut self, paragraph: StyledParagraph) {
        if self.table_depth == 0 {
            self.content.paragraphs.push(paragraph);
        } else if let Some(builder) = self.cell_builder() {
            builder.cell.paragraphs.push(paragraph);
        }
    }

    fn push_run_text(&mut self, text: &str) {
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(text);
        }
    }
}

/// Reads the tables and loose paragraphs of one WordprocessingML part.
pub(crate) fn read_part(
    part: &str,
    xml: &str,
    styles: &StyleSheet,
) -> Result<PartContent, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut state = PartReader::new(styles);
    loop {
        match reader.read_event().map_err(|e| DocumentError::xml(part, e))? {
            Event::Start(e) => state.open(&e, false),
            Event::Empty(e) => state.open(&e, true),
            Event::End(e) => state.close(e.name().as_ref()),
            Event::Text(t) if state.in_text && state.tracking() => {
                let text = t.unescape().map_err(|e| DocumentError::xml(part, e))?;
                state.push_run_text(&text);
            }
            Event::CData(t) if state.in_text && state.tracking() => {
                state.push_run_text(&String::from_utf8_lossy(&t));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(state.content)
}
