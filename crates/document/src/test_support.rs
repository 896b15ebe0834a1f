//! Builders for small WordprocessingML fixtures.

use crate::package::{DocxPackage, DOCUMENT_PART, DOCUMENT_RELS_PART, STYLES_PART};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub(crate) fn run(style: Option<&str>, text: &str) -> String {
    let props = style
        .map(|s| format!(r#"<w:rPr><w:rStyle w:val="{s}"/></w:rPr>"#))
        .unwrap_or_default();
    format!(r#"<w:r>{props}<w:t xml:space="preserve">{}</w:t></w:r>"#, escape(text))
}

pub(crate) fn paragraph(style: Option<&str>, runs: &[String]) -> String {
    let props = style
        .map(|s| format!(r#"<w:pPr><w:pStyle w:val="{s}"/></w:pPr>"#))
        .unwrap_or_default();
    format!("<w:p>{props}{}</w:p>", runs.concat())
}

pub(crate) fn cell(paragraphs: &[String]) -> String {
    format!("<w:tc><w:tcPr/>{}</w:tc>", paragraphs.concat())
}

pub(crate) fn row(cells: &[String]) -> String {
    format!("<w:tr>{}</w:tr>", cells.concat())
}

pub(crate) fn table(columns: usize, rows: &[String]) -> String {
    let grid = r#"<w:gridCol w:w="1000"/>"#.repeat(columns);
    format!("<w:tbl><w:tblPr/><w:tblGrid>{grid}</w:tblGrid>{}</w:tbl>", rows.concat())
}

/// A row of plain single-paragraph cells.
pub(crate) fn text_row(fields: &[&str]) -> String {
    let cells: Vec<String> = fields
        .iter()
        .map(|f| {
            if f.is_empty() {
                cell(&[paragraph(None, &[])])
            } else {
                cell(&[paragraph(None, &[run(None, f)])])
            }
        })
        .collect();
    row(&cells)
}

pub(crate) fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}"><w:body>{body}<w:sectPr><w:headerReference w:type="even" r:id="rId7"/><w:headerReference w:type="default" r:id="rId8"/></w:sectPr></w:body></w:document>"#
    )
}

pub(crate) fn header_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:hdr xmlns:w="{W_NS}" xmlns:r="{R_NS}">{body}</w:hdr>"#
    )
}

pub(crate) fn document_rels_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId8" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/></Relationships>"#
        .to_string()
}

pub(crate) fn styles_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{W_NS}">
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
<w:style w:type="paragraph" w:styleId="SpecQuote"><w:name w:val="spec quote"/></w:style>
<w:style w:type="paragraph" w:styleId="CodeBlock"><w:name w:val="code block"/></w:style>
<w:style w:type="character" w:default="1" w:styleId="DefaultParagraphFont"><w:name w:val="Default Paragraph Font"/></w:style>
<w:style w:type="character" w:styleId="InlineCode"><w:name w:val="inline code"/></w:style>
</w:styles>"#
    )
}

/// The standard comments-table header row.
pub(crate) const HEADER_FIELDS: [&str; 6] =
    ["Type", "Source", "Clause", "Title", "Comment", "Suggestion"];

/// Header region using the table layout: locator at (0, 2), version at (1, 1).
pub(crate) fn header_table(locator: &str, version: &str) -> String {
    table(
        3,
        &[
            text_row(&["Comments on", "", locator]),
            text_row(&["Version", version, ""]),
        ],
    )
}

/// A complete package: body, header part, relationships, and styles.
pub(crate) fn package(body: &str, header_body: &str) -> DocxPackage {
    let mut package = DocxPackage::default();
    package.set_part("[Content_Types].xml", b"<Types/>".to_vec());
    package.set_part(DOCUMENT_PART, document_xml(body).into_bytes());
    package.set_part(DOCUMENT_RELS_PART, document_rels_xml().into_bytes());
    package.set_part(STYLES_PART, styles_xml().into_bytes());
    package.set_part("word/header1.xml", header_xml(header_body).into_bytes());
    package
}

/// A comments document with a table header region and the given data rows.
pub(crate) fn comments_package(rows: &[[&str; 6]]) -> DocxPackage {
    let mut all_rows = vec![text_row(&HEADER_FIELDS)];
    all_rows.extend(rows.iter().map(|r| text_row(r)));
    package(
        &table(6, &all_rows),
        &header_table("https://github.com/acme/widget-spec", "Draft 3"),
    )
}
