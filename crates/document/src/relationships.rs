//! Part relationships (`_rels/*.rels`): resolving header targets and adding
//! external hyperlink targets.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::package::{DocxPackage, DOCUMENT_RELS_PART};
use crate::reader::attr;
use crate::DocumentError;

const HYPERLINK_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub target: String,
}

/// Relationships of `word/document.xml`, plus any added during this edit.
#[derive(Debug, Clone, Default)]
pub(crate) struct DocumentRelationships {
    xml: Option<String>,
    entries: Vec<Relationship>,
    added: Vec<Relationship>,
}

impl DocumentRelationships {
    pub(crate) fn load(package: &DocxPackage) -> Result<Self, DocumentError> {
        if package.part(DOCUMENT_RELS_PART).is_none() {
            return Ok(Self::default());
        }
        let xml = package.xml_part(DOCUMENT_RELS_PART)?;
        let entries = parse(&xml)?;
        Ok(Self {
            xml: Some(xml),
            entries,
            added: Vec::new(),
        })
    }

    /// Part name targeted by a relationship id, relative to the package root.
    pub(crate) fn part_name(&self, id: &str) -> Option<String> {
        self.entries.iter().find(|r| r.id == id).map(|r| {
            match r.target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("word/{}", r.target),
            }
        })
    }

    /// Registers an external hyperlink and returns its new relationship id.
    pub(crate) fn add_hyperlink(&mut self, url: &str) -> String {
        let next = self
            .entries
            .iter()
            .chain(&self.added)
            .filter_map(|r| r.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{next}");
        self.added.push(Relationship {
            id: id.clone(),
            target: url.to_string(),
        });
        id
    }

    /// Serialises the relationships, appending the added hyperlinks.
    pub(crate) fn to_xml(&self) -> Result<Vec<u8>, DocumentError> {
        let part = DOCUMENT_RELS_PART;
        let fresh;
        let xml = match &self.xml {
            Some(xml) => xml.as_str(),
            None => {
                fresh = format!(r#"<Relationships xmlns="{RELATIONSHIPS_NS}"></Relationships>"#);
                fresh.as_str()
            }
        };

        let mut reader = Reader::from_str(xml);
        let mut writer = Writer::new(Vec::new());
        if self.xml.is_none() {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
                .map_err(|e| DocumentError::xml(part, e))?;
        }
        loop {
            let event = reader.read_event().map_err(|e| DocumentError::xml(part, e))?;
            match event {
                Event::End(ref e) if e.name().as_ref() == b"Relationships" => {
                    for rel in &self.added {
                        let element = BytesStart::new("Relationship").with_attributes([
                            ("Id", rel.id.as_str()),
                            ("Type", HYPERLINK_TYPE),
                            ("Target", rel.target.as_str()),
                            ("TargetMode", "External"),
                        ]);
                        writer
                            .write_event(Event::Empty(element))
                            .map_err(|e| DocumentError::xml(part, e))?;
                    }
                    writer
                        .write_event(Event::End(BytesEnd::new("Relationships")))
                        .map_err(|e| DocumentError::xml(part, e))?;
                }
                Event::Eof => break,
                other => writer
                    .write_event(other)
                    .map_err(|e| DocumentError::xml(part, e))?,
            }
        }
        Ok(writer.into_inner())
    }
}

fn parse(xml: &str) -> Result<Vec<Relationship>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    loop {
        match reader
            .read_event()
            .map_err(|e| DocumentError::xml(DOCUMENT_RELS_PART, e))?
        {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr(&e, "Id"), attr(&e, "Target")) {
                    entries.push(Relationship { id, target });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(entries)
}
