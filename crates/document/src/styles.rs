//! Style id → display name resolution from `word/styles.xml`.
//!
//! Markup rules look at style *names* (`"spec quote"`, `"inline code"`), while
//! the document body only references style *ids*.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::DocumentError;

const DEFAULT_PARAGRAPH_STYLE: &str = "Normal";
const DEFAULT_CHARACTER_STYLE: &str = "Default Paragraph Font";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StyleSheet {
    names: HashMap<String, String>,
    default_paragraph: String,
    default_character: String,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            names: HashMap::new(),
            default_paragraph: DEFAULT_PARAGRAPH_STYLE.to_string(),
            default_character: DEFAULT_CHARACTER_STYLE.to_string(),
        }
    }
}

fn attr(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

impl StyleSheet {
    pub(crate) fn parse(xml: &str) -> Result<Self, DocumentError> {
        let mut sheet = StyleSheet::default();
        let mut reader = Reader::from_str(xml);

        // (style id, style type, is default)
        let mut current: Option<(String, String, bool)> = None;
        loop {
            match reader.read_event().map_err(|e| DocumentError::xml("styles", e))? {
                Event::Start(e) if e.name().as_ref() == b"w:style" => {
                    current = attr(&e, "w:styleId").map(|id| {
                        let kind = attr(&e, "w:type").unwrap_or_default();
                        let default =
                            matches!(attr(&e, "w:default").as_deref(), Some("1" | "true"));
                        (id, kind, default)
                    });
                }
                Event::End(e) if e.name().as_ref() == b"w:style" => current = None,
                Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"w:name" => {
                    if let (Some((id, kind, default)), Some(name)) = (&current, attr(&e, "w:val")) {
                        if *default && kind == "paragraph" {
                            sheet.default_paragraph = name.clone();
                        }
                        if *default && kind == "character" {
                            sheet.default_character = name.clone();
                        }
                        sheet.names.insert(id.clone(), name);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(sheet)
    }

    pub(crate) fn paragraph_name(&self, id: Option<&str>) -> String {
        id.and_then(|id| self.names.get(id))
            .unwrap_or(&self.default_paragraph)
            .clone()
    }

    pub(crate) fn character_name(&self, id: Option<&str>) -> String {
        id.and_then(|id| self.names.get(id))
            .unwrap_or(&self.default_character)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="SpecQuote"><w:name w:val="spec quote"/></w:style>
  <w:style w:type="character" w:default="1" w:styleId="DefaultParagraphFont"><w:name w:val="Default Paragraph Font"/></w:style>
  <w:style w:type="character" w:styleId="InlineCode"><w:name w:val="inline code"/></w:style>
</w:styles>"#;

    #[test]
    fn ids_resolve_to_names() {
        let sheet = StyleSheet::parse(STYLES).expect("valid styles");
        assert_eq!(sheet.paragraph_name(Some("SpecQuote")), "spec quote");
        assert_eq!(sheet.character_name(Some("InlineCode")), "inline code");
    }

    #[test]
    fn missing_or_unknown_ids_fall_back_to_defaults() {
        let sheet = StyleSheet::parse(STYLES).expect("valid styles");
        assert_eq!(sheet.paragraph_name(None), "Normal");
        assert_eq!(sheet.paragraph_name(Some("Nope")), "Normal");
        assert_eq!(sheet.character_name(None), "Default Paragraph Font");
    }
}
