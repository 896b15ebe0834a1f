//! The `.docx` container: a zip archive of XML parts.
//!
//! Parts are held in memory in archive order so a document can be loaded,
//! edited, and saved over the same path.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::DocumentError;

pub(crate) const DOCUMENT_PART: &str = "word/document.xml";
pub(crate) const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub(crate) const STYLES_PART: &str = "word/styles.xml";

/// An in-memory Word package.
#[derive(Debug, Clone, Default)]
pub struct DocxPackage {
    parts: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    /// Loads every part of the archive at `path`.
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let bytes = std::fs::read(path).map_err(|e| DocumentError::io(path, e))?;
        Self::from_bytes(&bytes)
    }

    /// Loads every part of an archive held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .map_err(|e| DocumentError::io(&name, e))?;
            parts.push((name, data));
        }
        Ok(Self { parts })
    }

    /// Returns the raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Returns a part decoded as UTF-8 text.
    pub fn xml_part(&self, name: &str) -> Result<String, DocumentError> {
        let bytes = self
            .part(name)
            .ok_or_else(|| DocumentError::MissingPart(name.to_string()))?;
        String::from_utf8(bytes.to_vec()).map_err(|e| DocumentError::xml(name, e))
    }

    /// Replaces a part, or appends it if the archive does not have it yet.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    /// Serialises the package to zip bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.parts {
            writer.start_file(name.as_str(), options)?;
            writer
                .write_all(data)
                .map_err(|e| DocumentError::io(name, e))?;
        }
        Ok(writer.finish()?.into_inner())
    }

    /// Writes the package to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| DocumentError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_survive_a_save_and_reload() {
        let mut package = DocxPackage::default();
        package.set_part("[Content_Types].xml", b"<Types/>".to_vec());
        package.set_part(DOCUMENT_PART, b"<w:document/>".to_vec());

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("out.docx");
        package.save(&path).expect("save");

        let reloaded = DocxPackage::open(&path).expect("reload");
        assert_eq!(reloaded.part(DOCUMENT_PART), Some(&b"<w:document/>"[..]));
        assert_eq!(reloaded.part("[Content_Types].xml"), Some(&b"<Types/>"[..]));
        assert!(reloaded.part("word/missing.xml").is_none());
    }

    #[test]
    fn set_part_replaces_in_place() {
        let mut package = DocxPackage::default();
        package.set_part("a", b"1".to_vec());
        package.set_part("b", b"2".to_vec());
        package.set_part("a", b"3".to_vec());
        assert_eq!(package.part("a"), Some(&b"3"[..]));
        assert_eq!(package.parts[0].0, "a");
    }

    #[test]
    fn missing_part_is_reported_by_name() {
        let package = DocxPackage::default();
        let err = package.xml_part(DOCUMENT_PART).expect_err("missing");
        assert!(matches!(err, DocumentError::MissingPart(name) if name == DOCUMENT_PART));
    }

    #[test]
    fn garbage_is_not_a_package() {
        assert!(matches!(
            DocxPackage::from_bytes(b"not a zip"),
            Err(DocumentError::Zip(_))
        ));
    }
}
