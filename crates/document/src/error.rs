use std::path::PathBuf;

use pipeline::ValidationError;
use thiserror::Error;

/// Failures reading or writing a Word document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Cannot access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid document container: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Malformed XML in '{part}': {message}")]
    Xml { part: String, message: String },

    #[error("Document part '{0}' is missing")]
    MissingPart(String),

    /// The document content violates a structural rule of the comments format.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl DocumentError {
    pub(crate) fn xml(part: &str, err: impl std::fmt::Display) -> Self {
        DocumentError::Xml {
            part: part.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DocumentError::Io {
            path: path.into(),
            source,
        }
    }
}
