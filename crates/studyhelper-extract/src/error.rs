//! Error types for text extraction.

use thiserror::Error;

/// Errors that abort extraction of a file.
///
/// PDF problems are not errors: they degrade to a partial or empty
/// [`Extraction`](crate::Extraction) with warnings.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The path's suffix is not one we can read.
    #[error("Unsupported file type. Use PDF or DOCX.")]
    UnsupportedFileType,

    /// The file could not be opened or read.
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The file is not a readable OOXML package.
    #[error("invalid document package: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The package has no main document part.
    #[error("document is missing '{0}'")]
    MissingPart(String),

    /// The document XML is malformed.
    #[error("invalid document XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Result type alias for extraction.
pub type Result<T> = std::result::Result<T, ExtractError>;
