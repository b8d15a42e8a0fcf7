//! Text extraction from study documents.
//!
//! [`read_file`] dispatches on the path's suffix:
//!
//! | Suffix            | Reader                  | Failure mode                       |
//! |-------------------|-------------------------|------------------------------------|
//! | `.pdf`            | [`pdf::extract_pdf`]    | degraded [`Extraction`] + warnings |
//! | `.docx` / `.doc`  | [`docx::extract_docx`]  | `Err`                              |
//! | anything else     |                         | [`ExtractError::UnsupportedFileType`] |
//!
//! The suffix test is literal, so `notes.PDF` is rejected.

pub mod docx;
pub mod error;
pub mod pdf;

use std::path::Path;

use tracing::info;

pub use error::{ExtractError, Result};

/// How much of a document made it into the extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStatus {
    /// Every page or paragraph was read.
    Complete,
    /// Some PDF pages could not be decoded.
    Partial { failed_pages: Vec<u32> },
    /// Nothing was extracted.
    Empty,
}

/// Text pulled from one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub status: ExtractionStatus,
    /// Human-readable problems encountered along the way.
    pub warnings: Vec<String>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.status == ExtractionStatus::Empty
    }
}

/// Read a PDF or DOCX file into plain text.
pub fn read_file(path: impl AsRef<Path>) -> Result<Extraction> {
    let path = path.as_ref();
    let name = path.to_string_lossy();

    let extraction = if name.ends_with(".pdf") {
        pdf::extract_pdf(path)
    } else if name.ends_with(".docx") || name.ends_with(".doc") {
        docx::extract_docx(path)?
    } else {
        return Err(ExtractError::UnsupportedFileType);
    };

    info!(
        path = %path.display(),
        chars = extraction.text.chars().count(),
        warnings = extraction.warnings.len(),
        "Extracted document text"
    );
    Ok(extraction)
}
