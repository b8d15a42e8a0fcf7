//! PDF text extraction.
//!
//! Pages are read one at a time. A page that fails to decode is recorded and
//! skipped so the rest of the document still comes through.

use std::path::Path;

use lopdf::Document;
use tracing::{debug, warn};

use crate::{Extraction, ExtractionStatus};

/// Warning attached when a PDF opens but yields no text at all.
pub const NO_TEXT_WARNING: &str =
    "PDF opened but no text was extracted. Check if it's scanned or image-based.";

/// Extract the text of every page, in page order.
///
/// Never fails: an unreadable file gives an empty extraction with a warning.
pub fn extract_pdf(path: &Path) -> Extraction {
    let doc = match Document::load(path) {
        Ok(doc) => doc,
        Err(e) => {
            let message = format!("Error reading PDF: {e}");
            warn!(path = %path.display(), "{}", message);
            return Extraction {
                text: String::new(),
                status: ExtractionStatus::Empty,
                warnings: vec![message],
            };
        }
    };

    let mut text = String::new();
    let mut warnings = Vec::new();
    let mut failed_pages = Vec::new();

    for page_number in doc.get_pages().keys().copied() {
        match doc.extract_text(&[page_number]) {
            Ok(page_text) => {
                let page_text = page_text.trim_end();
                if !page_text.is_empty() {
                    text.push_str(page_text);
                    text.push('\n');
                }
            }
            Err(e) => {
                let message = format!("Error reading PDF page {page_number}: {e}");
                warn!(path = %path.display(), "{}", message);
                warnings.push(message);
                failed_pages.push(page_number);
            }
        }
    }

    if text.is_empty() && failed_pages.is_empty() {
        warn!(path = %path.display(), "{}", NO_TEXT_WARNING);
        warnings.push(NO_TEXT_WARNING.to_string());
    }

    debug!(
        path = %path.display(),
        chars = text.chars().count(),
        failed = failed_pages.len(),
        "PDF extracted"
    );

    let status = if text.is_empty() {
        ExtractionStatus::Empty
    } else if failed_pages.is_empty() {
        ExtractionStatus::Complete
    } else {
        ExtractionStatus::Partial { failed_pages }
    };

    Extraction {
        text,
        status,
        warnings,
    }
}
