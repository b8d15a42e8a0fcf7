//! DOCX text extraction.
//!
//! A DOCX file is a zip package; the body text lives in `word/document.xml`.
//! Only body-level paragraphs are read. Table cells, text boxes and content
//! controls are skipped, and each paragraph becomes one line.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{ExtractError, Result};
use crate::{Extraction, ExtractionStatus};

/// Path of the main document part inside the package.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Extract paragraph text from a DOCX package.
pub fn extract_docx(path: &Path) -> Result<Extraction> {
    let io_err = |source| ExtractError::Io {
        path: path.display().to_string(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let mut archive = ZipArchive::new(file)?;

    let mut xml = String::new();
    {
        let mut part = match archive.by_name(DOCUMENT_PART) {
            Ok(part) => part,
            Err(ZipError::FileNotFound) => {
                return Err(ExtractError::MissingPart(DOCUMENT_PART.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        part.read_to_string(&mut xml).map_err(io_err)?;
    }

    let text = document_text(&xml)?;
    debug!(path = %path.display(), chars = text.chars().count(), "DOCX extracted");

    let status = if text.trim().is_empty() {
        ExtractionStatus::Empty
    } else {
        ExtractionStatus::Complete
    };

    Ok(Extraction {
        text,
        status,
        warnings: Vec::new(),
    })
}

/// Collect the text of every body paragraph in a `document.xml` string.
pub fn document_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut text = String::new();
    let mut buf = Vec::new();

    // Depth inside tables, text boxes and content controls.
    let mut nested_depth = 0usize;
    let mut in_run = false;
    let mut in_text = false;

    loop {
        let in_body = nested_depth == 0;

        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"tbl" | b"txbxContent" | b"sdtContent" => nested_depth += 1,
                b"r" => in_run = true,
                b"t" => in_text = in_run,
                _ => {}
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                b"tbl" | b"txbxContent" | b"sdtContent" => {
                    nested_depth = nested_depth.saturating_sub(1)
                }
                b"r" => in_run = false,
                b"t" => in_text = false,
                b"p" if in_body => text.push('\n'),
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"p" if in_body => text.push('\n'),
                b"tab" if in_body && in_run => text.push('\t'),
                b"br" | b"cr" if in_body && in_run => text.push('\n'),
                _ => {}
            },
            Event::Text(ref e) if in_text && in_body => {
                text.push_str(&e.unescape()?);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>{body}</w:body>
</w:document>"#
        )
    }

    #[test]
    fn test_paragraphs_become_lines() {
        let xml = wrap(
            "<w:p><w:r><w:t>Intro.</w:t></w:r></w:p>\
             <w:p/>\
             <w:p><w:r><w:t xml:space=\"preserve\">Details </w:t></w:r><w:r><w:t>here.</w:t></w:r></w:p>",
        );
        assert_eq!(document_text(&xml).unwrap(), "Intro.\n\nDetails here.\n");
    }

    #[test]
    fn test_tabs_and_breaks() {
        let xml = wrap(
            "<w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr>\
             <w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p>",
        );
        assert_eq!(document_text(&xml).unwrap(), "a\tb\nc\n");
    }

    #[test]
    fn test_entities_unescaped() {
        let xml = wrap("<w:p><w:r><w:t>Salt &amp; pepper &lt;3</w:t></w:r></w:p>");
        assert_eq!(document_text(&xml).unwrap(), "Salt & pepper <3\n");
    }

    #[test]
    fn test_tables_skipped() {
        let xml = wrap(
            "<w:p><w:r><w:t>Before</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p><w:r><w:t>After</w:t></w:r></w:p>",
        );
        assert_eq!(document_text(&xml).unwrap(), "Before\nAfter\n");
    }

    #[test]
    fn test_content_controls_skipped() {
        let xml = wrap(
            "<w:p><w:r><w:t>Before</w:t></w:r></w:p>\
             <w:sdt><w:sdtPr><w:alias w:val=\"Title\"/></w:sdtPr><w:sdtContent>\
             <w:p><w:r><w:t>Control</w:t></w:r></w:p></w:sdtContent></w:sdt>\
             <w:p><w:r><w:t>A</w:t></w:r><w:sdt><w:sdtContent><w:r><w:t>inline</w:t></w:r></w:sdtContent></w:sdt></w:p>",
        );
        assert_eq!(document_text(&xml).unwrap(), "Before
A
");
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let xml = wrap("<w:p><w:r><w:t>open</w:r></w:p>");
        assert!(matches!(document_text(&xml), Err(ExtractError::Xml(_))));
    }
}
