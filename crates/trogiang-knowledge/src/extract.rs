//! Document text extraction.
//!
//! Plain text and Markdown are decoded directly, PDF goes through
//! `pdf-extract`, and DOCX is read from `word/document.xml` inside the zip
//! container. Every parser failure is an extraction error, so callers can
//! tell "unreadable file" apart from "file with no text".

use quick_xml::events::Event;
use std::io::{Cursor, Read};
use std::path::Path;
use trogiang_core::error::{Result, TroGiangError};

/// File formats the uploader accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Markdown,
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detect the format from a file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::PlainText),
            "md" | "markdown" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }
}

/// Read a document from disk and return its text, trimmed.
pub fn extract_text(path: &Path) -> Result<String> {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let bytes = std::fs::read(path)
        .map_err(|e| TroGiangError::Extraction(format!("cannot read {}: {e}", path.display())))?;
    extract_bytes(name, &bytes)
}

/// Extract text from an uploaded file's bytes.
pub fn extract_bytes(file_name: &str, bytes: &[u8]) -> Result<String> {
    let text = match DocumentFormat::from_file_name(file_name) {
        Some(DocumentFormat::PlainText | DocumentFormat::Markdown) => decode_utf8(bytes),
        Some(DocumentFormat::Pdf) => parse_pdf(file_name, bytes)?,
        Some(DocumentFormat::Docx) => parse_docx(file_name, bytes)?,
        None => {
            return Err(TroGiangError::Extraction(format!(
                "unsupported format for '{file_name}', use PDF/DOCX/TXT"
            )));
        }
    };
    tracing::debug!("📄 Extracted {} chars from {file_name}", text.chars().count());
    Ok(text.trim().to_string())
}

/// Decode UTF-8, dropping invalid byte sequences.
fn decode_utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect()
}

fn parse_pdf(file_name: &str, bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed files instead of returning an error.
    let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| TroGiangError::Extraction(format!("'{file_name}' is not a readable PDF")))?;
    extracted.map_err(|e| TroGiangError::Extraction(format!("failed to read PDF '{file_name}': {e}")))
}

fn parse_docx(file_name: &str, bytes: &[u8]) -> Result<String> {
    let docx_err = |what: String| TroGiangError::Extraction(format!("DOCX '{file_name}': {what}"));

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| docx_err(format!("not a zip container: {e}")))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| docx_err("missing word/document.xml".into()))?
        .read_to_string(&mut xml)
        .map_err(|e| docx_err(format!("cannot read document.xml: {e}")))?;

    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut paragraphs = Vec::new();
    let mut paragraph = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"p" => paragraph.clear(),
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"tab" => paragraph.push(' '),
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => in_text = false,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"p" => {
                if !paragraph.trim().is_empty() {
                    paragraphs.push(std::mem::take(&mut paragraph));
                }
            }
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| docx_err(format!("bad text node: {e}")))?;
                paragraph.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(docx_err(format!("XML parse error: {e}"))),
            _ => {}
        }
    }
    Ok(paragraphs.join("\n"))
}
