//! Source document loading: plain text or PDF.

use std::path::Path;

use lopdf::Document;
use rallycoach_core::error::{Error, Result};
use tracing::{debug, warn};

/// Read the text of the document at `path`.
///
/// Files with a `.pdf` extension (any case) have their text extracted page
/// by page; anything else is read as UTF-8.
pub fn read_document(path: &Path) -> Result<String> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        let doc = Document::load(path).map_err(|e| document_error(path, e))?;
        return extract_pdf_text(&doc).map_err(|message| Error::Document {
            path: path.display().to_string(),
            message,
        });
    }

    std::fs::read_to_string(path).map_err(|e| document_error(path, e))
}

/// Concatenate the text of every page in page order.
///
/// Pages whose content cannot be decoded are skipped with a warning.
fn extract_pdf_text(doc: &Document) -> std::result::Result<String, String> {
    let mut page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    page_numbers.sort_unstable();

    let mut text = String::new();
    for page in &page_numbers {
        match doc.extract_text(&[*page]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => warn!(page, error = %e, "Skipping unreadable PDF page"),
        }
    }
    debug!(pages = page_numbers.len(), chars = text.len(), "Extracted PDF text");

    if text.trim().is_empty() {
        return Err("no extractable text (scanned document?)".into());
    }
    Ok(text)
}

fn document_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Document {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
