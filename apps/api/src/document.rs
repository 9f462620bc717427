//! Document text extraction for uploaded résumés.
//!
//! PDFs are opened with lopdf and read page by page. A page that fails to
//! decode is logged and skipped; a document that yields no text at all is an
//! error, since there is nothing to analyze.

use lopdf::Document;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Separator placed between the text of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid or corrupted PDF file")]
    Corrupted,

    #[error("Failed to extract text from PDF: {0}")]
    Unreadable(String),

    #[error("Failed to extract text from PDF: No text could be extracted from the PDF")]
    NoText,
}

/// Returns true when the bytes open as a PDF with at least one page.
/// Parse failures are logged, never propagated.
pub fn validate_pdf(bytes: &[u8]) -> bool {
    match Document::load_mem(bytes) {
        Ok(doc) if doc.get_pages().is_empty() => {
            error!("PDF validation failed: document has no pages");
            false
        }
        Ok(_) => true,
        Err(e) => {
            error!("PDF validation failed: {e}");
            false
        }
    }
}

/// Extracts the text of every page in page order, joined by a blank line.
pub fn extract_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let doc = Document::load_mem(bytes).map_err(|e| {
        error!("PDF extraction error: {e}");
        DocumentError::Unreadable(e.to_string())
    })?;

    // get_pages is keyed by page number, so iteration is already in page order
    let mut pages_text = Vec::new();
    for page_number in doc.get_pages().into_keys() {
        match doc.extract_text(&[page_number]) {
            Ok(text) => {
                let text = text.trim_end();
                if !text.trim().is_empty() {
                    pages_text.push(text.to_string());
                }
                debug!("Extracted text from page {page_number}");
            }
            Err(e) => {
                warn!("Failed to extract text from page {page_number}: {e}");
            }
        }
    }

    if pages_text.is_empty() {
        return Err(DocumentError::NoText);
    }

    let full_text = pages_text.join(PAGE_SEPARATOR);
    info!(
        "Successfully extracted {} characters from PDF",
        full_text.chars().count()
    );
    Ok(full_text)
}
