//! PDF → DOCX via local libraries: lopdf text extraction, docx-rust writer.
//!
//! ## What this preserves (and what it cannot)
//!
//! lopdf yields the text runs of each page in content-stream order; layout,
//! fonts, and images are gone. The output document carries one paragraph
//! per extracted line with a blank paragraph between source pages — the
//! same fidelity ceiling every text-extraction converter has. Image-only
//! (scanned) PDFs yield no text at all and are reported as such rather
//! than delivering an empty document.
//!
//! ## Why a scratch directory?
//!
//! The docx writer produces its ZIP container against a path, not a
//! buffer. Writing into a `TempDir` and reading the bytes back keeps the
//! public API in-memory while the directory (and everything in it) is
//! removed on drop — on the error paths too.

use crate::error::ConvertError;
use docx_rust::document::Paragraph;
use docx_rust::Docx;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Convert PDF bytes to DOCX bytes.
pub async fn pdf_to_docx(bytes: Vec<u8>) -> Result<Vec<u8>, ConvertError> {
    tokio::task::spawn_blocking(move || pdf_to_docx_blocking(&bytes))
        .await
        .map_err(|e| ConvertError::Internal(format!("Document task panicked: {}", e)))?
}

fn pdf_to_docx_blocking(bytes: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let pdf = lopdf::Document::load_mem(bytes).map_err(|e| ConvertError::PdfParse {
        detail: e.to_string(),
    })?;

    if pdf.is_encrypted() {
        return Err(ConvertError::PdfEncrypted);
    }

    let pages = pdf.get_pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut docx = Docx::default();
    let mut any_text = false;

    for (i, page_number) in pages.keys().enumerate() {
        let text = match pdf.extract_text(&[*page_number]) {
            Ok(t) => t,
            Err(e) => {
                warn!("Page {}: text extraction failed: {}", page_number, e);
                String::new()
            }
        };

        if i > 0 {
            docx.document.push(Paragraph::default());
        }

        for line in text.lines() {
            let line = line.trim_end();
            if !line.is_empty() {
                any_text = true;
            }
            docx.document
                .push(Paragraph::default().push_text(line.to_string()));
        }
        debug!("Page {}: {} extracted bytes", page_number, text.len());
    }

    if !any_text {
        return Err(ConvertError::NoExtractableText);
    }

    // Write the document into a scratch directory and read the bytes back.
    //
    // Inlined from a former `write_docx` helper: docx-rust's
    // `write_file(&'a mut self)` ties the mutable borrow to the document's
    // own lifetime, so the `Docx` must be borrowed here — where its lifetime
    // is inferred to this local region — rather than through a helper whose
    // caller-quantified lifetime parameter outlives the value.
    let scratch = TempDir::new().map_err(|e| ConvertError::Internal(e.to_string()))?;
    let path = scratch.path().join("converted.docx");

    docx.write_file(&path).map_err(|e| ConvertError::DocxWrite {
        detail: format!("{:?}", e),
    })?;

    let out = std::fs::read(&path).map_err(|e| ConvertError::Internal(e.to_string()))?;
    debug!("Wrote {} docx bytes via scratch dir", out.len());
    // `scratch` drops here, deleting the directory and its contents.
    Ok(out)
}
