//! PDF ingestion: uploaded PDF bytes in, plain text out.

use thiserror::Error;
use tracing::{debug, error};

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("{0}")]
    NotPdf(String),

    #[error("Failed to extract text from PDF: {0}")]
    Extraction(String),

    #[error("PDF contains no extractable text")]
    NoText,
}

/// Accepts an upload if it is declared as, or looks like, a PDF.
pub fn ensure_pdf(content_type: Option<&str>, bytes: &[u8]) -> Result<(), PdfError> {
    if bytes.is_empty() {
        return Err(PdfError::NotPdf("Please select a PDF file to upload.".to_string()));
    }
    let declared_pdf = content_type.is_some_and(|ct| ct.eq_ignore_ascii_case("application/pdf"));
    if !declared_pdf && !bytes.starts_with(PDF_MAGIC) {
        return Err(PdfError::NotPdf("Please upload a PDF file.".to_string()));
    }
    Ok(())
}

/// Extracts text from PDF bytes. Parsing is CPU-bound, so it runs on the
/// blocking pool.
pub async fn extract_text_from_pdf(bytes: Vec<u8>) -> Result<String, PdfError> {
    let size = bytes.len();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| PdfError::Extraction(e.to_string()))?
        .map_err(|e| {
            error!("[PDF] Error extracting text: {e}");
            PdfError::Extraction(e.to_string())
        })?;

    if text.trim().is_empty() {
        return Err(PdfError::NoText);
    }
    debug!("[PDF] Extracted {} chars from {size} bytes", text.len());
    Ok(text)
}

/// Default resume title for an uploaded file: the file name without `.pdf`.
pub fn title_from_filename(filename: Option<&str>) -> String {
    let name = filename.unwrap_or_default().trim();
    let stem = name
        .strip_suffix(".pdf")
        .or_else(|| name.strip_suffix(".PDF"))
        .unwrap_or(name);
    if stem.is_empty() {
        "Uploaded Resume".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_pdf_upload() {
        assert!(matches!(
            ensure_pdf(Some("text/plain"), b"hello"),
            Err(PdfError::NotPdf(_))
        ));
        assert!(matches!(ensure_pdf(None, b""), Err(PdfError::NotPdf(_))));
    }

    #[test]
    fn test_accepts_declared_or_sniffed_pdf() {
        assert!(ensure_pdf(Some("application/pdf"), b"anything").is_ok());
        assert!(ensure_pdf(Some("application/octet-stream"), b"%PDF-1.7\n").is_ok());
    }

    #[tokio::test]
    async fn test_garbage_bytes_fail_extraction() {
        let result = extract_text_from_pdf(b"%PDF-1.4 not really a pdf".to_vec()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename(Some("jane_doe.pdf")), "jane_doe");
        assert_eq!(title_from_filename(Some("CV.PDF")), "CV");
        assert_eq!(title_from_filename(None), "Uploaded Resume");
    }
}
