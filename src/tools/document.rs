//! PDF loading and text cleanup
//!
//! Read failures are reported inline as `[ERROR] ...` / `[WARN] ...` text so
//! the downstream agents can still explain what went wrong.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use super::{require_str, Tool};
use crate::error::AnalyzerError;
use crate::models::{ToolInput, ToolOutput};
use crate::Result;

pub const NO_TEXT_WARNING: &str = "[WARN] PDF parsed but no textual content was extracted.";

/// Turns raw document bytes into per-page text
pub trait TextExtractor: Send + Sync {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>>;
}

/// Extractor backed by `pdf-extract`
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>> {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| AnalyzerError::DocumentError(e.to_string()))
    }
}

pub struct FinancialDocumentTool {
    extractor: Arc<dyn TextExtractor>,
}

impl FinancialDocumentTool {
    pub fn new(extractor: Arc<dyn TextExtractor>) -> Self {
        Self { extractor }
    }

    /// Read text from a PDF file and return a cleaned string, or an inline
    /// `[ERROR]`/`[WARN]` marker describing why nothing usable came out.
    pub async fn read_pdf_text(&self, path: &Path) -> String {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return format!("[ERROR] File not found: {}", path.display());
            }
            Err(e) => return format!("[ERROR] Failed to read PDF: {}", e),
        };

        let extractor = Arc::clone(&self.extractor);
        let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&bytes)).await;

        match pages {
            Ok(Ok(pages)) => {
                debug!(path = %path.display(), pages = pages.len(), "PDF text extracted");
                join_pages(&pages)
            }
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "PDF extraction failed");
                format!("[ERROR] Failed to read PDF: {}", e)
            }
            // the PDF library panics on some malformed inputs
            Err(e) => {
                warn!(path = %path.display(), error = %e, "PDF extraction aborted");
                format!("[ERROR] Failed to read PDF: {}", e)
            }
        }
    }
}

/// Collapse blank-line runs inside each page, then join pages with one blank line
pub fn join_pages(pages: &[String]) -> String {
    let cleaned: Vec<String> = pages
        .iter()
        .map(|page| {
            let mut content = page.clone();
            while content.contains("\n\n") {
                content = content.replace("\n\n", "\n");
            }
            content.trim().to_string()
        })
        .collect();

    let full_text = cleaned.join("\n\n").trim().to_string();
    if full_text.is_empty() {
        NO_TEXT_WARNING.to_string()
    } else {
        full_text
    }
}

#[async_trait::async_trait]
impl Tool for FinancialDocumentTool {
    fn name(&self) -> &'static str {
        "read_financial_document"
    }

    fn description(&self) -> &'static str {
        "Load and sanitize the text of a PDF financial document"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let path = require_str(input, "path")?;
        let text = self.read_pdf_text(Path::new(path)).await;

        Ok(ToolOutput {
            success: !text.starts_with("[ERROR]"),
            data: json!({ "text": text }),
            error: None,
        })
    }
}

/// Minimal Helvetica PDF, one line of text per page
#[cfg(test)]
pub(crate) fn build_test_pdf(pages: &[&str]) -> Vec<u8> {
    let font_id = 3;
    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            (0..pages.len())
                .map(|i| format!("{} 0 R", 4 + 2 * i))
                .collect::<Vec<_>>()
                .join(" "),
            pages.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    for (i, text) in pages.iter().enumerate() {
        let stream = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 {} 0 R >> >> /Contents {} 0 R >>",
            font_id,
            5 + 2 * i
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{:010} 00000 n \n", offset));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));

    pdf.into_bytes()
}
