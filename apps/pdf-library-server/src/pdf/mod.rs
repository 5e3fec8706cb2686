//! PDF synthesis and text extraction
//!
//! Built on lopdf. `generate` lays title and body text out on US Letter
//! pages; `extract` reads the Info title and per-page paragraphs back out of
//! uploaded bytes.

mod extract;
mod generator;
mod text;

pub use extract::{extract, ExtractedPdf};
pub use generator::{generate, GeneratedPdf};
pub use text::{split_paragraphs, to_win_ansi};

use thiserror::Error;

/// Leading bytes of every PDF file
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Media type served for stored documents
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// PDF processing errors
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Failed to generate PDF: {0}")]
    Generate(String),
}

/// A section derived from PDF content, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDraft {
    /// 1-based page the section starts on
    pub page: Option<u32>,
    pub heading: Option<String>,
    pub content: String,
}

/// Check the `%PDF-` signature
pub fn has_pdf_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_SIGNATURE)
}
