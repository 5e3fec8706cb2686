//! Request and response types for the PDF library

use serde::{Deserialize, Serialize};

use crate::config::LibraryConfig;
use crate::error::{AppError, Result};
use crate::pdf::PDF_CONTENT_TYPE;

// ============================================================================
// Constants
// ============================================================================

/// Maximum generated title length, in characters
pub const MAX_TITLE_CHARS: usize = 200;

/// Maximum generated body length, in characters
pub const MAX_CONTENT_CHARS: usize = 100_000;

pub const UPLOAD_SUCCESS_MESSAGE: &str = "PDF uploaded successfully";
pub const GENERATE_SUCCESS_MESSAGE: &str = "PDF generated successfully";

/// Content type browsers send when they cannot tell
const OCTET_STREAM: &str = "application/octet-stream";

// ============================================================================
// Ingestion
// ============================================================================

/// Acknowledgment for a created document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: i64,
}

impl CreatedResponse {
    pub fn uploaded(id: i64) -> Self {
        Self {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            id,
        }
    }

    pub fn generated(id: i64) -> Self {
        Self {
            message: GENERATE_SUCCESS_MESSAGE.to_string(),
            id,
        }
    }
}

/// A file received through multipart upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Check the declared content type.
    ///
    /// Absent and `application/octet-stream` types are left to the
    /// signature check.
    pub fn check_content_type(&self) -> Result<()> {
        let Some(declared) = self.content_type.as_deref() else {
            return Ok(());
        };

        let essence = declared
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence.is_empty() || essence == PDF_CONTENT_TYPE || essence == OCTET_STREAM {
            Ok(())
        } else {
            Err(AppError::UnsupportedMediaType(format!(
                "Expected {}, got {}",
                PDF_CONTENT_TYPE, declared
            )))
        }
    }
}

/// Body of `POST /generate_pdf/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl GenerateRequest {
    /// Validate and return the trimmed title and content
    pub fn validate(&self) -> Result<(String, String)> {
        let title = self.title.trim();
        let content = self.content.trim();

        if title.is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }
        if content.is_empty() {
            return Err(AppError::Validation("content is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::Validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(AppError::Validation(format!(
                "content must be at most {} characters",
                MAX_CONTENT_CHARS
            )));
        }

        Ok((title.to_string(), content.to_string()))
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Query string of `GET /pdf/{id}/sections/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// Resolved 1-based page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
}

impl Pagination {
    /// Apply defaults and bounds: pages start at 1, sizes above the limit
    /// are clamped.
    pub fn resolve(query: &SectionQuery, limits: &LibraryConfig) -> Result<Self> {
        let page = query.page.unwrap_or(1);
        let size = query.size.unwrap_or(limits.default_page_size);

        if page == 0 {
            return Err(AppError::Validation("page must be 1 or greater".to_string()));
        }
        if size == 0 {
            return Err(AppError::Validation("size must be 1 or greater".to_string()));
        }

        Ok(Self {
            page,
            size: size.min(limits.max_page_size.max(1)),
        })
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.size)
    }
}

// ============================================================================
// File names
// ============================================================================

/// Strip directories, quotes and control characters from a client file name
pub fn sanitize_file_name(raw: Option<&str>) -> String {
    let base = raw
        .unwrap_or_default()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        "upload.pdf".to_string()
    } else {
        cleaned.to_string()
    }
}

/// File name without its extension
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.trim().is_empty() => stem,
        _ => file_name,
    }
}

/// File name for a generated document, derived from its title
pub fn generated_file_name(title: &str) -> String {
    let mut slug = String::new();
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug: String = slug.trim_end_matches('-').chars().take(64).collect();
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        "document.pdf".to_string()
    } else {
        format!("{}.pdf", slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> LibraryConfig {
        LibraryConfig {
            max_upload_bytes: 1024,
            default_page_size: 10,
            max_page_size: 100,
        }
    }

    #[test]
    fn test_pagination_defaults() {
        let page = Pagination::resolve(&SectionQuery::default(), &limits()).unwrap();
        assert_eq!(page, Pagination { page: 1, size: 10 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_pagination_offsets_are_one_based() {
        let query = SectionQuery {
            page: Some(3),
            size: Some(5),
        };
        let page = Pagination::resolve(&query, &limits()).unwrap();
        assert_eq!(page.limit(), 5);
        assert_eq!(page.offset(), 10);
    }

    #[test]
    fn test_pagination_clamps_size() {
        let query = SectionQuery {
            page: Some(1),
            size: Some(5000),
        };
        assert_eq!(Pagination::resolve(&query, &limits()).unwrap().size, 100);
    }

    #[test]
    fn test_pagination_rejects_zero() {
        let zero_page = SectionQuery {
            page: Some(0),
            size: None,
        };
        assert!(matches!(
            Pagination::resolve(&zero_page, &limits()),
            Err(AppError::Validation(_))
        ));

        let zero_size = SectionQuery {
            page: None,
            size: Some(0),
        };
        assert!(matches!(
            Pagination::resolve(&zero_size, &limits()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_pagination_far_page_does_not_overflow() {
        let query = SectionQuery {
            page: Some(u32::MAX),
            size: Some(100),
        };
        let page = Pagination::resolve(&query, &limits()).unwrap();
        assert!(page.offset() > 0);
    }

    #[test]
    fn test_generate_request_validation() {
        let ok = GenerateRequest {
            title: "  Test PDF ".to_string(),
            content: "This is a test PDF generated by API.".to_string(),
        };
        assert_eq!(
            ok.validate().unwrap(),
            (
                "Test PDF".to_string(),
                "This is a test PDF generated by API.".to_string()
            )
        );

        let blank_content = GenerateRequest {
            title: "Title".to_string(),
            content: "   ".to_string(),
        };
        assert!(matches!(blank_content.validate(), Err(AppError::Validation(_))));

        assert!(matches!(
            GenerateRequest::default().validate(),
            Err(AppError::Validation(_))
        ));

        let long_title = GenerateRequest {
            title: "x".repeat(MAX_TITLE_CHARS + 1),
            content: "body".to_string(),
        };
        assert!(matches!(long_title.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_content_type_check() {
        let file = |content_type: Option<&str>| UploadedFile {
            file_name: Some("a.pdf".to_string()),
            content_type: content_type.map(str::to_string),
            data: Vec::new(),
        };

        assert!(file(Some("application/pdf")).check_content_type().is_ok());
        assert!(file(Some("Application/PDF; charset=binary")).check_content_type().is_ok());
        assert!(file(Some("application/octet-stream")).check_content_type().is_ok());
        assert!(file(None).check_content_type().is_ok());
        assert!(matches!(
            file(Some("text/plain")).check_content_type(),
            Err(AppError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name(Some("test.pdf")), "test.pdf");
        assert_eq!(sanitize_file_name(Some("../../etc/report.pdf")), "report.pdf");
        assert_eq!(sanitize_file_name(Some("C:\\docs\\q\"1\".pdf")), "q1.pdf");
        assert_eq!(sanitize_file_name(Some("  ")), "upload.pdf");
        assert_eq!(sanitize_file_name(None), "upload.pdf");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("test.pdf"), "test");
        assert_eq!(file_stem("archive.tar.pdf"), "archive.tar");
        assert_eq!(file_stem("README"), "README");
        assert_eq!(file_stem(".pdf"), ".pdf");
    }

    #[test]
    fn test_generated_file_name() {
        assert_eq!(generated_file_name("Test PDF"), "test-pdf.pdf");
        assert_eq!(generated_file_name("  Q3: Results & Outlook!  "), "q3-results-outlook.pdf");
        assert_eq!(generated_file_name("\u{65e5}\u{672c}"), "document.pdf");
    }
}
