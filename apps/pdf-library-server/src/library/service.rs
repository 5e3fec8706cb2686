//! PDF library service
//!
//! Ingests PDFs by upload or generation, persists them with their sections,
//! and serves them back. Every operation is one atomic insert or read; PDF
//! parsing and synthesis run on the blocking pool.

use sqlx::SqlitePool;

use crate::config::LibraryConfig;
use crate::db::{
    self, DocumentRepository, DocumentSource, DocumentSummary, NewDocument, Section,
    SectionRepository, StoredFile,
};
use crate::error::{AppError, Result};
use crate::pdf::{self, has_pdf_signature, SectionDraft};

use super::types::{
    file_stem, generated_file_name, sanitize_file_name, GenerateRequest, Pagination,
    SectionQuery, UploadedFile,
};

/// Handle to the PDF library
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct PdfLibrary {
    pool: SqlitePool,
    limits: LibraryConfig,
}

impl PdfLibrary {
    /// Create a library over an initialized database pool
    pub fn new(pool: SqlitePool, limits: LibraryConfig) -> Self {
        Self { pool, limits }
    }

    /// Check that the database answers
    pub async fn ping(&self) -> Result<()> {
        db::ping(&self.pool).await
    }

    /// Close the underlying pool, waiting for checked-out connections
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Store an uploaded PDF and its extracted sections.
    ///
    /// Files that carry the PDF signature but fail to parse are stored
    /// without sections.
    pub async fn upload(&self, file: UploadedFile) -> Result<i64> {
        if file.data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }
        if file.data.len() > self.limits.max_upload_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File is {} bytes, the limit is {} bytes",
                file.data.len(),
                self.limits.max_upload_bytes
            )));
        }
        file.check_content_type()?;
        if !has_pdf_signature(&file.data) {
            return Err(AppError::BadRequest(
                "Uploaded file is not a PDF (missing %PDF- signature)".to_string(),
            ));
        }

        let file_name = sanitize_file_name(file.file_name.as_deref());
        let data = file.data;

        let (data, extracted) = tokio::task::spawn_blocking(move || {
            let extracted = pdf::extract(&data);
            (data, extracted)
        })
        .await
        .map_err(|e| AppError::Internal(format!("PDF extraction task failed: {}", e)))?;

        let (title, page_count, sections) = match extracted {
            Ok(extracted) => (
                extracted.title,
                Some(extracted.page_count as i64),
                extracted.sections,
            ),
            Err(e) => {
                tracing::warn!(
                    file_name = %file_name,
                    error = %e,
                    "Storing PDF without sections"
                );
                (None, None, Vec::new())
            }
        };

        let title = title.unwrap_or_else(|| match file_stem(&file_name).trim() {
            "" => "Untitled".to_string(),
            stem => stem.to_string(),
        });

        let document = NewDocument {
            title,
            file_name,
            source: DocumentSource::Upload,
            page_count,
            content: data,
        };
        let id = self.insert(&document, &sections).await?;

        tracing::info!(
            document_id = id,
            file_name = %document.file_name,
            size = document.content.len(),
            sections = sections.len(),
            "PDF uploaded"
        );

        Ok(id)
    }

    /// Synthesize a PDF from title and content and store it
    pub async fn generate(&self, request: GenerateRequest) -> Result<i64> {
        let (title, content) = request.validate()?;

        let layout_title = title.clone();
        let generated =
            tokio::task::spawn_blocking(move || pdf::generate(&layout_title, &content))
                .await
                .map_err(|e| AppError::Internal(format!("PDF generation task failed: {}", e)))??;

        let document = NewDocument {
            file_name: generated_file_name(&title),
            title,
            source: DocumentSource::Generated,
            page_count: Some(generated.page_count as i64),
            content: generated.bytes,
        };
        let id = self.insert(&document, &generated.sections).await?;

        tracing::info!(
            document_id = id,
            title = %document.title,
            pages = generated.page_count,
            sections = generated.sections.len(),
            "PDF generated"
        );

        Ok(id)
    }

    /// List every stored document
    pub async fn list(&self) -> Result<Vec<DocumentSummary>> {
        DocumentRepository::new(&self.pool).list().await
    }

    /// Get one document summary
    pub async fn get(&self, id: i64) -> Result<DocumentSummary> {
        DocumentRepository::new(&self.pool)
            .get(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// One page of a document's sections.
    ///
    /// Pages past the end are empty, not errors.
    pub async fn sections(&self, id: i64, query: &SectionQuery) -> Result<Vec<Section>> {
        let pagination = Pagination::resolve(query, &self.limits)?;

        if !DocumentRepository::new(&self.pool).exists(id).await? {
            return Err(not_found(id));
        }

        SectionRepository::new(&self.pool)
            .list_for_document(id, pagination.limit(), pagination.offset())
            .await
    }

    /// Stored bytes of a document
    pub async fn download(&self, id: i64) -> Result<StoredFile> {
        DocumentRepository::new(&self.pool)
            .get_file(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn insert(&self, document: &NewDocument, sections: &[SectionDraft]) -> Result<i64> {
        DocumentRepository::new(&self.pool)
            .create(document, sections)
            .await
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("PDF {} not found", id))
}
