//! Document database operations

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::pdf::{SectionDraft, PDF_CONTENT_TYPE};

/// How a document entered the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DocumentSource {
    Upload,
    Generated,
}

/// Document record without its bytes
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentSummary {
    pub id: i64,
    pub title: String,
    pub file_name: String,
    pub source: DocumentSource,
    pub content_type: String,
    pub file_size: i64,
    pub checksum: String,
    pub page_count: Option<i64>,
    pub section_count: i64,
    pub created_at: String,
}

/// Bytes of a stored document, for download
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredFile {
    pub file_name: String,
    pub checksum: String,
    pub content: Vec<u8>,
}

/// Document to insert
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub file_name: String,
    pub source: DocumentSource,
    pub page_count: Option<i64>,
    pub content: Vec<u8>,
}

/// Lowercase hex SHA-256 of `data`
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Document repository
pub struct DocumentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DocumentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a document and its sections in one transaction.
    ///
    /// Returns the new document id.
    pub async fn create(&self, document: &NewDocument, sections: &[SectionDraft]) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let checksum = compute_checksum(&document.content);

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO documents (title, file_name, source, content_type, file_size, checksum, page_count, content, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&document.title)
        .bind(&document.file_name)
        .bind(document.source)
        .bind(PDF_CONTENT_TYPE)
        .bind(document.content.len() as i64)
        .bind(&checksum)
        .bind(document.page_count)
        .bind(&document.content)
        .bind(&now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for (index, section) in sections.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sections (document_id, position, page_number, heading, content)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(index as i64 + 1)
            .bind(section.page.map(i64::from))
            .bind(&section.heading)
            .bind(&section.content)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(id)
    }

    /// Get a document summary
    pub async fn get(&self, id: i64) -> Result<Option<DocumentSummary>> {
        let document = sqlx::query_as::<_, DocumentSummary>(
            r#"
            SELECT d.id, d.title, d.file_name, d.source, d.content_type, d.file_size,
                   d.checksum, d.page_count, d.created_at,
                   (SELECT COUNT(*) FROM sections s WHERE s.document_id = d.id) AS section_count
            FROM documents d
            WHERE d.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(document)
    }

    /// List all documents, oldest first
    pub async fn list(&self) -> Result<Vec<DocumentSummary>> {
        let documents = sqlx::query_as::<_, DocumentSummary>(
            r#"
            SELECT d.id, d.title, d.file_name, d.source, d.content_type, d.file_size,
                   d.checksum, d.page_count, d.created_at,
                   (SELECT COUNT(*) FROM sections s WHERE s.document_id = d.id) AS section_count
            FROM documents d
            ORDER BY d.id ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(documents)
    }

    /// Whether a document exists
    pub async fn exists(&self, id: i64) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE id = ?")
            .bind(id)
            .fetch_one(self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Fetch the stored bytes of a document
    pub async fn get_file(&self, id: i64) -> Result<Option<StoredFile>> {
        let file = sqlx::query_as::<_, StoredFile>(
            r#"
            SELECT file_name, checksum, content
            FROM documents
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(file)
    }
}
