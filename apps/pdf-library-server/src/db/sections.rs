//! Section database operations

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;

/// Section record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Section {
    pub id: i64,
    pub document_id: i64,
    pub position: i64,
    pub page_number: Option<i64>,
    pub heading: Option<String>,
    pub content: String,
}

/// Section repository
pub struct SectionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SectionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List one window of a document's sections in position order
    pub async fn list_for_document(
        &self,
        document_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Section>> {
        let sections = sqlx::query_as::<_, Section>(
            r#"
            SELECT id, document_id, position, page_number, heading, content
            FROM sections
            WHERE document_id = ?
            ORDER BY position ASC, id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(document_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(sections)
    }
}
