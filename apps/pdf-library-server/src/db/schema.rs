//! Database schema lifecycle

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;

    Ok(())
}

/// Drop every table created by [`initialize_schema`]
pub async fn drop_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(DROP_SQL).execute(pool).await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Stored PDF documents, bytes included
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    file_name TEXT NOT NULL,
    -- 'upload' or 'generated'
    source TEXT NOT NULL,
    content_type TEXT NOT NULL DEFAULT 'application/pdf',
    file_size INTEGER NOT NULL,
    -- hex SHA-256 of content
    checksum TEXT NOT NULL,
    -- NULL when the upload could not be parsed
    page_count INTEGER,
    content BLOB NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_checksum ON documents(checksum);

-- Text sections derived from a document
CREATE TABLE IF NOT EXISTS sections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    -- 1-based order within the document
    position INTEGER NOT NULL,
    page_number INTEGER,
    heading TEXT,
    content TEXT NOT NULL,

    UNIQUE(document_id, position)
);
"#;

const DROP_SQL: &str = r#"
DROP TABLE IF EXISTS sections;
DROP TABLE IF EXISTS documents;
"#;
