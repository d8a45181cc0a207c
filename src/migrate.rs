use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Create the schema. Idempotent.
///
/// `(document_id, chunk_index)` is indexed but deliberately not unique:
/// duplicate indices can arise from interrupted or repeated ingestion
/// and are removed by chunk cleanup.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            document_id TEXT PRIMARY KEY,
            file_name TEXT NOT NULL,
            version TEXT NOT NULL,
            file_type TEXT NOT NULL,
            file_path TEXT NOT NULL,
            description TEXT,
            uploaded_at INTEGER NOT NULL, -- unix microseconds
            active INTEGER NOT NULL DEFAULT 1,
            indexed INTEGER NOT NULL DEFAULT 0,
            page_count INTEGER,
            chunk_count INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            document_id TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            content TEXT NOT NULL,
            page_number INTEGER,
            section TEXT,
            start_line INTEGER,
            end_line INTEGER,
            embedding TEXT NOT NULL DEFAULT '',
            FOREIGN KEY (document_id) REFERENCES documents(document_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id, chunk_index)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_file_name ON documents(file_name, uploaded_at DESC)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_active ON documents(active)")
        .execute(pool)
        .await?;

    info!("schema migrations applied");
    Ok(())
}
