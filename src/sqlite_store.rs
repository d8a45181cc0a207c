//! SQLite-backed [`ChunkStore`] and [`DocumentStore`].
//!
//! Maps each store operation to SQL against the schema created by
//! [`crate::migrate`]. sqlx errors surface as
//! [`Error::Store`](policy_harness_core::Error::Store).

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use policy_harness_core::error::{Error, Result};
use policy_harness_core::models::{Chunk, Document};
use policy_harness_core::store::{ChunkStore, DocumentStore};

const DOCUMENT_COLUMNS: &str = "d.document_id, d.file_name, d.version, d.file_type, d.file_path, \
     d.description, d.uploaded_at, d.active, d.indexed, d.page_count, d.chunk_count";

const CHUNK_COLUMNS: &str = "id, document_id, chunk_index, content, page_number, section, \
     start_line, end_line, embedding";

/// SQLite implementation of both store traits.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_documents(&self, sql: &str, year: Option<i32>) -> Result<Vec<Document>> {
        let mut query = sqlx::query(sql);
        if let Some(y) = year {
            query = query.bind(y);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(Error::store)?;
        rows.iter().map(document_from_row).collect()
    }
}

fn document_from_row(row: &SqliteRow) -> Result<Document> {
    Ok(Document {
        document_id: row.try_get("document_id").map_err(Error::store)?,
        file_name: row.try_get("file_name").map_err(Error::store)?,
        version: row.try_get("version").map_err(Error::store)?,
        file_type: row.try_get("file_type").map_err(Error::store)?,
        file_path: row.try_get("file_path").map_err(Error::store)?,
        description: row.try_get("description").map_err(Error::store)?,
        uploaded_at: row.try_get("uploaded_at").map_err(Error::store)?,
        active: row.try_get("active").map_err(Error::store)?,
        indexed: row.try_get("indexed").map_err(Error::store)?,
        page_count: row.try_get("page_count").map_err(Error::store)?,
        chunk_count: row.try_get("chunk_count").map_err(Error::store)?,
    })
}

fn chunk_from_row(row: &SqliteRow) -> Result<Chunk> {
    Ok(Chunk {
        id: row.try_get("id").map_err(Error::store)?,
        document_id: row.try_get("document_id").map_err(Error::store)?,
        chunk_index: row.try_get("chunk_index").map_err(Error::store)?,
        content: row.try_get("content").map_err(Error::store)?,
        page_number: row.try_get("page_number").map_err(Error::store)?,
        section: row.try_get("section").map_err(Error::store)?,
        start_line: row.try_get("start_line").map_err(Error::store)?,
        end_line: row.try_get("end_line").map_err(Error::store)?,
        embedding: row.try_get("embedding").map_err(Error::store)?,
    })
}

#[async_trait]
impl ChunkStore for SqliteStore {
    async fn fetch_by_document_ids(&self, document_ids: &[String]) -> Result<Vec<Chunk>> {
        if document_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; document_ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM chunks WHERE document_id IN ({}) ORDER BY document_id, chunk_index, rowid",
            CHUNK_COLUMNS, placeholders
        );

        let mut query = sqlx::query(&sql);
        for id in document_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(Error::store)?;
        rows.iter().map(chunk_from_row).collect()
    }

    async fn fetch_by_document_ordered(&self, document_id: &str) -> Result<Vec<Chunk>> {
        let sql = format!(
            "SELECT {} FROM chunks WHERE document_id = ? ORDER BY chunk_index ASC, rowid ASC",
            CHUNK_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(document_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::store)?;
        rows.iter().map(chunk_from_row).collect()
    }

    async fn save(&self, chunks: &[Chunk]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::store)?;

        for chunk in chunks {
            sqlx::query(
                r#"
                INSERT INTO chunks (id, document_id, chunk_index, content, page_number,
                                    section, start_line, end_line, embedding)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk.id)
            .bind(&chunk.document_id)
            .bind(chunk.chunk_index)
            .bind(&chunk.content)
            .bind(chunk.page_number)
            .bind(&chunk.section)
            .bind(chunk.start_line)
            .bind(chunk.end_line)
            .bind(&chunk.embedding)
            .execute(&mut *tx)
            .await
            .map_err(Error::store)?;
        }

        tx.commit().await.map_err(Error::store)?;
        Ok(())
    }

    async fn update_chunk_index(&self, chunk_id: &str, chunk_index: i64) -> Result<()> {
        sqlx::query("UPDATE chunks SET chunk_index = ? WHERE id = ?")
            .bind(chunk_index)
            .bind(chunk_id)
            .execute(&self.pool)
            .await
            .map_err(Error::store)?;
        Ok(())
    }

    async fn delete_by_document_id(&self, document_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chunks WHERE document_id = ?")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(Error::store)?;
        Ok(result.rows_affected())
    }

    async fn delete_many(&self, chunk_ids: &[String]) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(Error::store)?;
        let mut removed = 0u64;
        for id in chunk_ids {
            removed += sqlx::query("DELETE FROM chunks WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(Error::store)?
                .rows_affected();
        }
        tx.commit().await.map_err(Error::store)?;
        Ok(removed)
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert_document(&self, doc: &Document) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (document_id, file_name, version, file_type, file_path,
                                   description, uploaded_at, active, indexed, page_count,
                                   chunk_count)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&doc.document_id)
        .bind(&doc.file_name)
        .bind(&doc.version)
        .bind(&doc.file_type)
        .bind(&doc.file_path)
        .bind(&doc.description)
        .bind(doc.uploaded_at)
        .bind(doc.active)
        .bind(doc.indexed)
        .bind(doc.page_count)
        .bind(doc.chunk_count)
        .execute(&self.pool)
        .await
        .map_err(Error::store)?;
        Ok(())
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>> {
        let sql = format!("SELECT {} FROM documents d WHERE d.document_id = ?", DOCUMENT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::store)?;
        row.as_ref().map(document_from_row).transpose()
    }

    async fn find_active(&self) -> Result<Vec<Document>> {
        let sql = format!(
            "SELECT {} FROM documents d WHERE d.active = 1 ORDER BY d.document_id",
            DOCUMENT_COLUMNS
        );
        self.fetch_documents(&sql, None).await
    }

    async fn find_active_by_file_name(&self, file_name: &str) -> Result<Vec<Document>> {
        let sql = format!(
            "SELECT {} FROM documents d WHERE d.active = 1 AND d.file_name = ? \
             ORDER BY d.uploaded_at DESC, d.rowid DESC",
            DOCUMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(file_name)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::store)?;
        rows.iter().map(document_from_row).collect()
    }

    async fn find_active_by_file_name_and_version(
        &self,
        file_name: &str,
        version: &str,
    ) -> Result<Option<Document>> {
        let sql = format!(
            "SELECT {} FROM documents d WHERE d.active = 1 AND d.file_name = ? AND d.version = ? \
             ORDER BY d.uploaded_at DESC, d.rowid DESC LIMIT 1",
            DOCUMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(file_name)
            .bind(version)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::store)?;
        row.as_ref().map(document_from_row).transpose()
    }

    async fn find_latest_per_file_name(&self) -> Result<Vec<Document>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM (SELECT *, ROW_NUMBER() OVER (
                      PARTITION BY file_name ORDER BY uploaded_at DESC, rowid DESC) AS rn
                  FROM documents
                  WHERE active = 1) d
            WHERE d.rn = 1
            ORDER BY d.file_name
            "#,
            DOCUMENT_COLUMNS
        );
        self.fetch_documents(&sql, None).await
    }

    async fn find_latest_per_file_name_before_year(&self, year: i32) -> Result<Vec<Document>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM (SELECT *, ROW_NUMBER() OVER (
                      PARTITION BY file_name ORDER BY uploaded_at DESC, rowid DESC) AS rn
                  FROM documents
                  WHERE active = 1
                    AND CAST(strftime('%Y', uploaded_at / 1000000, 'unixepoch') AS INTEGER) <= ?) d
            WHERE d.rn = 1
            ORDER BY d.file_name
            "#,
            DOCUMENT_COLUMNS
        );
        self.fetch_documents(&sql, Some(year)).await
    }

    async fn deactivate(&self, document_id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE documents SET active = 0 WHERE document_id = ?")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(Error::store)?;
        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(document_id.to_string()));
        }
        Ok(())
    }

    async fn mark_indexed(
        &self,
        document_id: &str,
        indexed: bool,
        page_count: Option<i64>,
        chunk_count: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE documents SET indexed = ?, page_count = ?, chunk_count = ? WHERE document_id = ?",
        )
        .bind(indexed)
        .bind(page_count)
        .bind(chunk_count)
        .bind(document_id)
        .execute(&self.pool)
        .await
        .map_err(Error::store)?;
        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(document_id.to_string()));
        }
        Ok(())
    }

    async fn set_chunk_count(&self, document_id: &str, chunk_count: i64) -> Result<()> {
        let result = sqlx::query("UPDATE documents SET chunk_count = ? WHERE document_id = ?")
            .bind(chunk_count)
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(Error::store)?;
        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(document_id.to_string()));
        }
        Ok(())
    }
}
