//! Index overview for `policyctl stats`.
//!
//! Document, version and chunk counts plus embedding coverage, broken
//! down per policy file. Useful to confirm that uploads were indexed and
//! how many chunks are searchable by keyword only.

use anyhow::Result;
use serde::Serialize;
use sqlx::Row;

use crate::harness::Harness;

#[derive(Debug, Clone, Serialize)]
pub struct FileStats {
    pub file_name: String,
    pub versions: i64,
    pub chunks: i64,
    pub embedded: i64,
    pub last_upload: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub documents: i64,
    pub unindexed: i64,
    pub chunks: i64,
    pub embedded: i64,
    pub files: Vec<FileStats>,
}

/// Counts over active documents and their chunks.
pub async fn collect_stats(harness: &Harness) -> Result<IndexStats> {
    let pool = harness.store.pool();

    let documents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE active = 1")
        .fetch_one(pool)
        .await?;
    let unindexed: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE active = 1 AND indexed = 0")
            .fetch_one(pool)
            .await?;

    let rows = sqlx::query(
        r#"
        SELECT
            d.file_name,
            COUNT(DISTINCT d.document_id) AS versions,
            COUNT(c.id) AS chunks,
            COUNT(CASE WHEN c.embedding <> '' THEN 1 END) AS embedded,
            MAX(d.uploaded_at) AS last_upload
        FROM documents d
        LEFT JOIN chunks c ON c.document_id = d.document_id
        WHERE d.active = 1
        GROUP BY d.file_name
        ORDER BY d.file_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    let files: Vec<FileStats> = rows
        .iter()
        .map(|row| -> std::result::Result<FileStats, sqlx::Error> {
            Ok(FileStats {
                file_name: row.try_get("file_name")?,
                versions: row.try_get("versions")?,
                chunks: row.try_get("chunks")?,
                embedded: row.try_get("embedded")?,
                last_upload: row.try_get("last_upload")?,
            })
        })
        .collect::<std::result::Result<_, _>>()?;

    Ok(IndexStats {
        documents,
        unindexed,
        chunks: files.iter().map(|f| f.chunks).sum(),
        embedded: files.iter().map(|f| f.embedded).sum(),
        files,
    })
}

/// CLI entry point: print the overview.
pub async fn run_stats(harness: &Harness) -> Result<()> {
    let stats = collect_stats(harness).await?;
    let db_size = std::fs::metadata(&harness.config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Policy Harness Index Stats");
    println!("==========================");
    println!();
    println!("  Database:    {}", harness.config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Documents:   {}", stats.documents);
    if stats.unindexed > 0 {
        println!("  Unindexed:   {}", stats.unindexed);
    }
    println!("  Chunks:      {}", stats.chunks);
    println!(
        "  Embedded:    {} / {} ({}%)",
        stats.embedded,
        stats.chunks,
        if stats.chunks > 0 {
            (stats.embedded * 100) / stats.chunks
        } else {
            0
        }
    );

    if !stats.files.is_empty() {
        println!();
        println!("  By file:");
        println!(
            "  {:<32} {:>8} {:>8} {:>10}   {}",
            "FILE", "VERSIONS", "CHUNKS", "EMBEDDED", "LAST UPLOAD"
        );
        println!("  {}", "-".repeat(80));
        for f in &stats.files {
            println!(
                "  {:<32} {:>8} {:>8} {:>10}   {}",
                f.file_name,
                f.versions,
                f.chunks,
                f.embedded,
                crate::documents::format_date(f.last_upload)
            );
        }
    }
    println!();
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
