//! File ingestion: register an uploaded policy file and index it.
//!
//! ```text
//! file ──▶ extract pages ──▶ documents row (indexed = 0)
//!                │
//!                ▼
//!        core ingest_pages ──▶ chunks rows ──▶ mark_indexed
//! ```
//!
//! Text is extracted before anything is written, so an unreadable file
//! leaves no trace. A pipeline failure after the document row exists
//! leaves it `indexed = 0` and is reported rather than raised.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use policy_harness_core::cache::SearchCache;
use policy_harness_core::ingest::ingest_pages;
use policy_harness_core::models::Document;
use policy_harness_core::store::DocumentStore;

use crate::extract::{extract_pages, FileKind};
use crate::harness::Harness;

/// Version recorded when the caller gives none.
pub const DEFAULT_VERSION: &str = "1.0";

/// Outcome of one upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub success: bool,
    /// The new document, or the existing one on a duplicate upload.
    pub document_id: Option<String>,
    pub file_name: String,
    pub version: String,
    pub pages: usize,
    pub chunks_created: i64,
    pub chunks_without_embedding: i64,
    pub message: String,
}

impl UploadReport {
    fn failed(file_name: &str, version: &str, document_id: Option<String>, message: String) -> Self {
        Self {
            success: false,
            document_id,
            file_name: file_name.to_string(),
            version: version.to_string(),
            pages: 0,
            chunks_created: 0,
            chunks_without_embedding: 0,
            message,
        }
    }
}

/// Ingest the file at `path` as `version` (default `"1.0"`).
///
/// Errors are reserved for bad input (empty name, unsupported type,
/// unreadable file) and store faults before the document exists.
pub async fn ingest_file(
    harness: &Harness,
    path: &Path,
    version: Option<&str>,
    description: Option<&str>,
) -> Result<UploadReport> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().trim().to_string())
        .unwrap_or_default();
    if file_name.is_empty() {
        bail!("File name must not be empty: {}", path.display());
    }
    let version = version
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_VERSION);
    let kind = FileKind::from_file_name(&file_name)?;

    let store = &harness.store;
    if let Some(existing) = store
        .find_active_by_file_name_and_version(&file_name, version)
        .await?
    {
        info!(
            file_name = %file_name,
            version,
            existing = %existing.document_id,
            "document version already exists"
        );
        return Ok(UploadReport::failed(
            &file_name,
            version,
            Some(existing.document_id.clone()),
            format!(
                "{} version {} already exists as document {}",
                file_name, version, existing.document_id
            ),
        ));
    }

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let pages = extract_pages(&bytes, kind)
        .with_context(|| format!("Failed to extract text from {}", file_name))?;
    let page_count = pages.len();

    let document_id = new_document_id();
    let stored_path = copy_to_storage(harness, &document_id, &file_name, &bytes).await?;

    let doc = Document {
        document_id: document_id.clone(),
        file_name: file_name.clone(),
        version: version.to_string(),
        file_type: kind.as_str().to_string(),
        file_path: stored_path,
        description: description.map(str::to_string),
        uploaded_at: Utc::now().timestamp_micros(),
        active: true,
        indexed: false,
        page_count: None,
        chunk_count: 0,
    };
    store.insert_document(&doc).await?;

    let params = harness.config.chunking.params();
    let report = match ingest_pages(
        store,
        harness.provider.as_ref(),
        &document_id,
        pages,
        &params,
    )
    .await
    {
        Ok(report) => report,
        Err(e) => {
            error!(document_id = %document_id, error = %e, "ingestion failed");
            let mut failed =
                UploadReport::failed(&file_name, version, Some(document_id), e.to_string());
            failed.pages = page_count;
            return Ok(failed);
        }
    };

    store
        .mark_indexed(
            &document_id,
            true,
            Some(page_count as i64),
            report.chunks_created,
        )
        .await?;
    harness.cache.invalidate_all();

    info!(
        document_id = %document_id,
        file_name = %file_name,
        version,
        pages = page_count,
        chunks = report.chunks_created,
        "document indexed"
    );

    Ok(UploadReport {
        success: true,
        document_id: Some(document_id),
        file_name,
        version: version.to_string(),
        pages: page_count,
        chunks_created: report.chunks_created,
        chunks_without_embedding: report.chunks_without_embedding,
        message: "indexed".to_string(),
    })
}

/// First 8 hex characters of a v4 UUID.
fn new_document_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

async fn copy_to_storage(
    harness: &Harness,
    document_id: &str,
    file_name: &str,
    bytes: &[u8],
) -> Result<String> {
    let dir = &harness.config.storage.documents_dir;
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create storage directory: {}", dir.display()))?;
    let dest = dir.join(format!("{}_{}", document_id, file_name));
    tokio::fs::write(&dest, bytes)
        .await
        .with_context(|| format!("Failed to store {}", dest.display()))?;
    Ok(dest.display().to_string())
}

/// CLI entry point for `policyctl ingest`.
pub async fn run_ingest(
    harness: &Harness,
    path: &Path,
    version: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let report = ingest_file(harness, path, version, description).await?;

    println!("ingest {}", report.file_name);
    println!("  version: {}", report.version);
    if let Some(ref id) = report.document_id {
        println!("  document: {}", id);
    }
    if !report.success {
        println!("  failed: {}", report.message);
        std::process::exit(1);
    }
    println!("  pages: {}", report.pages);
    println!("  chunks written: {}", report.chunks_created);
    if report.chunks_without_embedding > 0 {
        println!(
            "  chunks without embedding: {}",
            report.chunks_without_embedding
        );
    }
    println!("ok");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_is_eight_hex_chars() {
        let id = new_document_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_document_id());
    }
}
