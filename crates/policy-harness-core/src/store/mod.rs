//! Storage abstraction for Policy Harness.
//!
//! [`ChunkStore`] and [`DocumentStore`] define every storage operation the
//! retrieval and ingestion pipeline needs, enabling pluggable backends
//! (SQLite in the app crate, in-memory here).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//! Read failures are reported as [`Error::Store`](crate::error::Error::Store);
//! "nothing found" is an empty result.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Chunk, Document};

/// Chunk persistence, always scoped by document or chunk id.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`fetch_by_document_ids`](ChunkStore::fetch_by_document_ids) | All chunks of the given documents |
/// | [`fetch_by_document_ordered`](ChunkStore::fetch_by_document_ordered) | One document's chunks by `chunk_index` |
/// | [`save`](ChunkStore::save) | Insert new chunks |
/// | [`update_chunk_index`](ChunkStore::update_chunk_index) | Reassign one chunk's index |
/// | [`delete_by_document_id`](ChunkStore::delete_by_document_id) | Cascade delete for a document |
/// | [`delete_many`](ChunkStore::delete_many) | Delete chunks by id |
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Fetch every chunk belonging to any of `document_ids`.
    async fn fetch_by_document_ids(&self, document_ids: &[String]) -> Result<Vec<Chunk>>;

    /// Fetch one document's chunks ordered by `chunk_index`; rows sharing
    /// an index keep insertion order.
    async fn fetch_by_document_ordered(&self, document_id: &str) -> Result<Vec<Chunk>>;

    /// Persist new chunks.
    async fn save(&self, chunks: &[Chunk]) -> Result<()>;

    /// Reassign the index of an existing chunk.
    async fn update_chunk_index(&self, chunk_id: &str, chunk_index: i64) -> Result<()>;

    /// Delete all chunks of a document, returning how many were removed.
    async fn delete_by_document_id(&self, document_id: &str) -> Result<u64>;

    /// Delete chunks by id, returning how many were removed.
    async fn delete_many(&self, chunk_ids: &[String]) -> Result<u64>;
}

/// Document metadata persistence and version queries.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document record.
    async fn insert_document(&self, doc: &Document) -> Result<()>;

    /// Look up a document (active or not) by id.
    async fn get_document(&self, document_id: &str) -> Result<Option<Document>>;

    /// All active documents.
    async fn find_active(&self) -> Result<Vec<Document>>;

    /// Active documents with this file name, newest upload first.
    async fn find_active_by_file_name(&self, file_name: &str) -> Result<Vec<Document>>;

    /// The active document with this file name and version, if any.
    async fn find_active_by_file_name_and_version(
        &self,
        file_name: &str,
        version: &str,
    ) -> Result<Option<Document>>;

    /// For each file name among active documents, the newest upload.
    async fn find_latest_per_file_name(&self) -> Result<Vec<Document>>;

    /// For each file name, the newest active upload whose year is `<= year`.
    async fn find_latest_per_file_name_before_year(&self, year: i32) -> Result<Vec<Document>>;

    /// Soft-delete a document.
    async fn deactivate(&self, document_id: &str) -> Result<()>;

    /// Record the outcome of an ingestion run.
    async fn mark_indexed(
        &self,
        document_id: &str,
        indexed: bool,
        page_count: Option<i64>,
        chunk_count: i64,
    ) -> Result<()>;

    /// Update the cached chunk count.
    async fn set_chunk_count(&self, document_id: &str, chunk_count: i64) -> Result<()>;
}

/// Pick, per file name, the active document with the greatest upload
/// time, optionally ignoring uploads after `max_year`.
///
/// Exactly one document is kept per file name: among uploads tied on the
/// maximum timestamp the one later in `docs` wins, so callers pass
/// documents in insertion order. Output is ordered by file name. Backends
/// without a query language use this directly; SQL backends express the
/// same rule in their query.
pub fn select_latest_versions(docs: &[Document], max_year: Option<i32>) -> Vec<Document> {
    use std::collections::BTreeMap;

    let mut newest: BTreeMap<&str, &Document> = BTreeMap::new();
    let eligible = |d: &&Document| d.active && max_year.map_or(true, |y| d.upload_year() <= y);

    for d in docs.iter().filter(eligible) {
        newest
            .entry(d.file_name.as_str())
            .and_modify(|best| {
                if d.uploaded_at >= best.uploaded_at {
                    *best = d;
                }
            })
            .or_insert(d);
    }

    newest.into_values().cloned().collect()
}
