//! Chunk and document integrity maintenance.
//!
//! All chunk operations are scoped to one document. After
//! [`cleanup_and_reindex`] a document's chunk indices are exactly
//! `0..n-1`, in their previous relative order, and its cached chunk
//! count equals `n`.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{Chunk, Document};
use crate::store::{ChunkStore, DocumentStore};

/// Outcome of [`cleanup_and_reindex`] for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanupReport {
    pub document_id: String,
    pub duplicates_removed: u64,
    pub invalid_removed: u64,
    pub chunk_count: i64,
}

/// Outcome of [`cleanup_duplicate_documents`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentCleanupReport {
    pub groups: usize,
    pub deactivated: Vec<String>,
    pub chunks_removed: u64,
}

/// A chunk is invalid when its content is blank or its index negative.
pub fn is_invalid_chunk(chunk: &Chunk) -> bool {
    chunk.content.trim().is_empty() || chunk.chunk_index < 0
}

/// Delete every chunk that repeats an already-seen `chunk_index`.
///
/// Chunks are scanned in index order; the first occurrence of each index
/// (insertion order among equals) survives.
pub async fn cleanup_duplicate_chunks<S>(store: &S, document_id: &str) -> Result<u64>
where
    S: ChunkStore + ?Sized,
{
    let chunks = store.fetch_by_document_ordered(document_id).await?;

    let mut seen = HashSet::new();
    let doomed: Vec<String> = chunks
        .into_iter()
        .filter(|c| !seen.insert(c.chunk_index))
        .map(|c| c.id)
        .collect();

    if doomed.is_empty() {
        return Ok(0);
    }
    let removed = store.delete_many(&doomed).await?;
    info!(document_id, removed, "removed duplicate chunks");
    Ok(removed)
}

/// Delete chunks with blank content or a negative index.
pub async fn cleanup_invalid_chunks<S>(store: &S, document_id: &str) -> Result<u64>
where
    S: ChunkStore + ?Sized,
{
    let doomed: Vec<String> = store
        .fetch_by_document_ordered(document_id)
        .await?
        .into_iter()
        .filter(is_invalid_chunk)
        .map(|c| c.id)
        .collect();

    if doomed.is_empty() {
        return Ok(0);
    }
    let removed = store.delete_many(&doomed).await?;
    info!(document_id, removed, "removed invalid chunks");
    Ok(removed)
}

/// Reassign dense indices `0..n-1` in current index order and update the
/// document's chunk count. Returns `n`.
pub async fn reindex_chunks<S>(store: &S, document_id: &str) -> Result<i64>
where
    S: ChunkStore + DocumentStore + ?Sized,
{
    let chunks = store.fetch_by_document_ordered(document_id).await?;

    let mut updated = 0usize;
    for (i, c) in chunks.iter().enumerate() {
        let index = i as i64;
        if c.chunk_index != index {
            store.update_chunk_index(&c.id, index).await?;
            updated += 1;
        }
    }

    let count = chunks.len() as i64;
    store.set_chunk_count(document_id, count).await?;
    debug!(document_id, count, updated, "reindexed chunks");
    Ok(count)
}

/// Duplicate cleanup, invalid cleanup, then re-index.
pub async fn cleanup_and_reindex<S>(store: &S, document_id: &str) -> Result<CleanupReport>
where
    S: ChunkStore + DocumentStore + ?Sized,
{
    if store.get_document(document_id).await?.is_none() {
        return Err(Error::DocumentNotFound(document_id.to_string()));
    }

    let duplicates_removed = cleanup_duplicate_chunks(store, document_id).await?;
    let invalid_removed = cleanup_invalid_chunks(store, document_id).await?;
    let chunk_count = reindex_chunks(store, document_id).await?;

    Ok(CleanupReport {
        document_id: document_id.to_string(),
        duplicates_removed,
        invalid_removed,
        chunk_count,
    })
}

/// Group active documents by `(file_name, version)`, keeping only groups
/// with more than one member. Keys read `"<file_name> v<version>"`; each
/// group is ordered newest upload first.
pub async fn find_duplicate_documents<S>(store: &S) -> Result<BTreeMap<String, Vec<Document>>>
where
    S: DocumentStore + ?Sized,
{
    let mut groups: BTreeMap<String, Vec<Document>> = BTreeMap::new();
    for d in store.find_active().await? {
        groups
            .entry(format!("{} v{}", d.file_name, d.version))
            .or_default()
            .push(d);
    }

    groups.retain(|_, docs| docs.len() > 1);
    for docs in groups.values_mut() {
        docs.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
    }
    Ok(groups)
}

/// In every duplicate group keep the newest upload; deactivate the rest
/// and delete their chunks.
pub async fn cleanup_duplicate_documents<S>(store: &S) -> Result<DocumentCleanupReport>
where
    S: ChunkStore + DocumentStore + ?Sized,
{
    let groups = find_duplicate_documents(store).await?;
    let mut report = DocumentCleanupReport {
        groups: groups.len(),
        ..Default::default()
    };

    for (key, docs) in groups {
        for stale in docs.iter().skip(1) {
            warn!(group = %key, document_id = %stale.document_id, "deactivating duplicate document");
            store.deactivate(&stale.document_id).await?;
            report.chunks_removed += store.delete_by_document_id(&stale.document_id).await?;
            report.deactivated.push(stale.document_id.clone());
        }
    }

    info!(
        groups = report.groups,
        deactivated = report.deactivated.len(),
        chunks_removed = report.chunks_removed,
        "duplicate document cleanup complete"
    );
    Ok(report)
}

/// Soft-delete a document and delete all of its chunks.
///
/// Returns the number of chunks removed.
pub async fn delete_document<S>(store: &S, document_id: &str) -> Result<u64>
where
    S: ChunkStore + DocumentStore + ?Sized,
{
    if store.get_document(document_id).await?.is_none() {
        return Err(Error::DocumentNotFound(document_id.to_string()));
    }
    store.deactivate(document_id).await?;
    let removed = store.delete_by_document_id(document_id).await?;
    info!(document_id, chunks_removed = removed, "document deleted");
    Ok(removed)
}
