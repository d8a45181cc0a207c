//! Page-wise ingestion: chunk, embed, validate, persist.
//!
//! Pages are processed one at a time and each page's chunks are written
//! and dropped before the next page is read, so peak memory is bounded by
//! the largest page rather than the whole document. The running chunk
//! index is owned here and threaded into the chunker as `starting_index`.

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chunk::{chunk_text, ChunkingParams};
use crate::cleanup::is_invalid_chunk;
use crate::embedding::{embed_drafts, encode_embedding, EmbeddingProvider};
use crate::error::Result;
use crate::models::{Chunk, PageText};
use crate::store::ChunkStore;

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub pages_processed: usize,
    pub empty_pages: usize,
    pub chunks_created: i64,
    pub chunks_without_embedding: i64,
}

/// Chunk, embed and persist `pages` for `document_id`.
///
/// Embedding failures never abort ingestion: affected chunks are stored
/// without a vector. Store failures propagate.
pub async fn ingest_pages<S, I>(
    store: &S,
    provider: &dyn EmbeddingProvider,
    document_id: &str,
    pages: I,
    params: &ChunkingParams,
) -> Result<IngestReport>
where
    S: ChunkStore + ?Sized,
    I: IntoIterator<Item = PageText>,
{
    params.validate()?;

    let mut report = IngestReport::default();
    let mut next_index: i64 = 0;

    for page in pages {
        report.pages_processed += 1;

        let drafts = chunk_text(&page.text, page.page_number, next_index, params);
        if drafts.is_empty() {
            debug!(document_id, page = ?page.page_number, "page produced no chunks");
            report.empty_pages += 1;
            continue;
        }

        let vectors = embed_drafts(provider, &drafts).await;

        let chunks: Vec<Chunk> = drafts
            .into_iter()
            .zip(vectors)
            .map(|(draft, vector)| Chunk {
                id: Uuid::new_v4().to_string(),
                document_id: document_id.to_string(),
                chunk_index: draft.chunk_index,
                content: draft.content,
                page_number: draft.page_number,
                section: None,
                start_line: None,
                end_line: None,
                embedding: encode_embedding(&vector),
            })
            .filter(|c| {
                let invalid = is_invalid_chunk(c);
                if invalid {
                    warn!(document_id, chunk_index = c.chunk_index, "dropping invalid chunk");
                }
                !invalid
            })
            .collect();

        if chunks.is_empty() {
            report.empty_pages += 1;
            continue;
        }

        let missing = chunks.iter().filter(|c| !c.has_embedding()).count() as i64;
        store.save(&chunks).await?;

        // The next page continues after the last persisted index.
        if let Some(last) = chunks.last() {
            next_index = last.chunk_index + 1;
        }
        report.chunks_created += chunks.len() as i64;
        report.chunks_without_embedding += missing;

        debug!(
            document_id,
            page = ?page.page_number,
            chunks = chunks.len(),
            without_embedding = missing,
            "page ingested"
        );
    }

    info!(
        document_id,
        pages = report.pages_processed,
        chunks = report.chunks_created,
        without_embedding = report.chunks_without_embedding,
        "ingestion complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::embedding::tests::FakeProvider;
    use crate::error::Error;
    use crate::store::memory::InMemoryStore;

    fn page(n: i64, text: &str) -> PageText {
        PageText {
            page_number: Some(n),
            text: text.to_string(),
        }
    }

    fn long_text(words: usize) -> String {
        (0..words).map(|i| format!("word{} ", i)).collect()
    }

    #[tokio::test]
    async fn test_indices_are_dense_across_pages() {
        let store = InMemoryStore::new();
        let provider = FakeProvider::new();
        let pages = vec![page(1, &long_text(200)), page(2, "   "), page(3, &long_text(150))];

        let report = ingest_pages(&store, &provider, "doc", pages, &ChunkingParams::default())
            .await
            .unwrap();

        let chunks = store.fetch_by_document_ordered("doc").await.unwrap();
        let indices: Vec<i64> = chunks.iter().map(|c| c.chunk_index).collect();
        let expected: Vec<i64> = (0..chunks.len() as i64).collect();
        assert_eq!(indices, expected);

        assert_eq!(report.pages_processed, 3);
        assert_eq!(report.empty_pages, 1);
        assert_eq!(report.chunks_created, chunks.len() as i64);
        assert_eq!(report.chunks_without_embedding, 0);
        assert!(chunks.iter().all(|c| c.has_embedding()));
        assert!(chunks.iter().any(|c| c.page_number == Some(3)));
    }

    #[tokio::test]
    async fn test_one_batch_call_per_page() {
        let store = InMemoryStore::new();
        let provider = FakeProvider::new();
        let pages = vec![page(1, &long_text(200)), page(2, &long_text(200))];

        ingest_pages(&store, &provider, "doc", pages, &ChunkingParams::default())
            .await
            .unwrap();

        assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 2);
        assert_eq!(provider.single_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batch_failure_falls_back_and_keeps_chunks() {
        let store = InMemoryStore::new();
        let mut provider = FakeProvider::new();
        provider.fail_batch = true;

        let report = ingest_pages(&store, &provider, "doc", vec![page(1, &long_text(200))], &ChunkingParams::default())
            .await
            .unwrap();

        assert!(report.chunks_created > 1);
        assert_eq!(report.chunks_without_embedding, 0);
        assert_eq!(
            provider.single_calls.load(Ordering::SeqCst) as i64,
            report.chunks_created
        );
    }

    #[tokio::test]
    async fn test_provider_down_stores_chunks_without_vectors() {
        let store = InMemoryStore::new();
        let mut provider = FakeProvider::new();
        provider.fail_all = true;

        let report = ingest_pages(
            &store,
            &provider,
            "doc",
            vec![PageText {
                page_number: None,
                text: "Bereavement leave is five working days.".into(),
            }],
            &ChunkingParams::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.chunks_created, 1);
        assert_eq!(report.chunks_without_embedding, 1);
        assert_eq!(store.chunk_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_params_rejected() {
        let store = InMemoryStore::new();
        let provider = FakeProvider::new();
        let params = ChunkingParams {
            chunk_size: 100,
            chunk_overlap: 100,
            ..ChunkingParams::default()
        };
        let err = ingest_pages(&store, &provider, "doc", vec![page(1, "text")], &params)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
