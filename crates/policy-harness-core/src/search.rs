//! Hybrid retrieval orchestrator.
//!
//! The search runs entirely through the [`ChunkStore`]/[`DocumentStore`]
//! traits and the [`EmbeddingProvider`] trait, with no database or
//! configuration dependencies. The calling application builds a
//! [`SearchRequest`] (query, limit, optional year bound, tuning
//! parameters) and passes its backends in.
//!
//! # Pipeline
//!
//! 1. Resolve eligible document ids (latest version per file name, or
//!    latest as of a year). Empty → return immediately, no embedding call.
//! 2. Embed the query. Failure skips the vector branch only.
//! 3. Fetch the eligible documents' chunks.
//! 4. Vector and keyword candidates, each capped at `top_k × oversample`.
//! 5. Fuse with weighted scores and return the best `top_k`.

use tracing::{debug, info};

use crate::cache::{CacheKey, SearchCache};
use crate::embedding::{embed_query, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::fusion::{fuse, keyword_candidates, vector_candidates, FusionWeights};
use crate::keyword::{tokenize_query, DEFAULT_MIN_TOKEN_LEN};
use crate::models::RankedChunk;
use crate::store::{ChunkStore, DocumentStore};
use crate::version::resolve_document_ids;

/// Retrieval tuning parameters, decoupled from application config.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    /// Weights for `hybrid = vector × w_v + keyword × w_k`.
    pub weights: FusionWeights,
    /// Each candidate set is truncated to `top_k × oversample`.
    pub oversample: usize,
    /// Query tokens shorter than this never match.
    pub min_token_len: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            oversample: 2,
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
        }
    }
}

impl SearchParams {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if self.oversample == 0 {
            return Err(Error::Config("oversample must be >= 1".into()));
        }
        Ok(())
    }
}

/// Bundles all inputs for a single search invocation.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    /// Maximum results to return.
    pub top_k: usize,
    /// Restrict retrieval to the versions current as of this year.
    pub temporal_year: Option<i32>,
    pub params: SearchParams,
}

/// Run a hybrid search.
///
/// Returns at most `top_k` chunks, best-first. An empty result means
/// nothing relevant was found; errors are reserved for store failures.
pub async fn search<S>(
    store: &S,
    provider: &dyn EmbeddingProvider,
    req: &SearchRequest<'_>,
) -> Result<Vec<RankedChunk>>
where
    S: ChunkStore + DocumentStore + ?Sized,
{
    if req.query.trim().is_empty() || req.top_k == 0 {
        return Ok(Vec::new());
    }

    let document_ids = resolve_document_ids(store, req.temporal_year).await?;
    if document_ids.is_empty() {
        info!(year = ?req.temporal_year, "no eligible documents, skipping search");
        return Ok(Vec::new());
    }

    let query_vec = embed_query(provider, req.query).await;

    let ids: Vec<String> = document_ids.into_iter().collect();
    let chunks = store.fetch_by_document_ids(&ids).await?;
    debug!(documents = ids.len(), chunks = chunks.len(), "fetched candidate chunks");

    let limit = req.top_k.saturating_mul(req.params.oversample.max(1));

    let vector = match &query_vec {
        Some(qv) => vector_candidates(&chunks, qv, limit),
        None => Vec::new(),
    };

    let tokens = tokenize_query(req.query);
    let keyword = keyword_candidates(&chunks, &tokens, req.params.min_token_len, limit);

    let results = fuse(&vector, &keyword, req.params.weights, req.top_k);

    info!(
        vector_candidates = vector.len(),
        keyword_candidates = keyword.len(),
        results = results.len(),
        "search complete"
    );
    Ok(results)
}

/// [`search`] behind a [`SearchCache`].
///
/// Only non-empty results are cached, so a corpus that later gains
/// matching content is not masked by a stale empty entry.
pub async fn search_cached<S>(
    store: &S,
    provider: &dyn EmbeddingProvider,
    cache: &dyn SearchCache,
    req: &SearchRequest<'_>,
) -> Result<Vec<RankedChunk>>
where
    S: ChunkStore + DocumentStore + ?Sized,
{
    let key = CacheKey::new(req.query, req.top_k, req.temporal_year);
    if let Some(hit) = cache.get(&key) {
        debug!(query = %key.query, "search cache hit");
        return Ok(hit);
    }

    let results = search(store, provider, req).await?;
    if !results.is_empty() {
        cache.set(key, results.clone());
    }
    Ok(results)
}
