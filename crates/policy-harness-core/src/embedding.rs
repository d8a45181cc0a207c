//! Embedding provider trait and vector utilities.
//!
//! Defines the [`EmbeddingProvider`] trait that all embedding backends
//! implement, the text codec used to persist vectors alongside chunks,
//! cosine similarity, and the batch-with-fallback helpers used by
//! ingestion and search.
//!
//! Concrete provider implementations (OpenAI-compatible HTTP, disabled)
//! live in the `policy-harness` app crate.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::ChunkDraft;

/// Trait for embedding providers (the remote text → vector gateway).
///
/// Batch output must have the same length and order as the input.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;

    /// Embed a batch of texts in one remote call.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    ///
    /// Blank input yields an empty vector without a remote call.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut out = self.embed_batch(&[text.to_string()]).await?;
        out.pop()
            .ok_or_else(|| Error::Embedding("empty embedding response".into()))
    }
}

/// Embed chunk drafts with one batched call, falling back to one call per
/// draft when the batch fails or returns the wrong number of vectors.
///
/// Always returns one vector per draft; a draft whose single call also
/// fails gets an empty vector and is persisted without an embedding.
pub async fn embed_drafts(provider: &dyn EmbeddingProvider, drafts: &[ChunkDraft]) -> Vec<Vec<f32>> {
    if drafts.is_empty() {
        return Vec::new();
    }

    let texts: Vec<String> = drafts.iter().map(|d| d.content.clone()).collect();

    match provider.embed_batch(&texts).await {
        Ok(vectors) if vectors.len() == texts.len() => {
            debug!(count = vectors.len(), "batch embedding succeeded");
            return vectors;
        }
        Ok(vectors) => warn!(
            expected = texts.len(),
            got = vectors.len(),
            "batch embedding returned wrong count, falling back to single calls"
        ),
        Err(e) => warn!(error = %e, "batch embedding failed, falling back to single calls"),
    }

    let mut vectors = Vec::with_capacity(texts.len());
    for (draft, text) in drafts.iter().zip(texts.iter()) {
        match provider.embed_text(text).await {
            Ok(v) => vectors.push(v),
            Err(e) => {
                warn!(chunk_index = draft.chunk_index, error = %e, "embedding failed, storing chunk without vector");
                vectors.push(Vec::new());
            }
        }
    }
    vectors
}

/// Embed a search query; `None` when the provider fails or returns nothing.
pub async fn embed_query(provider: &dyn EmbeddingProvider, query: &str) -> Option<Vec<f32>> {
    match provider.embed_text(query).await {
        Ok(v) if !v.is_empty() => Some(v),
        Ok(_) => {
            warn!("query embedding was empty, skipping vector scoring");
            None
        }
        Err(e) => {
            warn!(error = %e, "query embedding failed, skipping vector scoring");
            None
        }
    }
}

/// Encode a vector in the persisted text form: comma-separated floats.
///
/// An empty vector encodes to the empty string ("no embedding").
///
/// # Example
///
/// ```rust
/// use policy_harness_core::embedding::{encode_embedding, decode_embedding};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let text = encode_embedding(&v);
/// assert_eq!(text, "1,-2.5,3.125");
/// assert_eq!(decode_embedding(&text), Some(v));
/// ```
pub fn encode_embedding(vec: &[f32]) -> String {
    vec.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode the persisted text form back into a vector.
///
/// Surrounding brackets are tolerated. Returns `None` for an empty string
/// or if any component fails to parse; a partially parsed vector would
/// silently change dimensionality, so the whole embedding is treated as
/// absent instead.
pub fn decode_embedding(text: &str) -> Option<Vec<f32>> {
    let inner = text.trim().trim_start_matches('[').trim_end_matches(']').trim();
    if inner.is_empty() {
        return None;
    }
    inner
        .split(',')
        .map(|part| part.trim().parse::<f32>().ok())
        .collect()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors, zero-norm vectors, or vectors of
/// different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f64::EPSILON {
        return 0.0;
    }

    (dot / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Deterministic provider: maps each text to a bag-of-letters vector.
    ///
    /// Batch calls fail when `fail_batch` is set; texts listed in
    /// `fail_texts` fail individually.
    pub(crate) struct FakeProvider {
        pub fail_batch: bool,
        pub fail_all: bool,
        pub fail_texts: HashSet<String>,
        pub batch_calls: AtomicUsize,
        pub single_calls: AtomicUsize,
        pub seen: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        pub fn new() -> Self {
            Self {
                fail_batch: false,
                fail_all: false,
                fail_texts: HashSet::new(),
                batch_calls: AtomicUsize::new(0),
                single_calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn vectorize(text: &str) -> Vec<f32> {
            let mut v = vec![0.0f32; 26];
            for c in text.to_lowercase().chars() {
                if c.is_ascii_lowercase() {
                    v[(c as u8 - b'a') as usize] += 1.0;
                }
            }
            v
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FakeProvider {
        fn model_name(&self) -> &str {
            "fake-letters"
        }
        fn dims(&self) -> usize {
            26
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if self.fail_all {
                return Err(Error::Embedding("provider down".into()));
            }
            if texts.len() == 1 {
                self.single_calls.fetch_add(1, Ordering::SeqCst);
                if self.fail_texts.contains(&texts[0]) {
                    return Err(Error::Embedding("bad input".into()));
                }
            } else {
                self.batch_calls.fetch_add(1, Ordering::SeqCst);
                if self.fail_batch {
                    return Err(Error::Embedding("batch rejected".into()));
                }
            }
            self.seen.lock().unwrap().extend(texts.iter().cloned());
            Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
        }
    }

    fn draft(i: i64, text: &str) -> ChunkDraft {
        ChunkDraft {
            chunk_index: i,
            content: text.to_string(),
            page_number: None,
        }
    }

    #[test]
    fn test_codec_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        assert_eq!(decode_embedding(&encode_embedding(&vec)), Some(vec));
    }

    #[test]
    fn test_decode_tolerates_brackets() {
        assert_eq!(decode_embedding("[0.5, 0.25]"), Some(vec![0.5, 0.25]));
    }

    #[test]
    fn test_decode_empty_and_malformed() {
        assert_eq!(decode_embedding(""), None);
        assert_eq!(decode_embedding("  "), None);
        assert_eq!(decode_embedding("[]"), None);
        assert_eq!(decode_embedding("0.1,abc,0.3"), None);
        assert_eq!(decode_embedding("0.1,,0.3"), None);
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_bounds() {
        let pairs = [
            (vec![0.3f32, -7.0, 2.5], vec![100.0f32, 0.01, -3.0]),
            (vec![1e-3, 1e-3, 1e-3], vec![1e3, 1e3, 1e3]),
            (vec![-1.0, -1.0, 5.0], vec![-1.0, -1.0, 5.0]),
        ];
        for (a, b) in &pairs {
            let sim = cosine_similarity(a, b);
            assert!((-1.0..=1.0).contains(&sim), "out of range: {}", sim);
        }
    }

    #[tokio::test]
    async fn test_embed_drafts_single_batch_call() {
        let provider = FakeProvider::new();
        let drafts = vec![draft(0, "vacation policy"), draft(1, "expense policy")];
        let vectors = embed_drafts(&provider, &drafts).await;
        assert_eq!(vectors.len(), 2);
        assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.single_calls.load(Ordering::SeqCst), 0);
        assert_eq!(vectors[0], FakeProvider::vectorize("vacation policy"));
    }

    #[tokio::test]
    async fn test_embed_drafts_falls_back_to_single_calls() {
        let mut provider = FakeProvider::new();
        provider.fail_batch = true;
        provider.fail_texts.insert("broken chunk".to_string());
        let drafts = vec![draft(0, "good chunk"), draft(1, "broken chunk"), draft(2, "fine chunk")];

        let vectors = embed_drafts(&provider, &drafts).await;
        assert_eq!(vectors.len(), 3);
        assert_eq!(provider.single_calls.load(Ordering::SeqCst), 3);
        assert!(!vectors[0].is_empty());
        assert!(vectors[1].is_empty());
        assert!(!vectors[2].is_empty());
    }

    #[tokio::test]
    async fn test_embed_query_degrades_to_none() {
        let mut provider = FakeProvider::new();
        assert!(embed_query(&provider, "leave policy").await.is_some());
        assert!(embed_query(&provider, "   ").await.is_none());
        provider.fail_all = true;
        assert!(embed_query(&provider, "leave policy").await.is_none());
    }
}
