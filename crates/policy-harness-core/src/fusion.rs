//! Vector/keyword candidate scoring and weighted score fusion.
//!
//! # Hybrid Scoring Algorithm
//!
//! 1. Vector candidates: cosine similarity for every chunk with a decodable
//!    embedding, best-first, truncated to the candidate limit.
//! 2. Keyword candidates: token-overlap score for every chunk, keeping
//!    scores `> 0`, best-first, truncated to the candidate limit.
//! 3. Union both sets by chunk id. A chunk in both keeps its vector score
//!    and the larger keyword score; a chunk in one set scores 0 in the other.
//! 4. `hybrid = vector × w_v + keyword × w_k`.
//! 5. Sort by hybrid (desc), vector (desc), chunk id (asc); take `top_k`.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{trace, warn};

use crate::embedding::{cosine_similarity, decode_embedding};
use crate::error::{Error, Result};
use crate::keyword::keyword_score;
use crate::models::{Chunk, RankedChunk};

/// Fusion weights: `hybrid = vector × vector_weight + keyword × keyword_weight`.
#[derive(Debug, Clone, Copy)]
pub struct FusionWeights {
    pub vector: f64,
    pub keyword: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            vector: 0.7,
            keyword: 0.3,
        }
    }
}

impl FusionWeights {
    pub fn hybrid(&self, vector_score: f64, keyword_score: f64) -> f64 {
        vector_score * self.vector + keyword_score * self.keyword
    }

    /// Both weights must lie in `[0, 1]`; non-negative weights keep the
    /// hybrid score monotone in each input.
    pub fn validate(&self) -> Result<()> {
        for (name, w) in [("vector_weight", self.vector), ("keyword_weight", self.keyword)] {
            if !(0.0..=1.0).contains(&w) {
                return Err(Error::Config(format!("{} must be in [0.0, 1.0], got {}", name, w)));
            }
        }
        Ok(())
    }
}

/// A chunk with its per-signal scores, borrowed from the fetched set.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub chunk: &'a Chunk,
    pub vector_score: f64,
    pub keyword_score: f64,
}

/// Score chunks by cosine similarity to `query_vec`.
///
/// Chunks without an embedding, or whose stored embedding does not decode,
/// are skipped without aborting the scan.
pub fn vector_candidates<'a>(chunks: &'a [Chunk], query_vec: &[f32], limit: usize) -> Vec<ScoredCandidate<'a>> {
    if query_vec.is_empty() {
        return Vec::new();
    }

    let mut out: Vec<ScoredCandidate<'a>> = chunks
        .iter()
        .filter(|c| c.has_embedding())
        .filter_map(|c| match decode_embedding(&c.embedding) {
            Some(v) => Some(ScoredCandidate {
                chunk: c,
                vector_score: cosine_similarity(query_vec, &v),
                keyword_score: 0.0,
            }),
            None => {
                warn!(chunk_id = %c.id, "malformed stored embedding, skipping for vector scoring");
                None
            }
        })
        .collect();

    out.sort_by(|a, b| desc(a.vector_score, b.vector_score).then_with(|| a.chunk.id.cmp(&b.chunk.id)));
    out.truncate(limit);
    out
}

/// Score chunks by keyword overlap, keeping only positive scores.
pub fn keyword_candidates<'a>(
    chunks: &'a [Chunk],
    tokens: &[String],
    min_token_len: usize,
    limit: usize,
) -> Vec<ScoredCandidate<'a>> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut out: Vec<ScoredCandidate<'a>> = chunks
        .iter()
        .map(|c| ScoredCandidate {
            chunk: c,
            vector_score: 0.0,
            keyword_score: keyword_score(&c.content, tokens, min_token_len),
        })
        .filter(|sc| sc.keyword_score > 0.0)
        .collect();

    out.sort_by(|a, b| desc(a.keyword_score, b.keyword_score).then_with(|| a.chunk.id.cmp(&b.chunk.id)));
    out.truncate(limit);
    out
}

/// Merge vector and keyword candidates into one ranked list.
pub fn fuse(
    vector: &[ScoredCandidate<'_>],
    keyword: &[ScoredCandidate<'_>],
    weights: FusionWeights,
    top_k: usize,
) -> Vec<RankedChunk> {
    let mut merged: HashMap<&str, ScoredCandidate<'_>> = HashMap::new();

    for sc in vector {
        merged.insert(sc.chunk.id.as_str(), *sc);
    }
    for sc in keyword {
        merged
            .entry(sc.chunk.id.as_str())
            .and_modify(|existing| existing.keyword_score = existing.keyword_score.max(sc.keyword_score))
            .or_insert(ScoredCandidate {
                chunk: sc.chunk,
                vector_score: 0.0,
                keyword_score: sc.keyword_score,
            });
    }

    let mut ranked: Vec<RankedChunk> = merged
        .into_values()
        .map(|sc| {
            let hybrid = weights.hybrid(sc.vector_score, sc.keyword_score);
            trace!(
                chunk_id = %sc.chunk.id,
                vector = sc.vector_score,
                keyword = sc.keyword_score,
                hybrid,
                "fused candidate"
            );
            RankedChunk {
                chunk: sc.chunk.clone(),
                vector_score: sc.vector_score,
                keyword_score: sc.keyword_score,
                hybrid_score: hybrid,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        desc(a.hybrid_score, b.hybrid_score)
            .then_with(|| desc(a.vector_score, b.vector_score))
            .then_with(|| a.chunk.id.cmp(&b.chunk.id))
    });
    ranked.truncate(top_k);
    ranked
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
