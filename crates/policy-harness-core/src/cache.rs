//! Explicit key-value cache for search results.
//!
//! The orchestrator calls the cache directly: look up before searching,
//! store after. Anything that changes the corpus (ingestion, deletion,
//! cleanup) must call [`SearchCache::invalidate_all`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::models::RankedChunk;

/// Identity of a cached search: normalized query, result limit and year.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub query: String,
    pub top_k: usize,
    pub year: Option<i32>,
}

impl CacheKey {
    /// Build a key, trimming and lower-casing the query so trivially
    /// different spellings share an entry.
    pub fn new(query: &str, top_k: usize, year: Option<i32>) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            top_k,
            year,
        }
    }
}

/// Search-result cache. Implementations must be safe to share across tasks.
pub trait SearchCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Vec<RankedChunk>>;
    fn set(&self, key: CacheKey, results: Vec<RankedChunk>);
    fn invalidate_all(&self);
}

/// Unbounded in-process cache. No TTL, no eviction.
#[derive(Default)]
pub struct InMemorySearchCache {
    entries: RwLock<HashMap<CacheKey, Vec<RankedChunk>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemorySearchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SearchCache for InMemorySearchCache {
    fn get(&self, key: &CacheKey) -> Option<Vec<RankedChunk>> {
        let found = self.entries.read().ok().and_then(|e| e.get(key).cloned());
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    fn set(&self, key: CacheKey, results: Vec<RankedChunk>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, results);
        }
    }

    fn invalidate_all(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}
