//! In-memory store implementation for tests and embedded use.
//!
//! Uses `Vec`s behind `std::sync::RwLock` for thread safety.
//! Chunks and documents keep insertion order, which is what breaks ties
//! between chunks sharing a `chunk_index` and between uploads sharing a
//! timestamp.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{Chunk, Document};

use super::{select_latest_versions, ChunkStore, DocumentStore};

/// In-memory implementation of both [`ChunkStore`] and [`DocumentStore`].
pub struct InMemoryStore {
    docs: RwLock<Vec<Document>>,
    chunks: RwLock<Vec<Chunk>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
            chunks: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored chunks across all documents.
    pub fn chunk_count(&self) -> usize {
        self.chunks.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Store("in-memory store lock poisoned".into())
}

#[async_trait]
impl ChunkStore for InMemoryStore {
    async fn fetch_by_document_ids(&self, document_ids: &[String]) -> Result<Vec<Chunk>> {
        let wanted: HashSet<&str> = document_ids.iter().map(String::as_str).collect();
        let chunks = self.chunks.read().map_err(poisoned)?;
        Ok(chunks
            .iter()
            .filter(|c| wanted.contains(c.document_id.as_str()))
            .cloned()
            .collect())
    }

    async fn fetch_by_document_ordered(&self, document_id: &str) -> Result<Vec<Chunk>> {
        let chunks = self.chunks.read().map_err(poisoned)?;
        let mut out: Vec<Chunk> = chunks
            .iter()
            .filter(|c| c.document_id == document_id)
            .cloned()
            .collect();
        // Stable sort: equal indices keep insertion order.
        out.sort_by_key(|c| c.chunk_index);
        Ok(out)
    }

    async fn save(&self, new_chunks: &[Chunk]) -> Result<()> {
        let mut chunks = self.chunks.write().map_err(poisoned)?;
        chunks.extend(new_chunks.iter().cloned());
        Ok(())
    }

    async fn update_chunk_index(&self, chunk_id: &str, chunk_index: i64) -> Result<()> {
        let mut chunks = self.chunks.write().map_err(poisoned)?;
        if let Some(c) = chunks.iter_mut().find(|c| c.id == chunk_id) {
            c.chunk_index = chunk_index;
        }
        Ok(())
    }

    async fn delete_by_document_id(&self, document_id: &str) -> Result<u64> {
        let mut chunks = self.chunks.write().map_err(poisoned)?;
        let before = chunks.len();
        chunks.retain(|c| c.document_id != document_id);
        Ok((before - chunks.len()) as u64)
    }

    async fn delete_many(&self, chunk_ids: &[String]) -> Result<u64> {
        let doomed: HashSet<&str> = chunk_ids.iter().map(String::as_str).collect();
        let mut chunks = self.chunks.write().map_err(poisoned)?;
        let before = chunks.len();
        chunks.retain(|c| !doomed.contains(c.id.as_str()));
        Ok((before - chunks.len()) as u64)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_document(&self, doc: &Document) -> Result<()> {
        let mut docs = self.docs.write().map_err(poisoned)?;
        match docs.iter_mut().find(|d| d.document_id == doc.document_id) {
            Some(existing) => *existing = doc.clone(),
            None => docs.push(doc.clone()),
        }
        Ok(())
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>> {
        let docs = self.docs.read().map_err(poisoned)?;
        Ok(docs.iter().find(|d| d.document_id == document_id).cloned())
    }

    async fn find_active(&self) -> Result<Vec<Document>> {
        let docs = self.docs.read().map_err(poisoned)?;
        let mut out: Vec<Document> = docs.iter().filter(|d| d.active).cloned().collect();
        out.sort_by(|a, b| a.document_id.cmp(&b.document_id));
        Ok(out)
    }

    async fn find_active_by_file_name(&self, file_name: &str) -> Result<Vec<Document>> {
        let docs = self.docs.read().map_err(poisoned)?;
        // Newest first; among equal timestamps the later insert wins.
        let mut out: Vec<Document> = docs
            .iter()
            .rev()
            .filter(|d| d.active && d.file_name == file_name)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(out)
    }

    async fn find_active_by_file_name_and_version(
        &self,
        file_name: &str,
        version: &str,
    ) -> Result<Option<Document>> {
        let docs = self.docs.read().map_err(poisoned)?;
        // max_by_key returns the last maximum, i.e. the later insert.
        Ok(docs
            .iter()
            .filter(|d| d.active && d.file_name == file_name && d.version == version)
            .max_by_key(|d| d.uploaded_at)
            .cloned())
    }

    async fn find_latest_per_file_name(&self) -> Result<Vec<Document>> {
        let docs = self.docs.read().map_err(poisoned)?;
        Ok(select_latest_versions(&docs, None))
    }

    async fn find_latest_per_file_name_before_year(&self, year: i32) -> Result<Vec<Document>> {
        let docs = self.docs.read().map_err(poisoned)?;
        Ok(select_latest_versions(&docs, Some(year)))
    }

    async fn deactivate(&self, document_id: &str) -> Result<()> {
        let mut docs = self.docs.write().map_err(poisoned)?;
        match docs.iter_mut().find(|d| d.document_id == document_id) {
            Some(d) => {
                d.active = false;
                Ok(())
            }
            None => Err(Error::DocumentNotFound(document_id.to_string())),
        }
    }

    async fn mark_indexed(
        &self,
        document_id: &str,
        indexed: bool,
        page_count: Option<i64>,
        chunk_count: i64,
    ) -> Result<()> {
        let mut docs = self.docs.write().map_err(poisoned)?;
        let d = docs
            .iter_mut()
            .find(|d| d.document_id == document_id)
            .ok_or_else(|| Error::DocumentNotFound(document_id.to_string()))?;
        d.indexed = indexed;
        d.page_count = page_count;
        d.chunk_count = chunk_count;
        Ok(())
    }

    async fn set_chunk_count(&self, document_id: &str, chunk_count: i64) -> Result<()> {
        let mut docs = self.docs.write().map_err(poisoned)?;
        let d = docs
            .iter_mut()
            .find(|d| d.document_id == document_id)
            .ok_or_else(|| Error::DocumentNotFound(document_id.to_string()))?;
        d.chunk_count = chunk_count;
        Ok(())
    }
}
