//! Document listing, retrieval, archiving and deletion.
//!
//! Core functions return serializable structs; the `run_*` functions
//! print them for `policyctl documents`.

use anyhow::Result;
use serde::Serialize;

use policy_harness_core::cache::SearchCache;
use policy_harness_core::cleanup;
use policy_harness_core::models::Document;
use policy_harness_core::store::{ChunkStore, DocumentStore};
use policy_harness_core::Error;

use crate::harness::Harness;

/// A document with its chunks, as shown by `documents get`.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub document: Document,
    pub chunks: Vec<ChunkSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkSummary {
    pub index: i64,
    pub page_number: Option<i64>,
    pub has_embedding: bool,
    pub content: String,
}

/// Active documents, by file name then newest upload first.
pub async fn list_documents(harness: &Harness) -> Result<Vec<Document>> {
    let mut docs = harness.store.find_active().await?;
    docs.sort_by(|a, b| {
        a.file_name
            .cmp(&b.file_name)
            .then(b.uploaded_at.cmp(&a.uploaded_at))
    });
    Ok(docs)
}

/// A document and its chunks in index order.
pub async fn get_document(harness: &Harness, document_id: &str) -> Result<DocumentDetail> {
    let document = harness
        .store
        .get_document(document_id)
        .await?
        .ok_or_else(|| Error::DocumentNotFound(document_id.to_string()))?;

    let chunks = harness
        .store
        .fetch_by_document_ordered(document_id)
        .await?
        .into_iter()
        .map(|c| ChunkSummary {
            index: c.chunk_index,
            page_number: c.page_number,
            has_embedding: c.has_embedding(),
            content: c.content,
        })
        .collect();

    Ok(DocumentDetail { document, chunks })
}

/// Deactivate a document, delete its chunks and drop cached searches.
pub async fn delete_document(harness: &Harness, document_id: &str) -> Result<u64> {
    let removed = cleanup::delete_document(&harness.store, document_id).await?;
    harness.cache.invalidate_all();
    Ok(removed)
}

/// Archive a document: it leaves every version set but keeps its chunks.
pub async fn deactivate_document(harness: &Harness, document_id: &str) -> Result<()> {
    harness.store.deactivate(document_id).await?;
    harness.cache.invalidate_all();
    Ok(())
}

/// CLI entry point for `policyctl documents list`.
pub async fn run_list(harness: &Harness, json: bool) -> Result<()> {
    let docs = list_documents(harness).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&docs)?);
        return Ok(());
    }
    if docs.is_empty() {
        println!("No documents.");
        return Ok(());
    }

    println!(
        "{:<10} {:<32} {:<8} {:<10} {:>6}  {}",
        "ID", "FILE", "VERSION", "UPLOADED", "CHUNKS", "STATUS"
    );
    for d in &docs {
        println!(
            "{:<10} {:<32} {:<8} {:<10} {:>6}  {}",
            d.document_id,
            d.file_name,
            d.version,
            format_date(d.uploaded_at),
            d.chunk_count,
            if d.indexed { "indexed" } else { "pending" }
        );
    }
    Ok(())
}

/// CLI entry point for `policyctl documents get`.
pub async fn run_get(harness: &Harness, document_id: &str, json: bool) -> Result<()> {
    let detail = match get_document(harness, document_id).await {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let doc = &detail.document;
    println!("--- Document ---");
    println!("id:          {}", doc.document_id);
    println!("file:        {}", doc.file_name);
    println!("version:     {}", doc.version);
    println!("type:        {}", doc.file_type);
    println!("stored at:   {}", doc.file_path);
    if let Some(ref desc) = doc.description {
        println!("description: {}", desc);
    }
    println!("uploaded:    {}", format_date(doc.uploaded_at));
    println!("indexed:     {}", doc.indexed);
    if let Some(pages) = doc.page_count {
        println!("pages:       {}", pages);
    }
    println!();

    println!("--- Chunks ({}) ---", detail.chunks.len());
    for chunk in &detail.chunks {
        match chunk.page_number {
            Some(page) => println!("[chunk {} | page {}]", chunk.index, page),
            None => println!("[chunk {}]", chunk.index),
        }
        println!("{}", chunk.content);
        println!();
    }
    Ok(())
}

/// CLI entry point for `policyctl documents delete`.
pub async fn run_delete(harness: &Harness, document_id: &str) -> Result<()> {
    let removed = delete_document(harness, document_id).await?;
    println!("deleted {} ({} chunks removed)", document_id, removed);
    Ok(())
}

/// CLI entry point for `policyctl documents deactivate`.
pub async fn run_deactivate(harness: &Harness, document_id: &str) -> Result<()> {
    deactivate_document(harness, document_id).await?;
    println!("deactivated {}", document_id);
    Ok(())
}

/// `YYYY-MM-DD` of an upload timestamp in microseconds.
pub(crate) fn format_date(ts: i64) -> String {
    chrono::DateTime::from_timestamp_micros(ts)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date_reads_microseconds() {
        assert_eq!(format_date(1_685_577_600_000_000), "2023-06-01");
        assert_eq!(format_date(1_685_577_600_123_456), "2023-06-01");
    }
}
