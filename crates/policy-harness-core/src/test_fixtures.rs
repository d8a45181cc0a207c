//! Shared builders for unit tests.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::embedding::encode_embedding;
use crate::models::{Chunk, Document};

/// Unix timestamp (microseconds) of a `YYYY-MM-DD` date at midnight UTC.
pub fn ts(date: &str) -> i64 {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_micros()
}

pub fn doc(id: &str, file_name: &str, version: &str, uploaded_at: i64) -> Document {
    Document {
        document_id: id.to_string(),
        file_name: file_name.to_string(),
        version: version.to_string(),
        file_type: "txt".to_string(),
        file_path: format!("/tmp/{}_{}", id, file_name),
        description: None,
        uploaded_at,
        active: true,
        indexed: true,
        page_count: None,
        chunk_count: 0,
    }
}

pub fn chunk(document_id: &str, index: i64, content: &str, embedding: &[f32]) -> Chunk {
    Chunk {
        id: Uuid::new_v4().to_string(),
        document_id: document_id.to_string(),
        chunk_index: index,
        content: content.to_string(),
        page_number: None,
        section: None,
        start_line: None,
        end_line: None,
        embedding: encode_embedding(embedding),
    }
}

pub fn chunk_with_id(id: &str, document_id: &str, index: i64, content: &str, embedding: &[f32]) -> Chunk {
    Chunk {
        id: id.to_string(),
        ..chunk(document_id, index, content, embedding)
    }
}
