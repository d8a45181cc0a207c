//! Core data models used throughout Policy Harness.
//!
//! These types represent the documents, chunks, and ranked results that
//! flow through the ingestion and retrieval pipeline.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

/// An ingested source document (one uploaded file at one version).
///
/// Among active documents sharing a `file_name`, the one with the greatest
/// `uploaded_at` is the latest version; on equal timestamps the later
/// insert wins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub document_id: String,
    pub file_name: String,
    pub version: String,
    pub file_type: String,
    pub file_path: String,
    pub description: Option<String>,
    /// Unix timestamp (microseconds, UTC).
    pub uploaded_at: i64,
    pub active: bool,
    pub indexed: bool,
    pub page_count: Option<i64>,
    pub chunk_count: i64,
}

impl Document {
    /// Calendar year (UTC) of the upload timestamp.
    pub fn upload_year(&self) -> i32 {
        DateTime::<Utc>::from_timestamp_micros(self.uploaded_at)
            .map(|dt| dt.year())
            .unwrap_or(1970)
    }
}

/// A persisted chunk of a document's extracted text.
///
/// `embedding` holds the stored text form of the vector (see
/// [`crate::embedding::encode_embedding`]); an empty string means the
/// chunk was persisted without an embedding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub chunk_index: i64,
    pub content: String,
    pub page_number: Option<i64>,
    pub section: Option<String>,
    pub start_line: Option<i64>,
    pub end_line: Option<i64>,
    #[serde(skip_serializing)]
    pub embedding: String,
}

impl Chunk {
    pub fn has_embedding(&self) -> bool {
        !self.embedding.trim().is_empty()
    }
}

/// Chunker output before embedding and persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDraft {
    pub chunk_index: i64,
    pub content: String,
    pub page_number: Option<i64>,
}

/// One unit of extracted text handed to the ingestion pipeline.
///
/// Paged sources (PDF) yield one segment per page; flat sources yield a
/// single segment with no page number.
#[derive(Debug, Clone)]
pub struct PageText {
    pub page_number: Option<i64>,
    pub text: String,
}

/// A chunk with its retrieval scores, best-first in search output.
#[derive(Debug, Clone, Serialize)]
pub struct RankedChunk {
    pub chunk: Chunk,
    pub vector_score: f64,
    pub keyword_score: f64,
    pub hybrid_score: f64,
}

/// Which document versions a query is about.
///
/// Produced upstream of retrieval; the resolver only consumes the
/// year filter it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemporalIntent {
    Latest,
    SpecificYear(i32),
    NeedsClarification { reason: String },
}

impl TemporalIntent {
    /// The optional year bound for version resolution.
    ///
    /// `NeedsClarification` has no filter; callers are expected to ask the
    /// user before searching.
    pub fn year_filter(&self) -> Option<i32> {
        match self {
            TemporalIntent::SpecificYear(year) => Some(*year),
            _ => None,
        }
    }

    pub fn is_historical(&self) -> bool {
        matches!(self, TemporalIntent::SpecificYear(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_year() {
        let doc = Document {
            document_id: "d1".into(),
            file_name: "leave.pdf".into(),
            version: "1.0".into(),
            file_type: "pdf".into(),
            file_path: String::new(),
            description: None,
            uploaded_at: 1_685_577_600_000_000, // 2023-06-01
            active: true,
            indexed: true,
            page_count: None,
            chunk_count: 0,
        };
        assert_eq!(doc.upload_year(), 2023);
    }

    #[test]
    fn test_year_filter() {
        assert_eq!(TemporalIntent::Latest.year_filter(), None);
        assert_eq!(TemporalIntent::SpecificYear(2022).year_filter(), Some(2022));
        let clarify = TemporalIntent::NeedsClarification {
            reason: "which year?".into(),
        };
        assert_eq!(clarify.year_filter(), None);
        assert!(!clarify.is_historical());
    }
}
