//! Question answering retrieval: temporal intent, then cached hybrid search.
//!
//! The year filter comes from the caller when given (`--year`, `--latest`)
//! and from [`TemporalAnalyzer`] otherwise. A historical question without
//! a year is answered with a clarification prompt instead of results.
//! Results are cached on the [`Harness`], so repeats only hit when the
//! same harness answers them.

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;

use policy_harness_core::models::{RankedChunk, TemporalIntent};
use policy_harness_core::search::{search_cached, SearchRequest};
use policy_harness_core::store::DocumentStore;

use crate::harness::Harness;
use crate::temporal::TemporalAnalyzer;

/// How the version set for a search is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearSelection {
    /// Derive it from the question text.
    Auto,
    /// Latest version of every file.
    Latest,
    /// Versions current as of the end of this year.
    Year(i32),
}

/// One ranked chunk with its document's name and version.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub document_id: String,
    pub file_name: String,
    pub version: String,
    pub page_number: Option<i64>,
    pub chunk_index: i64,
    pub hybrid_score: f64,
    pub vector_score: f64,
    pub keyword_score: f64,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    /// Year bound applied, `None` for latest versions.
    pub year: Option<i32>,
    /// Set instead of results when the question needs a year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarification: Option<String>,
    pub results: Vec<SearchHit>,
}

/// Resolve the temporal intent and run a cached hybrid search.
pub async fn search_policies(
    harness: &Harness,
    query: &str,
    top_k: Option<usize>,
    selection: YearSelection,
) -> Result<SearchResponse> {
    let intent = match selection {
        YearSelection::Latest => TemporalIntent::Latest,
        YearSelection::Year(year) => TemporalIntent::SpecificYear(year),
        YearSelection::Auto => TemporalAnalyzer::new()?.analyze_question_now(query),
    };

    if let TemporalIntent::NeedsClarification { reason } = &intent {
        return Ok(SearchResponse {
            query: query.to_string(),
            year: None,
            clarification: Some(reason.clone()),
            results: Vec::new(),
        });
    }

    let req = SearchRequest {
        query,
        top_k: top_k.unwrap_or(harness.config.retrieval.top_k),
        temporal_year: intent.year_filter(),
        params: harness.config.retrieval.params(),
    };
    let ranked = search_cached(
        &harness.store,
        harness.provider.as_ref(),
        &harness.cache,
        &req,
    )
    .await?;

    Ok(SearchResponse {
        query: query.to_string(),
        year: req.temporal_year,
        clarification: None,
        results: attach_documents(harness, ranked).await?,
    })
}

async fn attach_documents(harness: &Harness, ranked: Vec<RankedChunk>) -> Result<Vec<SearchHit>> {
    let mut names: HashMap<String, (String, String)> = HashMap::new();
    let mut hits = Vec::with_capacity(ranked.len());

    for r in ranked {
        let doc_id = r.chunk.document_id.clone();
        if !names.contains_key(&doc_id) {
            let entry = match harness.store.get_document(&doc_id).await? {
                Some(doc) => (doc.file_name, doc.version),
                None => (String::from("(unknown)"), String::new()),
            };
            names.insert(doc_id.clone(), entry);
        }
        let (file_name, version) = names.get(&doc_id).cloned().unwrap_or_default();

        hits.push(SearchHit {
            chunk_id: r.chunk.id,
            document_id: doc_id,
            file_name,
            version,
            page_number: r.chunk.page_number,
            chunk_index: r.chunk.chunk_index,
            hybrid_score: r.hybrid_score,
            vector_score: r.vector_score,
            keyword_score: r.keyword_score,
            content: r.chunk.content,
        });
    }
    Ok(hits)
}

/// CLI entry point for `policyctl search`.
pub async fn run_search(
    harness: &Harness,
    query: &str,
    top_k: Option<usize>,
    selection: YearSelection,
    json: bool,
) -> Result<()> {
    let response = search_policies(harness, query, top_k, selection).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if let Some(ref question) = response.clarification {
        println!("{}", question);
        return Ok(());
    }

    if response.results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    match response.year {
        Some(year) => println!("(versions as of {})", year),
        None => println!("(latest versions)"),
    }
    for (i, hit) in response.results.iter().enumerate() {
        println!(
            "{}. [{:.2}] {} v{}",
            i + 1,
            hit.hybrid_score,
            hit.file_name,
            hit.version
        );
        if let Some(page) = hit.page_number {
            println!("    page: {}", page);
        }
        println!(
            "    scores: vector {:.2}, keyword {:.2}",
            hit.vector_score, hit.keyword_score
        );
        println!("    excerpt: \"{}\"", excerpt(&hit.content, 240));
        println!("    document: {}", hit.document_id);
        println!();
    }
    Ok(())
}

/// Single-line prefix of `text`, at most `max_chars` characters.
fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat.to_string(),
    }
}
