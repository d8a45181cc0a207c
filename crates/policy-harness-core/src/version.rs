//! Version-aware document selection.
//!
//! Retrieval only ever looks at one version of each file: the newest
//! active upload, or the newest upload no later than a target year.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::error::Result;
use crate::store::DocumentStore;

/// Resolve the ids of the documents eligible for retrieval.
///
/// - `None`: per file name, the active document with the latest upload.
/// - `Some(year)`: per file name, the latest active upload whose year is
///   `<= year`; file names with no such upload contribute nothing.
///
/// An empty set means "nothing retrievable", not a fault.
pub async fn resolve_document_ids<D>(store: &D, temporal_year: Option<i32>) -> Result<BTreeSet<String>>
where
    D: DocumentStore + ?Sized,
{
    let documents = match temporal_year {
        None => store.find_latest_per_file_name().await?,
        Some(year) => store.find_latest_per_file_name_before_year(year).await?,
    };

    for d in &documents {
        debug!(
            document_id = %d.document_id,
            file_name = %d.file_name,
            version = %d.version,
            "eligible document"
        );
    }

    let ids: BTreeSet<String> = documents.into_iter().map(|d| d.document_id).collect();
    info!(
        count = ids.len(),
        year = ?temporal_year,
        "resolved document versions"
    );
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use crate::test_fixtures::{doc, ts};

    async fn scenario() -> InMemoryStore {
        let store = InMemoryStore::new();
        for d in [
            doc("A-v1", "A", "v1", ts("2022-01-01")),
            doc("A-v2", "A", "v2", ts("2023-06-01")),
            doc("B-v1", "B", "v1", ts("2023-01-01")),
        ] {
            store.insert_document(&d).await.unwrap();
        }
        store
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_latest_versions() {
        let store = scenario().await;
        let ids = resolve_document_ids(&store, None).await.unwrap();
        assert_eq!(ids, set(&["A-v2", "B-v1"]));
    }

    #[tokio::test]
    async fn test_year_bound_excludes_later_files() {
        let store = scenario().await;
        let ids = resolve_document_ids(&store, Some(2022)).await.unwrap();
        assert_eq!(ids, set(&["A-v1"]));
    }

    #[tokio::test]
    async fn test_year_bound_includes_same_year() {
        let store = scenario().await;
        let ids = resolve_document_ids(&store, Some(2023)).await.unwrap();
        assert_eq!(ids, set(&["A-v2", "B-v1"]));
    }

    #[tokio::test]
    async fn test_year_before_everything_is_empty() {
        let store = scenario().await;
        let ids = resolve_document_ids(&store, Some(2019)).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_inactive_documents_ignored() {
        let store = scenario().await;
        store.deactivate("A-v2").await.unwrap();
        let ids = resolve_document_ids(&store, None).await.unwrap();
        assert_eq!(ids, set(&["A-v1", "B-v1"]));
    }

    #[tokio::test]
    async fn test_same_timestamp_keeps_one_per_file() {
        let store = InMemoryStore::new();
        let at = ts("2024-03-01");
        for d in [doc("L-v1", "L", "1.0", at), doc("L-v2", "L", "2.0", at)] {
            store.insert_document(&d).await.unwrap();
        }
        assert_eq!(resolve_document_ids(&store, None).await.unwrap(), set(&["L-v2"]));
        assert_eq!(
            resolve_document_ids(&store, Some(2024)).await.unwrap(),
            set(&["L-v2"])
        );
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = InMemoryStore::new();
        assert!(resolve_document_ids(&store, None).await.unwrap().is_empty());
    }
}
