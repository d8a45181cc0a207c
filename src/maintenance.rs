//! `policyctl cleanup` and `policyctl duplicates`.

use anyhow::Result;

use policy_harness_core::cache::SearchCache;
use policy_harness_core::cleanup::{
    cleanup_and_reindex, cleanup_duplicate_documents, find_duplicate_documents,
};

use crate::documents::format_date;
use crate::harness::Harness;

/// Remove duplicate and invalid chunks of one document and re-index it.
pub async fn run_cleanup_chunks(harness: &Harness, document_id: &str) -> Result<()> {
    let report = cleanup_and_reindex(&harness.store, document_id).await?;
    if report.duplicates_removed + report.invalid_removed > 0 {
        harness.cache.invalidate_all();
    }

    println!("cleanup {}", report.document_id);
    println!("  duplicate chunks removed: {}", report.duplicates_removed);
    println!("  invalid chunks removed: {}", report.invalid_removed);
    println!("  chunks: {}", report.chunk_count);
    println!("ok");
    Ok(())
}

/// Keep the newest upload of every duplicated file version.
pub async fn run_cleanup_documents(harness: &Harness) -> Result<()> {
    let report = cleanup_duplicate_documents(&harness.store).await?;
    if !report.deactivated.is_empty() {
        harness.cache.invalidate_all();
    }

    println!("cleanup documents");
    println!("  duplicate groups: {}", report.groups);
    println!("  deactivated: {}", report.deactivated.len());
    for id in &report.deactivated {
        println!("    {}", id);
    }
    println!("  chunks removed: {}", report.chunks_removed);
    println!("ok");
    Ok(())
}

/// List duplicate document groups without changing anything.
pub async fn run_duplicates(harness: &Harness) -> Result<()> {
    let groups = find_duplicate_documents(&harness.store).await?;
    if groups.is_empty() {
        println!("No duplicate documents.");
        return Ok(());
    }

    for (key, docs) in &groups {
        println!("{} ({} copies)", key, docs.len());
        for (i, d) in docs.iter().enumerate() {
            println!(
                "  {} {} uploaded {}",
                if i == 0 { "keep" } else { "drop" },
                d.document_id,
                format_date(d.uploaded_at)
            );
        }
    }
    Ok(())
}
