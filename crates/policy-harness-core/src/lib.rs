//! # Policy Harness Core
//!
//! Storage-agnostic logic for Policy Harness: data models, chunking,
//! embedding trait and vector utilities, keyword scoring, score fusion,
//! version resolution, the hybrid retrieval orchestrator, the search
//! cache interface, page-wise ingestion and cleanup operations.
//!
//! This crate contains no tokio runtime, sqlx, HTTP, or filesystem I/O.
//! Backends plug in through the [`store::ChunkStore`] /
//! [`store::DocumentStore`] and [`embedding::EmbeddingProvider`] traits.

pub mod cache;
pub mod chunk;
pub mod cleanup;
pub mod embedding;
pub mod error;
pub mod fusion;
pub mod ingest;
pub mod keyword;
pub mod models;
pub mod search;
pub mod store;
pub mod version;

#[cfg(test)]
mod test_fixtures;

pub use error::{Error, Result};
