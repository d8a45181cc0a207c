//! # Policy Harness
//!
//! Versioned policy-document retrieval for question answering.
//!
//! Uploaded policy files (PDF, DOCX, Markdown, text) are chunked, embedded
//! and stored in SQLite. Questions are answered from the chunks of the
//! document versions that were current at the time the question asks
//! about, ranked by a weighted blend of vector similarity and keyword
//! overlap.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────┐
//! │ Policy files │──▶│ Extract+Chunk │──▶│  SQLite   │
//! │ pdf/docx/md  │   │    +Embed     │   │ docs+chks │
//! └──────────────┘   └───────────────┘   └────┬─────┘
//!                                             │
//!                    ┌────────────────────────┤
//!                    ▼                        ▼
//!             ┌─────────────┐          ┌─────────────┐
//!             │  Temporal   │─────────▶│   Hybrid    │
//!             │  analyzer   │  year    │   search    │
//!             └─────────────┘          └─────────────┘
//! ```
//!
//! The algorithms live in `policy-harness-core`; this crate wires them to
//! SQLite, HTTP embedding providers, file extraction and the `policyctl` CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! policyctl init
//! policyctl ingest ./leave-policy.pdf --doc-version 2024
//! policyctl search "How many days of annual leave do I get?"
//! policyctl search "What was the travel policy in 2022?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | Tracing subscriber setup |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite chunk and document stores |
//! | [`embedding`] | HTTP embedding providers |
//! | [`extract`] | Text extraction per file type |
//! | [`harness`] | Opened database plus provider and cache |
//! | [`ingest`] | File upload and indexing |
//! | [`temporal`] | Year/version intent of a question |
//! | [`search`] | Question retrieval |
//! | [`documents`] | List, get and delete documents |
//! | [`maintenance`] | Chunk and duplicate-document cleanup |
//! | [`stats`] | Index overview |

pub mod config;
pub mod db;
pub mod documents;
pub mod embedding;
pub mod extract;
pub mod harness;
pub mod ingest;
pub mod logging;
pub mod maintenance;
pub mod migrate;
pub mod search;
pub mod sqlite_store;
pub mod stats;
pub mod temporal;
