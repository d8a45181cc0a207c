//! # Policy Harness CLI (`policyctl`)
//!
//! Ingest versioned policy documents and ask questions against them.
//!
//! ## Usage
//!
//! ```bash
//! policyctl --config ./config/policy.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `policyctl init` | Create the SQLite database and run schema migrations |
//! | `policyctl ingest <file>` | Upload and index a policy file |
//! | `policyctl search "<question>"` | Retrieve the most relevant policy chunks |
//! | `policyctl documents list` | List active documents |
//! | `policyctl documents get <id>` | Show a document and its chunks |
//! | `policyctl documents deactivate <id>` | Archive a document, keeping its chunks |
//! | `policyctl documents delete <id>` | Deactivate a document and drop its chunks |
//! | `policyctl cleanup chunks <id>` | Remove duplicate/invalid chunks and re-index |
//! | `policyctl cleanup documents` | Keep the newest of each duplicated upload |
//! | `policyctl duplicates` | List duplicated uploads |
//! | `policyctl stats` | Index overview |
//!
//! ## Examples
//!
//! ```bash
//! # Upload two versions of the same policy
//! policyctl ingest ./leave.pdf --doc-version 2023
//! policyctl ingest ./leave.pdf --doc-version 2024 --description "Carry-over raised"
//!
//! # The year in the question picks the version
//! policyctl search "What was the leave carry-over rule in 2023?"
//!
//! # Force the latest versions, JSON output
//! policyctl search "carry-over rule" --latest --json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use policy_harness::config;
use policy_harness::harness::Harness;
use policy_harness::logging::init_logging;
use policy_harness::search::YearSelection;
use policy_harness::{documents, ingest, maintenance, search, stats};

/// Policy Harness CLI: versioned policy-document retrieval.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "policyctl",
    about = "Policy Harness: versioned policy-document retrieval for question answering",
    version,
    long_about = "Policy Harness ingests versioned policy documents (PDF, DOCX, Markdown, text), \
    chunks and embeds them, and answers questions with hybrid (vector + keyword) search over \
    the document versions the question refers to."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/policy.toml`. Database, storage, chunking,
    /// retrieval, embedding and logging settings are read from this file.
    #[arg(long, global = true, default_value = "./config/policy.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the documents and chunks
    /// tables. Safe to run repeatedly.
    Init,

    /// Upload and index a policy file.
    ///
    /// Extracts text, chunks it, embeds the chunks when a provider is
    /// configured, and records the document as a new version.
    Ingest {
        /// Path to a `.pdf`, `.docx`, `.md` or `.txt` file.
        file: PathBuf,

        /// Version label. Defaults to `1.0`.
        #[arg(long = "doc-version")]
        version: Option<String>,

        /// Free-text description stored with the document.
        #[arg(long)]
        description: Option<String>,
    },

    /// Retrieve the policy chunks most relevant to a question.
    ///
    /// Without `--year` or `--latest` the year is inferred from the
    /// question; a historical question without a year prints a
    /// clarification prompt instead of results.
    Search {
        /// The question or search query.
        query: String,

        /// Maximum number of results. Defaults to `[retrieval] top_k`.
        #[arg(long)]
        top_k: Option<usize>,

        /// Search the versions current as of this year.
        #[arg(long, conflicts_with = "latest")]
        year: Option<i32>,

        /// Search the latest version of every file.
        #[arg(long)]
        latest: bool,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Inspect, archive and delete documents.
    Documents {
        #[command(subcommand)]
        action: DocumentsAction,
    },

    /// Repair chunk or document integrity.
    Cleanup {
        #[command(subcommand)]
        target: CleanupTarget,
    },

    /// List uploads that share a file name and version.
    Duplicates,

    /// Show document, chunk and embedding counts.
    Stats,
}

/// Document subcommands.
#[derive(Subcommand)]
enum DocumentsAction {
    /// List active documents.
    List {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show a document's metadata and chunks.
    Get {
        /// Document id.
        id: String,
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Archive a document. Its chunks stay but it is no longer searched.
    Deactivate {
        /// Document id.
        id: String,
    },
    /// Deactivate a document and delete its chunks.
    Delete {
        /// Document id.
        id: String,
    },
}

/// Cleanup subcommands.
#[derive(Subcommand)]
enum CleanupTarget {
    /// Remove duplicate and blank chunks of a document, then re-index it.
    Chunks {
        /// Document id.
        id: String,
    },
    /// Deactivate all but the newest upload of each duplicated file version.
    Documents,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;
    init_logging(&cfg.logging.level);

    let harness = Harness::open(cfg).await?;

    match cli.command {
        Commands::Init => {
            println!(
                "Database initialized at {}.",
                harness.config.db.path.display()
            );
        }
        Commands::Ingest {
            file,
            version,
            description,
        } => {
            ingest::run_ingest(&harness, &file, version.as_deref(), description.as_deref())
                .await?;
        }
        Commands::Search {
            query,
            top_k,
            year,
            latest,
            json,
        } => {
            let selection = match (year, latest) {
                (Some(y), _) => YearSelection::Year(y),
                (None, true) => YearSelection::Latest,
                (None, false) => YearSelection::Auto,
            };
            search::run_search(&harness, &query, top_k, selection, json).await?;
        }
        Commands::Documents { action } => match action {
            DocumentsAction::List { json } => documents::run_list(&harness, json).await?,
            DocumentsAction::Get { id, json } => documents::run_get(&harness, &id, json).await?,
            DocumentsAction::Deactivate { id } => {
                documents::run_deactivate(&harness, &id).await?
            }
            DocumentsAction::Delete { id } => documents::run_delete(&harness, &id).await?,
        },
        Commands::Cleanup { target } => match target {
            CleanupTarget::Chunks { id } => maintenance::run_cleanup_chunks(&harness, &id).await?,
            CleanupTarget::Documents => maintenance::run_cleanup_documents(&harness).await?,
        },
        Commands::Duplicates => maintenance::run_duplicates(&harness).await?,
        Commands::Stats => stats::run_stats(&harness).await?,
    }

    harness.close().await;
    Ok(())
}
