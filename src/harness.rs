//! Shared handles for every command: configuration, the SQLite store,
//! the embedding provider and the search cache.
//!
//! The cache lives and dies with its `Harness`. Every `policyctl`
//! invocation opens a fresh one, so CLI searches always miss and the
//! invalidations after ingest, delete and cleanup only matter to a
//! long-lived process that embeds the library and reuses one `Harness`
//! across many questions.

use anyhow::Result;
use tracing::debug;

use policy_harness_core::cache::InMemorySearchCache;
use policy_harness_core::embedding::EmbeddingProvider;

use crate::config::Config;
use crate::db;
use crate::embedding::create_provider;
use crate::migrate::run_migrations;
use crate::sqlite_store::SqliteStore;

/// An opened policy database plus the services that operate on it.
pub struct Harness {
    pub config: Config,
    pub store: SqliteStore,
    pub provider: Box<dyn EmbeddingProvider>,
    /// Search results of this harness only; starts empty.
    pub cache: InMemorySearchCache,
}

impl Harness {
    /// Connect, apply migrations and build the configured provider.
    pub async fn open(config: Config) -> Result<Self> {
        let provider = create_provider(&config.embedding)?;
        Self::with_provider(config, provider).await
    }

    /// Like [`Harness::open`] with a caller-supplied provider.
    pub async fn with_provider(config: Config, provider: Box<dyn EmbeddingProvider>) -> Result<Self> {
        let pool = db::connect(&config).await?;
        run_migrations(&pool).await?;
        debug!(
            db = %config.db.path.display(),
            model = provider.model_name(),
            "harness ready"
        );
        Ok(Self {
            config,
            store: SqliteStore::new(pool),
            provider,
            cache: InMemorySearchCache::new(),
        })
    }

    /// Close the connection pool, flushing the WAL.
    pub async fn close(self) {
        self.store.pool().close().await;
    }
}
