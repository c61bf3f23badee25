use std::{path::Path, str::FromStr, time::Duration};

use anyhow::Result;
use futures::future::BoxFuture;
use sqlx::{
    query,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};
use thiserror::Error;

use crate::domain::CacheSnapshot;

pub mod article_cache;
pub mod memory;

pub use article_cache::SqliteCacheStore;
pub use memory::MemoryCacheStore;

pub const CACHE_KEY: &str = "articleCache";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(#[from] sqlx::Error),
    #[error("stored cache record {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode cache snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Durable home of the classification history.
pub trait CacheStore: Send + Sync {
    fn load(&self) -> BoxFuture<'_, Result<CacheSnapshot, StorageError>>;
    fn save(&self, snapshot: CacheSnapshot) -> BoxFuture<'_, Result<(), StorageError>>;
}

pub async fn init_pool(db_path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&pool)
    .await?;

    Ok(pool)
}
