use futures::future::BoxFuture;
use sqlx::{query, query_as, sqlite::SqlitePool};

use crate::domain::CacheSnapshot;

use super::{CacheStore, StorageError, CACHE_KEY};

pub fn encode_snapshot(snapshot: &CacheSnapshot) -> Result<String, StorageError> {
    serde_json::to_string(snapshot).map_err(StorageError::Encode)
}

pub fn decode_snapshot(key: &str, raw: &str) -> Result<CacheSnapshot, StorageError> {
    serde_json::from_str(raw).map_err(|source| StorageError::Corrupt {
        key: key.to_string(),
        source,
    })
}

/// Keeps the whole cache as one JSON record in the key-value table.
#[derive(Clone)]
pub struct SqliteCacheStore {
    pool: SqlitePool,
    key: String,
}

impl SqliteCacheStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            key: CACHE_KEY.to_string(),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn load_snapshot(&self) -> Result<CacheSnapshot, StorageError> {
        let row: Option<(String,)> = query_as(r#"SELECT value FROM kv_store WHERE key = ?1"#)
            .bind(self.key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((raw,)) => decode_snapshot(&self.key, &raw),
            None => Ok(CacheSnapshot::new()),
        }
    }

    async fn save_snapshot(&self, snapshot: CacheSnapshot) -> Result<(), StorageError> {
        let encoded = encode_snapshot(&snapshot)?;
        query(
            r#"INSERT OR REPLACE INTO kv_store (key, value, updated_at)
                VALUES (?1, ?2, CURRENT_TIMESTAMP)"#,
        )
        .bind(self.key.as_str())
        .bind(encoded)
        .execute(&self.pool)
        .await?;
        tracing::debug!(target: "storage", entries = snapshot.len(), "cache saved");
        Ok(())
    }
}

impl CacheStore for SqliteCacheStore {
    fn load(&self) -> BoxFuture<'_, Result<CacheSnapshot, StorageError>> {
        Box::pin(self.load_snapshot())
    }

    fn save(&self, snapshot: CacheSnapshot) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(self.save_snapshot(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::init_pool, domain::CacheEntry};

    #[test]
    fn snapshot_round_trips_unicode_and_quotes() {
        let snapshot = vec![
            CacheEntry("Sunflowers bloom 🌻 in \"Paris\"".into(), true),
            CacheEntry("L'économie \\ ralentit".into(), false),
            CacheEntry(String::new(), true),
        ];
        let encoded = encode_snapshot(&snapshot).unwrap();
        assert_eq!(decode_snapshot(CACHE_KEY, &encoded).unwrap(), snapshot);

        let empty = CacheSnapshot::new();
        let encoded = encode_snapshot(&empty).unwrap();
        assert_eq!(encoded, "[]");
        assert_eq!(decode_snapshot(CACHE_KEY, &encoded).unwrap(), empty);
    }

    #[test]
    fn snapshot_uses_pair_layout() {
        let encoded = encode_snapshot(&vec![CacheEntry("A".into(), false)]).unwrap();
        assert_eq!(encoded, r#"[["A",false]]"#);
    }

    #[test]
    fn corrupt_record_is_reported() {
        let err = decode_snapshot(CACHE_KEY, r#"[["A","yes"]]"#).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn sqlite_store_persists_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("cache.db");

        let store = SqliteCacheStore::new(init_pool(&db_path).await.unwrap());
        assert!(store.load().await.unwrap().is_empty());
        store
            .save(vec![CacheEntry("A".into(), true), CacheEntry("B".into(), false)])
            .await
            .unwrap();
        store.close().await;

        let reopened = SqliteCacheStore::new(init_pool(&db_path).await.unwrap());
        assert_eq!(
            reopened.load().await.unwrap(),
            vec![CacheEntry("A".into(), true), CacheEntry("B".into(), false)]
        );
        reopened.close().await;
    }
}
