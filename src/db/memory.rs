use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::domain::CacheSnapshot;

use super::{CacheStore, StorageError};

/// Non-durable store; the cache lives only as long as the process.
#[derive(Default)]
pub struct MemoryCacheStore {
    snapshot: Mutex<CacheSnapshot>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&self) -> BoxFuture<'_, Result<CacheSnapshot, StorageError>> {
        let snapshot = self.snapshot.lock().clone();
        Box::pin(async move { Ok(snapshot) })
    }

    fn save(&self, snapshot: CacheSnapshot) -> BoxFuture<'_, Result<(), StorageError>> {
        *self.snapshot.lock() = snapshot;
        Box::pin(async { Ok(()) })
    }
}
