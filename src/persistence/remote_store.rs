//! Remote Store - key-value backend seen by the persistence layer
//!
//! The store is an external, independently rate-limited service. Every call
//! is a single idempotent per-key `get` or `set`; throttling and retries are
//! handled by the caller.

use super::chunk_key::ChunkKey;
use super::StoreResult;
use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

pub trait RemoteStore: Send + Sync {
    /// Fetch the payload stored under `key`, `Ok(None)` if it was never written
    fn get<'a>(&'a self, key: &'a ChunkKey) -> BoxFuture<'a, StoreResult<Option<Vec<u8>>>>;

    /// Replace the payload stored under `key`
    fn set<'a>(&'a self, key: &'a ChunkKey, payload: Vec<u8>) -> BoxFuture<'a, StoreResult<()>>;
}

/// In-process store, used for single-player worlds and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<FxHashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn contains(&self, key: &ChunkKey) -> bool {
        self.entries.lock().contains_key(key.as_str())
    }

    /// Write raw bytes directly, bypassing the codec
    pub fn insert_raw(&self, key: &ChunkKey, payload: Vec<u8>) {
        self.entries.lock().insert(key.as_str().to_string(), payload);
    }

    pub fn raw(&self, key: &ChunkKey) -> Option<Vec<u8>> {
        self.entries.lock().get(key.as_str()).cloned()
    }
}

impl RemoteStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a ChunkKey) -> BoxFuture<'a, StoreResult<Option<Vec<u8>>>> {
        future::ready(Ok(self.raw(key))).boxed()
    }

    fn set<'a>(&'a self, key: &'a ChunkKey, payload: Vec<u8>) -> BoxFuture<'a, StoreResult<()>> {
        self.insert_raw(key, payload);
        future::ready(Ok(())).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::encode_chunk_key;
    use crate::world::ChunkCoord;

    #[test]
    fn test_memory_store_get_set() {
        let store = MemoryStore::new();
        let key = encode_chunk_key(ChunkCoord::new(2, -2));

        assert_eq!(pollster::block_on(store.get(&key)), Ok(None));
        pollster::block_on(store.set(&key, vec![1, 2, 3])).expect("memory set");
        assert_eq!(pollster::block_on(store.get(&key)), Ok(Some(vec![1, 2, 3])));

        pollster::block_on(store.set(&key, vec![9])).expect("memory set");
        assert_eq!(store.raw(&key), Some(vec![9]));
        assert_eq!(store.len(), 1);
    }
}
