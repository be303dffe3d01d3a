//! Test doubles for the persistence layer

use super::chunk_key::ChunkKey;
use super::remote_store::{MemoryStore, RemoteStore};
use super::{StoreError, StoreResult};
use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

type SetHook = Box<dyn FnMut(&ChunkKey) + Send>;

/// `MemoryStore` with scripted failures and call counters
#[derive(Default)]
pub struct ScriptedStore {
    pub inner: MemoryStore,
    failing_sets: Mutex<Vec<StoreError>>,
    failing_gets: Mutex<Vec<StoreError>>,
    fail_all_sets: Mutex<Option<StoreError>>,
    on_set: Mutex<Option<SetHook>>,
    set_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` writes fail with `error`
    pub fn fail_next_sets(&self, count: usize, error: StoreError) {
        let mut failing = self.failing_sets.lock();
        failing.extend(std::iter::repeat(error).take(count));
    }

    pub fn fail_next_get(&self, error: StoreError) {
        self.failing_gets.lock().push(error);
    }

    /// Every write fails until `set_healthy`
    pub fn set_unavailable(&self, error: StoreError) {
        *self.fail_all_sets.lock() = Some(error);
    }

    pub fn set_healthy(&self) {
        *self.fail_all_sets.lock() = None;
        self.failing_sets.lock().clear();
    }

    /// Run `hook` inside every write, after the payload was handed over
    pub fn on_set(&self, hook: impl FnMut(&ChunkKey) + Send + 'static) {
        *self.on_set.lock() = Some(Box::new(hook));
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    fn scripted_set_result(&self) -> StoreResult<()> {
        if let Some(error) = self.fail_all_sets.lock().clone() {
            return Err(error);
        }
        match self.failing_sets.lock().pop() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl RemoteStore for ScriptedStore {
    fn get<'a>(&'a self, key: &'a ChunkKey) -> BoxFuture<'a, StoreResult<Option<Vec<u8>>>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failing_gets.lock().pop() {
            return future::ready(Err(error)).boxed();
        }
        self.inner.get(key)
    }

    fn set<'a>(&'a self, key: &'a ChunkKey, payload: Vec<u8>) -> BoxFuture<'a, StoreResult<()>> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = self.on_set.lock().as_mut() {
            hook(key);
        }
        if let Err(error) = self.scripted_set_result() {
            return future::ready(Err(error)).boxed();
        }
        self.inner.set(key, payload)
    }
}
