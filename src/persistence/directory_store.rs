//! Directory Store - one file per chunk key
//!
//! Writes go to a temporary file that is renamed over the target, so a
//! crash mid-write leaves the previous payload intact.

use super::chunk_key::ChunkKey;
use super::remote_store::RemoteStore;
use super::{StoreError, StoreResult};
use futures::future::{BoxFuture, FutureExt};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const CHUNK_FILE_EXTENSION: &str = "chunk";

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open (and create if needed) a store rooted at `root`
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        log::info!("[DirectoryStore::open] Using {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &ChunkKey) -> PathBuf {
        self.root
            .join(format!("{}.{}", key.as_str(), CHUNK_FILE_EXTENSION))
    }

    async fn read(&self, key: &ChunkKey) -> StoreResult<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(format!("read {}: {}", key, e))),
        }
    }

    async fn write(&self, key: &ChunkKey, payload: Vec<u8>) -> StoreResult<()> {
        let target = self.path_for(key);
        let temp = target.with_extension("tmp");

        tokio::fs::write(&temp, &payload)
            .await
            .map_err(|e| StoreError::Io(format!("write {}: {}", key, e)))?;
        tokio::fs::rename(&temp, &target)
            .await
            .map_err(|e| StoreError::Io(format!("rename {}: {}", key, e)))
    }
}

impl RemoteStore for DirectoryStore {
    fn get<'a>(&'a self, key: &'a ChunkKey) -> BoxFuture<'a, StoreResult<Option<Vec<u8>>>> {
        self.read(key).boxed()
    }

    fn set<'a>(&'a self, key: &'a ChunkKey, payload: Vec<u8>) -> BoxFuture<'a, StoreResult<()>> {
        self.write(key, payload).boxed()
    }
}
