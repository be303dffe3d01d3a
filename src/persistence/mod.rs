//! Persistence Module
//!
//! Chunk persistence against a remote key-value store:
//! - `chunk_key`: chunk coordinates <-> `chunk_{x}_{z}` keys
//! - `run_length_*`: dense block grid <-> ordered run list
//! - `record_format`: run list <-> versioned binary payload
//! - `save_queue_*`: coalescing queue of chunks awaiting a write
//! - `persistence_service`: budgeted drain of the queue, plus loading
//! - `remote_store` / `directory_store`: backends

// Data modules
pub mod run_length_data;
pub mod save_queue_data;

// Operations modules
pub mod run_length_operations;
pub mod save_queue_operations;

pub mod chunk_key;
pub mod chunk_loader;
pub mod persistence_service;
pub mod record_format;
pub mod remote_store;
pub mod save_backoff;

#[cfg(feature = "native")]
pub mod directory_store;

#[cfg(test)]
pub(crate) mod test_support;

pub use chunk_key::{decode_chunk_key, encode_chunk_key, ChunkKey};
pub use chunk_loader::LoadOutcome;
pub use persistence_service::{DrainReport, PersistenceService, PersistenceStats, QueueOutcome};
pub use remote_store::{MemoryStore, RemoteStore};
pub use run_length_data::{BlockRun, CompressedRecord};
pub use save_backoff::SaveBackoff;
pub use save_queue_data::{SaveQueueData, SaveQueueEntry};

#[cfg(feature = "native")]
pub use directory_store::DirectoryStore;

use crate::world::ChunkCoord;
use std::time::Duration;

pub type PersistenceResult<T> = Result<T, PersistenceError>;
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Invalid chunk key '{key}': {reason}")]
    Validation { key: String, reason: String },

    #[error("Corrupted chunk data: {0}")]
    Corruption(#[from] CorruptionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Why a record or payload was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorruptionError {
    #[error("record is for chunk {found}, expected {expected}")]
    CoordinateMismatch {
        expected: ChunkCoord,
        found: ChunkCoord,
    },

    #[error("runs cover {found} voxels, chunk volume is {expected}")]
    RunSumMismatch { expected: u64, found: u64 },

    #[error("run {index} has zero length")]
    ZeroLengthRun { index: usize },

    #[error("height map has {found} columns, expected {expected}")]
    HeightMapLength { expected: usize, found: usize },

    #[error("height {height} in column {column} exceeds chunk height {max}")]
    HeightOutOfRange { column: usize, height: u16, max: u16 },

    #[error("height map column {column} says {stored}, blocks give {computed}")]
    HeightMapMismatch {
        column: usize,
        stored: u16,
        computed: u16,
    },

    #[error("bad magic {found:?}")]
    BadMagic { found: [u8; 4] },

    #[error("unsupported record version {found} (supported: {supported})")]
    UnsupportedVersion { found: u16, supported: u16 },

    #[error("run count {run_count} exceeds chunk volume")]
    TooManyRuns { run_count: u32 },

    #[error("payload is {found} bytes, expected {expected}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("malformed header: {0}")]
    MalformedHeader(String),
}

/// Failures reported by a `RemoteStore`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("request timed out")]
    Timeout,

    #[error("request throttled")]
    Throttled { retry_after: Option<Duration> },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}
