// Voxel Persist - chunk persistence for voxel worlds
//
// Data-oriented layout: plain data in *_data modules, transformations as free
// functions in *_operations modules.
// - world: chunk grid, height map and dirty tracking
// - persistence: run-length records, save queue, budgeted writes, loading
// - config: tunables for the save scheduler

// Constants module
pub mod constants;

pub mod config;
pub mod persistence;
pub mod world;

pub use config::PersistenceConfig;
pub use persistence::{
    decode_chunk_key, encode_chunk_key, ChunkKey, CorruptionError, DrainReport, LoadOutcome,
    MemoryStore, PersistenceError, PersistenceResult, PersistenceService, PersistenceStats,
    QueueOutcome, RemoteStore, StoreError, StoreResult,
};
pub use world::{BlockId, Chunk, ChunkCoord, ChunkHandle, PersistenceState, WorldError, WorldResult};

#[cfg(feature = "native")]
pub use persistence::DirectoryStore;
