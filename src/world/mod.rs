//! World Module
//!
//! The slice of world state the persistence layer needs: block ids, chunk
//! coordinates and the chunk column itself with its dirty bookkeeping.
//!
//! Chunk data lives in `chunk_data` (pure data) and is transformed by the
//! free functions in `chunk_operations`. The world manager owns every chunk
//! through a `ChunkHandle`; persistence only ever holds weak references.

pub mod chunk_data;
pub mod chunk_operations;
pub mod core;
pub mod error;

pub use chunk_data::{Chunk, ChunkHandle, PersistenceState, WeakChunkHandle};
pub use core::{BlockId, ChunkCoord};
pub use error::{WorldError, WorldResult};
