//! Chunk Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in chunk_operations.rs

use super::core::{BlockId, ChunkCoord};
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};

/// Persistence status of a live chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistenceState {
    /// Matches what was last written (or was never edited)
    #[default]
    Clean,
    /// Has edits that are not in the store yet
    Dirty,
    /// A snapshot is being written
    Saving,
}

/// A fixed 16 x 256 x 16 column of blocks.
///
/// `blocks` is laid out Y-major, then Z, then X:
/// `index = y * SIZE_X * SIZE_Z + z * SIZE_X + x`.
#[derive(Clone)]
pub struct Chunk {
    pub coord: ChunkCoord,

    /// Block IDs, VOXELS_PER_CHUNK entries
    pub(crate) blocks: Box<[BlockId]>,

    /// One above the topmost non-air block per (x, z) column, 0 when empty.
    /// Indexed `z * SIZE_X + x`.
    pub(crate) height_map: Box<[u16]>,

    pub(crate) state: PersistenceState,

    /// Bumped on every mutation; compared when a save completes
    pub(crate) generation: u64,
}

// Content equality: persistence bookkeeping is not part of a chunk's value
impl PartialEq for Chunk {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord
            && self.height_map == other.height_map
            && self.blocks == other.blocks
    }
}

impl Eq for Chunk {}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("coord", &self.coord)
            .field("blocks", &format_args!("[{} blocks]", self.blocks.len()))
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Shared handle owned by the world manager
pub type ChunkHandle = Arc<RwLock<Chunk>>;

/// Non-owning reference held by the save queue
pub type WeakChunkHandle = Weak<RwLock<Chunk>>;
