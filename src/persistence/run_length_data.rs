//! Run-Length Data - Pure DOP
//!
//! NO METHODS beyond trivial accessors. Just data.
//! All transformations happen in run_length_operations.rs

use crate::world::{BlockId, ChunkCoord};

/// `length` consecutive voxels of `block_id` in traversal order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRun {
    pub block_id: BlockId,
    pub length: u32,
}

impl BlockRun {
    pub const fn new(block_id: BlockId, length: u32) -> Self {
        Self { block_id, length }
    }
}

/// Serialized unit of a chunk: coordinates, runs and height map.
///
/// Runs follow the chunk's Y-major, then Z, then X order. A record built by
/// `compress` always covers exactly `VOXELS_PER_CHUNK` voxels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedRecord {
    pub coord: ChunkCoord,
    pub runs: Vec<BlockRun>,
    pub height_map: Vec<u16>,
}

impl CompressedRecord {
    /// Voxels covered by all runs
    pub fn total_voxels(&self) -> u64 {
        self.runs.iter().map(|run| run.length as u64).sum()
    }
}
