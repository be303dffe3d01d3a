//! Save Queue Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in save_queue_operations.rs

use super::run_length_data::CompressedRecord;
use crate::world::{ChunkCoord, WeakChunkHandle};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::Arc;

/// Where the drain reads the chunk's state from
#[derive(Debug, Clone)]
pub enum EntrySource {
    /// Live chunk owned by the world; read at drain time
    Live(WeakChunkHandle),
    /// Chunk already evicted; its state was captured on eviction
    Detached(Arc<CompressedRecord>),
}

/// One chunk awaiting persistence
#[derive(Debug, Clone)]
pub struct SaveQueueEntry {
    pub coord: ChunkCoord,
    pub source: EntrySource,
    /// Failed write attempts since the entry was last replaced
    pub attempts: u32,
}

/// Coalescing FIFO keyed by chunk coordinate.
///
/// `order` holds each queued coordinate exactly once; `entries` holds the
/// latest entry for it. Overwriting an entry keeps its place in line.
#[derive(Debug)]
pub struct SaveQueueData {
    pub entries: FxHashMap<ChunkCoord, SaveQueueEntry>,
    pub order: VecDeque<ChunkCoord>,
    pub max_size: usize,
}
