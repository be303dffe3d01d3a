//! Save Queue Operations - Pure DOP Functions
//!
//! Insertion coalesces by coordinate; removal is strictly FIFO over
//! coordinates, so a backlog of any size drains in bounded passes.

use super::save_queue_data::{EntrySource, SaveQueueData, SaveQueueEntry};
use crate::world::{ChunkCoord, ChunkHandle};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::Arc;

/// Result of putting an entry in the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Coalesced,
}

pub fn create_save_queue(max_size: usize) -> SaveQueueData {
    SaveQueueData {
        entries: FxHashMap::default(),
        order: VecDeque::with_capacity(max_size),
        max_size,
    }
}

pub fn live_entry(handle: &ChunkHandle) -> SaveQueueEntry {
    let coord = handle.read().coord;
    SaveQueueEntry {
        coord,
        source: EntrySource::Live(Arc::downgrade(handle)),
        attempts: 0,
    }
}

/// Insert an entry, or overwrite the one already queued for its coordinate
pub fn upsert(data: &mut SaveQueueData, entry: SaveQueueEntry) -> Upsert {
    let coord = entry.coord;
    match data.entries.insert(coord, entry) {
        Some(_) => Upsert::Coalesced,
        None => {
            data.order.push_back(coord);
            Upsert::Inserted
        }
    }
}

/// Put a drained entry back at the end of the line.
///
/// Never overwrites: if the coordinate was queued again in the meantime the
/// newer entry wins. Returns false in that case.
pub fn requeue(data: &mut SaveQueueData, entry: SaveQueueEntry) -> bool {
    if data.entries.contains_key(&entry.coord) {
        return false;
    }
    data.order.push_back(entry.coord);
    data.entries.insert(entry.coord, entry);
    true
}

/// Remove and return the oldest entry
pub fn pop_front(data: &mut SaveQueueData) -> Option<SaveQueueEntry> {
    while let Some(coord) = data.order.pop_front() {
        if let Some(entry) = data.entries.remove(&coord) {
            return Some(entry);
        }
    }
    None
}

pub fn get(data: &SaveQueueData, coord: ChunkCoord) -> Option<&SaveQueueEntry> {
    data.entries.get(&coord)
}

pub fn contains(data: &SaveQueueData, coord: ChunkCoord) -> bool {
    data.entries.contains_key(&coord)
}

pub fn len(data: &SaveQueueData) -> usize {
    data.entries.len()
}

pub fn is_empty(data: &SaveQueueData) -> bool {
    data.entries.is_empty()
}

pub fn is_full(data: &SaveQueueData) -> bool {
    data.entries.len() >= data.max_size
}

/// Coordinates in drain order
pub fn queued_coords(data: &SaveQueueData) -> Vec<ChunkCoord> {
    data.order
        .iter()
        .copied()
        .filter(|coord| data.entries.contains_key(coord))
        .collect()
}
