//! Chunk Operations - Pure DOP Functions
//!
//! Free functions over `Chunk`. Every block mutation goes through
//! `set_block` or `mark_dirty` so the generation counter stays honest.

use super::chunk_data::{Chunk, ChunkHandle, PersistenceState};
use super::core::{BlockId, ChunkCoord};
use super::error::{WorldError, WorldResult};
use crate::constants::core::{
    CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, COLUMNS_PER_CHUNK, VOXELS_PER_CHUNK,
};
use parking_lot::RwLock;
use std::sync::Arc;

/// Create new chunk with all air blocks
pub fn create_chunk(coord: ChunkCoord) -> Chunk {
    Chunk {
        coord,
        blocks: vec![BlockId::AIR; VOXELS_PER_CHUNK].into_boxed_slice(),
        height_map: vec![0u16; COLUMNS_PER_CHUNK].into_boxed_slice(),
        state: PersistenceState::Clean,
        generation: 0,
    }
}

/// Create chunk filled with a specific block
pub fn create_filled(coord: ChunkCoord, block: BlockId) -> Chunk {
    let top = if block.is_solid() { CHUNK_SIZE_Y as u16 } else { 0 };
    Chunk {
        coord,
        blocks: vec![block; VOXELS_PER_CHUNK].into_boxed_slice(),
        height_map: vec![top; COLUMNS_PER_CHUNK].into_boxed_slice(),
        state: PersistenceState::Clean,
        generation: 0,
    }
}

/// Create chunk from a generator's flat block array (Y-major, then Z, then X)
pub fn create_with_blocks(coord: ChunkCoord, blocks: Vec<BlockId>) -> WorldResult<Chunk> {
    if blocks.len() != VOXELS_PER_CHUNK {
        return Err(WorldError::InvalidBlockCount {
            chunk: coord,
            expected: VOXELS_PER_CHUNK,
            found: blocks.len(),
        });
    }

    let height_map = compute_height_map(&blocks);
    Ok(Chunk {
        coord,
        blocks: blocks.into_boxed_slice(),
        height_map,
        state: PersistenceState::Clean,
        generation: 0,
    })
}

/// Assemble a clean chunk from buffers that were already validated together
pub(crate) fn create_from_parts(coord: ChunkCoord, blocks: Box<[BlockId]>, height_map: Box<[u16]>) -> Chunk {
    Chunk {
        coord,
        blocks,
        height_map,
        state: PersistenceState::Clean,
        generation: 0,
    }
}

/// Wrap a chunk into the shared handle the world manager keeps
pub fn into_handle(chunk: Chunk) -> ChunkHandle {
    Arc::new(RwLock::new(chunk))
}

/// Calculate voxel index from 3D coordinates
#[inline]
pub fn voxel_index(x: usize, y: usize, z: usize) -> usize {
    y * CHUNK_SIZE_X * CHUNK_SIZE_Z + z * CHUNK_SIZE_X + x
}

#[inline]
pub fn column_index(x: usize, z: usize) -> usize {
    z * CHUNK_SIZE_X + x
}

/// Check if coordinates are within chunk bounds
#[inline]
pub fn is_in_bounds(x: usize, y: usize, z: usize) -> bool {
    x < CHUNK_SIZE_X && y < CHUNK_SIZE_Y && z < CHUNK_SIZE_Z
}

/// Get block at position, `None` outside the chunk
pub fn get_block(chunk: &Chunk, x: usize, y: usize, z: usize) -> Option<BlockId> {
    if !is_in_bounds(x, y, z) {
        return None;
    }
    Some(chunk.blocks[voxel_index(x, y, z)])
}

/// Set block at position.
///
/// Returns `Ok(false)` when the block was already there (nothing changes,
/// the chunk is not dirtied). Otherwise updates the height map, marks the
/// chunk dirty and returns `Ok(true)`.
pub fn set_block(
    chunk: &mut Chunk,
    x: usize,
    y: usize,
    z: usize,
    block: BlockId,
) -> WorldResult<bool> {
    if !is_in_bounds(x, y, z) {
        return Err(WorldError::BlockOutOfBounds {
            chunk: chunk.coord,
            x,
            y,
            z,
        });
    }

    let index = voxel_index(x, y, z);
    if chunk.blocks[index] == block {
        return Ok(false);
    }
    chunk.blocks[index] = block;

    let column = column_index(x, z);
    let height = chunk.height_map[column] as usize;
    if block.is_solid() {
        if y + 1 > height {
            chunk.height_map[column] = (y + 1) as u16;
        }
    } else if y + 1 == height {
        chunk.height_map[column] = scan_column_height(&chunk.blocks, x, z, y);
    }

    mark_dirty(chunk);
    Ok(true)
}

/// Height of the (x, z) column: one above its topmost non-air block
pub fn column_height(chunk: &Chunk, x: usize, z: usize) -> Option<u16> {
    if x >= CHUNK_SIZE_X || z >= CHUNK_SIZE_Z {
        return None;
    }
    Some(chunk.height_map[column_index(x, z)])
}

/// Get blocks slice
pub fn blocks(chunk: &Chunk) -> &[BlockId] {
    &chunk.blocks
}

/// Get height map slice
pub fn height_map(chunk: &Chunk) -> &[u16] {
    &chunk.height_map
}

/// Build the height map for a full block array
pub fn compute_height_map(blocks: &[BlockId]) -> Box<[u16]> {
    let mut height_map = vec![0u16; COLUMNS_PER_CHUNK];
    for z in 0..CHUNK_SIZE_Z {
        for x in 0..CHUNK_SIZE_X {
            height_map[column_index(x, z)] = scan_column_height(blocks, x, z, CHUNK_SIZE_Y);
        }
    }
    height_map.into_boxed_slice()
}

// Topmost solid block strictly below `below`, as a height
fn scan_column_height(blocks: &[BlockId], x: usize, z: usize, below: usize) -> u16 {
    (0..below)
        .rev()
        .find(|&y| blocks[voxel_index(x, y, z)].is_solid())
        .map_or(0, |y| (y + 1) as u16)
}

/// Record a mutation made outside `set_block` (bulk edits, generator passes)
pub fn mark_dirty(chunk: &mut Chunk) {
    chunk.generation = chunk.generation.wrapping_add(1);
    chunk.state = PersistenceState::Dirty;
}

pub fn is_dirty(chunk: &Chunk) -> bool {
    chunk.state == PersistenceState::Dirty
}

pub fn persistence_state(chunk: &Chunk) -> PersistenceState {
    chunk.state
}

pub fn generation(chunk: &Chunk) -> u64 {
    chunk.generation
}

/// Dirty -> Saving. Returns the generation the snapshot reflects.
pub fn begin_save(chunk: &mut Chunk) -> u64 {
    chunk.state = PersistenceState::Saving;
    chunk.generation
}

/// Saving -> Clean when the write succeeded and nothing changed since the
/// snapshot, Saving -> Dirty otherwise. Returns true if the chunk is clean.
pub fn finish_save(chunk: &mut Chunk, snapshot_generation: u64, write_succeeded: bool) -> bool {
    if write_succeeded && chunk.generation == snapshot_generation {
        chunk.state = PersistenceState::Clean;
        true
    } else {
        chunk.state = PersistenceState::Dirty;
        false
    }
}

/// Swap freshly decoded contents in. The chunk now mirrors the store.
pub(crate) fn replace_contents(chunk: &mut Chunk, blocks: &mut Box<[BlockId]>, height_map: &mut Box<[u16]>) {
    std::mem::swap(&mut chunk.blocks, blocks);
    std::mem::swap(&mut chunk.height_map, height_map);
    chunk.generation = chunk.generation.wrapping_add(1);
    chunk.state = PersistenceState::Clean;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chunk_is_clean_air() {
        let chunk = create_chunk(ChunkCoord::new(3, -7));
        assert_eq!(blocks(&chunk).len(), VOXELS_PER_CHUNK);
        assert!(blocks(&chunk).iter().all(|b| *b == BlockId::AIR));
        assert!(height_map(&chunk).iter().all(|h| *h == 0));
        assert_eq!(persistence_state(&chunk), PersistenceState::Clean);
        assert_eq!(generation(&chunk), 0);
    }

    #[test]
    fn test_set_block_marks_dirty_and_bumps_generation() {
        let mut chunk = create_chunk(ChunkCoord::new(0, 0));
        assert!(set_block(&mut chunk, 1, 2, 3, BlockId::STONE).expect("in bounds"));
        assert!(is_dirty(&chunk));
        assert_eq!(generation(&chunk), 1);
        assert_eq!(get_block(&chunk, 1, 2, 3), Some(BlockId::STONE));

        // Same block again is not a mutation
        assert!(!set_block(&mut chunk, 1, 2, 3, BlockId::STONE).expect("in bounds"));
        assert_eq!(generation(&chunk), 1);
    }

    #[test]
    fn test_set_block_out_of_bounds() {
        let mut chunk = create_chunk(ChunkCoord::new(0, 0));
        let result = set_block(&mut chunk, 0, CHUNK_SIZE_Y, 0, BlockId::DIRT);
        assert!(matches!(result, Err(WorldError::BlockOutOfBounds { .. })));
        assert!(!is_dirty(&chunk));
        assert_eq!(get_block(&chunk, CHUNK_SIZE_X, 0, 0), None);
    }

    #[test]
    fn test_height_map_tracks_edits() {
        let mut chunk = create_chunk(ChunkCoord::new(0, 0));
        set_block(&mut chunk, 4, 10, 5, BlockId::DIRT).expect("in bounds");
        set_block(&mut chunk, 4, 60, 5, BlockId::STONE).expect("in bounds");
        assert_eq!(column_height(&chunk, 4, 5), Some(61));

        // Removing the top block falls back to the next solid one
        set_block(&mut chunk, 4, 60, 5, BlockId::AIR).expect("in bounds");
        assert_eq!(column_height(&chunk, 4, 5), Some(11));

        set_block(&mut chunk, 4, 10, 5, BlockId::AIR).expect("in bounds");
        assert_eq!(column_height(&chunk, 4, 5), Some(0));
        assert_eq!(height_map(&chunk), &*compute_height_map(blocks(&chunk)));
    }

    #[test]
    fn test_create_with_blocks_validates_length() {
        let coord = ChunkCoord::new(1, 1);
        assert!(create_with_blocks(coord, vec![BlockId::AIR; 10]).is_err());

        let mut raw = vec![BlockId::AIR; VOXELS_PER_CHUNK];
        raw[voxel_index(0, 255, 0)] = BlockId::BEDROCK;
        let chunk = create_with_blocks(coord, raw).expect("full volume");
        assert_eq!(column_height(&chunk, 0, 0), Some(256));
        assert_eq!(column_height(&chunk, 1, 0), Some(0));
    }

    #[test]
    fn test_save_state_machine() {
        let mut chunk = create_chunk(ChunkCoord::new(0, 0));
        set_block(&mut chunk, 0, 0, 0, BlockId::SAND).expect("in bounds");

        let snapshot = begin_save(&mut chunk);
        assert_eq!(persistence_state(&chunk), PersistenceState::Saving);
        assert!(finish_save(&mut chunk, snapshot, true));
        assert_eq!(persistence_state(&chunk), PersistenceState::Clean);

        set_block(&mut chunk, 0, 1, 0, BlockId::SAND).expect("in bounds");
        let snapshot = begin_save(&mut chunk);
        set_block(&mut chunk, 0, 2, 0, BlockId::SAND).expect("in bounds");
        assert!(!finish_save(&mut chunk, snapshot, true));
        assert!(is_dirty(&chunk));

        let snapshot = begin_save(&mut chunk);
        assert!(!finish_save(&mut chunk, snapshot, false));
        assert!(is_dirty(&chunk));
    }

    #[test]
    fn test_filled_chunk_equality_ignores_bookkeeping() {
        let mut a = create_filled(ChunkCoord::new(2, 2), BlockId::STONE);
        let b = create_filled(ChunkCoord::new(2, 2), BlockId::STONE);
        mark_dirty(&mut a);
        assert_eq!(a, b);
        assert_eq!(column_height(&b, 15, 15), Some(CHUNK_SIZE_Y as u16));
    }
}
