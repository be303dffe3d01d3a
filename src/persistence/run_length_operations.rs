//! Run-Length Operations - Pure DOP Functions
//!
//! Compression walks the grid in storage order (Y-major, then Z, then X),
//! which is exactly the flat layout of `Chunk::blocks`, and merges equal
//! neighbours into runs. Decompression validates the whole record before
//! touching anything.

use super::run_length_data::{BlockRun, CompressedRecord};
use super::CorruptionError;
use crate::constants::core::{CHUNK_SIZE_Y, COLUMNS_PER_CHUNK, VOXELS_PER_CHUNK};
use crate::world::chunk_operations::{self, compute_height_map};
use crate::world::{BlockId, Chunk, ChunkCoord};
use std::iter;

/// Compress a chunk into its run list and height map
pub fn compress(chunk: &Chunk) -> CompressedRecord {
    let blocks = chunk_operations::blocks(chunk);
    let mut runs: Vec<BlockRun> = Vec::new();

    for &block in blocks {
        match runs.last_mut() {
            Some(run) if run.block_id == block => run.length += 1,
            _ => runs.push(BlockRun::new(block, 1)),
        }
    }

    CompressedRecord {
        coord: chunk.coord,
        runs,
        height_map: chunk_operations::height_map(chunk).to_vec(),
    }
}

/// Check every record invariant against the chunk it is meant for
pub fn validate_record(record: &CompressedRecord, target: ChunkCoord) -> Result<(), CorruptionError> {
    if record.coord != target {
        return Err(CorruptionError::CoordinateMismatch {
            expected: target,
            found: record.coord,
        });
    }
    validate_contents(record)
}

/// Invariants that do not depend on the target chunk
pub fn validate_contents(record: &CompressedRecord) -> Result<(), CorruptionError> {
    if let Some(index) = record.runs.iter().position(|run| run.length == 0) {
        return Err(CorruptionError::ZeroLengthRun { index });
    }

    let total = record.total_voxels();
    if total != VOXELS_PER_CHUNK as u64 {
        return Err(CorruptionError::RunSumMismatch {
            expected: VOXELS_PER_CHUNK as u64,
            found: total,
        });
    }

    if record.height_map.len() != COLUMNS_PER_CHUNK {
        return Err(CorruptionError::HeightMapLength {
            expected: COLUMNS_PER_CHUNK,
            found: record.height_map.len(),
        });
    }

    let max = CHUNK_SIZE_Y as u16;
    if let Some((column, &height)) = record
        .height_map
        .iter()
        .enumerate()
        .find(|(_, height)| **height > max)
    {
        return Err(CorruptionError::HeightOutOfRange { column, height, max });
    }

    Ok(())
}

/// Rebuild a chunk from a record. The result is clean at generation 0.
pub fn decompress(record: &CompressedRecord, target: ChunkCoord) -> Result<Chunk, CorruptionError> {
    let (blocks, height_map) = rebuild_grid(record, target)?;
    Ok(chunk_operations::create_from_parts(target, blocks, height_map))
}

/// Replace the contents of `chunk` with the record.
///
/// All-or-nothing: the record is validated against `chunk.coord` and the
/// grid is built in a scratch buffer before being swapped in. On error the
/// chunk is left exactly as it was.
pub fn decompress_into(record: &CompressedRecord, chunk: &mut Chunk) -> Result<(), CorruptionError> {
    let (mut blocks, mut height_map) = rebuild_grid(record, chunk.coord)?;
    chunk_operations::replace_contents(chunk, &mut blocks, &mut height_map);
    Ok(())
}

// Validated grid and height map; the stored heights must match the blocks
fn rebuild_grid(
    record: &CompressedRecord,
    target: ChunkCoord,
) -> Result<(Box<[BlockId]>, Box<[u16]>), CorruptionError> {
    validate_record(record, target)?;

    let blocks = expand_runs(&record.runs);
    let height_map = compute_height_map(&blocks);
    if let Some((column, (&stored, &computed))) = record
        .height_map
        .iter()
        .zip(height_map.iter())
        .enumerate()
        .find(|(_, (stored, computed))| stored != computed)
    {
        return Err(CorruptionError::HeightMapMismatch {
            column,
            stored,
            computed,
        });
    }

    Ok((blocks, height_map))
}

fn expand_runs(runs: &[BlockRun]) -> Box<[BlockId]> {
    let mut blocks = Vec::with_capacity(VOXELS_PER_CHUNK);
    for run in runs {
        blocks.extend(iter::repeat(run.block_id).take(run.length as usize));
    }
    blocks.into_boxed_slice()
}
