/// World Error Handling
///
/// Errors raised by block edits on live chunks.
use super::core::ChunkCoord;

/// World-specific result type
pub type WorldResult<T> = Result<T, WorldError>;

#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("Block position ({x}, {y}, {z}) out of bounds for chunk {chunk}")]
    BlockOutOfBounds {
        chunk: ChunkCoord,
        x: usize,
        y: usize,
        z: usize,
    },

    #[error("Chunk {chunk} expects {expected} blocks, got {found}")]
    InvalidBlockCount {
        chunk: ChunkCoord,
        expected: usize,
        found: usize,
    },
}
