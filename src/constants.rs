//! Engine-wide constants
//!
//! Chunk dimensions and persistence format values live here so the codec,
//! the queue and the world types agree on a single definition.

use static_assertions::{const_assert, const_assert_eq};

/// Chunk geometry
pub mod core {
    /// Blocks along X in one chunk column
    pub const CHUNK_SIZE_X: usize = 16;
    /// Blocks along Y (full world height)
    pub const CHUNK_SIZE_Y: usize = 256;
    /// Blocks along Z in one chunk column
    pub const CHUNK_SIZE_Z: usize = 16;

    /// Number of vertical columns in a chunk (height map length)
    pub const COLUMNS_PER_CHUNK: usize = CHUNK_SIZE_X * CHUNK_SIZE_Z;

    /// Total voxels in a chunk: 16 * 256 * 16 = 65,536
    pub const VOXELS_PER_CHUNK: usize = CHUNK_SIZE_X * CHUNK_SIZE_Y * CHUNK_SIZE_Z;
}

/// Persistence format and scheduling defaults
pub mod persistence {
    /// Every stored key starts with this prefix
    pub const CHUNK_KEY_PREFIX: &str = "chunk_";

    /// "VXCR" - voxel chunk record
    pub const RECORD_MAGIC: [u8; 4] = *b"VXCR";

    /// Current payload version
    pub const RECORD_VERSION: u16 = 1;

    /// magic(4) + version(2) + x(4) + z(4) + run_count(4)
    pub const RECORD_HEADER_LEN: usize = 18;

    /// block_id(2) + length(4)
    pub const RECORD_RUN_LEN: usize = 6;

    /// crc32 trailer
    pub const RECORD_CHECKSUM_LEN: usize = 4;

    pub const DEFAULT_MAX_QUEUE_SIZE: usize = 64;
    pub const DEFAULT_SAVES_PER_TICK: usize = 8;
    pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
    pub const DEFAULT_MAX_BACKOFF_TICKS: u64 = 64;
}

// Run lengths and run counts are stored as u32
const_assert!(core::VOXELS_PER_CHUNK <= u32::MAX as usize);
// Height map entries are stored as u16 and may equal CHUNK_SIZE_Y
const_assert!(core::CHUNK_SIZE_Y <= u16::MAX as usize);
const_assert_eq!(core::VOXELS_PER_CHUNK, 65_536);
const_assert_eq!(persistence::RECORD_HEADER_LEN, 4 + 2 + 4 + 4 + 4);
