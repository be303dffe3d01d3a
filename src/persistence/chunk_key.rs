//! Chunk keys
//!
//! Stored chunks are addressed as `chunk_{x}_{z}` with signed decimal
//! coordinates. The format is shared with data already in the store and
//! must not change.

use super::{PersistenceError, PersistenceResult};
use crate::constants::persistence::CHUNK_KEY_PREFIX;
use crate::world::ChunkCoord;
use std::fmt;

/// Canonical storage key of one chunk
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey(String);

impl ChunkKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChunkKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ChunkCoord> for ChunkKey {
    fn from(coord: ChunkCoord) -> Self {
        encode_chunk_key(coord)
    }
}

/// Encode chunk coordinates as a storage key
pub fn encode_chunk_key(coord: ChunkCoord) -> ChunkKey {
    ChunkKey(format!("{}{}_{}", CHUNK_KEY_PREFIX, coord.x, coord.z))
}

/// Decode a storage key back into chunk coordinates.
///
/// Only the exact output of `encode_chunk_key` is accepted, so every chunk
/// has a single key: `chunk_+1_2`, `chunk_01_2` and `chunk_-0_2` are all
/// rejected.
pub fn decode_chunk_key(key: &str) -> PersistenceResult<ChunkCoord> {
    let invalid = |reason: &str| PersistenceError::Validation {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let body = key
        .strip_prefix(CHUNK_KEY_PREFIX)
        .ok_or_else(|| invalid("missing 'chunk_' prefix"))?;
    let (x_text, z_text) = body
        .split_once('_')
        .ok_or_else(|| invalid("expected two coordinates separated by '_'"))?;

    let x = parse_coordinate(x_text).ok_or_else(|| invalid("x is not a canonical i32"))?;
    let z = parse_coordinate(z_text).ok_or_else(|| invalid("z is not a canonical i32"))?;
    Ok(ChunkCoord::new(x, z))
}

fn parse_coordinate(text: &str) -> Option<i32> {
    let value: i32 = text.parse().ok()?;
    // Rejects '+', leading zeros and "-0" by requiring the canonical spelling
    (value.to_string() == text).then_some(value)
}
