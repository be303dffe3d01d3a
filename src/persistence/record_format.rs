//! Record Format - binary payload of a stored chunk
//!
//! Layout (little-endian):
//!
//! ```text
//! header    magic "VXCR" | version u16 | x i32 | z i32 | run_count u32   (18 bytes)
//! runs      run_count * { block_id u16 | length u32 }                   (6 bytes each)
//! heights   COLUMNS_PER_CHUNK * u16                                     (512 bytes)
//! checksum  crc32 of everything above                                   (4 bytes)
//! ```
//!
//! The header goes through bincode's fixed-int encoding; the body is packed
//! by hand because it is the hot path for large run lists.

use super::run_length_data::{BlockRun, CompressedRecord};
use super::run_length_operations::validate_contents;
use super::{CorruptionError, PersistenceError, PersistenceResult};
use crate::constants::core::{COLUMNS_PER_CHUNK, VOXELS_PER_CHUNK};
use crate::constants::persistence::{
    RECORD_CHECKSUM_LEN, RECORD_HEADER_LEN, RECORD_MAGIC, RECORD_RUN_LEN, RECORD_VERSION,
};
use crate::world::{BlockId, ChunkCoord};
use serde::{Deserialize, Serialize};

const HEIGHT_MAP_BYTES: usize = COLUMNS_PER_CHUNK * 2;

/// Fixed-size payload header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub x: i32,
    pub z: i32,
    pub run_count: u32,
}

impl RecordHeader {
    pub fn new(coord: ChunkCoord, run_count: u32) -> Self {
        Self {
            magic: RECORD_MAGIC,
            version: RECORD_VERSION,
            x: coord.x,
            z: coord.z,
            run_count,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        ChunkCoord::new(self.x, self.z)
    }
}

/// Total payload size for a given number of runs
pub fn encoded_len(run_count: usize) -> usize {
    RECORD_HEADER_LEN + run_count * RECORD_RUN_LEN + HEIGHT_MAP_BYTES + RECORD_CHECKSUM_LEN
}

/// Encode a record for the store.
///
/// Records that break the run-sum or height-map invariants are refused so a
/// bad record never reaches the store.
pub fn encode_record(record: &CompressedRecord) -> PersistenceResult<Vec<u8>> {
    validate_contents(record)?;

    let header = RecordHeader::new(record.coord, record.runs.len() as u32);
    let mut bytes = Vec::with_capacity(encoded_len(record.runs.len()));
    bincode::serialize_into(&mut bytes, &header)
        .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

    for run in &record.runs {
        bytes.extend_from_slice(&run.block_id.0.to_le_bytes());
        bytes.extend_from_slice(&run.length.to_le_bytes());
    }
    for height in &record.height_map {
        bytes.extend_from_slice(&height.to_le_bytes());
    }

    let checksum = crc32fast::hash(&bytes);
    bytes.extend_from_slice(&checksum.to_le_bytes());
    Ok(bytes)
}

/// Decode and validate a payload read from the store
pub fn decode_record(bytes: &[u8]) -> Result<CompressedRecord, CorruptionError> {
    let min_len = encoded_len(0);
    if bytes.len() < min_len {
        return Err(CorruptionError::LengthMismatch {
            expected: min_len,
            found: bytes.len(),
        });
    }

    let header: RecordHeader = bincode::deserialize(&bytes[..RECORD_HEADER_LEN])
        .map_err(|e| CorruptionError::MalformedHeader(e.to_string()))?;

    if header.magic != RECORD_MAGIC {
        return Err(CorruptionError::BadMagic {
            found: header.magic,
        });
    }
    if header.version != RECORD_VERSION {
        return Err(CorruptionError::UnsupportedVersion {
            found: header.version,
            supported: RECORD_VERSION,
        });
    }
    if header.run_count as usize > VOXELS_PER_CHUNK {
        return Err(CorruptionError::TooManyRuns {
            run_count: header.run_count,
        });
    }

    let run_count = header.run_count as usize;
    let expected = encoded_len(run_count);
    if bytes.len() != expected {
        return Err(CorruptionError::LengthMismatch {
            expected,
            found: bytes.len(),
        });
    }

    let (body, trailer) = bytes.split_at(expected - RECORD_CHECKSUM_LEN);
    let stored = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let computed = crc32fast::hash(body);
    if stored != computed {
        return Err(CorruptionError::ChecksumMismatch { stored, computed });
    }

    let runs_end = RECORD_HEADER_LEN + run_count * RECORD_RUN_LEN;
    let runs = body[RECORD_HEADER_LEN..runs_end]
        .chunks_exact(RECORD_RUN_LEN)
        .map(|raw| BlockRun {
            block_id: BlockId(u16::from_le_bytes([raw[0], raw[1]])),
            length: u32::from_le_bytes([raw[2], raw[3], raw[4], raw[5]]),
        })
        .collect();
    let height_map = body[runs_end..]
        .chunks_exact(2)
        .map(|raw| u16::from_le_bytes([raw[0], raw[1]]))
        .collect();

    let record = CompressedRecord {
        coord: header.coord(),
        runs,
        height_map,
    };
    validate_contents(&record)?;
    Ok(record)
}
