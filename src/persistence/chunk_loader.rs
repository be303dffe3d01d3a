//! Chunk Loader
//!
//! Reads a chunk's record from the store and rebuilds it. A missing key is
//! a normal outcome (the caller generates the chunk); anything that fails
//! to decode or validate is reported as corruption and never half-applied.

use super::chunk_key::encode_chunk_key;
use super::record_format::decode_record;
use super::remote_store::RemoteStore;
use super::run_length_operations::{decompress, decompress_into};
use super::PersistenceResult;
use crate::world::{Chunk, ChunkCoord};

/// What the store held for a coordinate
#[derive(Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Rebuilt from the stored record, clean
    Loaded(Chunk),
    /// Nothing stored under the key; generate the chunk instead
    NotFound,
}

impl LoadOutcome {
    pub fn into_chunk(self) -> Option<Chunk> {
        match self {
            LoadOutcome::Loaded(chunk) => Some(chunk),
            LoadOutcome::NotFound => None,
        }
    }
}

/// Load the chunk at `coord` from `store`
pub async fn load_chunk<S: RemoteStore + ?Sized>(
    store: &S,
    coord: ChunkCoord,
) -> PersistenceResult<LoadOutcome> {
    let key = encode_chunk_key(coord);
    let Some(bytes) = store.get(&key).await? else {
        log::debug!("[ChunkLoader::load_chunk] No record for {}", key);
        return Ok(LoadOutcome::NotFound);
    };

    let chunk = decode_record(&bytes)
        .and_then(|record| decompress(&record, coord))
        .map_err(|e| {
            log::error!("[ChunkLoader::load_chunk] Rejected record {}: {}", key, e);
            e
        })?;

    log::debug!(
        "[ChunkLoader::load_chunk] Loaded {} ({} bytes)",
        key,
        bytes.len()
    );
    Ok(LoadOutcome::Loaded(chunk))
}

/// Reload an existing chunk in place from the store.
///
/// Returns false if nothing is stored for it. On any error the chunk keeps
/// its current contents.
pub async fn reload_chunk<S: RemoteStore + ?Sized>(
    store: &S,
    chunk: &mut Chunk,
) -> PersistenceResult<bool> {
    let key = encode_chunk_key(chunk.coord);
    let Some(bytes) = store.get(&key).await? else {
        return Ok(false);
    };

    let record = decode_record(&bytes)?;
    decompress_into(&record, chunk)?;
    Ok(true)
}
