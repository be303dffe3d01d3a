//! Persistence Service
//!
//! Owns the save queue and drives it against a `RemoteStore`:
//! - `queue_chunk_save` admits dirty chunks, coalescing by coordinate
//! - `tick` / `process_save_queue` write a bounded number of entries
//! - `flush` drains everything, used on shutdown
//! - `detach_chunk` captures a dirty chunk that is about to be evicted
//! - `load_chunk` serves pending snapshots first, then the store
//!
//! No chunk lock is held across a store call. The drain snapshots a chunk
//! under a short write lock, releases it, writes, then re-locks to settle
//! the chunk's state against the generation it captured.

use super::chunk_key::encode_chunk_key;
use super::chunk_loader::{self, LoadOutcome};
use super::record_format::encode_record;
use super::remote_store::RemoteStore;
use super::run_length_data::CompressedRecord;
use super::run_length_operations::{compress, decompress};
use super::save_backoff::SaveBackoff;
use super::save_queue_data::{EntrySource, SaveQueueData, SaveQueueEntry};
use super::save_queue_operations::{self as queue_ops, Upsert};
use super::{PersistenceError, PersistenceResult, StoreError};
use crate::config::PersistenceConfig;
use crate::world::chunk_operations::{begin_save, finish_save, persistence_state};
use crate::world::{ChunkCoord, ChunkHandle, PersistenceState};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What `queue_chunk_save` did with a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOutcome {
    /// Chunk was clean, nothing queued
    NotDirty,
    /// New queue entry
    Queued,
    /// Merged into the entry already queued for the coordinate
    Coalesced,
}

/// Result of one drain pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Writes issued
    pub attempted: usize,
    /// Writes that left the chunk clean
    pub saved: usize,
    /// Writes that succeeded but the chunk changed meanwhile; requeued
    pub stale: usize,
    /// Writes that failed; requeued
    pub failed: usize,
    /// Entries dropped without a write (chunk already clean or evicted)
    pub skipped: usize,
    /// The pass stopped or never started because of save backoff
    pub backed_off: bool,
    /// The pass stopped on the tick time budget
    pub time_budget_exhausted: bool,
    pub last_error: Option<StoreError>,
}

impl DrainReport {
    fn merge(&mut self, other: DrainReport) {
        self.attempted += other.attempted;
        self.saved += other.saved;
        self.stale += other.stale;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.backed_off |= other.backed_off;
        self.time_budget_exhausted |= other.time_budget_exhausted;
        if other.last_error.is_some() {
            self.last_error = other.last_error;
        }
    }

    fn made_progress(&self) -> bool {
        self.saved > 0 || self.skipped > 0
    }
}

/// Persistence statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistenceStats {
    pub saves_attempted: u64,
    pub saves_succeeded: u64,
    pub saves_failed: u64,
    pub saves_stale: u64,
    pub entries_skipped: u64,
    pub bytes_written: u64,
    pub forced_drains: u64,
    /// Admissions past `max_queue_size` while the store was failing
    pub over_capacity_admissions: u64,
    pub ticks_backed_off: u64,
    pub loads: u64,
    pub loads_not_found: u64,
    pub loads_from_queue: u64,
    pub loads_failed: u64,
}

/// State captured for one write
enum Snapshot {
    Live {
        handle: ChunkHandle,
        record: CompressedRecord,
        generation: u64,
    },
    Detached(Arc<CompressedRecord>),
}

impl Snapshot {
    fn record(&self) -> &CompressedRecord {
        match self {
            Snapshot::Live { record, .. } => record,
            Snapshot::Detached(record) => record,
        }
    }

    /// Settle the chunk after the write. True when nothing is left to save.
    fn finish(self, write_succeeded: bool) -> bool {
        match self {
            Snapshot::Live {
                handle, generation, ..
            } => finish_save(&mut handle.write(), generation, write_succeeded),
            Snapshot::Detached(_) => write_succeeded,
        }
    }
}

pub struct PersistenceService<S: RemoteStore + ?Sized = dyn RemoteStore> {
    config: PersistenceConfig,
    store: Arc<S>,
    queue: SaveQueueData,
    backoff: SaveBackoff,
    tick: u64,
    stats: PersistenceStats,
}

impl<S: RemoteStore + ?Sized> PersistenceService<S> {
    /// Create a service over `store`. Fails if the config does not validate.
    pub fn new(store: Arc<S>, config: PersistenceConfig) -> anyhow::Result<Self> {
        config.validate()?;

        log::info!(
            "[PersistenceService::new] queue={}, saves_per_tick={}, time_budget={:?}",
            config.max_queue_size,
            config.saves_per_tick,
            config.tick_time_budget()
        );

        Ok(Self::from_config(store, config))
    }

    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::from_config(store, PersistenceConfig::default())
    }

    // Config must already be valid
    fn from_config(store: Arc<S>, config: PersistenceConfig) -> Self {
        Self {
            queue: queue_ops::create_save_queue(config.max_queue_size),
            backoff: SaveBackoff::new(config.failure_threshold, config.max_backoff_ticks),
            config,
            store,
            tick: 0,
            stats: PersistenceStats::default(),
        }
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    pub fn stats(&self) -> &PersistenceStats {
        &self.stats
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Distinct chunks awaiting a write
    pub fn pending_saves(&self) -> usize {
        queue_ops::len(&self.queue)
    }

    pub fn is_queued(&self, coord: ChunkCoord) -> bool {
        queue_ops::contains(&self.queue, coord)
    }

    /// Coordinates in the order they will be written
    pub fn queued_coords(&self) -> Vec<ChunkCoord> {
        queue_ops::queued_coords(&self.queue)
    }

    /// Ticks elapsed since the service was created
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn is_backing_off(&self) -> bool {
        self.backoff.is_backing_off(self.tick)
    }

    /// Schedule a chunk for saving.
    ///
    /// Clean chunks are ignored. A chunk already queued is coalesced into
    /// its existing entry. When the queue is at `max_queue_size` a forced
    /// drain runs first; if the store cannot take writes the entry is still
    /// admitted so no edit is dropped.
    pub async fn queue_chunk_save(&mut self, handle: &ChunkHandle) -> QueueOutcome {
        let state = persistence_state(&handle.read());
        // Saving is only observable here after a drain future was dropped
        if state == PersistenceState::Clean {
            return QueueOutcome::NotDirty;
        }

        self.admit(queue_ops::live_entry(handle)).await
    }

    /// Capture a chunk that is being evicted.
    ///
    /// A dirty chunk's contents are compressed now and queued as a detached
    /// snapshot, replacing any live entry, so the world may drop its handle
    /// right away. Clean chunks need nothing and return `NotDirty`.
    pub async fn detach_chunk(&mut self, handle: &ChunkHandle) -> QueueOutcome {
        let record = {
            let chunk = handle.read();
            if persistence_state(&chunk) == PersistenceState::Clean {
                return QueueOutcome::NotDirty;
            }
            compress(&chunk)
        };

        log::debug!(
            "[PersistenceService::detach_chunk] Snapshot of {} queued ({} runs)",
            record.coord,
            record.runs.len()
        );

        let entry = SaveQueueEntry {
            coord: record.coord,
            source: EntrySource::Detached(Arc::new(record)),
            attempts: 0,
        };
        self.admit(entry).await
    }

    async fn admit(&mut self, entry: SaveQueueEntry) -> QueueOutcome {
        let coord = entry.coord;

        if !queue_ops::contains(&self.queue, coord) && queue_ops::is_full(&self.queue) {
            if self.backoff.is_backing_off(self.tick) {
                log::debug!(
                    "[PersistenceService::queue_chunk_save] Queue full, store backing off; no forced drain"
                );
            } else {
                self.stats.forced_drains += 1;
                log::debug!(
                    "[PersistenceService::queue_chunk_save] Queue full ({}), forcing a drain",
                    self.pending_saves()
                );
                self.drain(self.config.saves_per_tick, None).await;
            }

            if queue_ops::is_full(&self.queue) {
                self.stats.over_capacity_admissions += 1;
                log::warn!(
                    "[PersistenceService::queue_chunk_save] Store not keeping up, queue at {} over capacity {}",
                    self.pending_saves() + 1,
                    self.queue.max_size
                );
            }
        }

        match queue_ops::upsert(&mut self.queue, entry) {
            Upsert::Inserted => QueueOutcome::Queued,
            Upsert::Coalesced => QueueOutcome::Coalesced,
        }
    }

    /// Advance one tick and write up to `saves_per_tick` queued chunks,
    /// unless saves are backing off after repeated store failures.
    pub async fn tick(&mut self) -> DrainReport {
        self.tick += 1;

        if self.backoff.is_backing_off(self.tick) {
            self.stats.ticks_backed_off += 1;
            log::debug!(
                "[PersistenceService::tick] Tick {} skipped, saves resume at tick {}",
                self.tick,
                self.backoff.resume_at_tick()
            );
            return DrainReport {
                backed_off: true,
                ..DrainReport::default()
            };
        }

        let report = self
            .drain(self.config.saves_per_tick, self.config.tick_time_budget())
            .await;
        if report.attempted > 0 {
            log::debug!(
                "[PersistenceService::tick] Tick {}: {} saved, {} stale, {} failed, {} pending",
                self.tick,
                report.saved,
                report.stale,
                report.failed,
                self.pending_saves()
            );
        }
        report
    }

    /// Write up to `budget` queued chunks in FIFO order.
    ///
    /// Ignores the backoff window; a failure during the pass can still open
    /// one and end the pass early.
    pub async fn process_save_queue(&mut self, budget: usize) -> DrainReport {
        self.drain(budget, None).await
    }

    /// Drain until the queue is empty or a pass makes no progress.
    ///
    /// Returns an error carrying the last store failure if chunks are left
    /// pending; they stay queued and dirty.
    pub async fn flush(&mut self) -> PersistenceResult<DrainReport> {
        let mut total = DrainReport::default();

        while !queue_ops::is_empty(&self.queue) {
            let budget = self.pending_saves();
            let report = self.drain(budget, None).await;
            let progressed = report.made_progress();
            total.merge(report);
            if !progressed {
                break;
            }
        }

        let pending = self.pending_saves();
        if pending == 0 {
            log::info!(
                "[PersistenceService::flush] Flushed {} chunks ({} retries)",
                total.saved,
                total.stale + total.failed
            );
            return Ok(total);
        }

        log::error!(
            "[PersistenceService::flush] {} chunks still pending after flush",
            pending
        );
        let error = total.last_error.clone().unwrap_or_else(|| {
            StoreError::Unavailable(format!("{} chunks could not be saved", pending))
        });
        Err(PersistenceError::Store(error))
    }

    /// Load a chunk.
    ///
    /// A detached snapshot still waiting in the queue is newer than anything
    /// in the store and is returned without a store read.
    pub async fn load_chunk(&mut self, coord: ChunkCoord) -> PersistenceResult<LoadOutcome> {
        self.stats.loads += 1;

        if let Some(SaveQueueEntry {
            source: EntrySource::Detached(record),
            ..
        }) = queue_ops::get(&self.queue, coord)
        {
            self.stats.loads_from_queue += 1;
            let chunk = decompress(record, coord)?;
            return Ok(LoadOutcome::Loaded(chunk));
        }

        match chunk_loader::load_chunk(&*self.store, coord).await {
            Ok(LoadOutcome::NotFound) => {
                self.stats.loads_not_found += 1;
                Ok(LoadOutcome::NotFound)
            }
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.stats.loads_failed += 1;
                Err(e)
            }
        }
    }

    async fn drain(&mut self, max_saves: usize, time_budget: Option<Duration>) -> DrainReport {
        let started = Instant::now();
        let mut report = DrainReport::default();
        let mut retry: Vec<SaveQueueEntry> = Vec::new();

        while report.attempted < max_saves {
            if let Some(budget) = time_budget {
                if report.attempted > 0 && started.elapsed() >= budget {
                    report.time_budget_exhausted = true;
                    break;
                }
            }

            let Some(mut entry) = queue_ops::pop_front(&mut self.queue) else {
                break;
            };

            let Some(snapshot) = take_snapshot(&entry) else {
                report.skipped += 1;
                self.stats.entries_skipped += 1;
                continue;
            };

            report.attempted += 1;
            self.stats.saves_attempted += 1;

            let key = encode_chunk_key(entry.coord);
            let written = match encode_record(snapshot.record()) {
                Ok(payload) => {
                    let len = payload.len() as u64;
                    self.store
                        .set(&key, payload)
                        .await
                        .map(|()| len)
                        .map_err(PersistenceError::from)
                }
                Err(e) => Err(e),
            };

            match written {
                Ok(len) => {
                    self.backoff.record_success();
                    self.stats.bytes_written += len;

                    if snapshot.finish(true) {
                        report.saved += 1;
                        self.stats.saves_succeeded += 1;
                    } else {
                        log::debug!(
                            "[PersistenceService::drain] {} changed during save, requeued",
                            key
                        );
                        report.stale += 1;
                        self.stats.saves_stale += 1;
                        entry.attempts = 0;
                        retry.push(entry);
                    }
                }
                Err(e) => {
                    snapshot.finish(false);
                    entry.attempts += 1;
                    report.failed += 1;
                    self.stats.saves_failed += 1;
                    log::warn!(
                        "[PersistenceService::drain] Save of {} failed (attempt {}): {}",
                        key,
                        entry.attempts,
                        e
                    );
                    retry.push(entry);

                    let PersistenceError::Store(store_error) = e else {
                        continue;
                    };
                    report.last_error = Some(store_error);
                    if self.backoff.record_failure(self.tick) {
                        report.backed_off = true;
                        break;
                    }
                }
            }
        }

        // Back of the line; the pass above never sees them twice
        for entry in retry {
            queue_ops::requeue(&mut self.queue, entry);
        }

        report
    }
}

// Capture what to write for an entry. None when there is nothing to save.
fn take_snapshot(entry: &SaveQueueEntry) -> Option<Snapshot> {
    match &entry.source {
        EntrySource::Detached(record) => Some(Snapshot::Detached(Arc::clone(record))),
        EntrySource::Live(weak) => {
            let Some(handle) = weak.upgrade() else {
                log::warn!(
                    "[PersistenceService::drain] Chunk {} was dropped without detach_chunk, edits lost",
                    entry.coord
                );
                return None;
            };

            let (record, generation) = {
                let mut chunk = handle.write();
                if persistence_state(&chunk) == PersistenceState::Clean {
                    return None;
                }
                let record = compress(&chunk);
                (record, begin_save(&mut chunk))
            };

            Some(Snapshot::Live {
                handle,
                record,
                generation,
            })
        }
    }
}
