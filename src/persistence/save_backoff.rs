//! Save Backoff
//!
//! Store-level circuit breaker for the save scheduler. After
//! `failure_threshold` consecutive failed writes the scheduler sits out a
//! number of ticks that doubles with every further failure, up to
//! `max_backoff_ticks`. Any successful write resets it.
//!
//! Failed chunks stay dirty and queued the whole time; backoff only delays
//! the next attempt against a store that is clearly unavailable.

#[derive(Debug, Clone)]
pub struct SaveBackoff {
    /// 0 disables backoff
    failure_threshold: u32,
    max_backoff_ticks: u64,
    consecutive_failures: u32,
    current_backoff_ticks: u64,
    resume_at_tick: u64,
}

impl SaveBackoff {
    pub fn new(failure_threshold: u32, max_backoff_ticks: u64) -> Self {
        Self {
            failure_threshold,
            max_backoff_ticks,
            consecutive_failures: 0,
            current_backoff_ticks: 0,
            resume_at_tick: 0,
        }
    }

    /// True while `tick` is inside a backoff window
    pub fn is_backing_off(&self, tick: u64) -> bool {
        tick < self.resume_at_tick
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// First tick at which draining resumes
    pub fn resume_at_tick(&self) -> u64 {
        self.resume_at_tick
    }

    pub fn record_success(&mut self) {
        if self.consecutive_failures > 0 {
            log::info!(
                "[SaveBackoff] Store recovered after {} failed writes",
                self.consecutive_failures
            );
        }
        self.consecutive_failures = 0;
        self.current_backoff_ticks = 0;
        self.resume_at_tick = 0;
    }

    /// Register a failed write at `tick`. Returns true if a backoff window
    /// was opened, in which case the caller should stop issuing writes.
    pub fn record_failure(&mut self, tick: u64) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.failure_threshold == 0 || self.consecutive_failures < self.failure_threshold {
            return false;
        }

        self.current_backoff_ticks = if self.current_backoff_ticks == 0 {
            1
        } else {
            self.current_backoff_ticks.saturating_mul(2)
        }
        .min(self.max_backoff_ticks.max(1));
        self.resume_at_tick = tick.saturating_add(self.current_backoff_ticks + 1);

        log::warn!(
            "[SaveBackoff] {} consecutive failed writes, pausing saves for {} ticks",
            self.consecutive_failures,
            self.current_backoff_ticks
        );
        true
    }
}
