//! Repetition-run tracking state machine.
//!
//! The tracker owns the single active run — the maximal consecutive
//! sequence of records sharing severity and message text — and decides,
//! for every incoming record, one of four actions: deliver it unchanged,
//! deliver a bundle summary, suppress it silently (optionally arming the
//! delayed flush), or close out a superseded dirty run before delivering
//! the newcomer.
//!
//! The tracker is deliberately free of clocks, threads, and locks: callers
//! inject `now_ms` and serialize access (see
//! [`crate::suppressor::BundleSuppressor`]), so every decision here is
//! deterministic and unit-testable without sleeping.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SuppressorConfig};
use crate::record::Record;
use crate::schedule::{MIN_REPETITIONS_MAX, is_emission_point};

// =============================================================================
// Actions
// =============================================================================

/// Request to arm the delayed flush for the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerArm {
    /// How long to wait for the next repetition before force-flushing.
    pub delay: Duration,
    /// Generation stamp; a firing timer whose stamp no longer matches the
    /// tracker is stale and must no-op.
    pub generation: u64,
}

/// What the caller must do with the record it just observed.
#[derive(Debug, Clone)]
pub enum Action {
    /// Deliver the incoming record unchanged.
    EmitOriginal,
    /// Deliver this bundle summary for the continuing run instead of the
    /// incoming record.
    EmitBundle(Record),
    /// Deliver nothing; the repetition was counted silently. `Some` when
    /// the delayed flush should be (re-)armed.
    Suppress(Option<TimerArm>),
    /// The previous run was dirty: deliver this closing bundle first, then
    /// the incoming record unchanged.
    FlushThenEmit(Record),
}

/// Result of observing one record.
#[derive(Debug, Clone)]
pub struct Observation {
    /// The action to take.
    pub action: Action,
    /// Whether a previously armed timer should be physically cancelled.
    /// (Staleness detection makes this an optimization, not a correctness
    /// requirement.)
    pub cancel_pending: bool,
}

// =============================================================================
// Statistics
// =============================================================================

/// Serializable counters for one suppressor instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuppressStats {
    /// Records observed (post-filter arrivals).
    pub records_observed: u64,
    /// Deliveries handed downstream (originals plus bundles).
    pub records_delivered: u64,
    /// Records counted silently.
    pub records_suppressed: u64,
    /// Bundle summaries emitted (threshold, run-switch, or forced).
    pub bundles_emitted: u64,
    /// Bundles emitted by the delay timer rather than an emission point.
    pub forced_flushes: u64,
    /// Distinct runs started.
    pub runs_started: u64,
    /// Timer firings that found their run already flushed or superseded.
    pub stale_timer_fires: u64,
}

// =============================================================================
// RunTracker
// =============================================================================

/// The active run: representative record, running count, and the count
/// last reflected in any emitted output.
#[derive(Debug, Clone)]
struct ActiveRun {
    record: Record,
    count: u64,
    last_emitted: u64,
}

impl ActiveRun {
    /// A run is dirty iff it holds repetitions not yet reported.
    fn dirty(&self) -> bool {
        debug_assert!(self.last_emitted <= self.count);
        self.last_emitted < self.count
    }
}

/// Repetition-detection state machine for one logger instance.
#[derive(Debug)]
pub struct RunTracker {
    min_repetitions: u32,
    max_delay: Duration,
    active: Option<ActiveRun>,
    /// Bumped on every observe; logically cancels any armed timer before
    /// the new record is evaluated, so a timer/record race always resolves
    /// in favor of the record.
    generation: u64,
    timer_armed: bool,
    stats: SuppressStats,
}

impl RunTracker {
    /// Create a tracker from a validated configuration.
    #[must_use]
    pub fn new(config: &SuppressorConfig) -> Self {
        Self {
            min_repetitions: config.min_repetitions,
            max_delay: config.max_delay(),
            active: None,
            generation: 0,
            timer_armed: false,
            stats: SuppressStats::default(),
        }
    }

    /// Observe one incoming record and decide what to do with it.
    pub fn observe(&mut self, record: &Record, now_ms: u64) -> Observation {
        self.generation += 1;
        let cancel_pending = std::mem::take(&mut self.timer_armed);
        self.stats.records_observed += 1;

        if let Some(run) = self.active.as_mut() {
            if run.record.same_run(record) {
                run.count += 1;
                let action = if run.count <= u64::from(self.min_repetitions) {
                    // Leading repetitions are reported individually.
                    run.last_emitted = run.count;
                    self.stats.records_delivered += 1;
                    Action::EmitOriginal
                } else if is_emission_point(run.count, self.min_repetitions) {
                    run.last_emitted = run.count;
                    self.stats.records_delivered += 1;
                    self.stats.bundles_emitted += 1;
                    Action::EmitBundle(run.record.bundled(run.count, now_ms))
                } else {
                    // Stays dirty; wait for a milestone, the timer, or a
                    // distinct record.
                    self.stats.records_suppressed += 1;
                    let arm = if self.max_delay.is_zero() {
                        None
                    } else {
                        self.timer_armed = true;
                        Some(TimerArm {
                            delay: self.max_delay,
                            generation: self.generation,
                        })
                    };
                    Action::Suppress(arm)
                };
                return Observation {
                    action,
                    cancel_pending,
                };
            }
        }

        // Run switch (or very first record): close out the previous run if
        // it still holds unreported repetitions, then start fresh.
        let closing = self
            .active
            .take()
            .filter(ActiveRun::dirty)
            .map(|run| run.record.bundled(run.count, now_ms));

        self.active = Some(ActiveRun {
            record: record.clone(),
            count: 1,
            last_emitted: 1,
        });
        self.stats.runs_started += 1;
        self.stats.records_delivered += 1;

        let action = match closing {
            Some(bundle) => {
                self.stats.records_delivered += 1;
                self.stats.bundles_emitted += 1;
                Action::FlushThenEmit(bundle)
            }
            None => Action::EmitOriginal,
        };
        Observation {
            action,
            cancel_pending,
        }
    }

    /// The delayed-flush path: produce the pending bundle, or `None` when
    /// the firing timer is stale (an event intervened since it was armed)
    /// or the run has nothing unreported.
    pub fn force_flush(&mut self, generation: u64, now_ms: u64) -> Option<Record> {
        if generation != self.generation {
            self.stats.stale_timer_fires += 1;
            return None;
        }
        self.timer_armed = false;
        let run = self.active.as_mut()?;
        if !run.dirty() {
            self.stats.stale_timer_fires += 1;
            return None;
        }
        run.last_emitted = run.count;
        self.stats.records_delivered += 1;
        self.stats.bundles_emitted += 1;
        self.stats.forced_flushes += 1;
        Some(run.record.bundled(run.count, now_ms))
    }

    /// Unconditional flush of the pending bundle (shutdown path): emits
    /// the dirty run's bundle regardless of timer state, invalidating any
    /// armed deadline.
    pub fn flush_dirty(&mut self, now_ms: u64) -> Option<Record> {
        self.generation += 1;
        self.timer_armed = false;
        let run = self.active.as_mut()?;
        if !run.dirty() {
            return None;
        }
        run.last_emitted = run.count;
        self.stats.records_delivered += 1;
        self.stats.bundles_emitted += 1;
        Some(run.record.bundled(run.count, now_ms))
    }

    /// Reconfigure the force-flush window. Zero disables forced flushes:
    /// below-threshold repetitions stay pending until superseded.
    pub fn set_max_delay(&mut self, max_delay: Duration) {
        self.max_delay = max_delay;
    }

    /// Reconfigure how many leading repetitions are reported individually.
    pub fn set_min_repetitions(&mut self, min_repetitions: u32) -> Result<(), ConfigError> {
        if min_repetitions > MIN_REPETITIONS_MAX {
            return Err(ConfigError::MinRepetitionsTooLarge {
                value: min_repetitions,
            });
        }
        self.min_repetitions = min_repetitions;
        Ok(())
    }

    /// Repetition count of the active run, if any.
    #[must_use]
    pub fn active_count(&self) -> Option<u64> {
        self.active.as_ref().map(|run| run.count)
    }

    /// Whether the active run holds unreported repetitions.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.active.as_ref().is_some_and(ActiveRun::dirty)
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> SuppressStats {
        self.stats.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
