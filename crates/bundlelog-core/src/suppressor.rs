//! The assembled suppression engine.
//!
//! [`BundleSuppressor`] wires the pieces together: the [`RunTracker`]
//! state machine behind one mutex, the [`DelayFlusher`] worker, and the
//! downstream [`Sink`]. `observe` is the single synchronized entrypoint;
//! the timer callback re-enters through the same lock, so producer calls
//! and delayed flushes are mutually exclusive critical sections.
//!
//! Delivery happens while the lock is held. That is deliberate: the
//! ordering guarantee (delivered repetition counts are monotonically
//! non-decreasing, and a run's closing bundle always precedes the record
//! that superseded it) cannot survive unlocked dispatch under concurrent
//! producers. Sinks must therefore be quick and must not call back into
//! the suppressor.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use thiserror::Error;
use tracing::trace;

use crate::config::{ConfigError, SuppressorConfig};
use crate::flusher::DelayFlusher;
use crate::record::{Record, epoch_ms};
use crate::run_tracker::{Action, RunTracker, SuppressStats};
use crate::sink::Sink;

/// Errors constructing or reconfiguring a suppressor.
#[derive(Debug, Error)]
pub enum SuppressorError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to spawn the flush timer thread: {0}")]
    TimerSpawn(#[from] std::io::Error),
}

struct Inner {
    tracker: Mutex<RunTracker>,
    sink: Box<dyn Sink>,
}

impl Inner {
    /// A panicked producer must not wedge logging for everyone else, so
    /// poisoning is recovered rather than propagated.
    fn lock_tracker(&self) -> MutexGuard<'_, RunTracker> {
        self.tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Timer-callback path: flush the pending bundle unless the firing
    /// deadline went stale.
    fn force_flush(&self, generation: u64) {
        let now_ms = epoch_ms();
        let mut tracker = self.lock_tracker();
        if let Some(bundle) = tracker.force_flush(generation, now_ms) {
            self.sink.deliver(&bundle);
        } else {
            trace!(generation, "ignoring stale delay flush");
        }
    }
}

/// Flood suppressor for one logger instance.
///
/// Feed it fully-formed, already-filtered records via [`observe`]; it
/// forwards originals, swallows duplicates, and emits bundle summaries on
/// the logarithmic schedule. Dropping the suppressor flushes any pending
/// bundle and stops the timer worker.
///
/// [`observe`]: BundleSuppressor::observe
pub struct BundleSuppressor {
    inner: Arc<Inner>,
    flusher: DelayFlusher,
}

impl core::fmt::Debug for BundleSuppressor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BundleSuppressor").finish_non_exhaustive()
    }
}

impl BundleSuppressor {
    /// Create a suppressor with the default configuration.
    pub fn new(sink: Box<dyn Sink>) -> Result<Self, SuppressorError> {
        Self::with_config(SuppressorConfig::default(), sink)
    }

    /// Create a suppressor with the given configuration.
    pub fn with_config(
        config: SuppressorConfig,
        sink: Box<dyn Sink>,
    ) -> Result<Self, SuppressorError> {
        config.validate()?;
        let inner = Arc::new(Inner {
            tracker: Mutex::new(RunTracker::new(&config)),
            sink,
        });
        // The worker holds a Weak so a forgotten suppressor can still be
        // torn down; a firing timer after teardown simply finds nothing.
        let weak: Weak<Inner> = Arc::downgrade(&inner);
        let flusher = DelayFlusher::spawn(move |generation| {
            if let Some(inner) = weak.upgrade() {
                inner.force_flush(generation);
            }
        })?;
        Ok(Self { inner, flusher })
    }

    /// Process one incoming record: deliver it, count it silently, or
    /// deliver a bundle summary, per the run tracker's decision.
    pub fn observe(&self, record: &Record) {
        let now_ms = epoch_ms();
        let mut tracker = self.inner.lock_tracker();
        let obs = tracker.observe(record, now_ms);

        // Re-arming replaces the pending deadline anyway; an explicit
        // cancel is only needed when nothing new gets armed.
        let rearming = matches!(obs.action, Action::Suppress(Some(_)));
        if obs.cancel_pending && !rearming {
            self.flusher.cancel();
        }

        match obs.action {
            Action::EmitOriginal => self.inner.sink.deliver(record),
            Action::EmitBundle(bundle) => self.inner.sink.deliver(&bundle),
            Action::Suppress(Some(arm)) => self.flusher.arm(arm.delay, arm.generation),
            Action::Suppress(None) => {}
            Action::FlushThenEmit(bundle) => {
                self.inner.sink.deliver(&bundle);
                self.inner.sink.deliver(record);
            }
        }
        // Guard drops here: state transition and delivery were atomic.
    }

    /// Emit the pending bundle immediately, if the active run is dirty.
    ///
    /// Useful at shutdown; also invoked by `Drop` so trailing repetitions
    /// are not lost.
    pub fn flush_pending(&self) {
        let now_ms = epoch_ms();
        let mut tracker = self.inner.lock_tracker();
        if let Some(bundle) = tracker.flush_dirty(now_ms) {
            self.inner.sink.deliver(&bundle);
        }
    }

    /// Reconfigure the force-flush window. Zero disables forced flushes.
    pub fn set_max_delay(&self, max_delay: Duration) {
        self.inner.lock_tracker().set_max_delay(max_delay);
    }

    /// Reconfigure how many leading repetitions are reported individually.
    pub fn set_min_repetitions(&self, min_repetitions: u32) -> Result<(), ConfigError> {
        self.inner.lock_tracker().set_min_repetitions(min_repetitions)
    }

    /// Snapshot of the suppression counters.
    #[must_use]
    pub fn stats(&self) -> SuppressStats {
        self.inner.lock_tracker().stats()
    }
}

impl Drop for BundleSuppressor {
    fn drop(&mut self) {
        self.flush_pending();
        // `flusher` drops after this, joining the worker thread.
    }
}

// =============================================================================
// Tests
// =============================================================================
