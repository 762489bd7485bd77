//! Single-slot delayed-flush timer.
//!
//! Holds at most one pending deadline per suppressor. Arming replaces any
//! previous deadline, cancellation is idempotent, and a deadline that
//! elapses undisturbed invokes the fire callback with the generation it
//! was armed under. The callback re-enters the suppressor's flush path,
//! which compares generations and no-ops when the targeted run was
//! already flushed or superseded — so cancellation only needs to be
//! best-effort and no timer-race guarantees are required from the OS.
//!
//! Implemented as one worker thread per suppressor, parked on a crossbeam
//! channel: `recv_deadline` doubles as both the wait-for-deadline and the
//! wake-on-control-message path. The core stays free of async runtimes so
//! it can run on whatever threads the log producers own.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use tracing::trace;

enum Msg {
    Arm { deadline: Instant, generation: u64 },
    Cancel,
    Shutdown,
}

/// Cancellable single-slot deferred action.
#[derive(Debug)]
pub struct DelayFlusher {
    tx: Sender<Msg>,
    worker: Option<JoinHandle<()>>,
}

impl DelayFlusher {
    /// Spawn the timer worker. `on_fire` runs on the worker thread with
    /// the generation the elapsed deadline was armed under.
    pub fn spawn<F>(on_fire: F) -> std::io::Result<Self>
    where
        F: Fn(u64) + Send + 'static,
    {
        let (tx, rx) = channel::unbounded();
        let worker = std::thread::Builder::new()
            .name("bundlelog-flush".to_string())
            .spawn(move || {
                let mut pending: Option<(Instant, u64)> = None;
                loop {
                    let msg = match pending {
                        Some((deadline, generation)) => match rx.recv_deadline(deadline) {
                            Ok(msg) => msg,
                            Err(RecvTimeoutError::Timeout) => {
                                pending = None;
                                trace!(generation, "delay timer elapsed");
                                on_fire(generation);
                                continue;
                            }
                            Err(RecvTimeoutError::Disconnected) => return,
                        },
                        None => match rx.recv() {
                            Ok(msg) => msg,
                            Err(_) => return,
                        },
                    };
                    match msg {
                        Msg::Arm {
                            deadline,
                            generation,
                        } => pending = Some((deadline, generation)),
                        Msg::Cancel => pending = None,
                        Msg::Shutdown => return,
                    }
                }
            })?;
        Ok(Self {
            tx,
            worker: Some(worker),
        })
    }

    /// Schedule the fire callback after `delay`, replacing any pending
    /// deadline. A zero delay is treated as disabled and ignored (the
    /// tracker never requests one, but the guard keeps the contract
    /// local).
    pub fn arm(&self, delay: Duration, generation: u64) {
        if delay.is_zero() {
            return;
        }
        let _ = self.tx.send(Msg::Arm {
            deadline: Instant::now() + delay,
            generation,
        });
    }

    /// Discard any pending deadline. Idempotent; safe with nothing armed.
    /// Best-effort: a deadline that is elapsing concurrently may still
    /// fire, and the callback's staleness check absorbs it.
    pub fn cancel(&self) {
        let _ = self.tx.send(Msg::Cancel);
    }
}

impl Drop for DelayFlusher {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
