//! bundlelog-core: flood suppression for streaming log pipelines
//!
//! When a producer emits the same message at the same severity many times
//! in rapid succession, this crate collapses the run into periodic
//! "bundle" entries reporting a repetition count instead of forwarding
//! every duplicate downstream. Output volume stays bounded during error
//! storms while frequency and the eventual resumption of distinct
//! messages remain visible.
//!
//! # Architecture
//!
//! ```text
//! producer ──► BundleSuppressor::observe ──► RunTracker ──► Sink
//!                      ▲                        │
//!                      └──── DelayFlusher ◄─────┘  (arm / force-flush)
//! ```
//!
//! The suppressor forwards the first `min_repetitions` occurrences of a
//! run individually, then only decade milestones (10, 20, 50, 100, ...).
//! Repetitions stranded between milestones are force-flushed as a bundle
//! after `max_delay` of silence, or when a distinct message supersedes
//! the run.
//!
//! # Example
//!
//! ```ignore
//! use bundlelog_core::{BundleSuppressor, MemorySink, Record, Severity};
//!
//! let suppressor = BundleSuppressor::new(Box::new(MemorySink::new()))?;
//! for _ in 0..1000 {
//!     suppressor.observe(&Record::new(Severity::Error, "db", "connection refused"));
//! }
//! // The sink saw ~11 records, not 1000.
//! ```
//!
//! # Modules
//!
//! - `record`: log records, severities, bundle derivation
//! - `schedule`: the logarithmic emission-threshold schedule
//! - `run_tracker`: the repetition-detection state machine
//! - `flusher`: the single-slot delayed-flush timer
//! - `suppressor`: the assembled, thread-safe engine
//! - `sink`: downstream dispatch interface
//! - `config`: validated configuration
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod config;
pub mod flusher;
pub mod record;
pub mod run_tracker;
pub mod schedule;
pub mod sink;
pub mod suppressor;

pub use config::{ConfigError, SuppressorConfig};
pub use record::{Record, Severity};
pub use run_tracker::{Action, RunTracker, SuppressStats};
pub use schedule::{MIN_REPETITIONS_MAX, is_emission_point};
pub use sink::{MemorySink, Sink};
pub use suppressor::{BundleSuppressor, SuppressorError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
