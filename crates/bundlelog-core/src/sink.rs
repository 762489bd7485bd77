//! Downstream dispatch interface.
//!
//! The suppressor hands surviving records — originals and bundle
//! summaries — to a [`Sink`]. Formatting, fan-out to files/consoles/
//! network handlers, and failure handling all live behind this trait;
//! the suppressor calls `deliver` zero, one, or two times per observed
//! record and never depends on what the sink does with it.

use std::sync::Mutex;

use crate::record::Record;

/// Where surviving records go.
///
/// `deliver` is called with the per-suppressor lock held, so records
/// arrive in processing order; implementations must not call back into
/// the suppressor.
pub trait Sink: Send + Sync {
    /// Forward one record to the configured handlers.
    fn deliver(&self, record: &Record);
}

/// Sink that appends delivered records to an in-memory buffer.
///
/// Ships for tests and demos; `drain`/`snapshot` expose what got through
/// the suppressor.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything delivered so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Record> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Take everything delivered so far, leaving the sink empty.
    #[must_use]
    pub fn drain(&self) -> Vec<Record> {
        std::mem::take(
            &mut *self
                .records
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        )
    }

    /// Number of records delivered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been delivered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for MemorySink {
    fn deliver(&self, record: &Record) {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(record.clone());
    }
}

// =============================================================================
// Tests
// =============================================================================
