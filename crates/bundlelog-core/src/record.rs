//! Log records and severities.
//!
//! A [`Record`] is a fully-formed log event as handed to the suppressor:
//! severity, logger name, rendered message text, epoch-ms timestamp, and
//! arbitrary structured metadata. Records are immutable once created; when
//! the suppressor reports a bundle it derives a copy with a rewritten
//! message (see [`Record::bundled`]) and never touches the original.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Current wall-clock time as epoch milliseconds.
#[must_use]
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

// =============================================================================
// Severity
// =============================================================================

/// Ordered log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!(
                "unknown severity: {s}. Expected one of: trace, debug, info, warn, error"
            )),
        }
    }
}

// =============================================================================
// Record
// =============================================================================

/// A fully-formed log record.
///
/// The suppressor only ever reads records; the one derived copy it produces
/// is the bundle summary handed downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Severity of the event.
    pub severity: Severity,
    /// Name of the originating logger.
    pub logger: String,
    /// Rendered message text (formatting already applied upstream).
    pub message: String,
    /// Epoch ms when the record was created.
    pub timestamp_ms: u64,
    /// Structured metadata carried alongside the message.
    ///
    /// Ignored by run-matching; copied verbatim onto bundle records.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Record {
    /// Create a record timestamped now.
    #[must_use]
    pub fn new(
        severity: Severity,
        logger: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            logger: logger.into(),
            message: message.into(),
            timestamp_ms: epoch_ms(),
            metadata: BTreeMap::new(),
        }
    }

    /// Override the creation timestamp (epoch ms).
    #[must_use]
    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Attach a metadata field.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Whether `other` belongs to the same run as this record.
    ///
    /// Runs are keyed on severity plus rendered message text only;
    /// timestamps and metadata are ignored.
    #[must_use]
    pub fn same_run(&self, other: &Self) -> bool {
        self.severity == other.severity && self.message == other.message
    }

    /// Derive the bundle record summarizing `count` repetitions.
    ///
    /// Same severity, logger, and metadata; message prefixed with the
    /// repetition count; timestamped at delivery (`now_ms`), not at the
    /// representative record's creation.
    #[must_use]
    pub fn bundled(&self, count: u64, now_ms: u64) -> Self {
        Self {
            severity: self.severity,
            logger: self.logger.clone(),
            message: format!("[{count} repetitions] {}", self.message),
            timestamp_ms: now_ms,
            metadata: self.metadata.clone(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
