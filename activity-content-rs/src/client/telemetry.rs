//! Usage records for completed generation calls
//!
//! A record is emitted after every call that actually reached the client,
//! whether it succeeded, failed or timed out. Sinks must not fail or block
//! for long; storage of the records lives outside this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// How a call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "kind", rename_all = "lowercase")]
pub enum CallOutcome {
    Success,
    Failure(ErrorKind),
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success)
    }
}

/// Cost and usage data for one external call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub model: String,
    /// Prompt size in characters
    pub input_size: usize,
    /// Completion size in characters, 0 on failure
    pub output_size: usize,
    pub duration_ms: u64,
    pub outcome: CallOutcome,
    pub timestamp: DateTime<Utc>,
}

/// Receiver of call records
pub trait TelemetrySink: Send + Sync {
    fn record(&self, record: &CallRecord);
}

/// Writes each record to the log at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTelemetrySink;

impl TelemetrySink for LogTelemetrySink {
    fn record(&self, record: &CallRecord) {
        match record.outcome {
            CallOutcome::Success => log::debug!(
                "Generation call to {} succeeded in {}ms ({} chars in, {} chars out)",
                record.model,
                record.duration_ms,
                record.input_size,
                record.output_size
            ),
            CallOutcome::Failure(kind) => log::debug!(
                "Generation call to {} failed with {} after {}ms ({} chars in)",
                record.model,
                kind,
                record.duration_ms,
                record.input_size
            ),
        }
    }
}

/// Discards every record
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _record: &CallRecord) {}
}
