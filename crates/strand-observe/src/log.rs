//! Structured log records and the sinks receiving them.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strand_core::ContextSnapshot;
use strum::{Display, IntoStaticStr};

/// Tracing target used by [`TracingSink`].
pub const TRACING_TARGET_LOG: &str = "strand_observe::log";

/// Severity of a [`LogRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Level {
    /// The operation succeeded or hit an expected terminal condition.
    Info,
    /// The operation failed.
    Error,
}

/// Fields attached to a [`LogRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogFields {
    /// Error returned by the operation, rendered.
    pub err: Option<String>,
    /// Projection of the value, for single values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub val: Option<Value>,
    /// Number of values, for batches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub len: Option<usize>,
    /// Selected context values.
    pub ctx: ContextSnapshot,
}

/// One structured log event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// Severity.
    pub level: Level,
    /// Message, usually the tag of the decorator.
    #[serde(rename = "msg")]
    pub message: String,
    /// Structured fields.
    #[serde(flatten)]
    pub fields: LogFields,
}

/// Receives structured log records.
///
/// Sinks are shared between decorators and must not block for long: they are
/// called inline on every read or write.
pub trait LogSink: Send + Sync {
    /// Handles a single record.
    fn log(&self, record: &LogRecord);
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn log(&self, record: &LogRecord) {
        (**self).log(record);
    }
}

impl<S: LogSink + ?Sized> LogSink for &S {
    fn log(&self, record: &LogRecord) {
        (**self).log(record);
    }
}

/// Forwards records to [`tracing`] under [`TRACING_TARGET_LOG`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

struct Json<'a, T>(&'a T);

impl<T: Serialize> fmt::Display for Json<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self.0).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl LogSink for TracingSink {
    fn log(&self, record: &LogRecord) {
        let fields = &record.fields;
        let err = fields.err.as_deref();
        let val = fields.val.as_ref().map(Json);
        let ctx = Json(&fields.ctx);

        match record.level {
            Level::Info => tracing::info!(
                target: TRACING_TARGET_LOG,
                err,
                val = val.map(tracing::field::display),
                len = fields.len,
                ctx = %ctx,
                "{}",
                record.message
            ),
            Level::Error => tracing::error!(
                target: TRACING_TARGET_LOG,
                err,
                val = val.map(tracing::field::display),
                len = fields.len,
                ctx = %ctx,
                "{}",
                record.message
            ),
        }
    }
}

/// Keeps records in memory.
///
/// Clones share the same records, so one clone can be handed to a decorator
/// while another is inspected.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogSink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryLogSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the records received so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Returns the number of records received so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether no record was received.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for MemoryLogSink {
    fn log(&self, record: &LogRecord) {
        self.lock().push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(level: Level) -> LogRecord {
        LogRecord {
            level,
            message: "reads".to_owned(),
            fields: LogFields {
                err: None,
                val: Some(json!({ "id": 1 })),
                len: None,
                ctx: ContextSnapshot::default(),
            },
        }
    }

    #[test]
    fn test_record_serializes_flat() {
        let value = serde_json::to_value(record(Level::Error)).unwrap();

        assert_eq!(
            value,
            json!({ "level": "error", "msg": "reads", "err": null, "val": { "id": 1 }, "ctx": {} })
        );
    }

    #[test]
    fn test_level_names() {
        assert_eq!(Level::Info.to_string(), "info");
        let name: &'static str = Level::Error.into();
        assert_eq!(name, "error");
    }

    #[test]
    fn test_memory_sink_shares_records() {
        let sink = MemoryLogSink::new();
        let shared: Arc<dyn LogSink> = Arc::new(sink.clone());

        shared.log(&record(Level::Info));
        shared.log(&record(Level::Error));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.records()[1].level, Level::Error);
    }

    #[test]
    fn test_tracing_sink_accepts_records() {
        TracingSink.log(&record(Level::Info));
        TracingSink.log(&record(Level::Error));
    }
}
