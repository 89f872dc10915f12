#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for the decorators themselves.
pub const TRACING_TARGET: &str = "strand_observe";

mod config;
mod log;
mod logged;
mod stats;
mod tee;

pub use config::{ObserveConfig, ObserveConfigBuilder, ObserveConfigBuilderError, UNSET_TAG};
pub use log::{Level, LogFields, LogRecord, LogSink, MemoryLogSink, TRACING_TARGET_LOG, TracingSink};
pub use logged::{LogBatchReader, LogFormatter, LogReader, LogWriter};
pub use stats::{BatchedStats, StreamedStats};
pub use tee::{BatchedTeeReader, BatchedTeeWriter, Formatter, StreamedTeeReader, StreamedTeeWriter};
