#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for codec adapters.
pub const TRACING_TARGET_CODEC: &str = "strand_core::codec";

pub mod codec;
mod context;
mod duplex;
mod error;
mod reader;
mod writer;

pub use context::{Context, ContextSnapshot};
pub use duplex::{Queue, ReadWriter};
pub use error::{Error, ErrorKind, Result};
pub use reader::{Ended, ReadCloser, ReadCloserFn, Reader, ReaderFn, Values, from_values};
pub use writer::{Closed, Discard, WriteCloser, WriteCloserFn, Writer, WriterFn};

// Re-export so implementors do not need a direct dependency.
pub use async_trait::async_trait;
