#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for pacing.
pub const TRACING_TARGET: &str = "strand_pace";

mod adaptive;
mod delay;

pub use adaptive::AdaptiveReader;
pub use delay::{DelayReader, DelayWriter, pause};
