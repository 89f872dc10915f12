#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for the pump lifecycle.
pub const TRACING_TARGET: &str = "strand_pump";

mod pump;
mod report;

pub use pump::{Pump, PumpHandle};
pub use report::{PumpReport, StopReason};
