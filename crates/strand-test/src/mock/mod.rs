//! Test doubles for readers and writers.
//!
//! These stages are meant for unit and integration tests: they share state
//! behind locks and atomics so a test can inspect a stage after moving it
//! into a decorator or a pump.

mod counting;
mod failing;
mod recorder;
mod scripted;

pub use counting::{Calls, Counting, Slow};
pub use failing::Failing;
pub use recorder::Recorder;
pub use scripted::Scripted;
