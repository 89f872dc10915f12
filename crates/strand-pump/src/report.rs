//! Outcome of a finished pump.

use strand_core::Error;

/// Why a pump stopped.
///
/// The reason is recorded for inspection only; the pump never retries.
#[derive(Debug, Clone)]
pub enum StopReason {
    /// The context was cancelled.
    Cancelled,
    /// The reader or the writer was missing.
    Unconfigured,
    /// The reader failed, [`Error::StreamEnded`] included.
    Reader(Error),
    /// The writer failed, [`Error::SinkClosed`] included.
    Writer(Error),
}

impl StopReason {
    /// Returns the error that stopped the pump, if any.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Reader(err) | Self::Writer(err) => Some(err),
            Self::Cancelled | Self::Unconfigured => None,
        }
    }

    /// Returns whether the pump ran until a stage reached its terminal
    /// condition or was cancelled, rather than failing.
    pub fn is_graceful(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Unconfigured => false,
            Self::Reader(err) | Self::Writer(err) => err.is_terminal(),
        }
    }
}

/// Summary of a finished pump.
#[derive(Debug, Clone)]
pub struct PumpReport {
    /// Number of successful reads.
    pub reads: u64,
    /// Number of successful writes.
    pub writes: u64,
    /// Why the pump stopped.
    pub stop: StopReason,
}

impl PumpReport {
    pub(crate) fn unconfigured() -> Self {
        Self {
            reads: 0,
            writes: 0,
            stop: StopReason::Unconfigured,
        }
    }
}
