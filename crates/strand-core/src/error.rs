//! Error types and sentinels for stream operations.

use std::io;
use std::sync::Arc;

use strum::{AsRefStr, IntoStaticStr};

/// Result type for all stream operations.
///
/// This is a convenience type alias that defaults to using [`Error`] as the error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors returned by readers and writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The reader has no more values.
    StreamEnded,
    /// The writer refuses further values.
    SinkClosed,
    /// Byte-level I/O failed.
    Io,
    /// A value could not be encoded or decoded.
    Codec,
    /// A stage was configured with invalid parameters.
    InvalidConfig,
    /// Any other failure of a wrapped stage.
    Operation,
    /// An observability side channel failed.
    SideChannel,
    /// Two failures combined into one.
    Joined,
}

/// Unified error type for readers, writers and their decorators.
///
/// [`Error::StreamEnded`] and [`Error::SinkClosed`] are sentinels: they are
/// expected terminal conditions, never wrapped or combined by a decorator.
/// Every other variant is an operational failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Reader terminal condition: no value now or ever again.
    #[error("stream ended")]
    StreamEnded,

    /// Writer terminal condition: no write accepted now or ever again.
    #[error("sink closed")]
    SinkClosed,

    /// Underlying byte source or sink failed.
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// Encoding or decoding failed.
    #[error("Codec error: {0}")]
    Codec(Arc<serde_json::Error>),

    /// Invalid stage configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Generic operational failure with context.
    #[error("Operation failed: {operation} - {details}")]
    Operation { operation: String, details: String },

    /// Failure of an observability side channel (stats or log sink).
    #[error("Side channel error: {0}")]
    SideChannel(Box<Error>),

    /// Failure of the primary stage combined with a second failure.
    #[error("{primary}; {secondary}")]
    Joined {
        primary: Box<Error>,
        secondary: Box<Error>,
    },
}

impl Error {
    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an operation error with context.
    pub fn operation(op: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Operation {
            operation: op.into(),
            details: details.into(),
        }
    }

    /// Wrap an error raised by an observability side channel.
    pub fn side_channel(err: Error) -> Self {
        Self::SideChannel(Box::new(err))
    }

    /// Combine two optional errors, keeping both when both are present.
    ///
    /// Returns `None` when neither is set and the single error unchanged when
    /// only one is set.
    pub fn join(primary: Option<Error>, secondary: Option<Error>) -> Option<Error> {
        match (primary, secondary) {
            (None, None) => None,
            (Some(err), None) | (None, Some(err)) => Some(err),
            (Some(primary), Some(secondary)) => Some(Self::Joined {
                primary: Box::new(primary),
                secondary: Box::new(secondary),
            }),
        }
    }

    /// Combine the outcome of a primary stage with its side channel failure.
    ///
    /// The side channel error is wrapped in [`Error::SideChannel`] and joined
    /// after the primary error, if any.
    pub fn with_side_channel(primary: Option<Error>, side: Error) -> Self {
        let side = Self::side_channel(side);
        match primary {
            Some(primary) => Self::Joined {
                primary: Box::new(primary),
                secondary: Box::new(side),
            },
            None => side,
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StreamEnded => ErrorKind::StreamEnded,
            Self::SinkClosed => ErrorKind::SinkClosed,
            Self::Io(_) => ErrorKind::Io,
            Self::Codec(_) => ErrorKind::Codec,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            Self::Operation { .. } => ErrorKind::Operation,
            Self::SideChannel(_) => ErrorKind::SideChannel,
            Self::Joined { .. } => ErrorKind::Joined,
        }
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind().into()
    }

    /// Returns true for the reader sentinel.
    pub fn is_stream_ended(&self) -> bool {
        matches!(self, Self::StreamEnded)
    }

    /// Returns true for the writer sentinel.
    pub fn is_sink_closed(&self) -> bool {
        matches!(self, Self::SinkClosed)
    }

    /// Returns true for either sentinel.
    pub fn is_terminal(&self) -> bool {
        self.is_stream_ended() || self.is_sink_closed()
    }

    /// Checks whether this error, or any error combined into it, has `kind`.
    ///
    /// Side channel wrappers are looked through, so a closed stats sink is
    /// found with `contains(ErrorKind::SinkClosed)`.
    pub fn contains(&self, kind: ErrorKind) -> bool {
        if self.kind() == kind {
            return true;
        }

        match self {
            Self::SideChannel(inner) => inner.contains(kind),
            Self::Joined { primary, secondary } => {
                primary.contains(kind) || secondary.contains(kind)
            }
            _ => false,
        }
    }

    /// Returns the failure of the primary stage, looking through side channel
    /// failures. `None` when the primary stage succeeded.
    pub fn primary(&self) -> Option<&Error> {
        match self {
            Self::SideChannel(_) => None,
            Self::Joined { primary, .. } => Some(primary),
            other => Some(other),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            return Self::Io(Arc::new(err.into()));
        }

        Self::Codec(Arc::new(err))
    }
}
