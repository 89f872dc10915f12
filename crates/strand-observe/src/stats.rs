//! Statistics records written by the tee decorators.

use jiff::{SignedDuration, Timestamp};
use serde::{Serialize, Serializer};
use strand_core::{Context, ContextSnapshot, Error};

use crate::ObserveConfig;

/// Record of a single value passing through a streamed tee.
#[derive(Debug, Clone, Serialize)]
pub struct StreamedStats<U> {
    /// Tag of the decorator that produced the record.
    pub tag: String,
    /// Projection of the value, if the operation succeeded and a formatter
    /// is configured.
    #[serde(rename = "val")]
    pub value: Option<U>,
    /// Failure of the wrapped operation.
    #[serde(rename = "err", serialize_with = "serialize_error")]
    pub error: Option<Error>,
    /// Selected context values.
    pub ctx: ContextSnapshot,
    /// When the record was taken.
    pub stamp: Timestamp,
    /// Time since the previous record of the same decorator.
    pub delta: SignedDuration,
}

/// Record of a single batch passing through a batched tee.
#[derive(Debug, Clone, Serialize)]
pub struct BatchedStats {
    /// Tag of the decorator that produced the record.
    pub tag: String,
    /// Number of values in the batch, zero when the operation failed.
    pub len: usize,
    /// Failure of the wrapped operation.
    #[serde(rename = "err", serialize_with = "serialize_error")]
    pub error: Option<Error>,
    /// Selected context values.
    pub ctx: ContextSnapshot,
    /// When the record was taken.
    pub stamp: Timestamp,
    /// Time since the previous record of the same decorator.
    pub delta: SignedDuration,
}

fn serialize_error<S: Serializer>(error: &Option<Error>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(err) => serializer.collect_str(err),
        None => serializer.serialize_none(),
    }
}

/// Fields shared by both record kinds.
#[derive(Debug)]
pub(crate) struct Header {
    tag: String,
    ctx: ContextSnapshot,
    stamp: Timestamp,
    delta: SignedDuration,
}

impl Header {
    pub(crate) fn streamed<U>(self, value: Option<U>, error: Option<Error>) -> StreamedStats<U> {
        StreamedStats {
            tag: self.tag,
            value,
            error,
            ctx: self.ctx,
            stamp: self.stamp,
            delta: self.delta,
        }
    }

    pub(crate) fn batched(self, len: usize, error: Option<Error>) -> BatchedStats {
        BatchedStats {
            tag: self.tag,
            len,
            error,
            ctx: self.ctx,
            stamp: self.stamp,
            delta: self.delta,
        }
    }
}

/// Per-decorator state producing record headers.
///
/// The first delta is measured from construction, every later one from the
/// previous record.
#[derive(Debug)]
pub(crate) struct Stamper {
    config: ObserveConfig,
    last: Timestamp,
}

impl Stamper {
    pub(crate) fn new(config: ObserveConfig) -> Self {
        Self {
            config,
            last: Timestamp::now(),
        }
    }

    pub(crate) fn config(&self) -> &ObserveConfig {
        &self.config
    }

    pub(crate) fn header(&mut self, ctx: &Context) -> Header {
        let stamp = Timestamp::now();
        let delta = stamp.duration_since(self.last);
        self.last = stamp;

        Header {
            tag: self.config.tag().to_owned(),
            ctx: self.config.snapshot(ctx),
            stamp,
            delta,
        }
    }
}
