//! Fixed-delay decorators.

use std::time::Duration;

use async_trait::async_trait;
use strand_core::{Context, Error, Reader, Result, Writer};

use crate::TRACING_TARGET;

/// Sleeps for `duration` unless `ctx` is cancelled first.
///
/// Cancellation is checked before the timer, so an already cancelled context
/// returns right away even for a zero duration. Returns `false` when the wait
/// was cut short.
pub async fn pause(ctx: &Context, duration: Duration) -> bool {
    tokio::select! {
        biased;

        () = ctx.cancelled() => {
            tracing::trace!(target: TRACING_TARGET, "Pause interrupted by cancellation");
            false
        }

        () = tokio::time::sleep(duration) => true,
    }
}

/// Waits a fixed delay before every read.
///
/// The read always happens afterwards, with the same context, even when the
/// wait was interrupted by cancellation.
#[derive(Debug)]
pub struct DelayReader<R> {
    reader: R,
    delay: Duration,
}

impl<R> DelayReader<R> {
    /// Wraps `reader`, delaying every read by `delay`.
    pub fn new(reader: R, delay: Duration) -> Self {
        Self { reader, delay }
    }

    /// Returns the delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Consumes the decorator and returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[async_trait]
impl<T, R> Reader<T> for DelayReader<R>
where
    T: Send + 'static,
    R: Reader<T>,
{
    async fn read(&mut self, ctx: &Context) -> Result<T> {
        pause(ctx, self.delay).await;
        self.reader.read(ctx).await
    }
}

/// Waits a fixed delay after every write.
///
/// The write result is returned as is, errors included. A closed sink is
/// returned right away; any other outcome waits first.
#[derive(Debug)]
pub struct DelayWriter<W> {
    writer: W,
    delay: Duration,
}

impl<W> DelayWriter<W> {
    /// Wraps `writer`, delaying after every write by `delay`.
    pub fn new(writer: W, delay: Duration) -> Self {
        Self { writer, delay }
    }

    /// Returns the delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Consumes the decorator and returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<T, W> Writer<T> for DelayWriter<W>
where
    T: Send + 'static,
    W: Writer<T>,
{
    async fn write(&mut self, ctx: &Context, value: T) -> Result<()> {
        let result = self.writer.write(ctx, value).await;
        if !matches!(result, Err(Error::SinkClosed)) {
            pause(ctx, self.delay).await;
        }

        result
    }
}
