//! Self-adjusting delay.

use std::time::Duration;

use async_trait::async_trait;
use strand_core::{Context, Reader, Result};
use tokio::time::Instant;

use crate::{TRACING_TARGET, pause};

/// Tops every read up to a target duration.
///
/// The wrapped read is timed and, if it finished early, followed by a sleep
/// for the remainder so that a read takes roughly `target` overall. Reads
/// slower than the target are returned right away. Failed reads, including
/// the end of the stream, are returned without sleeping.
///
/// When the wrapped reader walks several bounds (e.g. chained pages), the
/// target can be split evenly across them with [`AdaptiveReader::with_bounds`].
#[derive(Debug)]
pub struct AdaptiveReader<R> {
    reader: R,
    target: Duration,
}

impl<R> AdaptiveReader<R> {
    /// Wraps `reader`, pacing every read to `target`.
    pub fn new(reader: R, target: Duration) -> Self {
        Self { reader, target }
    }

    /// Divides the target across `bounds` bounds.
    ///
    /// Zero bounds leave the target unchanged.
    pub fn with_bounds(mut self, bounds: u32) -> Self {
        if bounds > 0 {
            self.target /= bounds;
        }
        self
    }

    /// Returns the per-read target.
    pub fn target(&self) -> Duration {
        self.target
    }

    /// Consumes the decorator and returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[async_trait]
impl<T, R> Reader<T> for AdaptiveReader<R>
where
    T: Send + 'static,
    R: Reader<T>,
{
    async fn read(&mut self, ctx: &Context) -> Result<T> {
        let start = Instant::now();
        let value = self.reader.read(ctx).await?;

        let remaining = self.target.saturating_sub(start.elapsed());
        if !remaining.is_zero() {
            tracing::trace!(
                target: TRACING_TARGET,
                remaining = ?remaining,
                "Topping up read"
            );
            pause(ctx, remaining).await;
        }

        Ok(value)
    }
}
