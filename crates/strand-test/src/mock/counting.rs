//! Wrappers observing how a stage is driven.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use strand_core::{Context, Reader, Result, Writer};

#[derive(Debug, Default)]
struct Counters {
    reads: AtomicUsize,
    writes: AtomicUsize,
}

/// Shared view of the calls made through a [`Counting`] stage.
#[derive(Debug, Clone, Default)]
pub struct Calls {
    counters: Arc<Counters>,
}

impl Calls {
    /// Returns the number of reads attempted.
    pub fn reads(&self) -> usize {
        self.counters.reads.load(Ordering::SeqCst)
    }

    /// Returns the number of writes attempted.
    pub fn writes(&self) -> usize {
        self.counters.writes.load(Ordering::SeqCst)
    }
}

/// Counts every read and write delegated to the wrapped stage.
#[derive(Debug)]
pub struct Counting<S> {
    inner: S,
    calls: Calls,
}

impl<S> Counting<S> {
    /// Wraps `inner`, counting calls on a fresh [`Calls`] handle.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Calls::default(),
        }
    }

    /// Returns a handle to the call counters.
    pub fn calls(&self) -> Calls {
        self.calls.clone()
    }
}

#[async_trait]
impl<T, S> Reader<T> for Counting<S>
where
    T: Send + 'static,
    S: Reader<T>,
{
    async fn read(&mut self, ctx: &Context) -> Result<T> {
        self.calls.counters.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(ctx).await
    }
}

#[async_trait]
impl<T, S> Writer<T> for Counting<S>
where
    T: Send + 'static,
    S: Writer<T>,
{
    async fn write(&mut self, ctx: &Context, value: T) -> Result<()> {
        self.calls.counters.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(ctx, value).await
    }
}

/// Sleeps for a fixed duration before delegating each call.
///
/// The sleep ignores cancellation, so tests can tell a stage that honors the
/// context apart from one that waits on its inner stage.
#[derive(Debug)]
pub struct Slow<S> {
    inner: S,
    delay: Duration,
}

impl<S> Slow<S> {
    /// Wraps `inner`, delaying every call by `delay`.
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<T, S> Reader<T> for Slow<S>
where
    T: Send + 'static,
    S: Reader<T>,
{
    async fn read(&mut self, ctx: &Context) -> Result<T> {
        tokio::time::sleep(self.delay).await;
        self.inner.read(ctx).await
    }
}

#[async_trait]
impl<T, S> Writer<T> for Slow<S>
where
    T: Send + 'static,
    S: Writer<T>,
{
    async fn write(&mut self, ctx: &Context, value: T) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.write(ctx, value).await
    }
}
