//! The [`Reader`] half of the stream contract.

use std::collections::VecDeque;
use std::fmt;

use async_trait::async_trait;

use crate::{Context, Error, Result};

/// Produces values of type `T` one at a time.
///
/// A reader returns [`Error::StreamEnded`] once it has no more values and must
/// keep returning it on every later call. Any other error is operational and
/// says nothing about whether later reads may succeed.
#[async_trait]
pub trait Reader<T: Send + 'static>: Send {
    /// Reads the next value.
    async fn read(&mut self, ctx: &Context) -> Result<T>;
}

/// A [`Reader`] which also owns a resource that must be released.
#[async_trait]
pub trait ReadCloser<T: Send + 'static>: Reader<T> {
    /// Releases the underlying resource.
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
impl<T: Send + 'static, R: Reader<T> + ?Sized> Reader<T> for Box<R> {
    async fn read(&mut self, ctx: &Context) -> Result<T> {
        (**self).read(ctx).await
    }
}

#[async_trait]
impl<T: Send + 'static, R: Reader<T> + ?Sized> Reader<T> for &mut R {
    async fn read(&mut self, ctx: &Context) -> Result<T> {
        (**self).read(ctx).await
    }
}

/// An unset reader is already at its end.
#[async_trait]
impl<T: Send + 'static, R: Reader<T>> Reader<T> for Option<R> {
    async fn read(&mut self, ctx: &Context) -> Result<T> {
        match self {
            Some(reader) => reader.read(ctx).await,
            None => Err(Error::StreamEnded),
        }
    }
}

/// A reader that always returns [`Error::StreamEnded`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Ended;

#[async_trait]
impl<T: Send + 'static> Reader<T> for Ended {
    async fn read(&mut self, _ctx: &Context) -> Result<T> {
        Err(Error::StreamEnded)
    }
}

/// Implements [`Reader`] with a closure.
///
/// # Example
///
/// ```
/// use strand_core::{Context, Reader, ReaderFn};
///
/// # async fn example() -> strand_core::Result<()> {
/// let mut n = 0;
/// let mut reader = ReaderFn::new(move |_ctx: &Context| {
///     n += 1;
///     Ok(n)
/// });
///
/// assert_eq!(reader.read(&Context::new()).await?, 1);
/// # Ok(())
/// # }
/// ```
pub struct ReaderFn<F> {
    inner: F,
}

impl<F> ReaderFn<F> {
    /// Creates a reader from a closure.
    pub fn new<T>(inner: F) -> Self
    where
        F: FnMut(&Context) -> Result<T>,
    {
        Self { inner }
    }
}

#[async_trait]
impl<T, F> Reader<T> for ReaderFn<F>
where
    T: Send + 'static,
    F: FnMut(&Context) -> Result<T> + Send,
{
    async fn read(&mut self, ctx: &Context) -> Result<T> {
        (self.inner)(ctx)
    }
}

impl<F> fmt::Debug for ReaderFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderFn").finish_non_exhaustive()
    }
}

/// Implements [`ReadCloser`] with closures.
///
/// An unset read closure yields [`Error::StreamEnded`]; an unset close
/// closure succeeds without doing anything.
pub struct ReadCloserFn<R, C> {
    read: Option<R>,
    close: Option<C>,
}

impl<R, C> ReadCloserFn<R, C> {
    /// Creates a read-closer from optional closures.
    pub fn new(read: Option<R>, close: Option<C>) -> Self {
        Self { read, close }
    }
}

#[async_trait]
impl<T, R, C> Reader<T> for ReadCloserFn<R, C>
where
    T: Send + 'static,
    R: FnMut(&Context) -> Result<T> + Send,
    C: FnMut() -> Result<()> + Send,
{
    async fn read(&mut self, ctx: &Context) -> Result<T> {
        match self.read.as_mut() {
            Some(read) => read(ctx),
            None => Err(Error::StreamEnded),
        }
    }
}

#[async_trait]
impl<T, R, C> ReadCloser<T> for ReadCloserFn<R, C>
where
    T: Send + 'static,
    R: FnMut(&Context) -> Result<T> + Send,
    C: FnMut() -> Result<()> + Send,
{
    async fn close(&mut self) -> Result<()> {
        match self.close.as_mut() {
            Some(close) => close(),
            None => Ok(()),
        }
    }
}

impl<R, C> fmt::Debug for ReadCloserFn<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadCloserFn")
            .field("read", &self.read.is_some())
            .field("close", &self.close.is_some())
            .finish()
    }
}

/// A reader which yields a fixed sequence of values, then ends.
#[derive(Debug, Clone)]
pub struct Values<T> {
    values: VecDeque<T>,
}

impl<T> Values<T> {
    /// Creates a reader over `values`.
    pub fn new(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Returns the number of values not read yet.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

#[async_trait]
impl<T: Send + 'static> Reader<T> for Values<T> {
    async fn read(&mut self, _ctx: &Context) -> Result<T> {
        self.values.pop_front().ok_or(Error::StreamEnded)
    }
}

/// Returns a reader which yields `values` in order, then [`Error::StreamEnded`].
pub fn from_values<T>(values: impl IntoIterator<Item = T>) -> Values<T> {
    Values::new(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_reader_ends_and_stays_ended() {
        let ctx = Context::new();
        let mut reader = from_values([1, 2]);

        assert_eq!(reader.read(&ctx).await.unwrap(), 1);
        assert_eq!(reader.read(&ctx).await.unwrap(), 2);
        assert!(reader.read(&ctx).await.unwrap_err().is_stream_ended());
        assert!(reader.read(&ctx).await.unwrap_err().is_stream_ended());
    }

    #[tokio::test]
    async fn test_unset_reader_is_ended() {
        let ctx = Context::new();
        let mut reader: Option<Values<i32>> = None;

        assert!(reader.read(&ctx).await.unwrap_err().is_stream_ended());
        assert!(Reader::<i32>::read(&mut Ended, &ctx).await.unwrap_err().is_stream_ended());
    }

    #[tokio::test]
    async fn test_reader_fn() {
        let ctx = Context::new();
        let mut reader = ReaderFn::new(|_: &Context| Ok(1));

        assert_eq!(reader.read(&ctx).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_boxed_reader() {
        let ctx = Context::new();
        let mut reader: Box<dyn Reader<&str>> = Box::new(from_values(["a"]));

        assert_eq!(reader.read(&ctx).await.unwrap(), "a");
        assert!(reader.read(&ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_read_closer_fn() {
        type ReadFn = fn(&Context) -> Result<i32>;
        type CloseFn = fn() -> Result<()>;

        let ctx = Context::new();

        let read: ReadFn = |_| Ok(1);
        let close: CloseFn = || Ok(());

        let mut rc = ReadCloserFn::new(Some(read), Some(close));
        assert_eq!(rc.read(&ctx).await.unwrap(), 1);
        assert!(rc.close().await.is_ok());

        let mut rc = ReadCloserFn::<ReadFn, CloseFn>::new(None, None);
        assert!(rc.read(&ctx).await.unwrap_err().is_stream_ended());
        assert!(rc.close().await.is_ok());
    }
}
