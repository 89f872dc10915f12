//! The [`Writer`] half of the stream contract.

use std::fmt;

use async_trait::async_trait;

use crate::{Context, Error, Result};

/// Consumes values of type `T` one at a time.
///
/// A writer returns [`Error::SinkClosed`] once it refuses further values and
/// must keep returning it on every later call.
#[async_trait]
pub trait Writer<T: Send + 'static>: Send {
    /// Writes one value.
    async fn write(&mut self, ctx: &Context, value: T) -> Result<()>;
}

/// A [`Writer`] which also owns a resource that must be released.
#[async_trait]
pub trait WriteCloser<T: Send + 'static>: Writer<T> {
    /// Releases the underlying resource.
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
impl<T: Send + 'static, W: Writer<T> + ?Sized> Writer<T> for Box<W> {
    async fn write(&mut self, ctx: &Context, value: T) -> Result<()> {
        (**self).write(ctx, value).await
    }
}

#[async_trait]
impl<T: Send + 'static, W: Writer<T> + ?Sized> Writer<T> for &mut W {
    async fn write(&mut self, ctx: &Context, value: T) -> Result<()> {
        (**self).write(ctx, value).await
    }
}

/// An unset writer is already closed.
#[async_trait]
impl<T: Send + 'static, W: Writer<T>> Writer<T> for Option<W> {
    async fn write(&mut self, ctx: &Context, value: T) -> Result<()> {
        match self {
            Some(writer) => writer.write(ctx, value).await,
            None => Err(Error::SinkClosed),
        }
    }
}

/// A writer that always returns [`Error::SinkClosed`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Closed;

#[async_trait]
impl<T: Send + 'static> Writer<T> for Closed {
    async fn write(&mut self, _ctx: &Context, _value: T) -> Result<()> {
        Err(Error::SinkClosed)
    }
}

/// A writer that accepts and drops every value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

#[async_trait]
impl<T: Send + 'static> Writer<T> for Discard {
    async fn write(&mut self, _ctx: &Context, _value: T) -> Result<()> {
        Ok(())
    }
}

/// Implements [`Writer`] with a closure.
pub struct WriterFn<F> {
    inner: F,
}

impl<F> WriterFn<F> {
    /// Creates a writer from a closure.
    pub fn new<T>(inner: F) -> Self
    where
        F: FnMut(&Context, T) -> Result<()>,
    {
        Self { inner }
    }
}

#[async_trait]
impl<T, F> Writer<T> for WriterFn<F>
where
    T: Send + 'static,
    F: FnMut(&Context, T) -> Result<()> + Send,
{
    async fn write(&mut self, ctx: &Context, value: T) -> Result<()> {
        (self.inner)(ctx, value)
    }
}

impl<F> fmt::Debug for WriterFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterFn").finish_non_exhaustive()
    }
}

/// Implements [`WriteCloser`] with closures.
///
/// An unset write closure yields [`Error::SinkClosed`]; an unset close
/// closure succeeds without doing anything.
pub struct WriteCloserFn<W, C> {
    write: Option<W>,
    close: Option<C>,
}

impl<W, C> WriteCloserFn<W, C> {
    /// Creates a write-closer from optional closures.
    pub fn new(write: Option<W>, close: Option<C>) -> Self {
        Self { write, close }
    }
}

#[async_trait]
impl<T, W, C> Writer<T> for WriteCloserFn<W, C>
where
    T: Send + 'static,
    W: FnMut(&Context, T) -> Result<()> + Send,
    C: FnMut() -> Result<()> + Send,
{
    async fn write(&mut self, ctx: &Context, value: T) -> Result<()> {
        match self.write.as_mut() {
            Some(write) => write(ctx, value),
            None => Err(Error::SinkClosed),
        }
    }
}

#[async_trait]
impl<T, W, C> WriteCloser<T> for WriteCloserFn<W, C>
where
    T: Send + 'static,
    W: FnMut(&Context, T) -> Result<()> + Send,
    C: FnMut() -> Result<()> + Send,
{
    async fn close(&mut self) -> Result<()> {
        match self.close.as_mut() {
            Some(close) => close(),
            None => Ok(()),
        }
    }
}

impl<W, C> fmt::Debug for WriteCloserFn<W, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteCloserFn")
            .field("write", &self.write.is_some())
            .field("close", &self.close.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unset_writer_is_closed() {
        let ctx = Context::new();
        let mut writer: Option<Discard> = None;

        assert!(writer.write(&ctx, 1).await.unwrap_err().is_sink_closed());
        assert!(writer.write(&ctx, 2).await.unwrap_err().is_sink_closed());
        assert!(Closed.write(&ctx, 1).await.unwrap_err().is_sink_closed());
    }

    #[tokio::test]
    async fn test_writer_fn() {
        let ctx = Context::new();
        let mut seen = Vec::new();

        {
            let mut writer = WriterFn::new(|_: &Context, v: i32| {
                seen.push(v);
                Ok(())
            });
            writer.write(&ctx, 1).await.unwrap();
            writer.write(&ctx, 2).await.unwrap();
        }

        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_write_closer_fn() {
        type WriteFn = fn(&Context, i32) -> Result<()>;
        type CloseFn = fn() -> Result<()>;

        let ctx = Context::new();

        let mut wc = WriteCloserFn::<WriteFn, CloseFn>::new(None, None);
        assert!(wc.write(&ctx, 1).await.unwrap_err().is_sink_closed());
        assert!(wc.close().await.is_ok());

        let close: CloseFn = || Err(Error::operation("close", "busy"));
        let mut wc = WriteCloserFn::<WriteFn, CloseFn>::new(None, Some(close));
        assert!(wc.close().await.is_err());
    }
}
