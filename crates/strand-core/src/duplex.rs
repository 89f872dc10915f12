//! Stages that are both a [`Reader`] and a [`Writer`].

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::{Context, Error, Reader, Result, Writer};

/// A stage reading `T` and writing `U`.
///
/// Implemented for every type that implements both halves.
pub trait ReadWriter<T: Send + 'static, U: Send + 'static>: Reader<T> + Writer<U> {}

impl<T, U, S> ReadWriter<T, U> for S
where
    T: Send + 'static,
    U: Send + 'static,
    S: Reader<T> + Writer<U>,
{
}

/// An in-memory FIFO: writes push to the back, reads pop from the front.
///
/// A queue can be closed, after which writes return [`Error::SinkClosed`]
/// while the values already queued can still be read. Only a closed and
/// drained queue returns [`Error::StreamEnded`]; reading an open, empty queue
/// returns an [`Error::Operation`] and leaves it readable once written to.
#[derive(Debug, Clone)]
pub struct Queue<T> {
    values: VecDeque<T>,
    closed: bool,
}

impl<T> Queue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            values: VecDeque::new(),
            closed: false,
        }
    }

    /// Creates a queue holding `values`.
    pub fn from_values(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            values: values.into_iter().collect(),
            closed: false,
        }
    }

    /// Refuses further writes.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Returns whether the queue refuses writes.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns the number of queued values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether no values are queued.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drains the queued values without going through the reader.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.values.drain(..)
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static> Reader<T> for Queue<T> {
    async fn read(&mut self, _ctx: &Context) -> Result<T> {
        match self.values.pop_front() {
            Some(value) => Ok(value),
            None if self.closed => Err(Error::StreamEnded),
            None => Err(Error::operation("queue", "no value queued")),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Writer<T> for Queue<T> {
    async fn write(&mut self, _ctx: &Context, value: T) -> Result<()> {
        if self.closed {
            return Err(Error::SinkClosed);
        }

        self.values.push_back(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn roundtrip<S: ReadWriter<u8, u8>>(stage: &mut S, ctx: &Context) -> Result<u8> {
        stage.write(ctx, 7).await?;
        stage.read(ctx).await
    }

    #[tokio::test]
    async fn test_queue_is_fifo() {
        let ctx = Context::new();
        let mut queue = Queue::from_values(["a"]);

        queue.write(&ctx, "b").await.unwrap();
        queue.close();

        assert_eq!(queue.read(&ctx).await.unwrap(), "a");
        assert_eq!(queue.read(&ctx).await.unwrap(), "b");
        assert!(queue.read(&ctx).await.unwrap_err().is_stream_ended());
        assert!(queue.read(&ctx).await.unwrap_err().is_stream_ended());
    }

    #[tokio::test]
    async fn test_open_empty_queue_is_not_ended() {
        let ctx = Context::new();
        let mut queue = Queue::new();

        let err = queue.read(&ctx).await.unwrap_err();
        assert!(!err.is_stream_ended());
        assert!(matches!(err, Error::Operation { .. }));

        queue.write(&ctx, 5).await.unwrap();
        assert_eq!(queue.read(&ctx).await.unwrap(), 5);

        queue.close();
        assert!(queue.is_closed());
        assert!(queue.read(&ctx).await.unwrap_err().is_stream_ended());
        assert!(queue.write(&ctx, 6).await.unwrap_err().is_sink_closed());
        assert!(queue.read(&ctx).await.unwrap_err().is_stream_ended());
    }

    #[tokio::test]
    async fn test_closed_queue_keeps_values() {
        let ctx = Context::new();
        let mut queue = Queue::new();

        queue.write(&ctx, 1).await.unwrap();
        queue.close();

        assert!(queue.write(&ctx, 2).await.unwrap_err().is_sink_closed());
        assert!(queue.write(&ctx, 3).await.unwrap_err().is_sink_closed());
        assert_eq!(queue.read(&ctx).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_queue_as_read_writer() {
        let ctx = Context::new();
        let mut queue = Queue::new();

        assert_eq!(roundtrip(&mut queue, &ctx).await.unwrap(), 7);
    }
}
