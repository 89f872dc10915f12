//! Decorators logging every operation.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use strand_core::{Context, Error, Reader, Result, Writer};

use crate::{Level, LogFields, LogRecord, LogSink, ObserveConfig, TracingSink};

/// Projects a value into the `val` field of a [`LogRecord`].
pub type LogFormatter<T> = Box<dyn FnMut(&T) -> Value + Send>;

fn debug_formatter<T: Debug + 'static>() -> LogFormatter<T> {
    Box::new(|value: &T| Value::String(format!("{value:?}")))
}

/// Sink, tag and context keys shared by the logging decorators.
struct Emitter {
    sink: Arc<dyn LogSink>,
    config: ObserveConfig,
}

impl Emitter {
    fn new(config: ObserveConfig) -> Self {
        Self {
            sink: Arc::new(TracingSink),
            config,
        }
    }

    fn emit(&self, ctx: &Context, error: Option<&Error>, val: Option<Value>, len: Option<usize>) {
        let level = match error {
            Some(err) if !err.is_terminal() => Level::Error,
            _ => Level::Info,
        };

        let record = LogRecord {
            level,
            message: self.config.tag().to_owned(),
            fields: LogFields {
                err: error.map(ToString::to_string),
                val,
                len,
                ctx: self.config.snapshot(ctx),
            },
        };

        self.sink.log(&record);
    }
}

impl Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("tag", &self.config.tag())
            .finish_non_exhaustive()
    }
}

/// Logs every read.
///
/// Successful reads are logged at [`Level::Info`] with the formatted value,
/// failed reads at [`Level::Error`]. The end of the stream is not logged.
/// The tag of the configuration is used as the log message.
pub struct LogReader<R, T> {
    reader: R,
    format: LogFormatter<T>,
    emitter: Emitter,
}

impl<R, T: Debug + 'static> LogReader<R, T> {
    /// Wraps `reader`, logging values with their [`Debug`] representation to
    /// a [`TracingSink`].
    pub fn new(reader: R, config: ObserveConfig) -> Self {
        Self {
            reader,
            format: debug_formatter(),
            emitter: Emitter::new(config),
        }
    }
}

impl<R, T> LogReader<R, T> {
    /// Sets the projection logged as the value.
    pub fn with_formatter(mut self, format: impl FnMut(&T) -> Value + Send + 'static) -> Self {
        self.format = Box::new(format);
        self
    }

    /// Sets the sink receiving the records.
    pub fn with_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.emitter.sink = Arc::new(sink);
        self
    }
}

impl<R, T> Debug for LogReader<R, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogReader")
            .field("emitter", &self.emitter)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<R, T> Reader<T> for LogReader<R, T>
where
    T: Send + 'static,
    R: Reader<T>,
{
    async fn read(&mut self, ctx: &Context) -> Result<T> {
        let result = self.reader.read(ctx).await;

        match &result {
            Ok(value) => {
                let val = (self.format)(value);
                self.emitter.emit(ctx, None, Some(val), None);
            }
            Err(Error::StreamEnded) => {}
            Err(err) => self.emitter.emit(ctx, Some(err), None, None),
        }

        result
    }
}

/// Logs every batch read, with its length instead of its values.
#[derive(Debug)]
pub struct LogBatchReader<R> {
    reader: R,
    emitter: Emitter,
}

impl<R> LogBatchReader<R> {
    /// Wraps `reader`, logging to a [`TracingSink`].
    pub fn new(reader: R, config: ObserveConfig) -> Self {
        Self {
            reader,
            emitter: Emitter::new(config),
        }
    }

    /// Sets the sink receiving the records.
    pub fn with_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.emitter.sink = Arc::new(sink);
        self
    }
}

#[async_trait]
impl<R, T> Reader<Vec<T>> for LogBatchReader<R>
where
    T: Send + 'static,
    R: Reader<Vec<T>>,
{
    async fn read(&mut self, ctx: &Context) -> Result<Vec<T>> {
        let result = self.reader.read(ctx).await;

        match &result {
            Ok(batch) => self.emitter.emit(ctx, None, None, Some(batch.len())),
            Err(Error::StreamEnded) => {}
            Err(err) => self.emitter.emit(ctx, Some(err), None, None),
        }

        result
    }
}

/// Logs every write.
///
/// Successful writes and writes to a closed sink are logged at
/// [`Level::Info`], other failures at [`Level::Error`]. Every record carries
/// the formatted value.
pub struct LogWriter<W, T> {
    writer: W,
    format: LogFormatter<T>,
    emitter: Emitter,
}

impl<W, T: Debug + 'static> LogWriter<W, T> {
    /// Wraps `writer`, logging values with their [`Debug`] representation to
    /// a [`TracingSink`].
    pub fn new(writer: W, config: ObserveConfig) -> Self {
        Self {
            writer,
            format: debug_formatter(),
            emitter: Emitter::new(config),
        }
    }
}

impl<W, T> LogWriter<W, T> {
    /// Sets the projection logged as the value.
    pub fn with_formatter(mut self, format: impl FnMut(&T) -> Value + Send + 'static) -> Self {
        self.format = Box::new(format);
        self
    }

    /// Sets the sink receiving the records.
    pub fn with_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.emitter.sink = Arc::new(sink);
        self
    }
}

impl<W, T> Debug for LogWriter<W, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter")
            .field("emitter", &self.emitter)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<W, T> Writer<T> for LogWriter<W, T>
where
    T: Send + 'static,
    W: Writer<T>,
{
    async fn write(&mut self, ctx: &Context, value: T) -> Result<()> {
        let val = (self.format)(&value);
        let result = self.writer.write(ctx, value).await;

        self.emitter.emit(ctx, result.as_ref().err(), Some(val), None);
        result
    }
}
