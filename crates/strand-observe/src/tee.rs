//! Decorators copying statistics about every operation to a side channel.

use async_trait::async_trait;
use strand_core::{Context, Error, Reader, Result, Writer};

use crate::stats::Stamper;
use crate::{BatchedStats, ObserveConfig, StreamedStats, TRACING_TARGET};

/// Projects a value into the `value` of a [`StreamedStats`] record.
pub type Formatter<T, U> = Box<dyn FnMut(&T) -> U + Send>;

/// Finishes an operation whose record was written to the side channel.
fn settle<T>(result: Result<T>, side: Result<()>) -> Result<T> {
    match side {
        Ok(()) => result,
        Err(side) => {
            tracing::debug!(
                target: TRACING_TARGET,
                error = %side,
                "Side channel rejected record"
            );
            Err(Error::with_side_channel(result.err(), side))
        }
    }
}

/// Reads values while writing a [`StreamedStats`] record for each.
///
/// The end of the stream is returned untouched and not recorded. Without a
/// stats writer the tee passes results through without recording anything.
/// When the stats writer fails, the read value is dropped and the error is
/// returned joined after the read error, if any; use
/// [`StreamedTeeReader::read_observed`] to keep the value.
pub struct StreamedTeeReader<R, W, T, U> {
    reader: R,
    stats: Option<W>,
    format: Option<Formatter<T, U>>,
    stamper: Stamper,
}

impl<R, W, T, U> StreamedTeeReader<R, W, T, U> {
    /// Wraps `reader`, writing records to `stats`.
    pub fn new(reader: R, stats: Option<W>, config: ObserveConfig) -> Self {
        Self {
            reader,
            stats,
            format: None,
            stamper: Stamper::new(config),
        }
    }

    /// Sets the projection recorded as the value.
    ///
    /// Without one, records carry no value.
    pub fn with_formatter(mut self, format: impl FnMut(&T) -> U + Send + 'static) -> Self {
        self.format = Some(Box::new(format));
        self
    }
}

impl<R, W, T, U> std::fmt::Debug for StreamedTeeReader<R, W, T, U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamedTeeReader")
            .field("tag", &self.stamper.config().tag())
            .field("has_stats", &self.stats.is_some())
            .field("has_formatter", &self.format.is_some())
            .finish_non_exhaustive()
    }
}

impl<R, W, T, U> StreamedTeeReader<R, W, T, U>
where
    T: Send + 'static,
    U: Send + 'static,
    R: Reader<T>,
    W: Writer<StreamedStats<U>>,
{
    /// Reads and records like [`Reader::read`], returning the read result
    /// and the outcome of the side channel separately.
    ///
    /// A value read successfully is kept even when its record was rejected.
    pub async fn read_observed(&mut self, ctx: &Context) -> (Result<T>, Result<()>) {
        let result = self.reader.read(ctx).await;
        if matches!(result, Err(Error::StreamEnded)) {
            return (result, Ok(()));
        }

        let Some(stats) = self.stats.as_mut() else {
            return (result, Ok(()));
        };

        let record = match &result {
            Ok(value) => {
                let value = self.format.as_mut().map(|format| format(value));
                self.stamper.header(ctx).streamed(value, None)
            }
            Err(err) => self.stamper.header(ctx).streamed(None, Some(err.clone())),
        };

        let side = stats.write(ctx, record).await;
        (result, side)
    }
}

#[async_trait]
impl<R, W, T, U> Reader<T> for StreamedTeeReader<R, W, T, U>
where
    T: Send + 'static,
    U: Send + 'static,
    R: Reader<T>,
    W: Writer<StreamedStats<U>>,
{
    async fn read(&mut self, ctx: &Context) -> Result<T> {
        let (result, side) = self.read_observed(ctx).await;
        settle(result, side)
    }
}

/// Reads batches while writing a [`BatchedStats`] record for each.
///
/// Behaves like [`StreamedTeeReader`], recording the batch length instead of
/// a projection.
#[derive(Debug)]
pub struct BatchedTeeReader<R, W> {
    reader: R,
    stats: Option<W>,
    stamper: Stamper,
}

impl<R, W> BatchedTeeReader<R, W> {
    /// Wraps `reader`, writing records to `stats`.
    pub fn new(reader: R, stats: Option<W>, config: ObserveConfig) -> Self {
        Self {
            reader,
            stats,
            stamper: Stamper::new(config),
        }
    }
}

impl<R, W> BatchedTeeReader<R, W>
where
    W: Writer<BatchedStats>,
{
    /// Reads and records a batch, returning the read result and the outcome
    /// of the side channel separately.
    pub async fn read_observed<T>(&mut self, ctx: &Context) -> (Result<Vec<T>>, Result<()>)
    where
        T: Send + 'static,
        R: Reader<Vec<T>>,
    {
        let result = self.reader.read(ctx).await;
        if matches!(result, Err(Error::StreamEnded)) {
            return (result, Ok(()));
        }

        let Some(stats) = self.stats.as_mut() else {
            return (result, Ok(()));
        };

        let record = match &result {
            Ok(batch) => self.stamper.header(ctx).batched(batch.len(), None),
            Err(err) => self.stamper.header(ctx).batched(0, Some(err.clone())),
        };

        let side = stats.write(ctx, record).await;
        (result, side)
    }
}

#[async_trait]
impl<R, W, T> Reader<Vec<T>> for BatchedTeeReader<R, W>
where
    T: Send + 'static,
    R: Reader<Vec<T>>,
    W: Writer<BatchedStats>,
{
    async fn read(&mut self, ctx: &Context) -> Result<Vec<T>> {
        let (result, side) = self.read_observed(ctx).await;
        settle(result, side)
    }
}

/// Writes values while writing a [`StreamedStats`] record for each.
///
/// A closed sink is returned untouched and not recorded. Without a stats
/// writer the tee passes results through without recording anything. When
/// the stats writer fails, its error is returned joined after the write
/// error, if any; the value may still have been written.
pub struct StreamedTeeWriter<W, S, T, U> {
    writer: W,
    stats: Option<S>,
    format: Option<Formatter<T, U>>,
    stamper: Stamper,
}

impl<W, S, T, U> StreamedTeeWriter<W, S, T, U> {
    /// Wraps `writer`, writing records to `stats`.
    pub fn new(writer: W, stats: Option<S>, config: ObserveConfig) -> Self {
        Self {
            writer,
            stats,
            format: None,
            stamper: Stamper::new(config),
        }
    }

    /// Sets the projection recorded as the value.
    pub fn with_formatter(mut self, format: impl FnMut(&T) -> U + Send + 'static) -> Self {
        self.format = Some(Box::new(format));
        self
    }
}

impl<W, S, T, U> std::fmt::Debug for StreamedTeeWriter<W, S, T, U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamedTeeWriter")
            .field("tag", &self.stamper.config().tag())
            .field("has_stats", &self.stats.is_some())
            .field("has_formatter", &self.format.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<W, S, T, U> Writer<T> for StreamedTeeWriter<W, S, T, U>
where
    T: Send + 'static,
    U: Send + 'static,
    W: Writer<T>,
    S: Writer<StreamedStats<U>>,
{
    async fn write(&mut self, ctx: &Context, value: T) -> Result<()> {
        let Some(stats) = self.stats.as_mut() else {
            return self.writer.write(ctx, value).await;
        };

        let projected = self.format.as_mut().map(|format| format(&value));
        let result = self.writer.write(ctx, value).await;
        if matches!(result, Err(Error::SinkClosed)) {
            return result;
        }

        let record = self
            .stamper
            .header(ctx)
            .streamed(projected, result.as_ref().err().cloned());

        let side = stats.write(ctx, record).await;
        settle(result, side)
    }
}

/// Writes batches while writing a [`BatchedStats`] record for each.
#[derive(Debug)]
pub struct BatchedTeeWriter<W, S> {
    writer: W,
    stats: Option<S>,
    stamper: Stamper,
}

impl<W, S> BatchedTeeWriter<W, S> {
    /// Wraps `writer`, writing records to `stats`.
    pub fn new(writer: W, stats: Option<S>, config: ObserveConfig) -> Self {
        Self {
            writer,
            stats,
            stamper: Stamper::new(config),
        }
    }
}

#[async_trait]
impl<W, S, T> Writer<Vec<T>> for BatchedTeeWriter<W, S>
where
    T: Send + 'static,
    W: Writer<Vec<T>>,
    S: Writer<BatchedStats>,
{
    async fn write(&mut self, ctx: &Context, batch: Vec<T>) -> Result<()> {
        let len = batch.len();
        let result = self.writer.write(ctx, batch).await;
        if matches!(result, Err(Error::SinkClosed)) {
            return result;
        }

        let Some(stats) = self.stats.as_mut() else {
            return result;
        };

        let record = self.stamper.header(ctx).batched(len, result.as_ref().err().cloned());
        let side = stats.write(ctx, record).await;
        settle(result, side)
    }
}

#[cfg(test)]
mod tests {
    use strand_core::{Closed, Discard, ErrorKind, Values, from_values};
    use strand_test::{Failing, Recorder, Scripted};

    use super::*;

    fn config() -> ObserveConfig {
        ObserveConfig::builder()
            .with_tag("tee")
            .with_ctx_keys(vec!["job".to_owned()])
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_streamed_tee_reader_records_values() {
        let ctx = Context::new().with_value("job", "import");
        let stats: Recorder<StreamedStats<i32>> = Recorder::new();
        let mut reader = StreamedTeeReader::new(from_values([1, 2]), Some(stats.clone()), config())
            .with_formatter(|v: &i32| v * 10);

        assert_eq!(reader.read(&ctx).await.unwrap(), 1);
        assert_eq!(reader.read(&ctx).await.unwrap(), 2);
        assert!(reader.read(&ctx).await.unwrap_err().is_stream_ended());

        let records = stats.values();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tag, "tee");
        assert_eq!(records[0].value, Some(10));
        assert_eq!(records[1].value, Some(20));
        assert!(records[0].error.is_none());
        assert_eq!(records[0].ctx.get("job"), Some(&serde_json::json!("import")));
        assert_eq!(records[1].stamp.duration_since(records[0].stamp), records[1].delta);
    }

    #[tokio::test]
    async fn test_streamed_tee_reader_without_formatter() {
        let ctx = Context::new();
        let stats: Recorder<StreamedStats<String>> = Recorder::new();
        let mut reader = StreamedTeeReader::<_, _, &str, String>::new(
            from_values(["a"]),
            Some(stats.clone()),
            ObserveConfig::default(),
        );

        reader.read(&ctx).await.unwrap();

        let records = stats.values();
        assert_eq!(records[0].tag, "<unset>");
        assert!(records[0].value.is_none());
        assert!(records[0].ctx.is_empty());
    }

    #[tokio::test]
    async fn test_streamed_tee_reader_records_read_errors() {
        let ctx = Context::new();
        let stats: Recorder<StreamedStats<u32>> = Recorder::new();
        let script = Scripted::new(vec![Err(Error::operation("fetch", "timeout")), Ok(5u8)]);
        let mut reader = StreamedTeeReader::new(script, Some(stats.clone()), config())
            .with_formatter(|v: &u8| u32::from(*v));

        let err = reader.read(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
        assert_eq!(reader.read(&ctx).await.unwrap(), 5);

        let records = stats.values();
        assert_eq!(records.len(), 2);
        assert!(records[0].value.is_none());
        assert_eq!(records[0].error.as_ref().map(Error::kind), Some(ErrorKind::Operation));
        assert_eq!(records[1].value, Some(5));
    }

    #[tokio::test]
    async fn test_streamed_tee_reader_without_stats() {
        let ctx = Context::new();
        let mut reader: StreamedTeeReader<_, Recorder<StreamedStats<()>>, i32, ()> =
            StreamedTeeReader::new(from_values([3]), None, config());

        assert_eq!(reader.read(&ctx).await.unwrap(), 3);
        assert!(reader.read(&ctx).await.unwrap_err().is_stream_ended());
    }

    #[tokio::test]
    async fn test_streamed_tee_reader_stats_failure() {
        let ctx = Context::new();
        let mut reader = StreamedTeeReader::<_, _, i32, ()>::new(from_values([1]), Some(Closed), config());

        let err = reader.read(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SideChannel);
        assert!(err.primary().is_none());
        assert!(err.contains(ErrorKind::SinkClosed));
        assert!(!err.is_sink_closed());
    }

    #[tokio::test]
    async fn test_streamed_tee_reader_observed_keeps_value() {
        let ctx = Context::new();
        let mut reader = StreamedTeeReader::<_, _, i32, ()>::new(from_values([8]), Some(Closed), config());

        let (result, side) = reader.read_observed(&ctx).await;
        assert_eq!(result.unwrap(), 8);
        assert!(side.unwrap_err().is_sink_closed());

        let (result, side) = reader.read_observed(&ctx).await;
        assert!(result.unwrap_err().is_stream_ended());
        assert!(side.is_ok());
    }

    #[tokio::test]
    async fn test_batched_tee_reader_observed_keeps_batch() {
        let ctx = Context::new();
        let mut reader = BatchedTeeReader::new(from_values([vec![1u8, 2]]), Some(Closed), config());

        let (result, side) = reader.read_observed::<u8>(&ctx).await;
        assert_eq!(result.unwrap(), vec![1, 2]);
        assert!(side.is_err());
    }

    #[tokio::test]
    async fn test_streamed_tee_reader_both_fail() {
        let ctx = Context::new();
        let mut reader = StreamedTeeReader::<_, _, u8, ()>::new(
            Failing::operation("fetch", "refused"),
            Some(Failing::operation("stats", "full")),
            config(),
        );

        let err = reader.read(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Joined);
        assert_eq!(err.primary().map(Error::kind), Some(ErrorKind::Operation));
        assert!(err.contains(ErrorKind::SideChannel));
    }

    #[tokio::test]
    async fn test_streamed_tee_reader_end_not_recorded() {
        let ctx = Context::new();
        let stats: Recorder<StreamedStats<u8>> = Recorder::new();
        let mut reader = StreamedTeeReader::<_, _, u8, u8>::new(
            None::<Values<u8>>,
            Some(stats.clone()),
            config(),
        );

        assert!(reader.read(&ctx).await.unwrap_err().is_stream_ended());
        assert!(reader.read(&ctx).await.unwrap_err().is_stream_ended());
        assert!(stats.is_empty());
    }

    #[tokio::test]
    async fn test_batched_tee_reader() {
        let ctx = Context::new();
        let stats: Recorder<BatchedStats> = Recorder::new();
        let batches = from_values([vec![1, 2, 3], vec![], vec![4]]);
        let mut reader = BatchedTeeReader::new(batches, Some(stats.clone()), config());

        while let Ok(batch) = Reader::<Vec<i32>>::read(&mut reader, &ctx).await {
            assert!(batch.len() <= 3);
        }

        let lens: Vec<_> = stats.values().into_iter().map(|s| s.len).collect();
        assert_eq!(lens, vec![3, 0, 1]);
    }

    #[tokio::test]
    async fn test_batched_tee_reader_stats_closed() {
        let ctx = Context::new();
        let mut reader = BatchedTeeReader::new(from_values([vec!['a']]), Some(Closed), config());

        let err = Reader::<Vec<char>>::read(&mut reader, &ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SideChannel);

        let err = Reader::<Vec<char>>::read(&mut reader, &ctx).await.unwrap_err();
        assert!(err.is_stream_ended());
    }

    #[tokio::test]
    async fn test_streamed_tee_writer_records_values() {
        let ctx = Context::new();
        let sink = Recorder::new();
        let stats: Recorder<StreamedStats<usize>> = Recorder::new();
        let mut writer = StreamedTeeWriter::new(sink.clone(), Some(stats.clone()), config())
            .with_formatter(|v: &&str| v.len());

        writer.write(&ctx, "abc").await.unwrap();
        writer.write(&ctx, "de").await.unwrap();

        assert_eq!(sink.values(), vec!["abc", "de"]);
        let lens: Vec<_> = stats.values().into_iter().map(|s| s.value).collect();
        assert_eq!(lens, vec![Some(3), Some(2)]);
    }

    #[tokio::test]
    async fn test_streamed_tee_writer_closed_not_recorded() {
        let ctx = Context::new();
        let stats: Recorder<StreamedStats<u8>> = Recorder::new();
        let mut writer = StreamedTeeWriter::<_, _, u8, u8>::new(Closed, Some(stats.clone()), config());

        assert!(writer.write(&ctx, 1).await.unwrap_err().is_sink_closed());
        assert!(stats.is_empty());
    }

    #[tokio::test]
    async fn test_streamed_tee_writer_records_write_errors() {
        let ctx = Context::new();
        let stats: Recorder<StreamedStats<u8>> = Recorder::new();
        let mut writer = StreamedTeeWriter::new(
            Failing::operation("store", "disk full"),
            Some(stats.clone()),
            config(),
        )
        .with_formatter(|v: &u8| *v);

        let err = writer.write(&ctx, 9).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);

        let records = stats.values();
        assert_eq!(records[0].value, Some(9));
        assert!(records[0].error.is_some());
    }

    #[tokio::test]
    async fn test_streamed_tee_writer_stats_failure_keeps_write() {
        let ctx = Context::new();
        let sink: Recorder<u8> = Recorder::new();
        let mut writer = StreamedTeeWriter::<_, _, u8, ()>::new(sink.clone(), Some(Closed), config());

        let err = writer.write(&ctx, 4).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SideChannel);
        assert_eq!(sink.values(), vec![4]);
    }

    #[tokio::test]
    async fn test_batched_tee_writer() {
        let ctx = Context::new();
        let stats: Recorder<BatchedStats> = Recorder::new();
        let mut writer = BatchedTeeWriter::new(Discard, Some(stats.clone()), config());

        writer.write(&ctx, vec![1u8, 2]).await.unwrap();

        let mut closed = BatchedTeeWriter::new(Closed, Some(stats.clone()), config());
        assert!(closed.write(&ctx, vec![3u8]).await.unwrap_err().is_sink_closed());

        let records = stats.values();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].len, 2);
    }
}
