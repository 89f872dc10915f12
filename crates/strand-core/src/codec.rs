//! Encoder/Decoder boundary between byte streams and typed stages.
//!
//! [`EncodeWriter`] turns an [`Encoder`] into a [`Writer`] of values and
//! [`DecodeReader`] turns a [`Decoder`] into a [`Reader`] of values. The
//! default codec is newline-delimited JSON ([`JsonEncoder`], [`JsonDecoder`]).
//! `None` works as an encoder that is closed and as a decoder that has ended.

use std::fmt;
use std::io;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::de::IoRead;
use serde_json::{Deserializer, StreamDeserializer};

use crate::{Context, Error, Reader, Result, TRACING_TARGET_CODEC, Writer};

/// Encodes values of type `T` into some byte sink.
pub trait Encoder<T> {
    /// Encodes one value.
    fn encode(&mut self, value: &T) -> Result<()>;
}

/// Decodes values of type `T` from some byte source.
///
/// Returns [`Error::StreamEnded`] once the source is exhausted.
pub trait Decoder<T> {
    /// Decodes the next value.
    fn decode(&mut self) -> Result<T>;
}

impl<T, E: Encoder<T>> Encoder<T> for Option<E> {
    fn encode(&mut self, value: &T) -> Result<()> {
        match self {
            Some(encoder) => encoder.encode(value),
            None => Err(Error::SinkClosed),
        }
    }
}

impl<T, D: Decoder<T>> Decoder<T> for Option<D> {
    fn decode(&mut self) -> Result<T> {
        match self {
            Some(decoder) => decoder.decode(),
            None => Err(Error::StreamEnded),
        }
    }
}

/// Implements [`Encoder`] with a closure.
pub struct EncoderFn<F> {
    inner: F,
}

impl<F> EncoderFn<F> {
    /// Creates an encoder from a closure.
    pub fn new<T>(inner: F) -> Self
    where
        F: FnMut(&T) -> Result<()>,
    {
        Self { inner }
    }
}

impl<T, F: FnMut(&T) -> Result<()>> Encoder<T> for EncoderFn<F> {
    fn encode(&mut self, value: &T) -> Result<()> {
        (self.inner)(value)
    }
}

impl<F> fmt::Debug for EncoderFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderFn").finish_non_exhaustive()
    }
}

/// Implements [`Decoder`] with a closure.
pub struct DecoderFn<F> {
    inner: F,
}

impl<F> DecoderFn<F> {
    /// Creates a decoder from a closure.
    pub fn new<T>(inner: F) -> Self
    where
        F: FnMut() -> Result<T>,
    {
        Self { inner }
    }
}

impl<T, F: FnMut() -> Result<T>> Decoder<T> for DecoderFn<F> {
    fn decode(&mut self) -> Result<T> {
        (self.inner)()
    }
}

impl<F> fmt::Debug for DecoderFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderFn").finish_non_exhaustive()
    }
}

/// Newline-delimited JSON encoder.
#[derive(Debug)]
pub struct JsonEncoder<W> {
    sink: W,
}

impl<W: io::Write> JsonEncoder<W> {
    /// Creates an encoder writing to `sink`.
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Consumes the encoder and returns the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<T: Serialize, W: io::Write> Encoder<T> for JsonEncoder<W> {
    fn encode(&mut self, value: &T) -> Result<()> {
        // A value that fails to serialize leaves the sink untouched.
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');

        self.sink.write_all(&line)?;
        self.sink.flush()?;
        Ok(())
    }
}

/// Streaming JSON decoder.
///
/// Accepts any whitespace-separated sequence of JSON values. A clean end of
/// input is [`Error::StreamEnded`]; input ending in the middle of a value is
/// a codec error.
pub struct JsonDecoder<R: io::Read, T> {
    inner: StreamDeserializer<'static, IoRead<R>, T>,
    ended: bool,
}

impl<R: io::Read, T: DeserializeOwned> JsonDecoder<R, T> {
    /// Creates a decoder reading from `source`.
    pub fn new(source: R) -> Self {
        Self {
            inner: Deserializer::from_reader(source).into_iter(),
            ended: false,
        }
    }
}

impl<R: io::Read, T: DeserializeOwned> Decoder<T> for JsonDecoder<R, T> {
    fn decode(&mut self) -> Result<T> {
        if self.ended {
            return Err(Error::StreamEnded);
        }

        match self.inner.next() {
            Some(Ok(value)) => Ok(value),
            Some(Err(err)) => {
                tracing::debug!(
                    target: TRACING_TARGET_CODEC,
                    error = %err,
                    "Failed to decode JSON value"
                );
                Err(err.into())
            }
            None => {
                tracing::trace!(target: TRACING_TARGET_CODEC, "JSON source exhausted");
                self.ended = true;
                Err(Error::StreamEnded)
            }
        }
    }
}

impl<R: io::Read, T> fmt::Debug for JsonDecoder<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDecoder")
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

/// A [`Writer`] which encodes every value with an [`Encoder`].
#[derive(Debug)]
pub struct EncodeWriter<E> {
    encoder: E,
}

impl<E> EncodeWriter<E> {
    /// Creates a writer around `encoder`.
    pub fn new(encoder: E) -> Self {
        Self { encoder }
    }

    /// Consumes the writer and returns the encoder.
    pub fn into_inner(self) -> E {
        self.encoder
    }
}

impl<W: io::Write> EncodeWriter<JsonEncoder<W>> {
    /// Creates a writer encoding values as newline-delimited JSON into `sink`.
    pub fn json(sink: W) -> Self {
        Self::new(JsonEncoder::new(sink))
    }
}

#[async_trait]
impl<T, E> Writer<T> for EncodeWriter<E>
where
    T: Send + 'static,
    E: Encoder<T> + Send,
{
    async fn write(&mut self, _ctx: &Context, value: T) -> Result<()> {
        self.encoder.encode(&value)
    }
}

/// A [`Reader`] which decodes every value with a [`Decoder`].
pub struct DecodeReader<D, T> {
    decoder: D,
    _marker: PhantomData<fn() -> T>,
}

impl<D, T> DecodeReader<D, T> {
    /// Creates a reader around `decoder`.
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            _marker: PhantomData,
        }
    }
}

impl<R: io::Read, T: DeserializeOwned> DecodeReader<JsonDecoder<R, T>, T> {
    /// Creates a reader decoding JSON values from `source`.
    pub fn json(source: R) -> Self {
        Self::new(JsonDecoder::new(source))
    }
}

#[async_trait]
impl<T, D> Reader<T> for DecodeReader<D, T>
where
    T: Send + 'static,
    D: Decoder<T> + Send,
{
    async fn read(&mut self, _ctx: &Context) -> Result<T> {
        self.decoder.decode()
    }
}

impl<D: fmt::Debug, T> fmt::Debug for DecodeReader<D, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeReader")
            .field("decoder", &self.decoder)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[tokio::test]
    async fn test_json_roundtrip_through_stages() {
        let ctx = Context::new();
        let mut writer = EncodeWriter::json(Vec::new());

        writer.write(&ctx, "test1".to_owned()).await.unwrap();
        writer.write(&ctx, "test2".to_owned()).await.unwrap();

        let bytes = writer.into_inner().into_inner();
        assert_eq!(bytes, b"\"test1\"\n\"test2\"\n");

        let mut reader = DecodeReader::<_, String>::json(Cursor::new(bytes));
        assert_eq!(reader.read(&ctx).await.unwrap(), "test1");
        assert_eq!(reader.read(&ctx).await.unwrap(), "test2");
        assert!(reader.read(&ctx).await.unwrap_err().is_stream_ended());
        assert!(reader.read(&ctx).await.unwrap_err().is_stream_ended());
    }

    #[tokio::test]
    async fn test_truncated_input_is_codec_error() {
        let ctx = Context::new();
        let mut reader = DecodeReader::<_, String>::json(Cursor::new(b"\"unterminated".to_vec()));

        let err = reader.read(&ctx).await.unwrap_err();
        assert!(!err.is_terminal());
    }

    #[tokio::test]
    async fn test_missing_source_and_sink_are_terminal() {
        let ctx = Context::new();

        let mut reader = DecodeReader::<Option<JsonDecoder<Cursor<Vec<u8>>, u8>>, u8>::new(None);
        assert!(reader.read(&ctx).await.unwrap_err().is_stream_ended());

        let mut writer = EncodeWriter::new(None::<JsonEncoder<Vec<u8>>>);
        assert!(writer.write(&ctx, 1u8).await.unwrap_err().is_sink_closed());
    }

    #[test]
    fn test_closure_codecs() {
        let mut encoded = Vec::new();
        {
            let mut encoder = EncoderFn::new(|v: &u8| {
                encoded.push(*v);
                Ok(())
            });
            encoder.encode(&3).unwrap();
        }
        assert_eq!(encoded, vec![3]);

        let mut decoder = DecoderFn::new(|| Ok::<_, Error>(9u8));
        assert_eq!(decoder.decode().unwrap(), 9);
    }
}
