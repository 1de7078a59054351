//! JSON-lines framing: one JSON object per `\n`-terminated line.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tdlink_core::transport::{Transport, TransportError, TransportSink, TransportSource};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use bytes::BytesMut;
use tokio_util::codec::{Decoder, FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::warn;

/// Lines longer than this are discarded instead of buffered without bound.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024 * 1024;

/// A transport speaking JSON lines over any pair of byte streams.
#[derive(Debug)]
pub struct LinesTransport<R, W> {
    reader: R,
    writer: W,
    max_line_length: usize,
}

impl<R, W> LinesTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(reader: R, writer: W) -> Self {
        LinesTransport {
            reader,
            writer,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }
}

impl<S> LinesTransport<ReadHalf<S>, WriteHalf<S>>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Uses both directions of a single duplex stream, such as a socket.
    pub fn from_stream(stream: S) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        LinesTransport::new(reader, writer)
    }
}

impl<R, W> Transport for LinesTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    type Sink = LinesSink<W>;
    type Source = LinesSource<R>;

    fn split(self) -> (LinesSink<W>, LinesSource<R>) {
        let sink = LinesSink {
            inner: FramedWrite::new(self.writer, LinesCodec::new()),
        };
        let source = LinesSource {
            inner: FramedRead::new(self.reader, SkippingLinesCodec::new(self.max_line_length)),
        };
        (sink, source)
    }
}

/// A [`LinesCodec`] that drops oversized lines and keeps decoding.
///
/// `FramedRead` stops for good after its decoder fails once, so the length
/// error is handled here instead of being passed up.
#[derive(Debug)]
struct SkippingLinesCodec {
    inner: LinesCodec,
}

impl SkippingLinesCodec {
    fn new(max_line_length: usize) -> Self {
        SkippingLinesCodec {
            inner: LinesCodec::new_with_max_length(max_line_length),
        }
    }
}

impl Decoder for SkippingLinesCodec {
    type Item = String;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, LinesCodecError> {
        loop {
            match self.inner.decode(buf) {
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    warn!("skipping line over the maximum length");
                }
                other => return other,
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, LinesCodecError> {
        loop {
            match self.inner.decode_eof(buf) {
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    warn!("skipping line over the maximum length");
                }
                other => return other,
            }
        }
    }
}

fn frame_error(err: LinesCodecError) -> TransportError {
    match err {
        LinesCodecError::Io(err) => TransportError::Io(err),
        other => TransportError::Frame(other.to_string()),
    }
}

#[derive(Debug)]
pub struct LinesSink<W> {
    inner: FramedWrite<W, LinesCodec>,
}

#[async_trait]
impl<W> TransportSink for LinesSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&mut self, payload: Value) -> Result<(), TransportError> {
        // serde_json never emits raw newlines, so one payload is one line.
        let line = serde_json::to_string(&payload)
            .map_err(|e| TransportError::Frame(e.to_string()))?;
        self.inner.send(line).await.map_err(frame_error)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        SinkExt::<String>::close(&mut self.inner)
            .await
            .map_err(frame_error)
    }
}

#[derive(Debug)]
pub struct LinesSource<R> {
    inner: FramedRead<R, SkippingLinesCodec>,
}

#[async_trait]
impl<R> TransportSource for LinesSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn recv(&mut self) -> Result<Option<Value>, TransportError> {
        loop {
            match self.inner.next().await {
                None => return Ok(None),
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str(&line) {
                        Ok(value) => return Ok(Some(value)),
                        // The error names a position only, never the line itself.
                        Err(err) => {
                            warn!(error = %err, len = line.len(), "skipping malformed line")
                        }
                    }
                }
                Some(Err(err)) => return Err(frame_error(err)),
            }
        }
    }
}
