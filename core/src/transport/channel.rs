use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{Transport, TransportError, TransportSink, TransportSource};

/// Creates an in-memory transport and the handle that plays the engine's side
/// of it. Useful for tests and for embedding an engine that runs in-process.
pub fn channel() -> (ChannelTransport, EngineHandle) {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (push_tx, push_rx) = mpsc::unbounded_channel();
    let transport = ChannelTransport {
        sink: ChannelSink { tx: request_tx },
        source: ChannelSource { rx: push_rx },
    };
    let handle = EngineHandle {
        requests: request_rx,
        pushes: Some(push_tx),
    };
    (transport, handle)
}

#[derive(Debug)]
pub struct ChannelTransport {
    sink: ChannelSink,
    source: ChannelSource,
}

impl Transport for ChannelTransport {
    type Sink = ChannelSink;
    type Source = ChannelSource;

    fn split(self) -> (ChannelSink, ChannelSource) {
        (self.sink, self.source)
    }
}

#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Value>,
}

#[async_trait]
impl TransportSink for ChannelSink {
    async fn send(&mut self, payload: Value) -> Result<(), TransportError> {
        self.tx.send(payload).map_err(|_| TransportError::Closed)
    }
}

#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<Value>,
}

#[async_trait]
impl TransportSource for ChannelSource {
    async fn recv(&mut self) -> Result<Option<Value>, TransportError> {
        Ok(self.rx.recv().await)
    }
}

/// The engine's end of an in-memory transport.
#[derive(Debug)]
pub struct EngineHandle {
    requests: mpsc::UnboundedReceiver<Value>,
    pushes: Option<mpsc::UnboundedSender<Value>>,
}

impl EngineHandle {
    /// The next payload sent by the client, or `None` once the client's
    /// writer has gone away.
    pub async fn next_request(&mut self) -> Option<Value> {
        self.requests.recv().await
    }

    /// A request that has already arrived, without waiting.
    pub fn try_next_request(&mut self) -> Option<Value> {
        self.requests.try_recv().ok()
    }

    /// Sends a payload to the client. Returns `false` if the client is gone or
    /// the handle was disconnected.
    pub fn push(&self, payload: Value) -> bool {
        self.pushes
            .as_ref()
            .is_some_and(|tx| tx.send(payload).is_ok())
    }

    /// Ends the inbound stream; the client's reader sees a clean end of stream
    /// after draining what was already pushed.
    pub fn disconnect(&mut self) {
        self.pushes = None;
    }
}
