//! The seam between the client and whatever carries payloads to the engine.
//!
//! A transport is an ordered, reliable, duplex stream of JSON payloads. It is
//! split once into a [`TransportSink`], owned by the client's writer task, and
//! a [`TransportSource`], owned by its reader task, so that a stalled outbound
//! path never holds up inbound delivery.

mod channel;

use async_trait::async_trait;
use serde_json::Value;

pub use crate::error::TransportError;
pub use channel::{ChannelSink, ChannelSource, ChannelTransport, EngineHandle, channel};

/// Outbound half of a transport.
#[async_trait]
pub trait TransportSink: Send + 'static {
    /// Sends one payload. Payloads are delivered in the order they are sent.
    async fn send(&mut self, payload: Value) -> Result<(), TransportError>;

    /// Flushes and shuts down the outbound direction.
    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Inbound half of a transport.
#[async_trait]
pub trait TransportSource: Send + 'static {
    /// Receives the next payload, or `None` once the engine has closed the
    /// stream cleanly.
    async fn recv(&mut self) -> Result<Option<Value>, TransportError>;
}

/// A duplex connection to an engine.
pub trait Transport: Send + 'static {
    type Sink: TransportSink;
    type Source: TransportSource;

    fn split(self) -> (Self::Sink, Self::Source);
}
