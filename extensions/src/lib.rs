//! Transports that connect a `tdlink_core` client to a real engine.

pub mod lines;
pub mod process;

pub use lines::{LinesSink, LinesSource, LinesTransport};
pub use process::{EngineCommand, EngineProcess, ProcessError, ProcessTransport};
