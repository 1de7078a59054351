//! Client core for engines that speak a tagged-union JSON protocol.
//!
//! A [`Client`] owns one long-lived session over a [`transport`]. Requests are
//! typed [`types`] objects sent with [`Client::send`] or [`Client::call`];
//! their answers are matched by the [`correlator`] through the `@extra`
//! field. Everything else the engine sends is fanned out by the
//! [`dispatcher`] to subscribers, while the [`auth`] tracker follows the
//! session's authorization state.

pub mod auth;
pub mod client;
pub mod codec;
pub mod config;
pub mod correlator;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod transport;
pub mod types;

pub use auth::{AuthAction, AuthPhase, AuthSnapshot, AuthTracker, AuthTransition};
pub use client::{Client, ResponseHandle};
pub use codec::{Function, Int64, TdType};
pub use config::ClientConfig;
pub use dispatcher::{Filter, OverflowPolicy, Subscription};
pub use error::{CallError, DecodeError, RpcError, TransportError, redact_suppressed};
