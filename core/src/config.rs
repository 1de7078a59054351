use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatcher::OverflowPolicy;

/// Settings of one client session.
///
/// Durations are given in milliseconds when serialized. Every field has a
/// default, so a config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Timeout applied by [`Client::call`](crate::client::Client::call). `None`
    /// waits indefinitely.
    pub default_timeout_ms: Option<u64>,
    /// How long the token of a timed-out or cancelled call stays reserved, so
    /// that a late response is recognized and discarded.
    pub late_response_grace_ms: u64,
    /// Per-subscriber buffer size.
    pub subscriber_capacity: usize,
    pub overflow: OverflowPolicy,
    /// Prefix for generated correlation tokens. A random prefix is used when
    /// unset.
    pub token_prefix: Option<String>,
    /// Log every raw inbound and outbound payload at TRACE under `tdlink::wire`.
    pub wire_log: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            default_timeout_ms: Some(30_000),
            late_response_grace_ms: 60_000,
            subscriber_capacity: 1024,
            overflow: OverflowPolicy::DropOldest,
            token_prefix: None,
            wire_log: false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ClientConfig {
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }

    pub fn late_response_grace(&self) -> Duration {
        Duration::from_millis(self.late_response_grace_ms)
    }

    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy, capacity: usize) -> Self {
        self.overflow = overflow;
        self.subscriber_capacity = capacity;
        self
    }

    pub fn with_token_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.token_prefix = Some(prefix.into());
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a JSON config file.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&text)
    }
}
