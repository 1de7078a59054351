use std::time::Duration;

use anyhow::{Context, Result};
use tdlink_core::{AuthPhase, CallError, Client, ClientConfig, types::Close};
use tdlink_extensions::{EngineCommand, EngineProcess};
use tracing::{info, warn};

use crate::cli::Cli;

mod login;
pub use login::login;

/// How long a closing engine gets before it is killed.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// A client session bound to a spawned engine process.
pub struct App {
    pub client: Client,
    process: EngineProcess,
}

impl App {
    pub async fn start(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => ClientConfig::from_json_file(path)
                .await
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => ClientConfig::default(),
        };
        if let Some(ms) = cli.timeout {
            config.default_timeout_ms = (ms > 0).then_some(ms);
        }
        config.wire_log |= cli.wire_log;

        let engine = cli
            .engine
            .as_ref()
            .context("No engine given; pass --engine or set TDLINK_ENGINE")?;
        let command = EngineCommand::new(engine).args(cli.engine_args.iter().cloned());
        let (process, transport) = EngineProcess::spawn(&command)
            .with_context(|| format!("Failed to start engine {}", engine.display()))?;
        info!(engine = process.name(), pid = process.id(), "Engine started");

        Ok(App {
            client: Client::connect(transport, config),
            process,
        })
    }

    /// Closes the session properly if it got far enough to have one, then
    /// waits for the engine to exit.
    pub async fn stop(mut self) -> Result<()> {
        if let Err(e) = close_session(&self.client).await {
            warn!(error = %e, "Close request failed");
        }
        self.client.shutdown();

        match tokio::time::timeout(CLOSE_TIMEOUT, self.process.wait()).await {
            Ok(status) => {
                status?;
            }
            Err(_) => {
                warn!(engine = self.process.name(), "Engine did not exit, killing it");
                self.process.kill().await?;
            }
        }
        Ok(())
    }
}

/// Sends `close` unless the session is already closing, then waits for the
/// engine to report `Closed`.
async fn close_session(client: &Client) -> Result<(), CallError> {
    let auth = client.auth();
    let phase = auth.current_state();
    if phase == AuthPhase::Uninitialized || phase.is_terminal() {
        return Ok(());
    }
    if phase != AuthPhase::Closing {
        if !client.is_open() {
            return Ok(());
        }
        match client.call(&Close {}).await {
            // The engine announces `Closing` before it answers.
            Ok(_) | Err(CallError::SessionClosing) => {}
            Err(e) => return Err(e),
        }
    }
    if tokio::time::timeout(CLOSE_TIMEOUT, auth.wait_for(AuthPhase::is_terminal))
        .await
        .is_err()
    {
        warn!("Session did not reach the closed state in time");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tdlink_core::transport;

    use super::*;

    fn auth_update(state: &str) -> serde_json::Value {
        json!({
            "@type": "updateAuthorizationState",
            "authorization_state": {"@type": state},
        })
    }

    #[tokio::test]
    async fn closing_before_the_answer_counts_as_closed() {
        let (transport, mut engine) = transport::channel();
        let client = Client::connect(transport, ClientConfig::default());
        let mut rx = client.auth().watch();
        engine.push(auth_update("authorizationStateReady"));
        rx.changed().await.unwrap();

        let engine_task = tokio::spawn(async move {
            let request = engine.next_request().await.unwrap();
            assert_eq!(request["@type"], "close");
            engine.push(auth_update("authorizationStateClosing"));
            engine.push(json!({"@type": "ok", "@extra": request["@extra"]}));
            engine.push(auth_update("authorizationStateClosed"));
            engine
        });

        assert_eq!(close_session(&client).await, Ok(()));
        assert_eq!(client.auth().current_state(), AuthPhase::Closed);
        drop(engine_task.await.unwrap());
    }

    #[tokio::test]
    async fn nothing_is_sent_before_the_first_state() {
        let (transport, mut engine) = transport::channel();
        let client = Client::connect(transport, ClientConfig::default());

        assert_eq!(close_session(&client).await, Ok(()));
        assert!(engine.try_next_request().is_none());
    }
}
