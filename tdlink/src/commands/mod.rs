use anyhow::{Context, Result};
use console::style;
use futures::StreamExt;
use serde_json::Value;
use tdlink_core::{
    AuthPhase, Filter, codec, redact_suppressed,
    types::{GetAuthorizationState, SetTdlibParameters},
};
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::app::{self, App};
use crate::cli::{CallArgs, LoginArgs, WatchArgs};

// --- Handler Functions ---

pub async fn handle_call(args: CallArgs, app: &App) -> Result<()> {
    let text = if args.request == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read request from stdin")?;
        text
    } else {
        args.request
    };
    let request: Value = serde_json::from_str(&text).context("Request is not valid JSON")?;

    let timeout = app.client.config().default_timeout();
    let response = app.client.send_raw(request, timeout)?.wait().await?;
    println!("{}", render(Value::Object(response), !args.compact)?);
    Ok(())
}

// Everything printed goes through here so suppressed error messages never
// reach the terminal.
fn render(mut value: Value, pretty: bool) -> Result<String> {
    redact_suppressed(&mut value);
    let text = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(text)
}

pub async fn handle_watch(args: WatchArgs, app: &App) -> Result<()> {
    let filter = if args.tags.is_empty() {
        Filter::updates()
    } else {
        Filter::tags(args.tags)
    };
    let mut updates = app.client.subscribe(filter);

    // Nothing arrives until the engine receives its first request.
    let state = app.client.call(&GetAuthorizationState {}).await?;
    info!(phase = %AuthPhase::of(&state), "Watching updates");

    let mut seen = 0;
    loop {
        if args.limit.is_some_and(|limit| seen >= limit) {
            break;
        }
        tokio::select! {
            next = updates.next() => match next {
                Some(object) => {
                    println!("{}", render(codec::encode(&object), false)?);
                    seen += 1;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let dropped = updates.dropped();
    if dropped > 0 {
        eprintln!("{} {dropped} updates dropped", style("warning:").yellow().bold());
    }
    Ok(())
}

pub async fn handle_login(args: LoginArgs, app: &App) -> Result<()> {
    let database_directory = args
        .database_dir
        .to_str()
        .context("Database directory is not valid UTF-8")?;
    let mut params = SetTdlibParameters::new(args.api_id, args.api_hash, database_directory);
    params.use_test_dc = args.test_dc;

    let me = app::login(&app.client, params).await?;
    println!(
        "{} {}",
        style("Logged in as").green().bold(),
        style(me.display_name()).bold()
    );
    Ok(())
}

pub async fn handle_state(app: &App) -> Result<()> {
    let state = app.client.call(&GetAuthorizationState {}).await?;
    let phase = AuthPhase::of(&state);
    println!("{}", style(phase).bold());
    if !phase.legal_actions().is_empty() {
        let actions: Vec<_> = phase.legal_actions().iter().map(|a| a.function_tag()).collect();
        println!("  next: {}", actions.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tdlink_core::types::{Error, Object};

    use super::*;

    #[test]
    fn printed_objects_hide_suppressed_messages() {
        let error = Object::Error(Error {
            code: 406,
            message: "watchsecret".to_owned(),
        });
        let line = render(codec::encode(&error), false).unwrap();
        let printed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(printed, json!({"@type": "error", "code": 406}));

        let response = json!({
            "@type": "updateMessageSendFailed",
            "error": {"@type": "error", "code": 406, "message": "callsecret"},
        });
        assert!(!render(response, true).unwrap().contains("callsecret"));
    }

    #[test]
    fn displayable_errors_are_printed_in_full() {
        let line = render(json!({"@type": "error", "code": 400, "message": "BAD"}), false).unwrap();
        assert!(line.contains("BAD"));
    }
}
