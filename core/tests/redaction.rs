mod common;

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use serde_json::json;
use tdlink_core::{CallError, Client, ClientConfig, Filter, transport};

use common::{next_request, option_update};

// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

// The default test runtime is single-threaded, so the reader and writer tasks
// log through the scoped subscriber as well.
#[tokio::test]
async fn wire_log_never_contains_suppressed_messages() {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer({
            let captured = captured.clone();
            move || captured.clone()
        })
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (transport, mut engine) = transport::channel();
    let config = ClientConfig {
        wire_log: true,
        ..ClientConfig::default()
    };
    let client = Client::connect(transport, config);
    let mut updates = client.subscribe(Filter::All);

    let call = client
        .send_raw(json!({"@type": "sendMessage", "chat_id": 1, "@extra": "m1"}), None)
        .unwrap();
    let _ = next_request(&mut engine).await;
    engine.push(json!({"@type": "error", "code": 406, "message": "topsecret", "@extra": "m1"}));
    assert!(matches!(call.wait().await, Err(CallError::Rpc(_))));

    engine.push(json!({
        "@type": "updateMessageSendFailed",
        "old_message_id": 5,
        "error": {"@type": "error", "code": 406, "message": "nestedsecret"},
    }));
    engine.push(option_update("marker", true));
    while let Some(object) = updates.next().await {
        if tdlink_core::TdType::tag(&object) == "updateOption" {
            break;
        }
    }

    let logs = captured.text();
    assert!(logs.contains("updateMessageSendFailed"), "wire log is missing: {logs}");
    assert!(!logs.contains("topsecret"));
    assert!(!logs.contains("nestedsecret"));
}
