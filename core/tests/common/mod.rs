#![allow(dead_code)]

use std::time::Duration;

use serde_json::{Value, json};
use tdlink_core::{
    Client, ClientConfig, OverflowPolicy,
    transport::{self, EngineHandle},
};

// Helper to initialize tracing subscriber
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A client connected to a scripted engine through the in-memory transport.
pub fn connect() -> (Client, EngineHandle) {
    connect_with(ClientConfig::default())
}

pub fn connect_with(config: ClientConfig) -> (Client, EngineHandle) {
    setup_tracing();
    let (transport, engine) = transport::channel();
    (Client::connect(transport, config), engine)
}

pub fn connect_with_overflow(policy: OverflowPolicy, capacity: usize) -> (Client, EngineHandle) {
    connect_with(ClientConfig::default().with_overflow(policy, capacity))
}

/// Waits for the next request, failing the test instead of hanging.
pub async fn next_request(engine: &mut EngineHandle) -> Value {
    tokio::time::timeout(Duration::from_secs(5), engine.next_request())
        .await
        .expect("no request within 5s")
        .expect("client writer is gone")
}

pub fn auth_update(state: &str) -> Value {
    json!({
        "@type": "updateAuthorizationState",
        "authorization_state": { "@type": state },
    })
}

pub fn wait_code_update() -> Value {
    json!({
        "@type": "updateAuthorizationState",
        "authorization_state": {
            "@type": "authorizationStateWaitCode",
            "code_info": {
                "@type": "authenticationCodeInfo",
                "phone_number": "+15550100",
                "type": { "@type": "authenticationCodeTypeSms", "length": 5 },
                "timeout": 60,
            },
        },
    })
}

pub fn option_update(name: &str, value: bool) -> Value {
    json!({
        "@type": "updateOption",
        "name": name,
        "value": { "@type": "optionValueBoolean", "value": value },
    })
}
