mod common;

use std::time::Duration;

use futures::{StreamExt, future::join_all};
use serde_json::json;
use tdlink_core::{
    CallError, ClientConfig, Filter,
    types::{GetMe, GetUser, Object, User},
};

use common::{connect, connect_with, next_request};

#[tokio::test]
async fn get_me_with_caller_token_resolves_and_is_not_dispatched() {
    let (client, mut engine) = connect();
    let mut updates = client.subscribe(Filter::All);

    let handle = client
        .send_with_extra(&GetMe {}, "tok1", Some(Duration::from_secs(5)))
        .unwrap();
    let request = next_request(&mut engine).await;
    assert_eq!(request, json!({"@type": "getMe", "@extra": "tok1"}));

    engine.push(json!({"@type": "user", "id": 42, "@extra": "tok1"}));
    engine.push(json!({
        "@type": "updateOption",
        "name": "marker",
        "value": {"@type": "optionValueEmpty"},
    }));

    assert_eq!(handle.await.unwrap(), User::with_id(42));

    // The only thing a subscriber sees is the update pushed afterwards.
    let first = updates.next().await.unwrap();
    assert!(first.is_update(), "subscriber saw {first:?}");
}

#[tokio::test]
async fn concurrent_calls_resolve_with_their_own_responses() {
    let (client, mut engine) = connect();
    const N: i64 = 16;

    let handles: Vec<_> = (0..N)
        .map(|i| client.send(&GetUser { user_id: i }, None).unwrap())
        .collect();

    let mut requests = Vec::new();
    for _ in 0..N {
        requests.push(next_request(&mut engine).await);
    }
    let mut tokens: Vec<_> = requests.iter().map(|r| r["@extra"].clone()).collect();
    tokens.sort_by_key(|t| t.to_string());
    tokens.dedup();
    assert_eq!(tokens.len(), N as usize, "tokens must be distinct");

    // Answer in reverse order.
    for request in requests.iter().rev() {
        engine.push(json!({
            "@type": "user",
            "id": request["user_id"],
            "@extra": request["@extra"],
        }));
    }

    let users = join_all(handles.into_iter().map(|handle| handle.wait())).await;
    for (i, user) in users.into_iter().enumerate() {
        assert_eq!(user.unwrap().id, i as i64);
    }
}

#[tokio::test]
async fn zero_timeout_rejects_without_affecting_others() {
    let (client, mut engine) = connect();

    let patient = client.send(&GetUser { user_id: 1 }, None).unwrap();
    let impatient = client
        .send(&GetUser { user_id: 2 }, Some(Duration::ZERO))
        .unwrap();
    let impatient_token = impatient.token().to_owned();

    assert_eq!(impatient.await.unwrap_err(), CallError::Timeout);

    let _ = next_request(&mut engine).await;
    let _ = next_request(&mut engine).await;

    // The late answer is dropped, the other call is still served.
    let mut updates = client.subscribe(Filter::All);
    engine.push(json!({"@type": "user", "id": 2, "@extra": impatient_token}));
    engine.push(json!({"@type": "user", "id": 1, "@extra": patient.token()}));
    assert_eq!(patient.await.unwrap().id, 1);

    engine.disconnect();
    assert!(updates.next().await.is_none(), "late response must not be dispatched");
}

#[tokio::test]
async fn cancelled_call_discards_its_response() {
    let (client, mut engine) = connect();
    let mut updates = client.subscribe(Filter::All);

    let handle = client.send_with_extra(&GetMe {}, "gone", None).unwrap();
    let _ = next_request(&mut engine).await;
    handle.cancel();
    assert_eq!(client.pending_calls(), 0);

    engine.push(json!({"@type": "user", "id": 1, "@extra": "gone"}));
    engine.disconnect();
    assert!(updates.next().await.is_none());
    assert!(matches!(
        client.send_with_extra(&GetMe {}, "gone", None),
        Err(CallError::DuplicateToken(_)) | Err(CallError::TransportClosed)
    ));
}

#[tokio::test]
async fn duplicate_response_is_ignored() {
    let (client, mut engine) = connect();
    let mut updates = client.subscribe(Filter::All);

    let handle = client.send_with_extra(&GetMe {}, "once", None).unwrap();
    let _ = next_request(&mut engine).await;
    engine.push(json!({"@type": "user", "id": 1, "@extra": "once"}));
    engine.push(json!({"@type": "user", "id": 2, "@extra": "once"}));
    engine.push(json!({"@type": "user", "id": 3}));

    assert_eq!(handle.await.unwrap().id, 1);
    assert_eq!(updates.next().await, Some(Object::User(User::with_id(3))));
}

#[tokio::test]
async fn error_object_rejects_the_call() {
    let (client, mut engine) = connect();

    let handle = client.send(&GetUser { user_id: 9 }, None).unwrap();
    let request = next_request(&mut engine).await;
    engine.push(json!({
        "@type": "error",
        "code": 400,
        "message": "USER_NOT_FOUND",
        "@extra": request["@extra"],
    }));

    match handle.await {
        Err(CallError::Rpc(err)) => {
            assert_eq!(err.code(), 400);
            assert_eq!(err.message(), Some("USER_NOT_FOUND"));
        }
        other => panic!("expected an rpc error, got {other:?}"),
    }
}

#[tokio::test]
async fn suppressed_error_never_formats_its_message() {
    let (client, mut engine) = connect();

    let handle = client.send(&GetMe {}, None).unwrap();
    let request = next_request(&mut engine).await;
    engine.push(json!({
        "@type": "error",
        "code": 406,
        "message": "secret",
        "@extra": request["@extra"],
    }));

    let err = handle.await.unwrap_err();
    assert!(!err.to_string().contains("secret"));
    assert!(!format!("{err:?}").contains("secret"));
    let CallError::Rpc(rpc) = err else {
        panic!("expected an rpc error");
    };
    assert!(!rpc.is_displayable());
}

#[tokio::test]
async fn undecodable_response_is_a_decode_error() {
    let (client, mut engine) = connect();

    let handle = client.send(&GetMe {}, None).unwrap();
    let request = next_request(&mut engine).await;
    engine.push(json!({
        "@type": "chats",
        "total_count": 0,
        "chat_ids": [],
        "@extra": request["@extra"],
    }));

    assert!(matches!(handle.await, Err(CallError::Decode(_))));
}

#[tokio::test]
async fn raw_calls_keep_the_callers_extra() {
    let (client, mut engine) = connect();

    let call = client
        .send_raw(json!({"@type": "getOption", "name": "version", "@extra": 77}), None)
        .unwrap();
    assert_eq!(call.token(), "77");
    let request = next_request(&mut engine).await;
    assert_eq!(request["@extra"], json!(77));

    engine.push(json!({
        "@type": "optionValueString",
        "value": "1.8",
        "@extra": 77,
        "@client_id": 1,
    }));
    let response = call.wait().await.unwrap();
    assert_eq!(response.get("@type"), Some(&json!("optionValueString")));
    assert!(response.get("@extra").is_none());
    assert!(response.get("@client_id").is_none());
}

#[tokio::test]
async fn call_raw_decodes_a_general_object() {
    let (client, mut engine) = connect();

    let responder = tokio::spawn(async move {
        let request = next_request(&mut engine).await;
        engine.push(json!({"@type": "ok", "@extra": request["@extra"]}));
        engine
    });

    let object = client
        .call_raw(json!({
            "@type": "setOption",
            "name": "online",
            "value": {"@type": "optionValueBoolean", "value": true},
        }))
        .await
        .unwrap();
    assert!(matches!(object, Object::Ok(_)));
    drop(responder.await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn default_timeout_applies_to_call() {
    let (client, _engine) = connect_with(
        ClientConfig::default().with_default_timeout(Some(Duration::from_millis(250))),
    );
    assert_eq!(client.call(&GetMe {}).await.unwrap_err(), CallError::Timeout);
    assert_eq!(client.pending_calls(), 0);
}

#[tokio::test]
async fn transport_end_rejects_pending_calls() {
    let (client, mut engine) = connect();
    let handle = client.send(&GetMe {}, None).unwrap();
    let _ = next_request(&mut engine).await;

    engine.disconnect();
    assert_eq!(handle.await.unwrap_err(), CallError::TransportClosed);
    assert!(!client.is_open());
}
