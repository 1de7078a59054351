mod common;

use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tdlink_core::{
    AuthPhase, CallError, Filter,
    types::{AuthorizationState, GetMe, Object, Update},
};

use common::{auth_update, connect, next_request, option_update, wait_code_update};

#[tokio::test]
async fn canonical_sequence_drives_the_tracker() {
    let (client, mut engine) = connect();
    let transitions = Arc::new(Mutex::new(Vec::new()));
    let _listener = {
        let transitions = transitions.clone();
        client
            .auth()
            .on_transition(move |t| transitions.lock().unwrap().push(t.new))
    };
    let mut updates = client.subscribe(Filter::tags(["updateAuthorizationState"]));

    assert_eq!(client.auth().current_state(), AuthPhase::Uninitialized);

    engine.push(auth_update("authorizationStateWaitTdlibParameters"));
    engine.push(auth_update("authorizationStateWaitPhoneNumber"));
    engine.push(wait_code_update());
    engine.push(auth_update("authorizationStateReady"));
    engine.push(auth_update("authorizationStateLoggingOut"));
    engine.push(auth_update("authorizationStateClosing"));
    engine.push(auth_update("authorizationStateClosed"));

    let mut seen = Vec::new();
    while let Some(object) = updates.next().await {
        match object {
            Object::Update(Update::AuthorizationState(update)) => {
                seen.push(AuthPhase::of(&update.authorization_state))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    let expected = vec![
        AuthPhase::NeedsParameters,
        AuthPhase::NeedsPhoneNumber,
        AuthPhase::NeedsCode,
        AuthPhase::Ready,
        AuthPhase::LoggingOut,
        AuthPhase::Closing,
        AuthPhase::Closed,
    ];
    assert_eq!(seen, expected);
    assert_eq!(*transitions.lock().unwrap(), expected);
    assert_eq!(client.auth().current_state(), AuthPhase::Closed);

    let snapshot = client.auth().snapshot();
    assert_eq!(snapshot.version, 7);
    assert!(matches!(
        snapshot.state.as_deref(),
        Some(AuthorizationState::Closed(_))
    ));

    // Still the same session: nothing new is accepted.
    assert_eq!(
        client.send(&GetMe {}, None).unwrap_err(),
        CallError::SessionClosing
    );
    drop(engine);
}

#[tokio::test]
async fn closing_rejects_pending_calls() {
    let (client, mut engine) = connect();
    let mut all = client.subscribe(Filter::All);

    engine.push(auth_update("authorizationStateReady"));
    let handle = client.send(&GetMe {}, None).unwrap();
    let _ = next_request(&mut engine).await;

    engine.push(auth_update("authorizationStateClosing"));
    assert_eq!(handle.await.unwrap_err(), CallError::SessionClosing);
    assert_eq!(client.auth().current_state(), AuthPhase::Closing);

    // Subscriptions stay open until the session is closed.
    engine.push(option_update("still-open", true));
    engine.push(auth_update("authorizationStateClosed"));

    let mut tags = Vec::new();
    while let Some(object) = all.next().await {
        tags.push(tdlink_core::TdType::tag(&object));
    }
    assert_eq!(
        tags,
        [
            "updateAuthorizationState",
            "updateAuthorizationState",
            "updateOption",
            "updateAuthorizationState",
        ]
    );
    assert!(!all.is_active());
}

#[tokio::test]
async fn updates_after_closed_are_ignored() {
    let (client, engine) = connect();

    engine.push(auth_update("authorizationStateClosed"));
    engine.push(auth_update("authorizationStateReady"));

    let phase = client.auth().wait_for(AuthPhase::is_terminal).await;
    assert_eq!(phase, Some(AuthPhase::Closed));

    let mut late = client.subscribe(Filter::All);
    assert!(late.next().await.is_none());
    assert_eq!(client.auth().current_state(), AuthPhase::Closed);
    assert_eq!(client.auth().snapshot().version, 1);
}

#[tokio::test]
async fn watch_sees_every_update() {
    let (client, engine) = connect();
    let mut rx = client.auth().watch();

    engine.push(auth_update("authorizationStateWaitPhoneNumber"));
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().phase, AuthPhase::NeedsPhoneNumber);

    engine.push(auth_update("authorizationStateWaitPhoneNumber"));
    rx.changed().await.unwrap();
    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.phase, AuthPhase::NeedsPhoneNumber);
    assert_eq!(snapshot.version, 2);
}
