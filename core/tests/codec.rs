use serde_json::json;
use tdlink_core::{
    DecodeError, Int64, TdType,
    codec::{self, decode, decode_str, encode},
    types::{
        AuthenticationCodeInfo, AuthenticationCodeType, AuthenticationCodeTypeSms,
        AuthorizationState, AuthorizationStateWaitCode, Chat, ChatType, ChatTypePrivate,
        FormattedText, GetChats, Message, MessageContent, MessageSender, MessageSenderUser,
        MessageText, Messages, Object, OptionValue, OptionValueInteger, SetTdlibParameters,
        TextEntity, TextEntityType, TextEntityTypeBold, Update, UpdateNewMessage, UpdateOption,
        Updates, User, UserStatus, UserStatusOnline,
    },
};

fn round_trip<T: TdType + PartialEq + std::fmt::Debug + Clone>(value: T) {
    let encoded = encode(&value);
    assert_eq!(encoded, encode(&value), "encoding is deterministic");
    let decoded: T = decode(encoded).unwrap();
    assert_eq!(decoded, value);
}

fn sample_message(id: i64) -> Message {
    Message {
        id,
        sender_id: MessageSender::User(MessageSenderUser { user_id: 42 }),
        chat_id: 7,
        is_outgoing: false,
        date: 1_700_000_000,
        edit_date: 0,
        content: MessageContent::Text(MessageText {
            text: FormattedText {
                text: "hello".to_owned(),
                entities: vec![TextEntity {
                    offset: 0,
                    length: 5,
                    kind: TextEntityType::Bold(TextEntityTypeBold {}),
                }],
            },
        }),
        media_album_id: Int64(i64::MAX),
    }
}

#[test]
fn scenario_user_decodes_from_minimal_object() {
    let user: User = decode(json!({"@type": "user", "id": 42})).unwrap();
    assert_eq!(user, User::with_id(42));
}

#[test]
fn objects_round_trip() {
    round_trip(sample_message(1));
    round_trip(Chat {
        id: 7,
        kind: ChatType::Private(ChatTypePrivate { user_id: 42 }),
        title: "Alice".to_owned(),
        last_message: Some(Box::new(sample_message(2))),
        unread_count: 3,
        last_read_inbox_message_id: 1,
        last_read_outbox_message_id: 2,
    });
    round_trip(Messages {
        total_count: 2,
        messages: vec![Some(sample_message(3)), None],
    });
    round_trip(User {
        first_name: Some("Alice".to_owned()),
        last_name: Some(String::new()),
        status: Some(UserStatus::Online(UserStatusOnline { expires: 99 })),
        ..User::with_id(42)
    });
    round_trip(SetTdlibParameters::new(123, "hash", "/tmp/td"));
    round_trip(GetChats {
        chat_list: None,
        limit: 20,
    });
}

#[test]
fn unions_round_trip() {
    round_trip(AuthorizationState::WaitCode(AuthorizationStateWaitCode {
        code_info: AuthenticationCodeInfo {
            phone_number: "+15550100".to_owned(),
            kind: AuthenticationCodeType::Sms(AuthenticationCodeTypeSms { length: 5 }),
            next_type: None,
            timeout: 60,
        },
    }));
    round_trip(Object::Update(Update::Option(UpdateOption {
        name: "version".to_owned(),
        value: OptionValue::Integer(OptionValueInteger {
            value: Int64(-9_007_199_254_740_993),
        }),
    })));
    round_trip(Object::Updates(Updates {
        updates: vec![Update::NewMessage(UpdateNewMessage {
            message: sample_message(4),
        })],
    }));
}

#[test]
fn absent_optionals_are_omitted() {
    let encoded = encode(&GetChats {
        chat_list: None,
        limit: 5,
    });
    assert_eq!(encoded, json!({"@type": "getChats", "limit": 5}));

    let user = encode(&User::with_id(1));
    assert_eq!(user, json!({"@type": "user", "id": 1}));
}

#[test]
fn keyword_fields_use_their_wire_name() {
    let encoded = encode(&TextEntity {
        offset: 1,
        length: 2,
        kind: TextEntityType::Bold(TextEntityTypeBold {}),
    });
    assert_eq!(encoded["type"]["@type"], "textEntityTypeBold");
    assert!(encoded.get("kind").is_none());
}

#[test]
fn int64_is_a_string_on_the_wire() {
    let encoded = encode(&sample_message(1));
    assert_eq!(encoded["media_album_id"], json!("9223372036854775807"));

    let decoded: OptionValue =
        decode(json!({"@type": "optionValueInteger", "value": "-9007199254740993"})).unwrap();
    assert_eq!(
        decoded,
        OptionValue::Integer(OptionValueInteger {
            value: Int64(-9_007_199_254_740_993)
        })
    );
}

#[test]
fn unknown_tag_is_reported() {
    let err = decode::<Object>(json!({"@type": "somethingFromTheFuture"})).unwrap_err();
    assert_eq!(
        err,
        DecodeError::UnknownTag {
            tag: "somethingFromTheFuture".to_owned(),
            expected: "Object",
        }
    );
}

#[test]
fn tag_of_another_union_is_unknown() {
    // A perfectly valid object, but not an authorization state.
    let err = decode::<AuthorizationState>(json!({"@type": "userStatusEmpty"})).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::UnknownTag { ref tag, expected: "AuthorizationState" }
            if tag == "userStatusEmpty"
    ));

    let nested = decode::<User>(json!({
        "@type": "user",
        "id": 1,
        "status": {"@type": "chatTypePrivate", "user_id": 1},
    }))
    .unwrap_err();
    assert!(matches!(nested, DecodeError::UnknownTag { expected: "UserStatus", .. }));
}

#[test]
fn missing_and_mismatched_fields() {
    assert_eq!(
        decode::<User>(json!({"@type": "user"})).unwrap_err(),
        DecodeError::MissingField {
            type_name: "User",
            field: "id"
        }
    );
    assert_eq!(
        decode::<User>(json!({"id": 1})).unwrap_err(),
        DecodeError::MissingField {
            type_name: "User",
            field: "@type"
        }
    );
    assert_eq!(
        decode::<User>(json!({"@type": "user", "id": "1"})).unwrap_err(),
        DecodeError::TypeMismatch {
            type_name: "User",
            field: "id",
            expected: "int53",
            found: "string",
        }
    );
    assert!(matches!(
        decode::<User>(json!([1])),
        Err(DecodeError::TypeMismatch { expected: "object", .. })
    ));
    assert!(matches!(decode_str::<User>("{not json"), Err(DecodeError::Json(_))));
}

#[test]
fn unknown_fields_are_ignored() {
    let user: User = decode(json!({
        "@type": "user",
        "id": 5,
        "added_in_a_later_version": [1, 2],
    }))
    .unwrap();
    assert_eq!(user.id, 5);
}

#[test]
fn peek_tag_reads_without_decoding() {
    let value = json!({"@type": "updateFile", "file": 3});
    assert_eq!(codec::peek_tag(&value), Some("updateFile"));
    assert_eq!(codec::peek_tag(&json!({"id": 1})), None);
}
