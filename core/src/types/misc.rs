use std::fmt;

use crate::codec::{self, DecodeError, Map, TdType};
use crate::error::{RpcError, SUPPRESSED_ERROR_CODE};

crate::td_object! {
    /// An object of this type is returned on a successful function call for
    /// functions that have nothing else to return.
    pub struct Ok: "ok" {}

    /// A simple string result.
    pub struct Text: "text" {
        pub text: String,
    }

    /// A text with some entities.
    pub struct FormattedText: "formattedText" {
        pub text: String,
        pub entities: Vec<TextEntity>,
    }

    /// A part of a text that needs to be formatted in some unusual way.
    pub struct TextEntity: "textEntity" {
        /// Offset of the entity, in UTF-16 code units.
        pub offset: i32,
        /// Length of the entity, in UTF-16 code units.
        pub length: i32,
        pub kind as "type": TextEntityType,
    }

    pub struct TextEntityTypeBold: "textEntityTypeBold" {}
    pub struct TextEntityTypeItalic: "textEntityTypeItalic" {}
    pub struct TextEntityTypeCode: "textEntityTypeCode" {}
    pub struct TextEntityTypeMention: "textEntityTypeMention" {}
    pub struct TextEntityTypeUrl: "textEntityTypeUrl" {}
    pub struct TextEntityTypeTextUrl: "textEntityTypeTextUrl" {
        pub url: String,
    }

    pub struct OptionValueBoolean: "optionValueBoolean" {
        pub value: bool,
    }
    pub struct OptionValueEmpty: "optionValueEmpty" {}
    pub struct OptionValueInteger: "optionValueInteger" {
        pub value: codec::Int64,
    }
    pub struct OptionValueString: "optionValueString" {
        pub value: String,
    }

    pub struct ConnectionStateWaitingForNetwork: "connectionStateWaitingForNetwork" {}
    pub struct ConnectionStateConnectingToProxy: "connectionStateConnectingToProxy" {}
    pub struct ConnectionStateConnecting: "connectionStateConnecting" {}
    pub struct ConnectionStateUpdating: "connectionStateUpdating" {}
    pub struct ConnectionStateReady: "connectionStateReady" {}

    /// Represents a file.
    pub struct File: "file" {
        pub id: i32,
        /// File size, in bytes; 0 if unknown.
        pub size: i64,
        pub expected_size: i64,
        pub local: LocalFile,
        pub remote: RemoteFile,
    }

    pub struct LocalFile: "localFile" {
        pub path: String,
        pub can_be_downloaded: bool,
        pub is_downloading_active: bool,
        pub is_downloading_completed: bool,
        pub downloaded_size: i64,
    }

    pub struct RemoteFile: "remoteFile" {
        pub id: String,
        pub unique_id: String,
        pub is_uploading_active: bool,
        pub is_uploading_completed: bool,
        pub uploaded_size: i64,
    }
}

crate::td_union! {
    pub enum TextEntityType {
        Bold(TextEntityTypeBold),
        Italic(TextEntityTypeItalic),
        Code(TextEntityTypeCode),
        Mention(TextEntityTypeMention),
        Url(TextEntityTypeUrl),
        TextUrl(TextEntityTypeTextUrl),
    }

    /// Represents the value of an option.
    pub enum OptionValue {
        Boolean(OptionValueBoolean),
        Empty(OptionValueEmpty),
        Integer(OptionValueInteger),
        String(OptionValueString),
    }

    /// Describes the current state of the connection to the servers.
    pub enum ConnectionState {
        WaitingForNetwork(ConnectionStateWaitingForNetwork),
        ConnectingToProxy(ConnectionStateConnectingToProxy),
        Connecting(ConnectionStateConnecting),
        Updating(ConnectionStateUpdating),
        Ready(ConnectionStateReady),
    }
}

impl FormattedText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            entities: Vec::new(),
        }
    }
}

/// An error reported by the engine.
///
/// Written out by hand so that `Debug` and `Display` can redact messages of
/// code 406, which must never reach a log or a user.
#[derive(Clone, PartialEq, Eq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Error {
    pub const TAG: &'static str = "error";

    fn visible_message(&self) -> &str {
        if self.code == SUPPRESSED_ERROR_CODE {
            "<suppressed>"
        } else {
            &self.message
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("code", &self.code)
            .field("message", &self.visible_message())
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error {}: {}", self.code, self.visible_message())
    }
}

impl From<Error> for RpcError {
    fn from(err: Error) -> Self {
        RpcError::new(err.code, err.message)
    }
}

impl TdType for Error {
    const TYPE_NAME: &'static str = "Error";

    fn has_tag(tag: &str) -> bool {
        tag == Self::TAG
    }

    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn decode_tagged(_tag: &str, map: &mut Map) -> Result<Self, DecodeError> {
        Result::Ok(Error {
            code: codec::take_field(map, Self::TYPE_NAME, "code")?,
            message: codec::take_field(map, Self::TYPE_NAME, "message")?,
        })
    }

    fn encode_into(&self, map: &mut Map) {
        codec::put_field(map, "code", &self.code);
        codec::put_field(map, "message", &self.message);
    }
}

crate::__wire_field_via_tdtype!(Error);
