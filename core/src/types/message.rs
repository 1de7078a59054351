use super::FormattedText;
use crate::codec::Int64;

crate::td_object! {
    pub struct MessageSenderUser: "messageSenderUser" {
        pub user_id: i64,
    }
    pub struct MessageSenderChat: "messageSenderChat" {
        pub chat_id: i64,
    }

    pub struct MessageText: "messageText" {
        pub text: FormattedText,
    }
    pub struct MessageAnimatedEmoji: "messageAnimatedEmoji" {
        pub emoji: String,
    }
    /// Message content that is not supported in the current engine version.
    pub struct MessageUnsupported: "messageUnsupported" {}

    /// Describes a message.
    pub struct Message: "message" {
        pub id: i64,
        pub sender_id: MessageSender,
        pub chat_id: i64,
        pub is_outgoing: bool,
        /// Point in time (Unix timestamp) when the message was sent.
        pub date: i32,
        pub edit_date: i32,
        pub content: MessageContent,
        /// Unique identifier of an album this message belongs to; 0 if none.
        pub media_album_id: Int64,
    }

    /// Contains a list of messages. Entries may be null when a message is not
    /// available.
    pub struct Messages: "messages" {
        pub total_count: i32,
        pub messages: Vec<Option<Message>>,
    }

    pub struct InputMessageText: "inputMessageText" {
        pub text: FormattedText,
        pub clear_draft: bool,
    }
}

crate::td_union! {
    /// Contains information about the sender of a message.
    pub enum MessageSender {
        User(MessageSenderUser),
        Chat(MessageSenderChat),
    }

    /// Contains the content of a message.
    pub enum MessageContent {
        Text(MessageText),
        AnimatedEmoji(MessageAnimatedEmoji),
        Unsupported(MessageUnsupported),
    }

    /// The content of a message to send.
    pub enum InputMessageContent {
        Text(InputMessageText),
    }
}

impl InputMessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        InputMessageContent::Text(InputMessageText {
            text: FormattedText::plain(text),
            clear_draft: true,
        })
    }
}
