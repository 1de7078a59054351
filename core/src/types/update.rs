use super::{
    AuthorizationState, Chat, ChatList, ConnectionState, Error, File, Message, OptionValue,
    TermsOfService, User, UserStatus,
};

crate::td_object! {
    /// The user authorization state has changed.
    pub struct UpdateAuthorizationState: "updateAuthorizationState" {
        pub authorization_state: AuthorizationState,
    }

    /// A new message was received; can also be an outgoing message.
    pub struct UpdateNewMessage: "updateNewMessage" {
        pub message: Message,
    }

    /// A message has been successfully sent.
    pub struct UpdateMessageSendSucceeded: "updateMessageSendSucceeded" {
        pub message: Message,
        /// The previous temporary message identifier.
        pub old_message_id: i64,
    }

    /// A message failed to send.
    pub struct UpdateMessageSendFailed: "updateMessageSendFailed" {
        pub message: Message,
        pub old_message_id: i64,
        pub error: Error,
    }

    /// Some messages were deleted.
    pub struct UpdateDeleteMessages: "updateDeleteMessages" {
        pub chat_id: i64,
        pub message_ids: Vec<i64>,
        /// False if the messages were only removed from the local cache.
        pub is_permanent: bool,
        pub from_cache: bool,
    }

    /// A new chat has been loaded. Always sent before the chat identifier is
    /// returned to the application.
    pub struct UpdateNewChat: "updateNewChat" {
        pub chat: Chat,
    }

    pub struct UpdateChatTitle: "updateChatTitle" {
        pub chat_id: i64,
        pub title: String,
    }

    pub struct UpdateChatReadInbox: "updateChatReadInbox" {
        pub chat_id: i64,
        pub last_read_inbox_message_id: i64,
        pub unread_count: i32,
    }

    /// Some data of a user has changed.
    pub struct UpdateUser: "updateUser" {
        pub user: User,
    }

    pub struct UpdateUserStatus: "updateUserStatus" {
        pub user_id: i64,
        pub status: UserStatus,
    }

    /// An option changed its value.
    pub struct UpdateOption: "updateOption" {
        pub name: String,
        pub value: OptionValue,
    }

    pub struct UpdateConnectionState: "updateConnectionState" {
        pub state: ConnectionState,
    }

    /// Information about a file was updated.
    pub struct UpdateFile: "updateFile" {
        pub file: File,
    }

    pub struct UpdateUnreadMessageCount: "updateUnreadMessageCount" {
        pub chat_list: ChatList,
        pub unread_count: i32,
        pub unread_unmuted_count: i32,
    }

    /// New terms of service must be accepted by the user.
    pub struct UpdateTermsOfService: "updateTermsOfService" {
        pub terms_of_service_id: String,
        pub terms_of_service: TermsOfService,
    }

    /// A batch of updates delivered in a single object. The router unpacks it
    /// and dispatches the contained updates one by one.
    pub struct Updates: "updates" {
        pub updates: Vec<Update>,
    }
}

crate::td_union! {
    /// Contains notifications about data changes.
    pub enum Update {
        AuthorizationState(UpdateAuthorizationState),
        NewMessage(UpdateNewMessage),
        MessageSendSucceeded(UpdateMessageSendSucceeded),
        MessageSendFailed(UpdateMessageSendFailed),
        DeleteMessages(UpdateDeleteMessages),
        NewChat(UpdateNewChat),
        ChatTitle(UpdateChatTitle),
        ChatReadInbox(UpdateChatReadInbox),
        User(UpdateUser),
        UserStatus(UpdateUserStatus),
        Option(UpdateOption),
        ConnectionState(UpdateConnectionState),
        File(UpdateFile),
        UnreadMessageCount(UpdateUnreadMessageCount),
        TermsOfService(UpdateTermsOfService),
    }
}
