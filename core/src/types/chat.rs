use super::Message;

crate::td_object! {
    pub struct ChatTypePrivate: "chatTypePrivate" {
        pub user_id: i64,
    }
    pub struct ChatTypeBasicGroup: "chatTypeBasicGroup" {
        pub basic_group_id: i64,
    }
    pub struct ChatTypeSupergroup: "chatTypeSupergroup" {
        pub supergroup_id: i64,
        pub is_channel: bool,
    }
    pub struct ChatTypeSecret: "chatTypeSecret" {
        pub secret_chat_id: i32,
        pub user_id: i64,
    }

    pub struct ChatListMain: "chatListMain" {}
    pub struct ChatListArchive: "chatListArchive" {}
    pub struct ChatListFolder: "chatListFolder" {
        pub chat_folder_id: i32,
    }

    /// A chat. (Can be a private chat, basic group, supergroup, or secret chat.)
    pub struct Chat: "chat" {
        pub id: i64,
        pub kind as "type": ChatType,
        pub title: String,
        /// Last message in the chat; may be `None` even for non-empty chats.
        pub last_message: Option<Box<Message>>,
        pub unread_count: i32,
        pub last_read_inbox_message_id: i64,
        pub last_read_outbox_message_id: i64,
    }

    pub struct Chats: "chats" {
        /// Approximate total number of chats found.
        pub total_count: i32,
        pub chat_ids: Vec<i64>,
    }
}

crate::td_union! {
    /// Describes the type of a chat.
    pub enum ChatType {
        Private(ChatTypePrivate),
        BasicGroup(ChatTypeBasicGroup),
        Supergroup(ChatTypeSupergroup),
        Secret(ChatTypeSecret),
    }

    /// Describes a list of chats.
    pub enum ChatList {
        Main(ChatListMain),
        Archive(ChatListArchive),
        Folder(ChatListFolder),
    }
}
