crate::td_object! {
    /// Represents a user.
    ///
    /// Only the identifier is guaranteed; everything else may be left out by
    /// engines that send partial user objects.
    pub struct User: "user" {
        pub id: i64,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub usernames: Option<Usernames>,
        pub phone_number: Option<String>,
        pub status: Option<UserStatus>,
        pub is_contact: Option<bool>,
        pub is_premium: Option<bool>,
        pub kind as "type": Option<UserType>,
        /// IETF language tag of the user's language; only available to bots.
        pub language_code: Option<String>,
    }

    /// Describes usernames assigned to a user, a supergroup, or a channel.
    pub struct Usernames: "usernames" {
        pub active_usernames: Vec<String>,
        pub disabled_usernames: Vec<String>,
        pub editable_username: String,
    }

    /// Represents a list of users.
    pub struct Users: "users" {
        pub total_count: i32,
        pub user_ids: Vec<i64>,
    }

    pub struct UserStatusEmpty: "userStatusEmpty" {}
    pub struct UserStatusOnline: "userStatusOnline" {
        /// Point in time (Unix timestamp) when the user's online status will expire.
        pub expires: i32,
    }
    pub struct UserStatusOffline: "userStatusOffline" {
        pub was_online: i32,
    }
    pub struct UserStatusRecently: "userStatusRecently" {
        pub by_my_privacy_settings: bool,
    }
    pub struct UserStatusLastWeek: "userStatusLastWeek" {
        pub by_my_privacy_settings: bool,
    }
    pub struct UserStatusLastMonth: "userStatusLastMonth" {
        pub by_my_privacy_settings: bool,
    }

    pub struct UserTypeRegular: "userTypeRegular" {}
    pub struct UserTypeDeleted: "userTypeDeleted" {}
    pub struct UserTypeBot: "userTypeBot" {
        pub can_join_groups: bool,
        pub can_read_all_group_messages: bool,
        pub is_inline: bool,
        pub inline_query_placeholder: String,
    }
    pub struct UserTypeUnknown: "userTypeUnknown" {}
}

crate::td_union! {
    /// Describes the last time the user was online.
    pub enum UserStatus {
        Empty(UserStatusEmpty),
        Online(UserStatusOnline),
        Offline(UserStatusOffline),
        Recently(UserStatusRecently),
        LastWeek(UserStatusLastWeek),
        LastMonth(UserStatusLastMonth),
    }

    pub enum UserType {
        Regular(UserTypeRegular),
        Deleted(UserTypeDeleted),
        Bot(UserTypeBot),
        Unknown(UserTypeUnknown),
    }
}

impl User {
    /// A user object carrying nothing but its identifier.
    pub fn with_id(id: i64) -> Self {
        User {
            id,
            first_name: None,
            last_name: None,
            usernames: None,
            phone_number: None,
            status: None,
            is_contact: None,
            is_premium: None,
            kind: None,
            language_code: None,
        }
    }

    /// First and last name joined by a space, skipping empty parts.
    pub fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
