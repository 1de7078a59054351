//! Request functions. Each one names the object it is answered with through
//! [`Function::Return`].

use super::{
    AuthorizationState, Chat, ChatList, Chats, EmailAddressAuthentication, InputMessageContent,
    Message, Messages, OptionValue, PhoneNumberAuthenticationSettings, User,
};
use crate::codec::Function;

crate::td_object! {
    /// Returns the current authorization state. Should be used only for
    /// diagnostics; the state is normally tracked from updates.
    pub struct GetAuthorizationState: "getAuthorizationState" {}

    /// Sets the parameters for engine initialization. Works only while the
    /// authorization state is `authorizationStateWaitTdlibParameters`.
    pub struct SetTdlibParameters: "setTdlibParameters" {
        pub use_test_dc: bool,
        pub database_directory: String,
        pub files_directory: String,
        /// Encryption key for the database, as base64 text.
        pub database_encryption_key: String,
        pub use_file_database: bool,
        pub use_chat_info_database: bool,
        pub use_message_database: bool,
        pub use_secret_chats: bool,
        pub api_id: i32,
        pub api_hash: String,
        pub system_language_code: String,
        pub device_model: String,
        pub system_version: String,
        pub application_version: String,
    }

    pub struct SetAuthenticationPhoneNumber: "setAuthenticationPhoneNumber" {
        pub phone_number: String,
        pub settings: Option<PhoneNumberAuthenticationSettings>,
    }

    pub struct SetAuthenticationEmailAddress: "setAuthenticationEmailAddress" {
        pub email_address: String,
    }

    pub struct CheckAuthenticationEmailCode: "checkAuthenticationEmailCode" {
        pub code: EmailAddressAuthentication,
    }

    /// Re-sends an authentication code when the next code type is known.
    pub struct ResendAuthenticationCode: "resendAuthenticationCode" {}

    pub struct CheckAuthenticationCode: "checkAuthenticationCode" {
        pub code: String,
    }

    /// Requests QR code authentication by scanning a QR code on another
    /// logged-in device.
    pub struct RequestQrCodeAuthentication: "requestQrCodeAuthentication" {
        pub other_user_ids: Vec<i64>,
    }

    pub struct RegisterUser: "registerUser" {
        pub first_name: String,
        pub last_name: String,
        pub disable_notification: bool,
    }

    pub struct CheckAuthenticationPassword: "checkAuthenticationPassword" {
        pub password: String,
    }

    pub struct RequestAuthenticationPasswordRecovery: "requestAuthenticationPasswordRecovery" {}

    /// Closes the engine after a proper logout, deleting all local data.
    pub struct LogOut: "logOut" {}

    /// Closes the engine after properly closing all databases.
    pub struct Close: "close" {}

    /// Closes the engine and destroys all local data without a proper logout.
    pub struct Destroy: "destroy" {}

    /// Returns the current user.
    pub struct GetMe: "getMe" {}

    pub struct GetUser: "getUser" {
        pub user_id: i64,
    }

    pub struct GetChat: "getChat" {
        pub chat_id: i64,
    }

    /// Returns an ordered list of chats from the beginning of a chat list.
    pub struct GetChats: "getChats" {
        /// The chat list; the main list when `None`.
        pub chat_list: Option<ChatList>,
        pub limit: i32,
    }

    pub struct GetChatHistory: "getChatHistory" {
        pub chat_id: i64,
        pub from_message_id: i64,
        pub offset: i32,
        pub limit: i32,
        pub only_local: bool,
    }

    pub struct SendMessage: "sendMessage" {
        pub chat_id: i64,
        pub message_thread_id: i64,
        pub input_message_content: InputMessageContent,
    }

    pub struct GetOption: "getOption" {
        pub name: String,
    }

    /// Sets the value of an option; `None` resets it to its default.
    pub struct SetOption: "setOption" {
        pub name: String,
        pub value: Option<OptionValue>,
    }

    pub struct SetLogVerbosityLevel: "setLogVerbosityLevel" {
        pub new_verbosity_level: i32,
    }

    /// Does nothing; for testing only.
    pub struct TestCallEmpty: "testCallEmpty" {}
}

macro_rules! returns {
    ($($function:ty => $ret:ty),* $(,)?) => {
        $(
            impl Function for $function {
                type Return = $ret;
            }
        )*
    };
}

returns! {
    GetAuthorizationState => AuthorizationState,
    SetTdlibParameters => super::Ok,
    SetAuthenticationPhoneNumber => super::Ok,
    SetAuthenticationEmailAddress => super::Ok,
    CheckAuthenticationEmailCode => super::Ok,
    ResendAuthenticationCode => super::Ok,
    CheckAuthenticationCode => super::Ok,
    RequestQrCodeAuthentication => super::Ok,
    RegisterUser => super::Ok,
    CheckAuthenticationPassword => super::Ok,
    RequestAuthenticationPasswordRecovery => super::Ok,
    LogOut => super::Ok,
    Close => super::Ok,
    Destroy => super::Ok,
    GetMe => User,
    GetUser => User,
    GetChat => Chat,
    GetChats => Chats,
    GetChatHistory => Messages,
    SendMessage => Message,
    GetOption => OptionValue,
    SetOption => super::Ok,
    SetLogVerbosityLevel => super::Ok,
    TestCallEmpty => super::Ok,
}

impl SetTdlibParameters {
    /// Parameters with the given credentials and database directory; every
    /// database is enabled and the remaining fields are filled from the host.
    pub fn new(
        api_id: i32,
        api_hash: impl Into<String>,
        database_directory: impl Into<String>,
    ) -> Self {
        SetTdlibParameters {
            use_test_dc: false,
            database_directory: database_directory.into(),
            files_directory: String::new(),
            database_encryption_key: String::new(),
            use_file_database: true,
            use_chat_info_database: true,
            use_message_database: true,
            use_secret_chats: false,
            api_id,
            api_hash: api_hash.into(),
            system_language_code: "en".to_owned(),
            device_model: std::env::consts::ARCH.to_owned(),
            system_version: std::env::consts::OS.to_owned(),
            application_version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}
