use super::FormattedText;

crate::td_object! {
    pub struct AuthenticationCodeTypeTelegramMessage: "authenticationCodeTypeTelegramMessage" {
        pub length: i32,
    }
    pub struct AuthenticationCodeTypeSms: "authenticationCodeTypeSms" {
        pub length: i32,
    }
    pub struct AuthenticationCodeTypeCall: "authenticationCodeTypeCall" {
        pub length: i32,
    }
    pub struct AuthenticationCodeTypeFlashCall: "authenticationCodeTypeFlashCall" {
        /// Pattern of the phone number from which the call will be made.
        pub pattern: String,
    }
    pub struct AuthenticationCodeTypeFragment: "authenticationCodeTypeFragment" {
        pub url: String,
        pub length: i32,
    }

    /// Information about the authentication code that was sent.
    pub struct AuthenticationCodeInfo: "authenticationCodeInfo" {
        pub phone_number: String,
        pub kind as "type": AuthenticationCodeType,
        /// The way the next code will be sent; `None` if unknown.
        pub next_type: Option<AuthenticationCodeType>,
        /// Timeout before the code can be re-sent, in seconds.
        pub timeout: i32,
    }

    pub struct EmailAddressAuthenticationCodeInfo: "emailAddressAuthenticationCodeInfo" {
        pub email_address_pattern: String,
        pub length: i32,
    }

    pub struct EmailAddressAuthenticationCode: "emailAddressAuthenticationCode" {
        pub code: String,
    }

    pub struct TermsOfService: "termsOfService" {
        pub text: FormattedText,
        /// The minimum age of a user to be able to accept the terms; 0 if age isn't restricted.
        pub min_user_age: i32,
        pub show_popup: bool,
    }

    pub struct PhoneNumberAuthenticationSettings: "phoneNumberAuthenticationSettings" {
        pub allow_flash_call: bool,
        pub allow_missed_call: bool,
        pub is_current_phone_number: bool,
        pub allow_sms_retriever_api: bool,
    }

    /// Parameters must be provided with `setTdlibParameters`.
    pub struct AuthorizationStateWaitTdlibParameters: "authorizationStateWaitTdlibParameters" {}

    /// The user's phone number must be provided, or a QR code login requested.
    pub struct AuthorizationStateWaitPhoneNumber: "authorizationStateWaitPhoneNumber" {}

    /// The user must buy a premium subscription to log in.
    pub struct AuthorizationStateWaitPremiumPurchase: "authorizationStateWaitPremiumPurchase" {
        pub store_product_id: String,
        pub support_email_address: String,
        pub support_email_subject: String,
    }

    pub struct AuthorizationStateWaitEmailAddress: "authorizationStateWaitEmailAddress" {
        pub allow_apple_id: bool,
        pub allow_google_id: bool,
    }

    pub struct AuthorizationStateWaitEmailCode: "authorizationStateWaitEmailCode" {
        pub allow_apple_id: bool,
        pub allow_google_id: bool,
        pub code_info: EmailAddressAuthenticationCodeInfo,
    }

    /// An authentication code must be provided with `checkAuthenticationCode`.
    pub struct AuthorizationStateWaitCode: "authorizationStateWaitCode" {
        pub code_info: AuthenticationCodeInfo,
    }

    /// The user must confirm the login on another logged-in device.
    pub struct AuthorizationStateWaitOtherDeviceConfirmation:
        "authorizationStateWaitOtherDeviceConfirmation" {
        /// A tg:// URL for the QR code.
        pub link: String,
    }

    /// The user is unregistered and needs to accept the terms of service and enter a name.
    pub struct AuthorizationStateWaitRegistration: "authorizationStateWaitRegistration" {
        pub terms_of_service: TermsOfService,
    }

    /// The user has a 2-step verification password.
    pub struct AuthorizationStateWaitPassword: "authorizationStateWaitPassword" {
        pub password_hint: String,
        pub has_recovery_email_address: bool,
        pub has_passport_data: bool,
        pub recovery_email_address_pattern: String,
    }

    /// The user has been successfully authorized.
    pub struct AuthorizationStateReady: "authorizationStateReady" {}

    pub struct AuthorizationStateLoggingOut: "authorizationStateLoggingOut" {}

    /// The engine is closing; all resources will be freed.
    pub struct AuthorizationStateClosing: "authorizationStateClosing" {}

    /// The engine is closed. No further requests will be answered.
    pub struct AuthorizationStateClosed: "authorizationStateClosed" {}
}

crate::td_union! {
    /// Provides information about the method by which an authentication code is delivered.
    pub enum AuthenticationCodeType {
        TelegramMessage(AuthenticationCodeTypeTelegramMessage),
        Sms(AuthenticationCodeTypeSms),
        Call(AuthenticationCodeTypeCall),
        FlashCall(AuthenticationCodeTypeFlashCall),
        Fragment(AuthenticationCodeTypeFragment),
    }

    pub enum EmailAddressAuthentication {
        Code(EmailAddressAuthenticationCode),
    }

    /// Represents the current authorization state of the engine.
    pub enum AuthorizationState {
        WaitTdlibParameters(AuthorizationStateWaitTdlibParameters),
        WaitPhoneNumber(AuthorizationStateWaitPhoneNumber),
        WaitPremiumPurchase(AuthorizationStateWaitPremiumPurchase),
        WaitEmailAddress(AuthorizationStateWaitEmailAddress),
        WaitEmailCode(AuthorizationStateWaitEmailCode),
        WaitCode(AuthorizationStateWaitCode),
        WaitOtherDeviceConfirmation(AuthorizationStateWaitOtherDeviceConfirmation),
        WaitRegistration(AuthorizationStateWaitRegistration),
        WaitPassword(AuthorizationStateWaitPassword),
        Ready(AuthorizationStateReady),
        LoggingOut(AuthorizationStateLoggingOut),
        Closing(AuthorizationStateClosing),
        Closed(AuthorizationStateClosed),
    }
}
