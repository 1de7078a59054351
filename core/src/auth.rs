//! Tracking of the session's authorization phase.
//!
//! The engine announces every change of its authorization state with an
//! `updateAuthorizationState` update. The [`AuthTracker`] keeps the latest one
//! in a versioned cell, projects it onto an [`AuthPhase`], and notifies
//! listeners of every transition. It never blocks requests; what is legal in a
//! phase is only advisory ([`AuthPhase::legal_actions`]).

use std::{fmt, sync::Arc};

use tokio::sync::watch;

use crate::{
    codec::TdType,
    event::{Event, Listener, ListenerList},
    types::{
        AuthorizationState, CheckAuthenticationCode, CheckAuthenticationEmailCode,
        CheckAuthenticationPassword, Close, Destroy, LogOut, RegisterUser,
        RequestAuthenticationPasswordRecovery, RequestQrCodeAuthentication,
        ResendAuthenticationCode, SetAuthenticationEmailAddress, SetAuthenticationPhoneNumber,
        SetTdlibParameters,
    },
};

/// The authorization phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthPhase {
    /// No authorization state has been observed yet.
    Uninitialized,
    NeedsParameters,
    NeedsPhoneNumber,
    NeedsEmailAddress,
    NeedsEmailCode,
    NeedsCode,
    NeedsOtherDeviceConfirmation,
    NeedsRegistration,
    NeedsPassword,
    NeedsPremiumPurchase,
    Ready,
    LoggingOut,
    Closing,
    Closed,
}

/// A request that moves the authorization forward (or ends it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthAction {
    SetParameters,
    SetPhoneNumber,
    RequestQrCode,
    SetEmailAddress,
    CheckEmailCode,
    CheckCode,
    ResendCode,
    RegisterUser,
    CheckPassword,
    RequestPasswordRecovery,
    LogOut,
    Close,
    Destroy,
}

impl AuthAction {
    /// The `@type` of the request that performs this action.
    pub fn function_tag(self) -> &'static str {
        match self {
            AuthAction::SetParameters => SetTdlibParameters::TAG,
            AuthAction::SetPhoneNumber => SetAuthenticationPhoneNumber::TAG,
            AuthAction::RequestQrCode => RequestQrCodeAuthentication::TAG,
            AuthAction::SetEmailAddress => SetAuthenticationEmailAddress::TAG,
            AuthAction::CheckEmailCode => CheckAuthenticationEmailCode::TAG,
            AuthAction::CheckCode => CheckAuthenticationCode::TAG,
            AuthAction::ResendCode => ResendAuthenticationCode::TAG,
            AuthAction::RegisterUser => RegisterUser::TAG,
            AuthAction::CheckPassword => CheckAuthenticationPassword::TAG,
            AuthAction::RequestPasswordRecovery => RequestAuthenticationPasswordRecovery::TAG,
            AuthAction::LogOut => LogOut::TAG,
            AuthAction::Close => Close::TAG,
            AuthAction::Destroy => Destroy::TAG,
        }
    }
}

impl AuthPhase {
    pub fn of(state: &AuthorizationState) -> Self {
        match state {
            AuthorizationState::WaitTdlibParameters(_) => AuthPhase::NeedsParameters,
            AuthorizationState::WaitPhoneNumber(_) => AuthPhase::NeedsPhoneNumber,
            AuthorizationState::WaitPremiumPurchase(_) => AuthPhase::NeedsPremiumPurchase,
            AuthorizationState::WaitEmailAddress(_) => AuthPhase::NeedsEmailAddress,
            AuthorizationState::WaitEmailCode(_) => AuthPhase::NeedsEmailCode,
            AuthorizationState::WaitCode(_) => AuthPhase::NeedsCode,
            AuthorizationState::WaitOtherDeviceConfirmation(_) => {
                AuthPhase::NeedsOtherDeviceConfirmation
            }
            AuthorizationState::WaitRegistration(_) => AuthPhase::NeedsRegistration,
            AuthorizationState::WaitPassword(_) => AuthPhase::NeedsPassword,
            AuthorizationState::Ready(_) => AuthPhase::Ready,
            AuthorizationState::LoggingOut(_) => AuthPhase::LoggingOut,
            AuthorizationState::Closing(_) => AuthPhase::Closing,
            AuthorizationState::Closed(_) => AuthPhase::Closed,
        }
    }

    /// Requests that make sense in this phase. `Close` and `Destroy` are
    /// accepted in every phase the engine still answers in.
    pub fn legal_actions(self) -> &'static [AuthAction] {
        use AuthAction as A;
        match self {
            AuthPhase::Uninitialized => &[],
            AuthPhase::NeedsParameters => &[A::SetParameters, A::Close, A::Destroy],
            AuthPhase::NeedsPhoneNumber => {
                &[A::SetPhoneNumber, A::RequestQrCode, A::Close, A::Destroy]
            }
            AuthPhase::NeedsEmailAddress => &[A::SetEmailAddress, A::LogOut, A::Close, A::Destroy],
            AuthPhase::NeedsEmailCode => {
                &[A::CheckEmailCode, A::ResendCode, A::LogOut, A::Close, A::Destroy]
            }
            AuthPhase::NeedsCode => &[A::CheckCode, A::ResendCode, A::LogOut, A::Close, A::Destroy],
            AuthPhase::NeedsOtherDeviceConfirmation => {
                &[A::RequestQrCode, A::SetPhoneNumber, A::LogOut, A::Close, A::Destroy]
            }
            AuthPhase::NeedsRegistration => &[A::RegisterUser, A::LogOut, A::Close, A::Destroy],
            AuthPhase::NeedsPassword => &[
                A::CheckPassword,
                A::RequestPasswordRecovery,
                A::LogOut,
                A::Close,
                A::Destroy,
            ],
            AuthPhase::NeedsPremiumPurchase => &[A::LogOut, A::Close, A::Destroy],
            AuthPhase::Ready => &[A::LogOut, A::Close, A::Destroy],
            AuthPhase::LoggingOut => &[A::Close, A::Destroy],
            AuthPhase::Closing | AuthPhase::Closed => &[],
        }
    }

    pub fn allows(self, action: AuthAction) -> bool {
        self.legal_actions().contains(&action)
    }

    /// Whether the engine waits for input from the user in this phase.
    pub fn awaits_user(self) -> bool {
        matches!(
            self,
            AuthPhase::NeedsPhoneNumber
                | AuthPhase::NeedsEmailAddress
                | AuthPhase::NeedsEmailCode
                | AuthPhase::NeedsCode
                | AuthPhase::NeedsOtherDeviceConfirmation
                | AuthPhase::NeedsRegistration
                | AuthPhase::NeedsPassword
        )
    }

    pub fn is_terminal(self) -> bool {
        self == AuthPhase::Closed
    }
}

impl fmt::Display for AuthPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthPhase::Uninitialized => "uninitialized",
            AuthPhase::NeedsParameters => "needs parameters",
            AuthPhase::NeedsPhoneNumber => "needs phone number",
            AuthPhase::NeedsEmailAddress => "needs email address",
            AuthPhase::NeedsEmailCode => "needs email code",
            AuthPhase::NeedsCode => "needs code",
            AuthPhase::NeedsOtherDeviceConfirmation => "needs other device confirmation",
            AuthPhase::NeedsRegistration => "needs registration",
            AuthPhase::NeedsPassword => "needs password",
            AuthPhase::NeedsPremiumPurchase => "needs premium purchase",
            AuthPhase::Ready => "ready",
            AuthPhase::LoggingOut => "logging out",
            AuthPhase::Closing => "closing",
            AuthPhase::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// A consistent view of the authorization cell.
#[derive(Debug, Clone)]
pub struct AuthSnapshot {
    /// Number of authorization updates observed so far.
    pub version: u64,
    pub phase: AuthPhase,
    /// The last observed protocol object; `None` while uninitialized.
    pub state: Option<Arc<AuthorizationState>>,
}

impl AuthSnapshot {
    fn initial() -> Self {
        AuthSnapshot {
            version: 0,
            phase: AuthPhase::Uninitialized,
            state: None,
        }
    }
}

/// Fired for every observed authorization update, including repeats of the
/// current phase.
#[derive(Debug, Clone)]
pub struct AuthTransition {
    pub old: AuthPhase,
    pub new: AuthPhase,
    pub version: u64,
    pub state: Arc<AuthorizationState>,
}

impl Event for AuthTransition {}

/// Holds the current authorization state of one session.
///
/// Only the session's reader task writes to it.
#[derive(Debug)]
pub struct AuthTracker {
    cell: watch::Sender<AuthSnapshot>,
    listeners: ListenerList<AuthTransition>,
}

impl AuthTracker {
    pub fn new() -> Self {
        AuthTracker {
            cell: watch::Sender::new(AuthSnapshot::initial()),
            listeners: ListenerList::new(),
        }
    }

    pub fn current_state(&self) -> AuthPhase {
        self.cell.borrow().phase
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.cell.borrow().clone()
    }

    /// A receiver that is notified on every observed update.
    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.cell.subscribe()
    }

    /// Waits until the phase satisfies `pred` and returns it. Returns `None`
    /// if the tracker is dropped first.
    pub async fn wait_for(&self, mut pred: impl FnMut(AuthPhase) -> bool) -> Option<AuthPhase> {
        let mut rx = self.cell.subscribe();
        let snapshot = rx.wait_for(|snapshot| pred(snapshot.phase)).await.ok()?;
        Some(snapshot.phase)
    }

    /// Registers `callback` for every transition. The callback stays
    /// registered while the returned [`Listener`] is alive.
    pub fn on_transition<F>(&self, callback: F) -> Listener<AuthTransition>
    where
        F: Fn(&AuthTransition) + Send + Sync + 'static,
    {
        Listener::new(&self.listeners, callback)
    }

    /// Records a new authorization state. Returns the transition, or `None`
    /// if the session was already closed and the update was ignored.
    pub(crate) fn observe(&self, state: AuthorizationState) -> Option<AuthTransition> {
        let old = self.current_state();
        if old.is_terminal() {
            tracing::warn!(tag = state.tag(), "authorization update after close ignored");
            return None;
        }

        let new = AuthPhase::of(&state);
        let state = Arc::new(state);
        let mut version = 0;
        self.cell.send_modify(|snapshot| {
            snapshot.version += 1;
            snapshot.phase = new;
            snapshot.state = Some(Arc::clone(&state));
            version = snapshot.version;
        });
        tracing::info!(%old, %new, version, "authorization state changed");

        let transition = AuthTransition {
            old,
            new,
            version,
            state,
        };
        self.listeners.dispatch(&transition);
        Some(transition)
    }
}

impl Default for AuthTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::types::{
        AuthorizationStateClosed, AuthorizationStateClosing, AuthorizationStateReady,
        AuthorizationStateWaitPhoneNumber, AuthorizationStateWaitTdlibParameters,
    };

    #[test]
    fn starts_uninitialized() {
        let tracker = AuthTracker::new();
        assert_eq!(tracker.current_state(), AuthPhase::Uninitialized);
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.version, 0);
        assert!(snapshot.state.is_none());
    }

    #[test]
    fn repeated_states_still_fire() {
        let tracker = AuthTracker::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _listener = {
            let seen = seen.clone();
            tracker.on_transition(move |t| seen.lock().unwrap().push((t.old, t.new)))
        };

        tracker.observe(AuthorizationStateWaitTdlibParameters {}.into());
        tracker.observe(AuthorizationStateWaitTdlibParameters {}.into());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (AuthPhase::Uninitialized, AuthPhase::NeedsParameters),
                (AuthPhase::NeedsParameters, AuthPhase::NeedsParameters),
            ]
        );
        assert_eq!(tracker.snapshot().version, 2);
    }

    #[test]
    fn closed_is_terminal() {
        let tracker = AuthTracker::new();
        tracker.observe(AuthorizationStateClosing {}.into());
        tracker.observe(AuthorizationStateClosed {}.into());
        assert!(tracker.observe(AuthorizationStateReady {}.into()).is_none());
        assert_eq!(tracker.current_state(), AuthPhase::Closed);
        assert_eq!(tracker.snapshot().version, 2);
    }

    #[test]
    fn legal_actions_follow_the_phase() {
        assert!(AuthPhase::NeedsParameters.allows(AuthAction::SetParameters));
        assert!(!AuthPhase::NeedsParameters.allows(AuthAction::CheckCode));
        assert!(AuthPhase::NeedsCode.allows(AuthAction::CheckCode));
        assert!(AuthPhase::Ready.allows(AuthAction::LogOut));
        assert!(AuthPhase::Closed.legal_actions().is_empty());
        assert_eq!(AuthAction::CheckPassword.function_tag(), "checkAuthenticationPassword");
        assert_eq!(AuthAction::SetParameters.function_tag(), "setTdlibParameters");
    }

    #[tokio::test]
    async fn wait_for_resolves_on_matching_phase() {
        let tracker = Arc::new(AuthTracker::new());
        let waiter = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.wait_for(|phase| phase == AuthPhase::Ready).await })
        };
        tracker.observe(AuthorizationStateWaitPhoneNumber {}.into());
        tracker.observe(AuthorizationStateReady {}.into());
        assert_eq!(waiter.await.unwrap(), Some(AuthPhase::Ready));
    }
}
