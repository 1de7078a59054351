//! Matching of responses to the requests that asked for them.
//!
//! Every outbound request carries a correlation token in `@extra`; the engine
//! echoes it on the answer. The [`Correlator`] owns the token table and hands
//! out a [`PendingCall`] per request, which resolves exactly once.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::oneshot,
    time::{Instant, timeout_at},
};

use crate::{codec::Map, error::CallError};

/// What the router hands to [`Correlator::complete`]: the response object with
/// `@extra` removed, or the failure it encodes.
pub type Response = Result<Map, CallError>;

/// Outcome of matching one inbound response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Handed to the waiting caller.
    Delivered,
    /// The caller had already timed out.
    Late,
    /// The caller cancelled or dropped the call.
    Discarded,
    /// The token was already answered once.
    Duplicate,
    /// The token was never issued by this session, or has expired.
    Unknown,
}

/// Why a token is no longer live but still reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retired {
    Resolved,
    TimedOut,
    Cancelled,
    /// Rejected by [`Correlator::close`].
    Aborted,
}

impl Retired {
    fn completion(self) -> Completion {
        match self {
            Retired::Resolved => Completion::Duplicate,
            Retired::TimedOut => Completion::Late,
            Retired::Cancelled | Retired::Aborted => Completion::Discarded,
        }
    }
}

struct State {
    pending: HashMap<String, oneshot::Sender<Response>>,
    // Tokens stay reserved here until the grace window passes.
    retired: HashMap<String, (Retired, Instant)>,
    closed: Option<CallError>,
}

/// Token table shared by the client and its reader task.
pub struct Correlator {
    state: Mutex<State>,
    next_id: AtomicU64,
    prefix: String,
    grace: Duration,
}

impl Correlator {
    /// Creates a correlator whose generated tokens start with `prefix` and whose
    /// retired tokens stay reserved for `grace`.
    pub fn new(prefix: impl Into<String>, grace: Duration) -> Arc<Self> {
        Arc::new(Correlator {
            state: Mutex::new(State {
                pending: HashMap::new(),
                retired: HashMap::new(),
                closed: None,
            }),
            next_id: AtomicU64::new(1),
            prefix: prefix.into(),
            grace,
        })
    }

    // The table is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a new call. Without a token, a fresh one is generated.
    ///
    /// A caller-supplied token that is live or still reserved is rejected with
    /// [`CallError::DuplicateToken`]. After [`close`](Self::close) every call
    /// fails with the close reason.
    pub fn register(self: &Arc<Self>, token: Option<String>) -> Result<PendingCall, CallError> {
        let mut state = self.lock();
        if let Some(reason) = &state.closed {
            return Err(reason.clone());
        }
        let now = Instant::now();
        state.retired.retain(|_, (_, expiry)| *expiry > now);

        let token = match token {
            Some(token) => {
                if state.pending.contains_key(&token) || state.retired.contains_key(&token) {
                    return Err(CallError::DuplicateToken(token));
                }
                token
            }
            None => loop {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let candidate = format!("{}{}", self.prefix, id);
                // A caller may have claimed a generated-looking token already.
                if !state.pending.contains_key(&candidate)
                    && !state.retired.contains_key(&candidate)
                {
                    break candidate;
                }
            },
        };

        let (tx, rx) = oneshot::channel();
        state.pending.insert(token.clone(), tx);
        tracing::trace!(token = %token, "registered call");

        Ok(PendingCall {
            token,
            rx,
            correlator: Arc::clone(self),
            deadline: None,
            settled: false,
        })
    }

    /// Matches a response to its call. The live entry is removed exactly once;
    /// any later response for the same token only reports what happened.
    pub fn complete(&self, token: &str, response: Response) -> Completion {
        let mut state = self.lock();
        if let Some(tx) = state.pending.remove(token) {
            state
                .retired
                .insert(token.to_owned(), (Retired::Resolved, Instant::now() + self.grace));
            drop(state);
            return match tx.send(response) {
                Ok(()) => Completion::Delivered,
                // The receiver went away between its last check and now.
                Err(_) => Completion::Discarded,
            };
        }
        match state.retired.get(token) {
            Some((reason, expiry)) if *expiry > Instant::now() => reason.completion(),
            _ => Completion::Unknown,
        }
    }

    /// Whether `token` was issued by this session and is live or reserved.
    pub fn is_recognized(&self, token: &str) -> bool {
        let state = self.lock();
        state.pending.contains_key(token)
            || state
                .retired
                .get(token)
                .is_some_and(|(_, expiry)| *expiry > Instant::now())
    }

    /// Removes a live entry without answering it. Returns `false` when the
    /// token is no longer live, which means a response is already on its way
    /// to the receiver.
    pub fn retire(&self, token: &str, reason: Retired) -> bool {
        let mut state = self.lock();
        if state.pending.remove(token).is_none() {
            return false;
        }
        state
            .retired
            .insert(token.to_owned(), (reason, Instant::now() + self.grace));
        true
    }

    /// Rejects every live call with `reason` and refuses new registrations.
    /// Only the first close takes effect.
    pub fn close(&self, reason: CallError) {
        let mut state = self.lock();
        if state.closed.is_some() {
            return;
        }
        state.closed = Some(reason.clone());
        let expiry = Instant::now() + self.grace;
        let pending = std::mem::take(&mut state.pending);
        for token in pending.keys() {
            state.retired.insert(token.clone(), (Retired::Aborted, expiry));
        }
        drop(state);

        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), reason = %reason, "rejecting pending calls");
        }
        for (_, tx) in pending {
            let _ = tx.send(Err(reason.clone()));
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed.is_some()
    }

    /// The reason passed to [`close`](Self::close), if any.
    pub fn closed_reason(&self) -> Option<CallError> {
        self.lock().closed.clone()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }
}

impl fmt::Debug for Correlator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Correlator")
            .field("prefix", &self.prefix)
            .field("pending", &state.pending.len())
            .field("retired", &state.retired.len())
            .field("closed", &state.closed)
            .finish()
    }
}

/// One registered call, waiting for its response.
///
/// Dropping an unfinished `PendingCall` cancels it: the token is retired and a
/// response arriving later is discarded.
#[must_use = "a pending call is cancelled when dropped"]
pub struct PendingCall {
    token: String,
    rx: oneshot::Receiver<Response>,
    correlator: Arc<Correlator>,
    deadline: Option<Instant>,
    settled: bool,
}

impl PendingCall {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Sets the time after which [`wait`](Self::wait) gives up. Measured from
    /// now; a zero timeout fails on the first poll unless the response is
    /// already there.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.deadline = timeout.map(|timeout| Instant::now() + timeout);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels the call. A response that arrives later is discarded.
    pub fn cancel(mut self) {
        if self.correlator.retire(&self.token, Retired::Cancelled) {
            tracing::debug!(token = %self.token, "call cancelled");
        }
        self.settled = true;
    }

    /// Waits for the response or the deadline, whichever comes first.
    pub async fn wait(mut self) -> Result<Map, CallError> {
        let result = match self.deadline {
            None => (&mut self.rx).await,
            Some(deadline) => match timeout_at(deadline, &mut self.rx).await {
                Ok(received) => received,
                Err(_elapsed) => {
                    if self.correlator.retire(&self.token, Retired::TimedOut) {
                        self.settled = true;
                        tracing::debug!(token = %self.token, "call timed out");
                        return Err(CallError::Timeout);
                    }
                    // Lost the race: the response was already handed over.
                    (&mut self.rx).await
                }
            },
        };
        self.settled = true;
        match result {
            Ok(response) => response,
            Err(_) => Err(self
                .correlator
                .closed_reason()
                .unwrap_or(CallError::TransportClosed)),
        }
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if !self.settled && self.correlator.retire(&self.token, Retired::Cancelled) {
            tracing::debug!(token = %self.token, "call dropped before completion");
        }
    }
}

impl fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall")
            .field("token", &self.token)
            .field("deadline", &self.deadline)
            .finish()
    }
}
