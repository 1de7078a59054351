//! The session client: one reader task, one writer task, and the router that
//! connects the transport to the correlator, the dispatcher and the
//! authorization tracker.

use std::{
    fmt,
    future::IntoFuture,
    marker::PhantomData,
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::{FutureExt, future::BoxFuture};
use serde_json::Value;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, instrument, trace, warn};

use crate::{
    auth::{AuthPhase, AuthTracker},
    codec::{self, CLIENT_ID_FIELD, EXTRA_FIELD, Function, Map, TYPE_FIELD, TdType},
    config::ClientConfig,
    correlator::{Completion, Correlator, PendingCall},
    dispatcher::{Dispatcher, Filter, Subscription},
    error::{CallError, redact_suppressed},
    transport::{Transport, TransportSink, TransportSource},
    types::{self, Object, Update},
};

const WIRE_TARGET: &str = "tdlink::wire";

/// A typed answer to a request, resolved by awaiting it.
///
/// Dropping the handle before it resolves cancels the call.
#[must_use = "a request is cancelled when its handle is dropped"]
pub struct ResponseHandle<T> {
    call: PendingCall,
    _response: PhantomData<fn() -> T>,
}

impl<T: TdType> ResponseHandle<T> {
    fn new(call: PendingCall) -> Self {
        ResponseHandle {
            call,
            _response: PhantomData,
        }
    }

    /// The correlation token sent as `@extra`.
    pub fn token(&self) -> &str {
        self.call.token()
    }

    pub fn cancel(self) {
        self.call.cancel();
    }

    pub async fn wait(self) -> Result<T, CallError> {
        let map = self.call.wait().await?;
        Ok(codec::decode_map(map)?)
    }
}

impl<T: TdType> IntoFuture for ResponseHandle<T> {
    type Output = Result<T, CallError>;
    type IntoFuture = BoxFuture<'static, Result<T, CallError>>;

    fn into_future(self) -> Self::IntoFuture {
        self.wait().boxed()
    }
}

impl<T> fmt::Debug for ResponseHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseHandle")
            .field("token", &self.call.token())
            .finish()
    }
}

struct Inner {
    correlator: Arc<Correlator>,
    dispatcher: Arc<Dispatcher>,
    auth: Arc<AuthTracker>,
    outbound: mpsc::UnboundedSender<Value>,
    config: ClientConfig,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Inner {
    fn abort_tasks(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(|p| p.into_inner()));
        for task in tasks {
            task.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.correlator.close(CallError::TransportClosed);
        self.dispatcher.close();
        self.abort_tasks();
    }
}

/// A connected session. Cheap to clone; all clones share the session, which
/// ends when the last clone is dropped or [`shutdown`](Self::shutdown) is
/// called.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Starts a session over `transport`. Must be called within a Tokio
    /// runtime.
    pub fn connect<T: Transport>(transport: T, config: ClientConfig) -> Self {
        let prefix = config
            .token_prefix
            .clone()
            .unwrap_or_else(|| format!("{}-", uuid::Uuid::new_v4().simple()));
        let correlator = Correlator::new(prefix, config.late_response_grace());
        let dispatcher = Dispatcher::new(config.subscriber_capacity, config.overflow);
        let auth = Arc::new(AuthTracker::new());

        let (sink, source) = transport.split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        let router = Router {
            correlator: Arc::clone(&correlator),
            dispatcher: Arc::clone(&dispatcher),
            auth: Arc::clone(&auth),
            wire_log: config.wire_log,
        };
        let reader = tokio::spawn(read_loop(source, router));
        let writer = tokio::spawn(write_loop(
            sink,
            outbound_rx,
            Arc::clone(&correlator),
            config.wire_log,
        ));

        Client {
            inner: Arc::new(Inner {
                correlator,
                dispatcher,
                auth,
                outbound,
                config,
                tasks: Mutex::new(vec![reader, writer]),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Sends a typed request. The returned handle resolves to the request's
    /// return type; `timeout` of `None` waits indefinitely.
    pub fn send<F: Function>(
        &self,
        request: &F,
        timeout: Option<Duration>,
    ) -> Result<ResponseHandle<F::Return>, CallError> {
        let call = self.start(codec::encode_map(request), None, timeout)?;
        Ok(ResponseHandle::new(call))
    }

    /// Like [`send`](Self::send), with a caller-chosen correlation token.
    /// Fails with [`CallError::DuplicateToken`] if the token is in use.
    pub fn send_with_extra<F: Function>(
        &self,
        request: &F,
        extra: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<ResponseHandle<F::Return>, CallError> {
        let extra = extra.into();
        let call = self.start(
            codec::encode_map(request),
            Some((extra.clone(), Value::String(extra))),
            timeout,
        )?;
        Ok(ResponseHandle::new(call))
    }

    /// Sends an untyped request. It must be an object with a string `@type`;
    /// an `@extra` (string or number) already present is used as the
    /// correlation token.
    pub fn send_raw(
        &self,
        request: Value,
        timeout: Option<Duration>,
    ) -> Result<PendingCall, CallError> {
        let Value::Object(mut map) = request else {
            return Err(CallError::InvalidRequest("request must be a JSON object".to_owned()));
        };
        if !map.get(TYPE_FIELD).is_some_and(Value::is_string) {
            return Err(CallError::InvalidRequest("request has no string @type".to_owned()));
        }
        let extra = match map.remove(EXTRA_FIELD) {
            None | Some(Value::Null) => None,
            Some(extra) => match token_of(&extra) {
                Some(token) => Some((token, extra)),
                None => {
                    return Err(CallError::InvalidRequest(
                        "@extra must be a string or a number".to_owned(),
                    ));
                }
            },
        };
        self.start(map, extra, timeout)
    }

    /// Sends a typed request with the configured default timeout and waits for
    /// the answer.
    pub async fn call<F: Function>(&self, request: &F) -> Result<F::Return, CallError> {
        self.send(request, self.inner.config.default_timeout())?.await
    }

    /// Sends an untyped request with the configured default timeout and decodes
    /// the answer as a general [`Object`].
    pub async fn call_raw(&self, request: Value) -> Result<Object, CallError> {
        let map = self
            .send_raw(request, self.inner.config.default_timeout())?
            .wait()
            .await?;
        Ok(codec::decode_map(map)?)
    }

    fn start(
        &self,
        mut map: Map,
        extra: Option<(String, Value)>,
        timeout: Option<Duration>,
    ) -> Result<PendingCall, CallError> {
        let (token, extra) = match extra {
            Some((token, extra)) => (Some(token), Some(extra)),
            None => (None, None),
        };
        let mut call = self.inner.correlator.register(token)?;
        call.set_timeout(timeout);
        let extra = extra.unwrap_or_else(|| Value::String(call.token().to_owned()));
        map.insert(EXTRA_FIELD.to_owned(), extra);

        let tag = codec::peek_tag_map(&map).unwrap_or_default();
        debug!(token = %call.token(), tag, "sending request");
        if self.inner.outbound.send(Value::Object(map)).is_err() {
            return Err(self
                .inner
                .correlator
                .closed_reason()
                .unwrap_or(CallError::TransportClosed));
        }
        Ok(call)
    }

    /// Subscribes to objects that are not answers to a request.
    pub fn subscribe(&self, filter: Filter) -> Subscription {
        self.inner.dispatcher.subscribe(filter)
    }

    pub fn auth(&self) -> &AuthTracker {
        &self.inner.auth
    }

    /// Number of requests still waiting for an answer.
    pub fn pending_calls(&self) -> usize {
        self.inner.correlator.pending_count()
    }

    /// Whether the session still accepts requests.
    pub fn is_open(&self) -> bool {
        !self.inner.correlator.is_closed()
    }

    /// Ends the session: pending calls fail with
    /// [`CallError::TransportClosed`], subscriptions end, and the reader and
    /// writer tasks are stopped.
    pub fn shutdown(&self) {
        debug!("shutting down session");
        self.inner.correlator.close(CallError::TransportClosed);
        self.inner.dispatcher.close();
        self.inner.abort_tasks();
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("correlator", &self.inner.correlator)
            .field("dispatcher", &self.inner.dispatcher)
            .field("auth", &self.inner.auth.current_state())
            .finish()
    }
}

/// The correlation token an `@extra` value stands for.
fn token_of(extra: &Value) -> Option<String> {
    match extra {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Logs a payload on the wire target. Error objects are reduced to their code,
/// and suppressed messages nested anywhere else are removed.
fn log_wire(direction: &'static str, payload: &Value) {
    if !tracing::enabled!(target: WIRE_TARGET, tracing::Level::TRACE) {
        return;
    }
    if codec::peek_tag(payload) == Some(types::Error::TAG) {
        let code = payload.get("code").and_then(Value::as_i64).unwrap_or_default();
        trace!(target: WIRE_TARGET, direction, code, "error object");
    } else {
        let mut payload = payload.clone();
        redact_suppressed(&mut payload);
        trace!(target: WIRE_TARGET, direction, payload = %payload);
    }
}

#[instrument(name = "writer", skip_all)]
async fn write_loop<S: TransportSink>(
    mut sink: S,
    mut outbound: mpsc::UnboundedReceiver<Value>,
    correlator: Arc<Correlator>,
    wire_log: bool,
) {
    while let Some(payload) = outbound.recv().await {
        if wire_log {
            log_wire("out", &payload);
        }
        if let Err(err) = sink.send(payload).await {
            error!(error = %err, "failed to send request, closing session");
            correlator.close(CallError::TransportClosed);
            break;
        }
    }
    if let Err(err) = sink.close().await {
        warn!(error = %err, "failed to close transport");
    }
    debug!("writer finished");
}

#[instrument(name = "reader", skip_all)]
async fn read_loop<R: TransportSource>(mut source: R, router: Router) {
    loop {
        match source.recv().await {
            Ok(Some(payload)) => router.route(payload).await,
            Ok(None) => {
                debug!("transport reached end of stream");
                break;
            }
            Err(err) => {
                error!(error = %err, "failed to receive from transport");
                break;
            }
        }
    }
    router.correlator.close(CallError::TransportClosed);
    router.dispatcher.close();
}

/// Sends each inbound object to the call waiting for it, or to subscribers.
struct Router {
    correlator: Arc<Correlator>,
    dispatcher: Arc<Dispatcher>,
    auth: Arc<AuthTracker>,
    wire_log: bool,
}

impl Router {
    async fn route(&self, payload: Value) {
        if self.wire_log {
            log_wire("in", &payload);
        }
        let mut map = match payload {
            Value::Object(map) => map,
            other => {
                warn!(kind = codec::json_kind(&other), "ignoring non-object payload");
                return;
            }
        };
        map.remove(CLIENT_ID_FIELD);

        if let Some(extra) = map.remove(EXTRA_FIELD) {
            match token_of(&extra) {
                Some(token) if self.correlator.is_recognized(&token) => {
                    self.complete(&token, map);
                    return;
                }
                _ => debug!("object carries an @extra not issued by this session"),
            }
        }

        match codec::decode_map::<Object>(map) {
            Ok(Object::Updates(batch)) => {
                for update in batch.updates {
                    self.deliver(Object::Update(update)).await;
                }
            }
            Ok(object) => self.deliver(object).await,
            Err(err) => warn!(error = %err, "skipping undecodable object"),
        }
    }

    fn complete(&self, token: &str, map: Map) {
        let response = if codec::peek_tag_map(&map) == Some(types::Error::TAG) {
            match codec::decode_map::<types::Error>(map) {
                Ok(err) => {
                    debug!(token, code = err.code, "request rejected by engine");
                    Err(CallError::Rpc(err.into()))
                }
                Err(err) => Err(CallError::Decode(err)),
            }
        } else {
            Ok(map)
        };

        match self.correlator.complete(token, response) {
            Completion::Delivered => trace!(token, "response delivered"),
            Completion::Late => debug!(token, "discarding response that arrived after its timeout"),
            Completion::Discarded => debug!(token, "discarding response to a cancelled call"),
            Completion::Duplicate => warn!(token, "second response for an answered call"),
            Completion::Unknown => debug!(token, "discarding response to an expired token"),
        }
    }

    async fn deliver(&self, object: Object) {
        let mut closed = false;
        if let Object::Update(Update::AuthorizationState(update)) = &object {
            let observed = self.auth.observe(update.authorization_state.clone());
            match observed.map(|transition| transition.new) {
                Some(AuthPhase::Closing) => self.correlator.close(CallError::SessionClosing),
                Some(AuthPhase::Closed) => {
                    self.correlator.close(CallError::SessionClosing);
                    closed = true;
                }
                _ => {}
            }
        }

        self.dispatcher.dispatch(object).await;

        if closed {
            self.dispatcher.close();
        }
    }
}
