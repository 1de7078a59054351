//! Fan-out of uncorrelated inbound objects to subscribers.
//!
//! Objects are delivered in arrival order to every subscriber whose filter
//! accepts them. Each subscriber has its own bounded buffer; what happens when
//! it fills up is decided once, by the [`OverflowPolicy`] the dispatcher was
//! built with.

use std::{
    collections::VecDeque,
    fmt,
    pin::Pin,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
    task::{Context, Poll, Waker},
};

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::{codec::TdType, types::Object};

/// What the dispatcher does when a subscriber's buffer is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the oldest buffered object. Never slows down the reader.
    #[default]
    DropOldest,
    /// Wait for the subscriber to make room, which pauses reading from the
    /// transport.
    Backpressure,
}

/// Selects which objects a subscription receives.
#[derive(Clone, Default)]
pub enum Filter {
    #[default]
    All,
    /// Objects whose `@type` is one of these.
    Tags(Vec<String>),
    Predicate(Arc<dyn Fn(&Object) -> bool + Send + Sync>),
}

impl Filter {
    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Tags(tags.into_iter().map(Into::into).collect())
    }

    pub fn predicate(f: impl Fn(&Object) -> bool + Send + Sync + 'static) -> Self {
        Filter::Predicate(Arc::new(f))
    }

    /// Only push updates, skipping unsolicited non-update objects.
    pub fn updates() -> Self {
        Filter::predicate(Object::is_update)
    }

    pub fn matches(&self, object: &Object) -> bool {
        match self {
            Filter::All => true,
            Filter::Tags(tags) => {
                let tag = object.tag();
                tags.iter().any(|t| t == tag)
            }
            Filter::Predicate(f) => f(object),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str("All"),
            Filter::Tags(tags) => f.debug_tuple("Tags").field(tags).finish(),
            Filter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

struct QueueState {
    items: VecDeque<Object>,
    waker: Option<Waker>,
    // Closed by the dispatcher: drain what is buffered, then end.
    ended: bool,
    // Unsubscribed: nothing more is delivered, buffered items included.
    detached: bool,
}

struct Queue {
    id: u64,
    filter: Filter,
    capacity: usize,
    state: Mutex<QueueState>,
    // Signalled whenever the subscriber takes an item or detaches.
    space: Notify,
    dropped: AtomicU64,
}

impl Queue {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn end(&self) {
        let mut state = self.lock();
        state.ended = true;
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }

    fn detach(&self) {
        let mut state = self.lock();
        state.detached = true;
        state.items.clear();
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
        drop(state);
        self.space.notify_waiters();
    }
}

enum Push {
    Done,
    Full,
    Gone,
}

/// Delivers objects to subscribers. Shared by the client and its reader task.
pub struct Dispatcher {
    queues: Mutex<Vec<Arc<Queue>>>,
    closed: Mutex<bool>,
    capacity: usize,
    policy: OverflowPolicy,
    next_id: AtomicU64,
}

impl Dispatcher {
    /// `capacity` is the per-subscriber buffer size; zero is treated as one.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Arc<Self> {
        Arc::new(Dispatcher {
            queues: Mutex::new(Vec::new()),
            closed: Mutex::new(false),
            capacity: capacity.max(1),
            policy,
            next_id: AtomicU64::new(0),
        })
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    fn queues(&self) -> MutexGuard<'_, Vec<Arc<Queue>>> {
        self.queues.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn closed_flag(&self) -> MutexGuard<'_, bool> {
        self.closed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a subscriber. It sees only objects dispatched from now on.
    /// After [`close`](Self::close) the returned stream is already ended.
    pub fn subscribe(self: &Arc<Self>, filter: Filter) -> Subscription {
        let queue = Arc::new(Queue {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            filter,
            capacity: self.capacity,
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                waker: None,
                ended: false,
                detached: false,
            }),
            space: Notify::new(),
            dropped: AtomicU64::new(0),
        });

        let closed = self.closed_flag();
        if *closed {
            queue.lock().ended = true;
        } else {
            self.queues().push(Arc::clone(&queue));
        }
        drop(closed);
        tracing::trace!(id = queue.id, filter = ?queue.filter, "subscribed");

        Subscription {
            queue,
            dispatcher: Arc::downgrade(self),
        }
    }

    /// Delivers `object` to every matching subscriber, in subscription order.
    ///
    /// With [`OverflowPolicy::Backpressure`] this waits while a matching
    /// subscriber's buffer is full.
    pub async fn dispatch(&self, object: Object) {
        let targets: Vec<Arc<Queue>> = self
            .queues()
            .iter()
            .filter(|queue| queue.filter.matches(&object))
            .cloned()
            .collect();
        if targets.is_empty() {
            tracing::trace!(tag = object.tag(), "no subscriber for object");
            return;
        }

        let last = targets.len() - 1;
        let mut object = Some(object);
        for (i, queue) in targets.into_iter().enumerate() {
            let item = if i == last {
                object.take()
            } else {
                object.clone()
            };
            if let Some(item) = item {
                self.deliver(&queue, item).await;
            }
        }
    }

    async fn deliver(&self, queue: &Queue, item: Object) {
        let mut item = Some(item);
        loop {
            // Register interest before checking, so a wakeup between the check
            // and the await is not lost.
            let space = queue.space.notified();
            tokio::pin!(space);
            space.as_mut().enable();

            match self.try_push(queue, &mut item) {
                Push::Done | Push::Gone => return,
                Push::Full => space.await,
            }
        }
    }

    fn try_push(&self, queue: &Queue, item: &mut Option<Object>) -> Push {
        let mut state = queue.lock();
        if state.detached || state.ended {
            return Push::Gone;
        }
        if state.items.len() >= queue.capacity {
            match self.policy {
                OverflowPolicy::Backpressure => return Push::Full,
                OverflowPolicy::DropOldest => {
                    state.items.pop_front();
                    let dropped = queue.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::debug!(
                        id = queue.id,
                        dropped,
                        "subscriber buffer full, dropped oldest"
                    );
                }
            }
        }
        if let Some(item) = item.take() {
            state.items.push_back(item);
        }
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
        Push::Done
    }

    /// Ends every subscription. Buffered objects are still delivered, then
    /// the streams yield `None`. Later subscriptions start out ended.
    pub fn close(&self) {
        let mut closed = self.closed_flag();
        if *closed {
            return;
        }
        *closed = true;
        drop(closed);

        let queues = std::mem::take(&mut *self.queues());
        tracing::debug!(subscribers = queues.len(), "dispatcher closed");
        for queue in queues {
            queue.end();
            queue.space.notify_waiters();
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed_flag()
    }

    pub fn subscriber_count(&self) -> usize {
        self.queues().len()
    }

    fn remove(&self, id: u64) {
        self.queues().retain(|queue| queue.id != id);
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("subscribers", &self.subscriber_count())
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .finish()
    }
}

/// A live feed of dispatched objects.
///
/// Yields `None` once the dispatcher is closed and the buffer is drained, or
/// right after [`unsubscribe`](Self::unsubscribe). Dropping it unsubscribes.
pub struct Subscription {
    queue: Arc<Queue>,
    dispatcher: std::sync::Weak<Dispatcher>,
}

impl Subscription {
    /// Stops deliveries and discards anything still buffered. Calling it again
    /// has no effect.
    pub fn unsubscribe(&mut self) {
        if self.queue.lock().detached {
            return;
        }
        self.queue.detach();
        if let Some(dispatcher) = self.dispatcher.upgrade() {
            dispatcher.remove(self.queue.id);
        }
        tracing::trace!(id = self.queue.id, "unsubscribed");
    }

    /// Number of objects discarded because this subscriber fell behind.
    pub fn dropped(&self) -> u64 {
        self.queue.dropped.load(Ordering::Relaxed)
    }

    /// Whether more objects may still be delivered.
    pub fn is_active(&self) -> bool {
        let state = self.queue.lock();
        !state.detached && !(state.ended && state.items.is_empty())
    }

    /// Number of objects buffered and not yet taken.
    pub fn buffered_len(&self) -> usize {
        self.queue.lock().items.len()
    }
}

impl Stream for Subscription {
    type Item = Object;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Object>> {
        let mut state = self.queue.lock();
        if state.detached {
            return Poll::Ready(None);
        }
        if let Some(item) = state.items.pop_front() {
            drop(state);
            self.queue.space.notify_waiters();
            return Poll::Ready(Some(item));
        }
        if state.ended {
            return Poll::Ready(None);
        }
        state.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.queue.id)
            .field("filter", &self.queue.filter)
            .field("dropped", &self.dropped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;

    use super::*;
    use crate::types::{Text, User};

    fn text(s: &str) -> Object {
        Object::Text(Text { text: s.to_owned() })
    }

    fn texts(items: &[Object]) -> Vec<String> {
        items
            .iter()
            .map(|item| match item {
                Object::Text(t) => t.text.clone(),
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn delivers_in_order_to_every_subscriber() {
        let dispatcher = Dispatcher::new(16, OverflowPolicy::DropOldest);
        let a = dispatcher.subscribe(Filter::All);
        let b = dispatcher.subscribe(Filter::All);

        for s in ["1", "2", "3"] {
            dispatcher.dispatch(text(s)).await;
        }
        dispatcher.close();

        assert_eq!(texts(&a.collect::<Vec<_>>().await), ["1", "2", "3"]);
        assert_eq!(texts(&b.collect::<Vec<_>>().await), ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn late_subscriber_sees_only_new_objects() {
        let dispatcher = Dispatcher::new(16, OverflowPolicy::DropOldest);
        dispatcher.dispatch(text("before")).await;
        let sub = dispatcher.subscribe(Filter::All);
        dispatcher.dispatch(text("after")).await;
        dispatcher.close();
        assert_eq!(texts(&sub.collect::<Vec<_>>().await), ["after"]);
    }

    #[tokio::test]
    async fn filters_select_by_tag_and_predicate() {
        let dispatcher = Dispatcher::new(16, OverflowPolicy::DropOldest);
        let by_tag = dispatcher.subscribe(Filter::tags(["user"]));
        let by_pred = dispatcher.subscribe(Filter::predicate(|object| {
            matches!(object, Object::Text(t) if t.text.starts_with('k'))
        }));

        dispatcher.dispatch(text("keep")).await;
        dispatcher.dispatch(Object::User(User::with_id(7))).await;
        dispatcher.dispatch(text("skip")).await;
        dispatcher.close();

        let users = by_tag.collect::<Vec<_>>().await;
        assert_eq!(users, vec![Object::User(User::with_id(7))]);
        assert_eq!(texts(&by_pred.collect::<Vec<_>>().await), ["keep"]);
    }

    #[tokio::test]
    async fn drop_oldest_counts_discarded_objects() {
        let dispatcher = Dispatcher::new(2, OverflowPolicy::DropOldest);
        let sub = dispatcher.subscribe(Filter::All);
        for s in ["1", "2", "3", "4"] {
            dispatcher.dispatch(text(s)).await;
        }
        assert_eq!(sub.dropped(), 2);
        dispatcher.close();
        assert_eq!(texts(&sub.collect::<Vec<_>>().await), ["3", "4"]);
    }

    #[tokio::test]
    async fn backpressure_waits_for_the_subscriber() {
        let dispatcher = Dispatcher::new(1, OverflowPolicy::Backpressure);
        let mut sub = dispatcher.subscribe(Filter::All);

        dispatcher.dispatch(text("1")).await;
        let producer = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                dispatcher.dispatch(text("2")).await;
                dispatcher.dispatch(text("3")).await;
                dispatcher.close();
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished());
        assert_eq!(sub.buffered_len(), 1);

        let mut seen = Vec::new();
        while let Some(item) = sub.next().await {
            seen.push(item);
        }
        producer.await.unwrap();
        assert_eq!(texts(&seen), ["1", "2", "3"]);
        assert_eq!(sub.dropped(), 0);
    }

    #[tokio::test]
    async fn unsubscribe_is_immediate_and_idempotent() {
        let dispatcher = Dispatcher::new(16, OverflowPolicy::DropOldest);
        let mut sub = dispatcher.subscribe(Filter::All);
        dispatcher.dispatch(text("buffered")).await;

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(dispatcher.subscriber_count(), 0);

        dispatcher.dispatch(text("after")).await;
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn unsubscribe_releases_a_blocked_dispatch() {
        let dispatcher = Dispatcher::new(1, OverflowPolicy::Backpressure);
        let mut sub = dispatcher.subscribe(Filter::All);
        dispatcher.dispatch(text("1")).await;

        let blocked = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.dispatch(text("2")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        sub.unsubscribe();
        blocked.await.unwrap();
    }

    #[tokio::test]
    async fn subscribe_after_close_is_already_ended() {
        let dispatcher = Dispatcher::new(4, OverflowPolicy::DropOldest);
        dispatcher.close();
        let mut sub = dispatcher.subscribe(Filter::All);
        assert!(!sub.is_active());
        assert_eq!(sub.next().await, None);
    }

    #[test]
    fn overflow_policy_uses_snake_case() {
        let policy: OverflowPolicy = serde_json::from_str("\"backpressure\"").unwrap();
        assert_eq!(policy, OverflowPolicy::Backpressure);
        assert_eq!(
            serde_json::to_string(&OverflowPolicy::DropOldest).unwrap(),
            "\"drop_oldest\""
        );
    }
}
