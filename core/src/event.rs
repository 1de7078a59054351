use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicUsize, Ordering},
    },
};

use crossbeam_skiplist::SkipMap;

/// Represents an event that can be dispatched to listeners.
pub trait Event: fmt::Debug + Send + Sync {}

type Callback<E> = dyn Fn(&E) + Send + Sync;

// Insertion order across all lists; listeners run in the order they were added.
static LISTENER_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A list of listeners for a specific event type `E`.
///
/// The list only holds weak references. A callback stays registered for as
/// long as its [`Listener`] handle is alive; stale entries are removed on the
/// next dispatch.
pub struct ListenerList<E: Event> {
    inner: SkipMap<usize, Weak<Callback<E>>>,
}

impl<E: Event + 'static> ListenerList<E> {
    pub fn new() -> Self {
        ListenerList {
            inner: SkipMap::new(),
        }
    }

    /// Dispatches an event to all live listeners in order.
    ///
    /// Only code within this crate can dispatch events.
    pub(crate) fn dispatch(&self, event: &E) {
        let mut stale = Vec::new();

        for entry in self.inner.iter() {
            match entry.value().upgrade() {
                Some(callback) => callback(event),
                None => stale.push(*entry.key()),
            }
        }

        for order in stale {
            self.inner.remove(&order);
        }
    }

    /// Number of registered entries, including ones not yet cleaned up.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<E: Event + 'static> Default for ListenerList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for ListenerList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerList")
            .field("listener_count", &self.inner.len())
            .finish()
    }
}

/// Represents an active listener registration.
///
/// Keep this value alive for as long as the callback should be called. When
/// it's dropped, the listener becomes inactive.
#[must_use = "the listener is deregistered when this handle is dropped"]
pub struct Listener<E: Event> {
    // The list only holds a Weak reference to this.
    _callback: Arc<Callback<E>>,
    order: usize,
}

impl<E: Event + 'static> Listener<E> {
    /// Creates a new listener and registers it with the given `ListenerList`.
    pub fn new<F>(listeners: &ListenerList<E>, callback: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let order = LISTENER_ID_COUNTER.fetch_add(1, Ordering::SeqCst);
        let callback: Arc<Callback<E>> = Arc::new(callback);
        listeners.inner.insert(order, Arc::downgrade(&callback));

        Listener {
            _callback: callback,
            order,
        }
    }
}

impl<E: Event> fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("order", &self.order)
            .finish()
    }
}
