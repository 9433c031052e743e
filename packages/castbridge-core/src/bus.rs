//! Synchronous notification bus for session changes.
//!
//! Every session mutation publishes exactly one notification carrying the
//! post-mutation snapshot. Listeners run synchronously, in mutation order,
//! on the thread that performed the mutation.
//!
//! # Lock ordering
//!
//! Publishers take the bus dispatch lock *before* the session lock and keep it
//! until all listeners have returned. The dispatch lock is reentrant, so a
//! listener may read controller state, subscribe, or even trigger another
//! mutation from inside its callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};

use crate::session::Session;

type Listener = Arc<dyn Fn(&Session) + Send + Sync>;

struct BusInner {
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
    dispatch: ReentrantMutex<()>,
}

/// Observer set for session snapshots.
#[derive(Clone)]
pub struct NotificationBus {
    inner: Arc<BusInner>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                dispatch: ReentrantMutex::new(()),
            }),
        }
    }

    /// Registers a listener invoked after every session mutation.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Serializes publishers. Hold the guard across mutate-then-notify.
    pub(crate) fn dispatch_lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.inner.dispatch.lock()
    }

    /// Delivers `session` to every current listener, in subscription order.
    ///
    /// The listener list is copied first so callbacks may subscribe or
    /// unsubscribe without deadlocking.
    pub(crate) fn notify(&self, session: &Session) {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(session);
        }
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle of a registered listener.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Removes the listener. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
