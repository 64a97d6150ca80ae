//! Process-wide holder of the current [`Session`].
//!
//! Reads are lock-free snapshots. Writes replace the whole session and then
//! notify subscribers, serialized so listeners see updates in write order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use parking_lot::{Mutex, ReentrantMutex};

use crate::types::{AccessToken, Session, UserProfile};

type Listener = Arc<dyn Fn(&Session) + Send + Sync>;

#[derive(Default)]
struct WriteQueue {
    draining: bool,
    pending: VecDeque<Arc<Session>>,
}

struct Inner {
    current: ArcSwap<Session>,
    // Held across swap + notify. Reentrant so a listener may itself write;
    // such nested writes are queued behind the pass in progress.
    write: ReentrantMutex<RefCell<WriteQueue>>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

/// Injectable session container shared by the UI and the transport layer.
///
/// Cloning is cheap and yields a handle to the same store.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<Inner>,
}

impl CredentialStore {
    /// Create a store hydrated with `session` (typically the resolver's output).
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Inner {
                current: ArcSwap::from_pointee(session),
                write: ReentrantMutex::new(RefCell::new(WriteQueue::default())),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn session(&self) -> Arc<Session> {
        self.inner.current.load_full()
    }

    /// Replace the session and notify subscribers.
    ///
    /// A write made from inside a listener takes effect immediately but is
    /// delivered only after every listener has seen the current one, so each
    /// listener observes writes in order and ends on the store's value.
    pub fn set_session(&self, session: Session) {
        let guard = self.inner.write.lock();
        let next = Arc::new(session);
        self.inner.current.store(Arc::clone(&next));

        {
            let mut queue = guard.borrow_mut();
            queue.pending.push_back(next);
            if queue.draining {
                return;
            }
            queue.draining = true;
        }
        let _reset = DrainReset(&*guard);

        loop {
            let pending = guard.borrow_mut().pending.pop_front();
            let Some(session) = pending else { break };

            // Snapshot so listeners can subscribe/unsubscribe without deadlocking.
            let listeners: Vec<Listener> = self
                .inner
                .listeners
                .lock()
                .iter()
                .map(|(_, l)| Arc::clone(l))
                .collect();
            for listener in listeners {
                listener(&session);
            }
        }
    }

    /// Explicit sign-in with a freshly obtained credential and profile.
    pub fn sign_in(&self, access_token: AccessToken, user: UserProfile) {
        self.set_session(Session::authenticated(access_token, user));
    }

    /// Reset to the signed-out session.
    pub fn clear(&self) {
        self.set_session(Session::empty());
    }

    /// Register `listener` for every subsequent write.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped or [`unsubscribe`](Subscription::unsubscribe)d.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        Subscription {
            store: Arc::downgrade(&self.inner),
            id,
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(Session::empty())
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("authenticated", &self.inner.current.load().is_authenticated())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// Reopens the queue even if a listener panics mid-pass.
struct DrainReset<'a>(&'a RefCell<WriteQueue>);

impl Drop for DrainReset<'_> {
    fn drop(&mut self) {
        let mut queue = self.0.borrow_mut();
        queue.draining = false;
        queue.pending.clear();
    }
}

/// Handle returned by [`CredentialStore::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    store: Weak<Inner>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
