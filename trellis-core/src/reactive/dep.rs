//! Dependency Tracker
//!
//! A [`Dep`] belongs to exactly one reactive field and keeps the subscribers
//! that read the field, in subscription order. Writing the field calls
//! [`Dep::notify`], which re-runs every subscriber synchronously.
//!
//! Subscribers are held weakly. A watcher's getter usually captures the state
//! that owns the tracker, so a strong reference here would form a cycle.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;
use tracing::trace;

use super::context::ReactiveContext;
use super::subscriber::{Subscriber, SubscriberId};

/// Unique identifier for a dependency tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepId(u64);

impl DepId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

type SubscriberList = SmallVec<[(SubscriberId, Weak<dyn Subscriber>); 4]>;

struct DepInner {
    id: DepId,
    subs: RefCell<SubscriberList>,
}

/// Per-field registry of interested subscribers.
///
/// Cloning a `Dep` shares the registry.
#[derive(Clone)]
pub struct Dep {
    inner: Rc<DepInner>,
}

impl Dep {
    /// Create a tracker with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DepInner {
                id: DepId::next(),
                subs: RefCell::new(SmallVec::new()),
            }),
        }
    }

    /// The tracker's unique ID.
    pub fn id(&self) -> DepId {
        self.inner.id
    }

    /// Append a subscriber. No de-duplication happens here; the subscriber
    /// is expected to register once per run.
    pub fn add_sub(&self, id: SubscriberId, subscriber: Weak<dyn Subscriber>) {
        trace!(dep = ?self.inner.id, subscriber = ?id, "subscribe");
        self.inner.subs.borrow_mut().push((id, subscriber));
    }

    /// Remove every registration of `id`.
    pub fn remove_sub(&self, id: SubscriberId) {
        self.inner.subs.borrow_mut().retain(|(sub, _)| *sub != id);
    }

    /// Register the active subscriber, if any.
    ///
    /// Registration goes through [`Subscriber::add_dep`] so the subscriber
    /// also learns about this tracker.
    pub fn depend(&self) {
        if let Some(subscriber) = ReactiveContext::current() {
            subscriber.add_dep(self);
        }
    }

    /// Re-run every subscriber, in registration order.
    pub fn notify(&self) {
        // Subscribers re-register while they run, so iterate over a snapshot.
        let subs: SmallVec<[Rc<dyn Subscriber>; 4]> = self
            .inner
            .subs
            .borrow()
            .iter()
            .filter_map(|(_, weak)| weak.upgrade())
            .collect();

        trace!(dep = ?self.inner.id, count = subs.len(), "notify");

        for sub in subs {
            sub.update();
        }
    }

    /// Number of registered subscribers, dropped ones included.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subs.borrow().len()
    }

    /// Whether `id` is registered with this tracker.
    pub fn has_subscriber(&self, id: SubscriberId) -> bool {
        self.inner.subs.borrow().iter().any(|(sub, _)| *sub == id)
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.inner.id)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
