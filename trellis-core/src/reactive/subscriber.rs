//! Subscriber types for the reactive system.
//!
//! A Subscriber is anything that wants to be re-run when a reactive field it
//! read changes. In practice that is a [`Watcher`](super::Watcher), but the
//! trait keeps [`Dep`] independent of the watcher's value type.

use std::sync::atomic::{AtomicU64, Ordering};

use super::dep::Dep;

/// Unique identifier for a subscriber.
///
/// Trackers use it to remove a subscriber on teardown without having to
/// upgrade every weak reference they hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A computation that can be notified by a [`Dep`].
pub trait Subscriber {
    /// The subscriber's unique ID.
    fn id(&self) -> SubscriberId;

    /// Register with `dep`.
    ///
    /// Called by [`Dep::depend`] while this subscriber is the active one. The
    /// subscriber decides whether to call [`Dep::add_sub`] and remembers the
    /// tracker so it can unregister itself later.
    fn add_dep(&self, dep: &Dep);

    /// Re-run after one of the subscriber's dependencies changed.
    fn update(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_never_repeat() {
        let ids: HashSet<_> = (0..64).map(|_| SubscriberId::default()).collect();
        assert_eq!(ids.len(), 64);
    }
}
