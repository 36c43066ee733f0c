//! Reactive Context
//!
//! The reactive context tracks which subscriber is currently running, so that
//! a field read can find it and register it with the field's [`Dep`].
//!
//! # Implementation
//!
//! We use a thread-local stack instead of a single global slot. Entering a
//! context pushes the subscriber, and the returned guard pops it when dropped.
//! The pop happens on every exit path, including a panicking getter, so a
//! failed run never leaves reads attributed to a dead subscriber.
//!
//! [`ReactiveContext::untracked`] pushes an empty entry: reads inside it see
//! no active subscriber even when an outer run is in progress.

use std::cell::RefCell;
use std::rc::Rc;

use super::subscriber::{Subscriber, SubscriberId};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Option<Rc<dyn Subscriber>>>> =
        const { RefCell::new(Vec::new()) };
}

/// Guard that pops the context when dropped.
///
/// Holding a `ReactiveContext` is the "begin tracking" half of a run;
/// dropping it is the "end tracking" half.
#[must_use = "tracking ends as soon as the guard is dropped"]
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Make `subscriber` the active subscriber until the guard is dropped.
    pub fn enter(subscriber: Rc<dyn Subscriber>) -> Self {
        let subscriber_id = Some(subscriber.id());
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(Some(subscriber)));
        Self { subscriber_id }
    }

    /// Run `f` with tracking suspended.
    pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(None));
        let _guard = Self {
            subscriber_id: None,
        };
        f()
    }

    /// Check if there is an active subscriber.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| matches!(stack.borrow().last(), Some(Some(_))))
    }

    /// The active subscriber, if any.
    pub fn current() -> Option<Rc<dyn Subscriber>> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().cloned().flatten())
    }

    /// The active subscriber's ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|entry| entry.as_ref().map(|s| s.id()))
        })
    }

    /// Number of entries on the stack, untracked scopes included.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Catches guards dropped out of order.
            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.as_ref().map(|s| s.id()),
                    self.subscriber_id,
                    "ReactiveContext mismatch"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Dep;

    struct Probe(SubscriberId);

    impl Subscriber for Probe {
        fn id(&self) -> SubscriberId {
            self.0
        }
        fn add_dep(&self, _dep: &Dep) {}
        fn update(&self) {}
    }

    fn probe() -> Rc<dyn Subscriber> {
        Rc::new(Probe(SubscriberId::new()))
    }

    #[test]
    fn context_tracks_subscriber() {
        let sub = probe();
        let id = sub.id();

        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current_subscriber().is_none());

        {
            let _ctx = ReactiveContext::enter(sub);
            assert!(ReactiveContext::is_active());
            assert_eq!(ReactiveContext::current_subscriber(), Some(id));
        }

        assert!(!ReactiveContext::is_active());
        assert_eq!(ReactiveContext::depth(), 0);
    }

    #[test]
    fn nested_contexts() {
        let outer = probe();
        let inner = probe();
        let (outer_id, inner_id) = (outer.id(), inner.id());

        {
            let _ctx1 = ReactiveContext::enter(outer);
            assert_eq!(ReactiveContext::current_subscriber(), Some(outer_id));

            {
                let _ctx2 = ReactiveContext::enter(inner);
                assert_eq!(ReactiveContext::current_subscriber(), Some(inner_id));
            }

            assert_eq!(ReactiveContext::current_subscriber(), Some(outer_id));
        }

        assert!(ReactiveContext::current_subscriber().is_none());
    }

    #[test]
    fn untracked_hides_the_active_subscriber() {
        let _ctx = ReactiveContext::enter(probe());
        let seen = ReactiveContext::untracked(ReactiveContext::is_active);
        assert!(!seen);
        assert!(ReactiveContext::is_active());
    }

    #[test]
    fn context_is_cleared_when_the_run_panics() {
        let result = std::panic::catch_unwind(|| {
            let _ctx = ReactiveContext::enter(probe());
            panic!("getter failed");
        });

        assert!(result.is_err());
        assert!(!ReactiveContext::is_active());
        assert_eq!(ReactiveContext::depth(), 0);
    }
}
