//! Watcher Implementation
//!
//! A Watcher re-runs a getter whenever a reactive field it read changes.
//!
//! # How Watchers Work
//!
//! 1. When created, the watcher runs its getter immediately to establish the
//!    baseline value and the initial dependencies.
//!
//! 2. During a run the watcher is the active subscriber, so every reactive
//!    read registers it with the field's [`Dep`]. A tracker is registered at
//!    most once per run.
//!
//! 3. After a run, trackers that were not read again are dropped, so a
//!    watcher never re-runs for a field it stopped reading.
//!
//! 4. When notified, the watcher re-runs synchronously, stores the new value
//!    and then hands the new and the previous value to its callback. The
//!    callback fires even when both values are equal.
//!
//! # Teardown
//!
//! [`Watcher::teardown`] unregisters the watcher from every tracker and marks
//! it inactive. A run already in flight still completes.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::{trace, warn};

use super::context::ReactiveContext;
use super::dep::{Dep, DepId};
use super::subscriber::{Subscriber, SubscriberId};

type Getter<T> = Box<dyn Fn() -> T>;
type Callback<T> = Box<dyn Fn(&T, &T)>;

struct WatcherInner<T: 'static> {
    id: SubscriberId,
    self_ref: Weak<WatcherInner<T>>,
    getter: Getter<T>,
    callback: Callback<T>,
    /// Value of the last run. Replaced before the callback is invoked.
    value: RefCell<Rc<T>>,
    /// Trackers registered during the last completed run.
    deps: RefCell<IndexMap<DepId, Dep>>,
    /// Trackers read by the run in progress.
    new_deps: RefCell<IndexMap<DepId, Dep>>,
    active: Cell<bool>,
    running: Cell<bool>,
    run_count: Cell<usize>,
}

/// Active subscriber of the first run, which happens before the watcher
/// itself exists. Trackers are registered under the watcher's ID and weak
/// handle, so they notify the watcher once it is built.
struct FirstRun {
    id: SubscriberId,
    watcher: Weak<dyn Subscriber>,
    deps: RefCell<IndexMap<DepId, Dep>>,
}

impl Subscriber for FirstRun {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn add_dep(&self, dep: &Dep) {
        let mut deps = self.deps.borrow_mut();
        if !deps.contains_key(&dep.id()) {
            deps.insert(dep.id(), dep.clone());
            dep.add_sub(self.id, self.watcher.clone());
        }
    }

    // Trackers hold the watcher's handle, never this one.
    fn update(&self) {}
}

impl Drop for FirstRun {
    /// Only non-empty if the first run panicked.
    fn drop(&mut self) {
        for (_, dep) in self.deps.get_mut().drain(..) {
            dep.remove_sub(self.id);
        }
    }
}

/// Resets the `running` flag on every exit path of a run.
struct RunningGuard<'a>(&'a Cell<bool>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// A reactive subscriber bound to a getter and a completion callback.
///
/// Cloning shares the watcher.
///
/// # Example
///
/// ```rust,ignore
/// let state = ReactiveObject::from_json(json!({ "count": 0 })).unwrap();
///
/// let watcher = Watcher::new(
///     state.clone(),
///     |state| state.get("count"),
///     |_, new, old| println!("{old:?} -> {new:?}"),
/// );
///
/// state.set("count", 1); // prints "Some(Number(0)) -> Some(Number(1))"
/// ```
pub struct Watcher<T: 'static> {
    inner: Rc<WatcherInner<T>>,
}

impl<T: 'static> Watcher<T> {
    /// Create a watcher and run it once.
    ///
    /// `context` is handed to both the getter and the callback.
    pub fn new<C, G, F>(context: C, getter: G, callback: F) -> Self
    where
        C: Clone + 'static,
        G: Fn(&C) -> T + 'static,
        F: Fn(&C, &T, &T) + 'static,
    {
        let getter_ctx = context.clone();
        let getter: Getter<T> = Box::new(move || getter(&getter_ctx));
        let callback: Callback<T> = Box::new(move |new: &T, old: &T| callback(&context, new, old));
        let id = SubscriberId::new();

        let inner = Rc::new_cyclic(|self_ref: &Weak<WatcherInner<T>>| {
            let watcher: Weak<dyn Subscriber> = self_ref.clone();
            let first_run = Rc::new(FirstRun {
                id,
                watcher,
                deps: RefCell::new(IndexMap::new()),
            });
            let value = {
                let _ctx = ReactiveContext::enter(first_run.clone());
                getter()
            };

            WatcherInner {
                id,
                self_ref: self_ref.clone(),
                getter,
                callback,
                value: RefCell::new(Rc::new(value)),
                deps: RefCell::new(first_run.deps.take()),
                new_deps: RefCell::new(IndexMap::new()),
                active: Cell::new(true),
                running: Cell::new(false),
                run_count: Cell::new(1),
            }
        });

        Self { inner }
    }

    /// The watcher's subscriber ID.
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Run the getter with dependency tracking and return its value.
    ///
    /// The stored value is not touched; use [`Watcher::update`] for that.
    pub fn run(&self) -> T {
        self.inner.run()
    }

    /// Re-run and invoke the callback with the new and the previous value.
    pub fn update(&self) {
        self.inner.update();
    }

    /// Unregister from every tracker. Safe to call more than once.
    pub fn teardown(&self) {
        self.inner.teardown();
    }

    /// Whether the watcher still reacts to changes.
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// The value computed by the last run.
    pub fn value(&self) -> Ref<'_, T> {
        Ref::map(self.inner.value.borrow(), |value| &**value)
    }

    /// Number of completed runs.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Number of trackers the watcher is registered with.
    pub fn dependency_count(&self) -> usize {
        self.inner.deps.borrow().len()
    }
}

impl<T: 'static> WatcherInner<T> {
    fn run(self: &Rc<Self>) -> T {
        self.running.set(true);
        let _running = RunningGuard(&self.running);
        self.new_deps.borrow_mut().clear();

        let value = {
            let _ctx = ReactiveContext::enter(self.clone());
            (self.getter)()
        };

        self.cleanup_deps();
        self.run_count.set(self.run_count.get() + 1);
        value
    }

    fn update(&self) {
        if !self.active.get() {
            return;
        }
        if self.running.get() {
            // The getter wrote a field it reads. Re-running here would recurse
            // without bound.
            warn!(subscriber = ?self.id, "skipping re-entrant watcher update");
            return;
        }
        let Some(this) = self.self_ref.upgrade() else {
            return;
        };

        trace!(subscriber = ?self.id, "watcher update");
        let new_value = Rc::new(this.run());
        // Store first: the callback may write a dependency and re-enter.
        let old_value = self.value.replace(Rc::clone(&new_value));
        (self.callback)(&new_value, &old_value);
    }

    /// Swap in the trackers of the run that just finished and unsubscribe
    /// from the ones it no longer read.
    fn cleanup_deps(&self) {
        let new_deps = std::mem::take(&mut *self.new_deps.borrow_mut());
        let old_deps = std::mem::replace(&mut *self.deps.borrow_mut(), new_deps);

        let deps = self.deps.borrow();
        for (id, dep) in old_deps {
            if !deps.contains_key(&id) {
                dep.remove_sub(self.id);
            }
        }
        drop(deps);

        // Torn down while running: drop what the run registered before that.
        if !self.active.get() {
            for (_, dep) in self.deps.borrow_mut().drain(..) {
                dep.remove_sub(self.id);
            }
        }
    }

    fn teardown(&self) {
        if !self.active.replace(false) {
            return;
        }
        for (_, dep) in self.deps.borrow_mut().drain(..) {
            dep.remove_sub(self.id);
        }
        trace!(subscriber = ?self.id, "watcher torn down");
    }
}

impl<T: 'static> Subscriber for WatcherInner<T> {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn add_dep(&self, dep: &Dep) {
        if !self.active.get() {
            return;
        }
        let id = dep.id();
        let mut new_deps = self.new_deps.borrow_mut();
        if new_deps.contains_key(&id) {
            return;
        }
        new_deps.insert(id, dep.clone());
        drop(new_deps);

        if !self.deps.borrow().contains_key(&id) {
            let weak: Weak<dyn Subscriber> = self.self_ref.clone();
            dep.add_sub(self.id, weak);
        }
    }

    fn update(&self) {
        WatcherInner::update(self);
    }
}

impl<T: 'static> Clone for Watcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> fmt::Debug for Watcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("active", &self.is_active())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
