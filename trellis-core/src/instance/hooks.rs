//! Lifecycle hooks.
//!
//! Hooks are the one place where failures are contained. Each handler runs
//! behind its own boundary: an `Err` or a panic is logged and the remaining
//! handlers, and the mount/update/destroy step around them, carry on.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::reactive::{ReactiveContext, ReactiveObject};

/// Points in an instance's life where hooks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleHook {
    BeforeMount,
    Mounted,
    BeforeUpdate,
    Updated,
    BeforeDestroy,
    Destroyed,
}

impl LifecycleHook {
    pub const ALL: [LifecycleHook; 6] = [
        LifecycleHook::BeforeMount,
        LifecycleHook::Mounted,
        LifecycleHook::BeforeUpdate,
        LifecycleHook::Updated,
        LifecycleHook::BeforeDestroy,
        LifecycleHook::Destroyed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LifecycleHook::BeforeMount => "beforeMount",
            LifecycleHook::Mounted => "mounted",
            LifecycleHook::BeforeUpdate => "beforeUpdate",
            LifecycleHook::Updated => "updated",
            LifecycleHook::BeforeDestroy => "beforeDestroy",
            LifecycleHook::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error a hook handler may return.
pub type HookError = Box<dyn std::error::Error>;

/// A hook handler. It receives the instance state.
pub type HookFn = Rc<dyn Fn(&ReactiveObject) -> Result<(), HookError>>;

/// Hook handlers per lifecycle point, in registration order.
#[derive(Clone, Default)]
pub struct Hooks {
    handlers: IndexMap<LifecycleHook, Vec<HookFn>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        hook: LifecycleHook,
        handler: impl Fn(&ReactiveObject) -> Result<(), HookError> + 'static,
    ) {
        self.handlers.entry(hook).or_default().push(Rc::new(handler));
    }

    pub fn get(&self, hook: LifecycleHook) -> &[HookFn] {
        self.handlers.get(&hook).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of handlers.
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (hook, handlers) in &self.handlers {
            map.entry(&hook.name(), &handlers.len());
        }
        map.finish()
    }
}

/// Run every handler of `hook` and return how many of them failed.
///
/// Handlers run untracked: reading state in a hook never makes the render
/// depend on it.
pub fn call_hook(hooks: &Hooks, hook: LifecycleHook, state: &ReactiveObject) -> usize {
    let handlers = hooks.get(hook);
    if handlers.is_empty() {
        return 0;
    }
    debug!(%hook, count = handlers.len(), "calling hook");

    let mut failures = 0;
    for handler in handlers {
        let outcome =
            ReactiveContext::untracked(|| catch_unwind(AssertUnwindSafe(|| handler(state))));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                failures += 1;
                error!(%hook, error = %err, "lifecycle hook failed");
            }
            Err(payload) => {
                failures += 1;
                let panic = panic_message(payload.as_ref());
                error!(%hook, panic, "lifecycle hook panicked");
            }
        }
    }
    failures
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
