//! App instances.
//!
//! This module is the glue between options, the reactive state, the render
//! function and the patch engine. [`create_app`] takes [`AppOptions`] and
//! [`App::mount`] turns them into a live [`Instance`]. Lifecycle hooks run
//! around mount, every reactive re-render and destroy.

mod hooks;
mod lifecycle;
mod options;

pub use hooks::{call_hook, HookError, HookFn, Hooks, LifecycleHook};
pub use lifecycle::{create_app, App, Instance};
pub use options::AppOptions;
