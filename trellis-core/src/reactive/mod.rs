//! Reactive Primitives
//!
//! This module implements dependency tracking over plain data: trackers,
//! reactive objects and watchers. Together they decide when a re-render
//! happens.
//!
//! # Concepts
//!
//! ## Reactive objects
//!
//! A [`ReactiveObject`] holds named fields. [`make_reactive`] gives every
//! field a [`Dep`]. Reading a reactive field inside a tracked run registers
//! the running watcher; writing a different value notifies it.
//!
//! ## Watchers
//!
//! A [`Watcher`] runs a getter with itself as the active subscriber, so it
//! ends up registered with every tracker its getter touched. When one of
//! them notifies, the watcher re-runs and calls its callback with the new
//! and the previous value.
//!
//! # Implementation Notes
//!
//! Everything is single-threaded and synchronous. A write re-runs every
//! affected watcher before it returns; there is no batching. The active
//! subscriber lives on a thread-local stack managed by [`ReactiveContext`]
//! guards.

mod context;
mod dep;
mod object;
mod subscriber;
mod value;
mod watcher;

pub use context::ReactiveContext;
pub use dep::{Dep, DepId};
pub use object::{make_reactive, observe, ReactiveObject};
pub use subscriber::{Subscriber, SubscriberId};
pub use value::Value;
pub use watcher::Watcher;
