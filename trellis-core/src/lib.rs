//! Trellis Core
//!
//! This crate provides the core runtime for the Trellis reactive UI framework.
//! It implements:
//!
//! - Reactive primitives (dependency trackers, reactive objects, watchers)
//! - Virtual DOM and a two-ended diff/patch engine
//! - A template parser and render-function generator
//! - App instances with lifecycle hooks
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Dependency tracking over plain data
//! - `vnode`: Virtual nodes and the patch engine
//! - `dom`: Leaf DOM primitives and an in-memory backend
//! - `compiler`: Template string to render function
//! - `instance`: Options, mounting, lifecycle hooks
//!
//! # Example
//!
//! ```rust,ignore
//! use std::{cell::RefCell, rc::Rc};
//! use serde_json::json;
//! use trellis_core::{create_app, h, text, AppOptions, Attrs, MemoryDom};
//!
//! let mut dom = MemoryDom::new();
//! let root = dom.create_container("div");
//! let dom = Rc::new(RefCell::new(dom));
//!
//! let app = create_app(
//!     AppOptions::new()
//!         .data(json!({ "count": 0 }))
//!         .render(|state| {
//!             let count = state.get("count").unwrap_or_default();
//!             h("p", Attrs::new(), vec![text(count.to_string())])
//!         }),
//! )
//! .mount(dom.clone(), root)?;
//!
//! app.state().set("count", 1);
//! assert_eq!(dom.borrow().inner_html(root), "<p>1</p>");
//! ```

pub mod compiler;
pub mod dom;
pub mod error;
pub mod instance;
pub mod reactive;
pub mod vnode;

pub use compiler::{compile, parse, AstNode, Render};
pub use dom::{Dom, MemoryDom, NodeId};
pub use error::{DomError, Error, PatchError, Result, TemplateError};
pub use instance::{create_app, App, AppOptions, Instance, LifecycleHook};
pub use reactive::{make_reactive, ReactiveObject, Value, Watcher};
pub use vnode::{h, patch, text, Attrs, VNode};
