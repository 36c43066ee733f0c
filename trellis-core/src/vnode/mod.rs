//! Virtual DOM
//!
//! Render functions describe the UI as a tree of [`VNode`]s. Successive
//! trees are reconciled against the real DOM by [`patch`], which is the only
//! code that mutates managed real nodes.

mod node;
mod patch;

pub use node::{h, text, Attrs, VNode, VNodeKind, KEY_ATTR};
pub use patch::{create_elm, patch, patch_children, same_vnode, update_attributes};
