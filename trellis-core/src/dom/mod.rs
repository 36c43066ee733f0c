//! Real DOM primitives.
//!
//! The patch engine never builds or mutates nodes itself; it calls the leaf
//! operations of a [`Dom`] backend. Backends hand out [`NodeId`] handles.
//! A handle does not keep its node alive and carries no ownership.
//!
//! [`MemoryDom`] is an arena backend used for headless rendering and tests.

mod memory;

pub use memory::{DomStats, MemoryDom};

use crate::error::DomError;

/// Handle to a node owned by a [`Dom`] backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Leaf DOM operations the patch engine relies on.
pub trait Dom {
    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Create a detached text node.
    fn create_text(&mut self, text: &str) -> NodeId;

    fn set_attribute(&mut self, el: NodeId, name: &str, value: &str) -> Result<(), DomError>;

    fn remove_attribute(&mut self, el: NodeId, name: &str) -> Result<(), DomError>;

    /// Replace the content of a text node.
    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError>;

    /// Insert `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None`. A child that is already attached somewhere is
    /// moved.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError>;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError>;

    /// Put `new` in the slot `old` occupies under `parent`.
    fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> Result<(), DomError>;

    fn next_sibling(&self, node: NodeId) -> Result<Option<NodeId>, DomError>;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }
}
