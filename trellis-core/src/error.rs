//! Error types.
//!
//! Everything in the core is let-it-crash: DOM failures and malformed trees
//! surface to whoever called mount or update. Lifecycle hooks are the only
//! place where failures are caught, see [`crate::instance::call_hook`].

use thiserror::Error;

use crate::dom::NodeId;

/// Failure of a leaf DOM primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("node {0:?} is not a text node")]
    NotText(NodeId),

    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("inserting {child:?} into {parent:?} would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },
}

/// Failure while reconciling two virtual trees.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error(transparent)]
    Dom(#[from] DomError),

    /// The old vnode was never created or patched, so it has no real node.
    #[error("vnode <{tag}> has no real DOM handle")]
    MissingHandle { tag: String },

    /// The shared DOM was already borrowed when a patch tried to run.
    #[error("the DOM is already borrowed by another operation")]
    DomBusy,
}

/// Failure while parsing or validating a template tree.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template is empty")]
    Empty,

    #[error("parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },

    /// A tree node that is neither a well-formed element nor a text node.
    #[error("invalid template node: {0}")]
    InvalidNode(String),

    #[error("template tree JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TemplateError {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}

/// Crate-level error returned by the instance API.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("options carry neither a template nor a render function")]
    NoRender,

    #[error("initial data must be a JSON object")]
    InvalidData,

    #[error("options JSON error: {0}")]
    Options(#[from] serde_json::Error),
}

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
