//! Virtual nodes.

use std::cell::Cell;

use indexmap::IndexMap;

use crate::dom::NodeId;

/// Attribute map of an element, in declaration order.
pub type Attrs = IndexMap<String, String>;

/// Name of the attribute that doubles as the identity key.
pub const KEY_ATTR: &str = "key";

#[derive(Debug, Clone)]
pub enum VNodeKind {
    Element {
        tag: String,
        attrs: Attrs,
        children: Vec<VNode>,
    },
    Text(String),
}

/// Description of an element or a text node.
///
/// The real node a vnode produced is recorded once the vnode has been created
/// or patched; before that [`VNode::el`] is `None`.
#[derive(Debug, Clone)]
pub struct VNode {
    kind: VNodeKind,
    key: Option<String>,
    el: Cell<Option<NodeId>>,
}

impl VNode {
    /// An element with no attributes and no children.
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            kind: VNodeKind::Element {
                tag: tag.into(),
                attrs: Attrs::new(),
                children: Vec::new(),
            },
            key: None,
            el: Cell::new(None),
        }
    }

    /// A text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: VNodeKind::Text(text.into()),
            key: None,
            el: Cell::new(None),
        }
    }

    /// Set an attribute. Setting [`KEY_ATTR`] sets the key instead.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        if name == KEY_ATTR {
            self.key = Some(value);
        } else if let VNodeKind::Element { attrs, .. } = &mut self.kind {
            attrs.insert(name, value);
        }
        self
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Append a child. Text nodes ignore children.
    #[must_use]
    pub fn child(mut self, child: VNode) -> Self {
        if let VNodeKind::Element { children, .. } = &mut self.kind {
            children.push(child);
        }
        self
    }

    #[must_use]
    pub fn children(mut self, more: impl IntoIterator<Item = VNode>) -> Self {
        if let VNodeKind::Element { children, .. } = &mut self.kind {
            children.extend(more);
        }
        self
    }

    pub fn kind(&self) -> &VNodeKind {
        &self.kind
    }

    /// The tag, or `None` for text nodes.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            VNodeKind::Element { tag, .. } => Some(tag),
            VNodeKind::Text(_) => None,
        }
    }

    pub fn attrs(&self) -> Option<&Attrs> {
        match &self.kind {
            VNodeKind::Element { attrs, .. } => Some(attrs),
            VNodeKind::Text(_) => None,
        }
    }

    /// Child vnodes; always empty for text nodes.
    pub fn child_nodes(&self) -> &[VNode] {
        match &self.kind {
            VNodeKind::Element { children, .. } => children,
            VNodeKind::Text(_) => &[],
        }
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            VNodeKind::Text(text) => Some(text),
            VNodeKind::Element { .. } => None,
        }
    }

    pub fn key_value(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The real node this vnode last produced.
    pub fn el(&self) -> Option<NodeId> {
        self.el.get()
    }

    pub(crate) fn set_el(&self, el: NodeId) {
        self.el.set(Some(el));
    }

    /// Whether `self` and `other` describe the same logical node, which
    /// allows reusing the real node in place: tags and keys both match.
    pub fn is_same(&self, other: &VNode) -> bool {
        self.tag() == other.tag() && self.key == other.key
    }

    /// A short label for logs and errors.
    pub(crate) fn label(&self) -> String {
        match (&self.kind, &self.key) {
            (VNodeKind::Element { tag, .. }, Some(key)) => format!("{tag} key={key}"),
            (VNodeKind::Element { tag, .. }, None) => tag.clone(),
            (VNodeKind::Text(_), _) => "#text".to_owned(),
        }
    }
}

/// Element constructor used by render functions.
///
/// An entry named [`KEY_ATTR`] in `attrs` becomes the key and is not set on
/// the real element.
pub fn h(tag: impl Into<String>, attrs: Attrs, children: Vec<VNode>) -> VNode {
    attrs
        .into_iter()
        .fold(VNode::element(tag), |node, (name, value)| node.attr(name, value))
        .children(children)
}

/// Text constructor used by render functions.
pub fn text(content: impl Into<String>) -> VNode {
    VNode::text(content)
}
