//! Template trees.
//!
//! [`AstNode`] is the validated tree the code generator consumes. [`RawNode`]
//! is its wire shape: the form an external template producer hands over,
//! with a numeric `type` discriminant (1 = element, 3 = text).

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

pub const ELEMENT_NODE: u8 = 1;
pub const TEXT_NODE: u8 = 3;

/// A `name="value"` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Unvalidated tree node as exchanged with template producers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(rename = "type")]
    pub node_type: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<Attr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RawNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A validated template node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
    Element {
        tag: String,
        attrs: Vec<Attr>,
        children: Vec<AstNode>,
    },
    Text(String),
}

impl AstNode {
    pub fn element(tag: impl Into<String>, attrs: Vec<Attr>, children: Vec<AstNode>) -> Self {
        Self::Element {
            tag: tag.into(),
            attrs,
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Read and validate a tree in wire shape.
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        let raw: RawNode = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    /// Write the tree in wire shape.
    pub fn to_json(&self) -> Result<String, TemplateError> {
        Ok(serde_json::to_string(&RawNode::from(self))?)
    }

    /// Number of nodes in the tree, `self` included.
    pub fn node_count(&self) -> usize {
        match self {
            AstNode::Element { children, .. } => {
                1 + children.iter().map(AstNode::node_count).sum::<usize>()
            }
            AstNode::Text(_) => 1,
        }
    }

    fn validate(raw: RawNode, path: &mut Vec<usize>) -> Result<Self, TemplateError> {
        match raw.node_type {
            ELEMENT_NODE => {
                let tag = match raw.tag {
                    Some(tag) if !tag.is_empty() => tag,
                    _ => return Err(invalid(path, "is an element without a tag")),
                };
                let mut children = Vec::with_capacity(raw.children.len());
                for (index, child) in raw.children.into_iter().enumerate() {
                    path.push(index);
                    children.push(Self::validate(child, path)?);
                    path.pop();
                }
                Ok(AstNode::Element {
                    tag,
                    attrs: raw.attrs,
                    children,
                })
            }
            TEXT_NODE => {
                if !raw.children.is_empty() {
                    return Err(invalid(path, "is a text node with children"));
                }
                raw.text
                    .map(AstNode::Text)
                    .ok_or_else(|| invalid(path.as_slice(), "is a text node without text"))
            }
            other => Err(invalid(path, &format!("has unknown type {other}"))),
        }
    }
}

fn invalid(path: &[usize], what: &str) -> TemplateError {
    let mut at: String = path.iter().map(|i| format!("/{i}")).collect();
    if at.is_empty() {
        at.push('/');
    }
    TemplateError::InvalidNode(format!("node at {at} {what}"))
}

impl TryFrom<RawNode> for AstNode {
    type Error = TemplateError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        Self::validate(raw, &mut Vec::new())
    }
}

impl From<&AstNode> for RawNode {
    fn from(node: &AstNode) -> Self {
        match node {
            AstNode::Element {
                tag,
                attrs,
                children,
            } => RawNode {
                node_type: ELEMENT_NODE,
                tag: Some(tag.clone()),
                attrs: attrs.clone(),
                children: children.iter().map(RawNode::from).collect(),
                text: None,
            },
            AstNode::Text(text) => RawNode {
                node_type: TEXT_NODE,
                tag: None,
                attrs: Vec::new(),
                children: Vec::new(),
                text: Some(text.clone()),
            },
        }
    }
}
