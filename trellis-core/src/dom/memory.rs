//! In-memory DOM.
//!
//! Nodes live in an arena indexed by [`NodeId`]. Every mutation is counted in
//! [`DomStats`], which lets tests assert how much work a patch did.

use std::fmt::Write as _;

use indexmap::IndexMap;

use super::{Dom, NodeId};
use crate::error::DomError;

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Counters for every mutation a [`MemoryDom`] performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomStats {
    pub elements_created: usize,
    pub texts_created: usize,
    /// Detached nodes inserted under a parent.
    pub inserts: usize,
    /// Attached nodes moved to a new position.
    pub moves: usize,
    pub removals: usize,
    pub replacements: usize,
    pub attribute_writes: usize,
    pub attribute_removals: usize,
    pub text_writes: usize,
}

impl DomStats {
    /// Nodes created, of either kind.
    pub fn creates(&self) -> usize {
        self.elements_created + self.texts_created
    }

    /// Whether nothing structural happened: no creation, insertion, move,
    /// removal or replacement.
    pub fn is_structurally_idle(&self) -> bool {
        self.creates() == 0
            && self.inserts == 0
            && self.moves == 0
            && self.removals == 0
            && self.replacements == 0
    }
}

/// Arena-backed [`Dom`] implementation.
///
/// Nodes are never freed. A removed or replaced node keeps its handle and
/// content, and handles are never reused, so a stale [`NodeId`] can't alias
/// a newer node. The arena therefore grows with every node created: use it
/// for tests and headless snapshots, not for long-lived instances.
#[derive(Debug, Clone, Default)]
pub struct MemoryDom {
    nodes: Vec<NodeData>,
    stats: DomStats,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element to mount into, without counting it.
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_owned(),
            attrs: IndexMap::new(),
        })
    }

    /// Number of nodes ever allocated, detached and removed ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn stats(&self) -> DomStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DomStats::default();
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).ok().and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).ok()?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.node(node).ok()?.kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).ok()?.kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    /// Serialise `node` and its subtree.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    /// Serialise the children of `node`, without `node` itself.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Ok(data) = self.node(node) else {
            return;
        };
        match &data.kind {
            NodeKind::Text(text) => out.push_str(&escape(text, false)),
            NodeKind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    let _ = write!(out, " {name}=\"{}\"", escape(value, true));
                }
                out.push('>');
                for &child in &data.children {
                    self.write_html(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from(self.nodes.len() as u64);
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        usize::try_from(id.raw())
            .ok()
            .and_then(|index| self.nodes.get(index))
            .ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        usize::try_from(id.raw())
            .ok()
            .and_then(|index| self.nodes.get_mut(index))
            .ok_or(DomError::UnknownNode(id))
    }

    fn element(&self, id: NodeId) -> Result<&NodeData, DomError> {
        let node = self.node(id)?;
        match node.kind {
            NodeKind::Element { .. } => Ok(node),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    fn attrs_mut(&mut self, id: NodeId) -> Result<&mut IndexMap<String, String>, DomError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element { attrs, .. } => Ok(attrs),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    fn index_in(&self, parent: NodeId, child: NodeId) -> Result<usize, DomError> {
        self.element(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(DomError::NotAChild { parent, child })
    }

    /// Whether `node` is `ancestor` or lies somewhere below it.
    fn is_inclusive_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Unlink `node` from its parent, if it has one.
    fn detach(&mut self, node: NodeId) -> Result<bool, DomError> {
        let Some(parent) = self.node(node)?.parent else {
            return Ok(false);
        };
        let index = self.index_in(parent, node)?;
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(node)?.parent = None;
        Ok(true)
    }
}

impl Dom for MemoryDom {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.stats.elements_created += 1;
        self.alloc(NodeKind::Element {
            tag: tag.to_owned(),
            attrs: IndexMap::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.stats.texts_created += 1;
        self.alloc(NodeKind::Text(text.to_owned()))
    }

    fn set_attribute(&mut self, el: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.attrs_mut(el)?.insert(name.to_owned(), value.to_owned());
        self.stats.attribute_writes += 1;
        Ok(())
    }

    fn remove_attribute(&mut self, el: NodeId, name: &str) -> Result<(), DomError> {
        self.attrs_mut(el)?.shift_remove(name);
        self.stats.attribute_removals += 1;
        Ok(())
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::Text(content) => {
                text.clone_into(content);
                self.stats.text_writes += 1;
                Ok(())
            }
            NodeKind::Element { .. } => Err(DomError::NotText(node)),
        }
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.element(parent)?;
        self.node(child)?;
        if self.is_inclusive_descendant(parent, child) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(reference) = reference {
            self.index_in(parent, reference)?;
        }

        // Inserting a node before itself keeps its position.
        let reference = match reference {
            Some(r) if r == child => self.next_sibling(child)?,
            other => other,
        };

        let moved = self.detach(child)?;
        let index = match reference {
            Some(reference) => self.index_in(parent, reference)?,
            None => self.element(parent)?.children.len(),
        };
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);

        if moved {
            self.stats.moves += 1;
        } else {
            self.stats.inserts += 1;
        }
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let index = self.index_in(parent, child)?;
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(child)?.parent = None;
        self.stats.removals += 1;
        Ok(())
    }

    fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> Result<(), DomError> {
        self.index_in(parent, old)?;
        if new == old {
            return Ok(());
        }
        if self.is_inclusive_descendant(parent, new) {
            return Err(DomError::HierarchyRequest { parent, child: new });
        }

        self.detach(new)?;
        let index = self.index_in(parent, old)?;
        self.node_mut(parent)?.children[index] = new;
        self.node_mut(new)?.parent = Some(parent);
        self.node_mut(old)?.parent = None;
        self.stats.replacements += 1;
        Ok(())
    }

    fn next_sibling(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        let Some(parent) = self.node(node)?.parent else {
            return Ok(None);
        };
        let index = self.index_in(parent, node)?;
        Ok(self.element(parent)?.children.get(index + 1).copied())
    }
}

fn escape(raw: &str, in_attribute: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(dom: &mut MemoryDom, items: &[&str]) -> (NodeId, Vec<NodeId>) {
        let ul = dom.create_container("ul");
        let lis = items
            .iter()
            .map(|text| {
                let li = dom.create_element("li");
                let t = dom.create_text(text);
                dom.append_child(li, t).unwrap();
                dom.append_child(ul, li).unwrap();
                li
            })
            .collect();
        dom.reset_stats();
        (ul, lis)
    }

    #[test]
    fn builds_and_serialises_a_tree() {
        let mut dom = MemoryDom::new();
        let root = dom.create_container("div");
        let p = dom.create_element("p");
        dom.set_attribute(p, "class", "a\"b").unwrap();
        let text = dom.create_text("1 < 2");
        dom.append_child(p, text).unwrap();
        dom.append_child(root, p).unwrap();

        assert_eq!(dom.to_html(root), "<div><p class=\"a&quot;b\">1 &lt; 2</p></div>");
        assert_eq!(dom.stats().creates(), 2);
        assert_eq!(dom.stats().inserts, 2);
    }

    #[test]
    fn inserting_an_attached_node_moves_it() {
        let mut dom = MemoryDom::new();
        let (ul, lis) = list(&mut dom, &["a", "b", "c"]);

        dom.insert_before(ul, lis[2], Some(lis[0])).unwrap();

        assert_eq!(dom.inner_html(ul), "<li>c</li><li>a</li><li>b</li>");
        assert_eq!(dom.stats().moves, 1);
        assert_eq!(dom.stats().inserts, 0);
    }

    #[test]
    fn inserting_before_itself_keeps_position() {
        let mut dom = MemoryDom::new();
        let (ul, lis) = list(&mut dom, &["a", "b"]);
        dom.insert_before(ul, lis[0], Some(lis[0])).unwrap();
        assert_eq!(dom.inner_html(ul), "<li>a</li><li>b</li>");
    }

    #[test]
    fn next_sibling_walks_the_parent() {
        let mut dom = MemoryDom::new();
        let (_, lis) = list(&mut dom, &["a", "b"]);
        assert_eq!(dom.next_sibling(lis[0]).unwrap(), Some(lis[1]));
        assert_eq!(dom.next_sibling(lis[1]).unwrap(), None);
    }

    #[test]
    fn replace_child_keeps_the_slot() {
        let mut dom = MemoryDom::new();
        let (ul, lis) = list(&mut dom, &["a", "b", "c"]);
        let p = dom.create_element("p");
        dom.replace_child(ul, p, lis[1]).unwrap();

        assert_eq!(dom.inner_html(ul), "<li>a</li><p></p><li>c</li>");
        assert_eq!(dom.parent(lis[1]), None);
        assert_eq!(dom.stats().replacements, 1);
    }

    #[test]
    fn misuse_is_reported() {
        let mut dom = MemoryDom::new();
        let (ul, lis) = list(&mut dom, &["a"]);
        let stray = dom.create_element("p");
        let text = dom.create_text("x");

        assert_eq!(
            dom.remove_child(ul, stray),
            Err(DomError::NotAChild { parent: ul, child: stray })
        );
        assert_eq!(dom.append_child(text, stray), Err(DomError::NotAnElement(text)));
        assert_eq!(
            dom.append_child(lis[0], ul),
            Err(DomError::HierarchyRequest { parent: lis[0], child: ul })
        );
        assert_eq!(
            dom.set_attribute(NodeId::from(999), "a", "b"),
            Err(DomError::UnknownNode(NodeId::from(999)))
        );
        assert_eq!(dom.set_text(ul, "x"), Err(DomError::NotText(ul)));
    }

    #[test]
    fn removed_nodes_keep_their_handles() {
        let mut dom = MemoryDom::new();
        let (ul, lis) = list(&mut dom, &["a", "b"]);
        let allocated = dom.node_count();

        dom.remove_child(ul, lis[0]).unwrap();
        let fresh = dom.create_element("li");

        assert!(!lis.contains(&fresh));
        assert_eq!(dom.node_count(), allocated + 1);
        assert_eq!(dom.parent(lis[0]), None);
        assert_eq!(dom.to_html(lis[0]), "<li>a</li>");
    }
}
