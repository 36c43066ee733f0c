//! Diff/patch engine.
//!
//! [`patch`] converges the real DOM from an old virtual tree to a new one.
//! Nodes with different tags are replaced wholesale; nodes with the same tag
//! keep their real node, get their attributes diffed and their children
//! reconciled by [`patch_children`].
//!
//! # Children
//!
//! Children are reconciled with a two-ended walk. Four cursors point at the
//! first and last unprocessed child of both lists, and each step tries, in
//! this order:
//!
//! 1. old start vs new start: patch in place
//! 2. old end vs new end: patch in place
//! 3. old start vs new end: patch, move after the old end
//! 4. old end vs new start: patch, move before the old start
//! 5. nothing matched: create the new start before the old start
//!
//! There is no key-to-index lookup: a node that moved into the middle of the
//! list is created afresh and its old counterpart removed. Leftover new
//! children are inserted, leftover old children removed.
//!
//! The engine does not validate DOM placement. Any backend failure aborts
//! the current patch and is returned as is; the DOM may then be partially
//! updated.

use tracing::{debug, trace};

use super::node::{Attrs, VNode, VNodeKind};
use crate::dom::{Dom, NodeId};
use crate::error::PatchError;

/// Reconcile `old` into `new` under `parent`.
///
/// With no `old` tree the real nodes for `new` are built from scratch and
/// appended to `parent`.
pub fn patch<D: Dom + ?Sized>(
    dom: &mut D,
    old: Option<&VNode>,
    new: &VNode,
    parent: NodeId,
) -> Result<(), PatchError> {
    let Some(old) = old else {
        debug!(node = %new.label(), "mount");
        let el = create_elm(dom, new)?;
        dom.append_child(parent, el)?;
        return Ok(());
    };

    let old_el = handle(old)?;

    if old.tag() != new.tag() {
        debug!(old = %old.label(), new = %new.label(), "replace");
        let el = create_elm(dom, new)?;
        dom.replace_child(parent, el, old_el)?;
        return Ok(());
    }

    new.set_el(old_el);
    match (old.kind(), new.kind()) {
        (VNodeKind::Text(old_text), VNodeKind::Text(new_text)) => {
            if old_text != new_text {
                trace!(?old_el, "text changed");
                dom.set_text(old_el, new_text)?;
            }
        }
        (
            VNodeKind::Element {
                attrs: old_attrs,
                children: old_children,
                ..
            },
            VNodeKind::Element {
                attrs: new_attrs,
                children: new_children,
                ..
            },
        ) => {
            update_attributes(dom, old_el, old_attrs, new_attrs)?;
            patch_children(dom, old_children, new_children, old_el)?;
        }
        // Equal tags imply equal kinds.
        _ => unreachable!("vnodes with equal tags have the same kind"),
    }
    Ok(())
}

/// Reconcile two child lists of the element `parent`.
pub fn patch_children<D: Dom + ?Sized>(
    dom: &mut D,
    old_children: &[VNode],
    new_children: &[VNode],
    parent: NodeId,
) -> Result<(), PatchError> {
    // End cursors are exclusive.
    let (mut old_start, mut old_end) = (0, old_children.len());
    let (mut new_start, mut new_end) = (0, new_children.len());

    while old_start < old_end && new_start < new_end {
        let old_start_node = &old_children[old_start];
        let old_end_node = &old_children[old_end - 1];
        let new_start_node = &new_children[new_start];
        let new_end_node = &new_children[new_end - 1];

        if same_vnode(old_start_node, new_start_node) {
            patch(dom, Some(old_start_node), new_start_node, parent)?;
            old_start += 1;
            new_start += 1;
        } else if same_vnode(old_end_node, new_end_node) {
            patch(dom, Some(old_end_node), new_end_node, parent)?;
            old_end -= 1;
            new_end -= 1;
        } else if same_vnode(old_start_node, new_end_node) {
            patch(dom, Some(old_start_node), new_end_node, parent)?;
            let reference = dom.next_sibling(handle(old_end_node)?)?;
            debug!(node = %old_start_node.label(), "move towards end");
            dom.insert_before(parent, handle(old_start_node)?, reference)?;
            old_start += 1;
            new_end -= 1;
        } else if same_vnode(old_end_node, new_start_node) {
            patch(dom, Some(old_end_node), new_start_node, parent)?;
            debug!(node = %old_end_node.label(), "move towards start");
            dom.insert_before(parent, handle(old_end_node)?, Some(handle(old_start_node)?))?;
            old_end -= 1;
            new_start += 1;
        } else {
            debug!(node = %new_start_node.label(), "create");
            let el = create_elm(dom, new_start_node)?;
            dom.insert_before(parent, el, Some(handle(old_start_node)?))?;
            new_start += 1;
        }
    }

    if new_start < new_end {
        // Everything after `new_end` has been patched and carries its handle.
        let reference = new_children.get(new_end).and_then(VNode::el);
        for node in &new_children[new_start..new_end] {
            debug!(node = %node.label(), "insert leftover");
            let el = create_elm(dom, node)?;
            dom.insert_before(parent, el, reference)?;
        }
    }

    if old_start < old_end {
        for node in &old_children[old_start..old_end] {
            debug!(node = %node.label(), "remove leftover");
            dom.remove_child(parent, handle(node)?)?;
        }
    }

    Ok(())
}

/// Build the real subtree for `vnode` and record the handles on every vnode.
///
/// The returned node is detached.
pub fn create_elm<D: Dom + ?Sized>(dom: &mut D, vnode: &VNode) -> Result<NodeId, PatchError> {
    let el = match vnode.kind() {
        VNodeKind::Text(content) => dom.create_text(content),
        VNodeKind::Element {
            tag,
            attrs,
            children,
        } => {
            let el = dom.create_element(tag);
            for (name, value) in attrs {
                dom.set_attribute(el, name, value)?;
            }
            for child in children {
                let child_el = create_elm(dom, child)?;
                dom.append_child(el, child_el)?;
            }
            el
        }
    };
    vnode.set_el(el);
    Ok(el)
}

/// Apply the attribute differences between `old` and `new` to `el`.
pub fn update_attributes<D: Dom + ?Sized>(
    dom: &mut D,
    el: NodeId,
    old: &Attrs,
    new: &Attrs,
) -> Result<(), PatchError> {
    for (name, value) in new {
        if old.get(name) != Some(value) {
            dom.set_attribute(el, name, value)?;
        }
    }
    for name in old.keys() {
        if !new.contains_key(name) {
            dom.remove_attribute(el, name)?;
        }
    }
    Ok(())
}

/// Same-node equivalence: tag and key both match.
pub fn same_vnode(a: &VNode, b: &VNode) -> bool {
    a.is_same(b)
}

fn handle(vnode: &VNode) -> Result<NodeId, PatchError> {
    vnode.el().ok_or_else(|| PatchError::MissingHandle {
        tag: vnode.label(),
    })
}
