//! Instance lifecycle.
//!
//! [`App::mount`] bootstraps an [`Instance`]: the initial data becomes
//! reactive state, the template is compiled, and a render watcher is
//! attached whose tracked run renders the state and patches the DOM. From
//! then on every write to a field the last render read re-runs the watcher
//! synchronously.
//!
//! ```text
//! mount:   beforeMount -> render -> patch(None, vnode) -> mounted
//! write:   beforeUpdate -> render -> patch(prev, vnode) -> updated
//! destroy: beforeDestroy -> teardown -> remove root -> destroyed
//! ```

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, error};

use super::hooks::{call_hook, Hooks, LifecycleHook};
use super::options::AppOptions;
use crate::compiler::{compile, Render};
use crate::dom::{Dom, NodeId};
use crate::error::{Error, PatchError, Result};
use crate::reactive::{ReactiveContext, ReactiveObject, Watcher};
use crate::vnode::{patch, VNode};

/// Create an app from `options`. Nothing is rendered until [`App::mount`].
pub fn create_app(options: AppOptions) -> App {
    App { options }
}

/// An app that has not been mounted yet.
#[derive(Debug)]
pub struct App {
    options: AppOptions,
}

impl App {
    /// Mount into `container`, an element of `dom`.
    ///
    /// Fails if the options carry no way to render, if the data is not an
    /// object, if the template does not compile, or if the first patch fails.
    pub fn mount<D: Dom + 'static>(
        self,
        dom: Rc<RefCell<D>>,
        container: NodeId,
    ) -> Result<Instance<D>> {
        let AppOptions {
            template,
            data,
            render,
            hooks,
        } = self.options;

        let state = if data.is_null() {
            ReactiveObject::new()
        } else {
            ReactiveObject::from_json(data).ok_or(Error::InvalidData)?
        };

        let render = match (render, template) {
            (Some(render), _) => render,
            (None, Some(template)) => compile(&template)?.render,
            (None, None) => return Err(Error::NoRender),
        };

        let instance = Instance {
            inner: Rc::new(InstanceInner {
                state,
                render,
                hooks,
                dom,
                container,
                vnode: RefCell::new(None),
                watcher: RefCell::new(None),
                last_error: RefCell::new(None),
                is_mounted: Cell::new(false),
                is_being_destroyed: Cell::new(false),
                is_destroyed: Cell::new(false),
            }),
        };
        instance.mount()?;
        Ok(instance)
    }
}

struct InstanceInner<D: Dom + 'static> {
    state: ReactiveObject,
    render: Render,
    hooks: Hooks,
    dom: Rc<RefCell<D>>,
    container: NodeId,
    /// The tree currently reflected in the DOM.
    vnode: RefCell<Option<VNode>>,
    watcher: RefCell<Option<Watcher<()>>>,
    last_error: RefCell<Option<PatchError>>,
    is_mounted: Cell<bool>,
    is_being_destroyed: Cell<bool>,
    is_destroyed: Cell<bool>,
}

/// A mounted app.
///
/// Cloning shares the instance. Dropping the last handle stops reactive
/// updates but leaves the DOM as it is; call [`Instance::destroy`] to
/// remove the rendered tree.
pub struct Instance<D: Dom + 'static> {
    inner: Rc<InstanceInner<D>>,
}

impl<D: Dom + 'static> Instance<D> {
    fn mount(&self) -> Result<()> {
        self.inner.call_hook(LifecycleHook::BeforeMount);

        let weak = Rc::downgrade(&self.inner);
        let watcher = Watcher::new(
            weak,
            |weak: &Weak<InstanceInner<D>>| {
                if let Some(inner) = weak.upgrade() {
                    inner.render_and_patch();
                }
            },
            |_, _, _| {},
        );

        if let Some(err) = self.inner.last_error.borrow_mut().take() {
            watcher.teardown();
            return Err(err.into());
        }

        *self.inner.watcher.borrow_mut() = Some(watcher);
        self.inner.is_mounted.set(true);
        debug!(container = ?self.inner.container, "instance mounted");
        self.inner.call_hook(LifecycleHook::Mounted);
        Ok(())
    }

    /// Reactive state. Writes re-render.
    pub fn state(&self) -> &ReactiveObject {
        &self.inner.state
    }

    /// Run the render function once, without tracking its reads.
    pub fn render(&self) -> VNode {
        ReactiveContext::untracked(|| self.inner.render.call(&self.inner.state))
    }

    /// Apply `vnode` to the DOM: patch it against the stored tree, or mount
    /// it if nothing is rendered yet, then store it.
    ///
    /// On failure the previous tree stays stored. The DOM may be partially
    /// patched.
    pub fn update(&self, vnode: VNode) -> Result<(), PatchError> {
        self.inner.update(vnode)
    }

    /// Re-render now, as if a tracked field had changed.
    pub fn force_update(&self) {
        let watcher = self.inner.watcher.borrow().clone();
        if let Some(watcher) = watcher {
            watcher.update();
        }
    }

    /// Tear the instance down. Safe to call more than once.
    ///
    /// Returns the DOM failure, if any, of removing the rendered tree; the
    /// instance counts as destroyed either way.
    pub fn destroy(&self) -> Result<(), PatchError> {
        let inner = &self.inner;
        if inner.is_being_destroyed.get() || inner.is_destroyed.get() {
            return Ok(());
        }
        inner.call_hook(LifecycleHook::BeforeDestroy);
        inner.is_being_destroyed.set(true);

        let watcher = inner.watcher.borrow_mut().take();
        if let Some(watcher) = watcher {
            watcher.teardown();
        }

        let removed = match inner.vnode.borrow_mut().take().and_then(|vnode| vnode.el()) {
            Some(root) => match inner.dom.try_borrow_mut() {
                Ok(mut dom) => dom.remove_child(inner.container, root).map_err(PatchError::from),
                Err(_) => Err(PatchError::DomBusy),
            },
            None => Ok(()),
        };

        inner.is_mounted.set(false);
        inner.is_destroyed.set(true);
        debug!(container = ?inner.container, "instance destroyed");
        inner.call_hook(LifecycleHook::Destroyed);
        removed
    }

    /// The tree currently reflected in the DOM.
    pub fn vnode(&self) -> Option<Ref<'_, VNode>> {
        Ref::filter_map(self.inner.vnode.borrow(), Option::as_ref).ok()
    }

    /// Real node of the rendered root.
    pub fn root_element(&self) -> Option<NodeId> {
        self.inner.vnode.borrow().as_ref().and_then(VNode::el)
    }

    pub fn container(&self) -> NodeId {
        self.inner.container
    }

    pub fn dom(&self) -> &Rc<RefCell<D>> {
        &self.inner.dom
    }

    /// Failure of the last write-triggered re-render, if it failed.
    pub fn last_error(&self) -> Option<Ref<'_, PatchError>> {
        Ref::filter_map(self.inner.last_error.borrow(), Option::as_ref).ok()
    }

    pub fn take_error(&self) -> Option<PatchError> {
        self.inner.last_error.borrow_mut().take()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.is_mounted.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed.get()
    }

    /// Number of renders so far, the initial one included.
    pub fn render_count(&self) -> usize {
        self.inner
            .watcher
            .borrow()
            .as_ref()
            .map_or(0, Watcher::run_count)
    }
}

impl<D: Dom + 'static> InstanceInner<D> {
    fn call_hook(&self, hook: LifecycleHook) {
        call_hook(&self.hooks, hook, &self.state);
    }

    /// Body of the render watcher. Runs tracked.
    fn render_and_patch(&self) {
        let mounted = self.is_mounted.get();
        if mounted {
            self.call_hook(LifecycleHook::BeforeUpdate);
        }

        let vnode = self.render.call(&self.state);
        match self.update(vnode) {
            Ok(()) => {
                if mounted {
                    self.call_hook(LifecycleHook::Updated);
                }
            }
            Err(err) => {
                // A write cannot return this error to its caller.
                if mounted {
                    error!(error = %err, "re-render failed");
                }
                *self.last_error.borrow_mut() = Some(err);
            }
        }
    }

    fn update(&self, vnode: VNode) -> Result<(), PatchError> {
        let mut dom = self.dom.try_borrow_mut().map_err(|_| PatchError::DomBusy)?;
        let previous = self.vnode.borrow_mut().take();

        match patch(&mut *dom, previous.as_ref(), &vnode, self.container) {
            Ok(()) => {
                *self.vnode.borrow_mut() = Some(vnode);
                Ok(())
            }
            Err(err) => {
                *self.vnode.borrow_mut() = previous;
                Err(err)
            }
        }
    }
}

impl<D: Dom + 'static> Clone for Instance<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: Dom + 'static> fmt::Debug for Instance<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("container", &self.inner.container)
            .field("mounted", &self.is_mounted())
            .field("destroyed", &self.is_destroyed())
            .field("render_count", &self.render_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;
    use crate::vnode::{h, text, Attrs};
    use serde_json::json;

    fn setup() -> (Rc<RefCell<MemoryDom>>, NodeId) {
        let mut dom = MemoryDom::new();
        let container = dom.create_container("div");
        (Rc::new(RefCell::new(dom)), container)
    }

    fn counter_options() -> AppOptions {
        AppOptions::new()
            .data(json!({ "count": 0, "label": "clicks" }))
            .render(|state| {
                let count = state.get("count").unwrap_or_default();
                h("p", Attrs::new(), vec![text(count.to_string())])
            })
    }

    #[test]
    fn mount_renders_into_the_container() {
        let (dom, container) = setup();
        let app = create_app(counter_options()).mount(dom.clone(), container).unwrap();

        assert!(app.is_mounted());
        assert_eq!(app.render_count(), 1);
        assert_eq!(dom.borrow().inner_html(container), "<p>0</p>");
        assert_eq!(dom.borrow().children(container), [app.root_element().unwrap()]);
    }

    #[test]
    fn writes_re_render_in_place() {
        let (dom, container) = setup();
        let app = create_app(counter_options()).mount(dom.clone(), container).unwrap();
        let root = app.root_element();
        dom.borrow_mut().reset_stats();

        app.state().set("count", 1);

        assert_eq!(app.render_count(), 2);
        assert_eq!(dom.borrow().inner_html(container), "<p>1</p>");
        assert_eq!(app.root_element(), root);
        let stats = dom.borrow().stats();
        assert_eq!(stats.text_writes, 1);
        assert!(stats.is_structurally_idle());
    }

    #[test]
    fn unread_fields_do_not_re_render() {
        let (dom, container) = setup();
        let app = create_app(counter_options()).mount(dom, container).unwrap();

        app.state().set("label", "taps");
        assert_eq!(app.render_count(), 1);
    }

    #[test]
    fn template_is_compiled_when_no_render_is_given() {
        let (dom, container) = setup();
        let options =
            AppOptions::from_json(r#"{ "template": "<ul><li key=\"a\">A</li></ul>" }"#).unwrap();
        let app = create_app(options).mount(dom.clone(), container).unwrap();

        assert_eq!(dom.borrow().inner_html(container), "<ul><li>A</li></ul>");
        assert_eq!(app.vnode().unwrap().child_nodes()[0].key_value(), Some("a"));
    }

    #[test]
    fn mount_rejects_incomplete_options() {
        let (dom, container) = setup();
        let err = create_app(AppOptions::new()).mount(dom.clone(), container).unwrap_err();
        assert!(matches!(err, Error::NoRender));

        let options = AppOptions::new().template("<p></p>").data(json!([1, 2]));
        let err = create_app(options).mount(dom.clone(), container).unwrap_err();
        assert!(matches!(err, Error::InvalidData));

        let err = create_app(AppOptions::new().template("<p>")).mount(dom, container).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn mount_surfaces_dom_failures() {
        let (dom, _) = setup();
        let bogus = NodeId::from(999);
        let err = create_app(counter_options()).mount(dom, bogus).unwrap_err();
        assert!(matches!(err, Error::Patch(PatchError::Dom(_))));
    }

    #[test]
    fn destroy_removes_the_tree_and_stops_updates() {
        let (dom, container) = setup();
        let app = create_app(counter_options()).mount(dom.clone(), container).unwrap();

        app.destroy().unwrap();
        app.destroy().unwrap();

        assert!(app.is_destroyed());
        assert!(!app.is_mounted());
        assert_eq!(dom.borrow().inner_html(container), "");
        assert_eq!(app.state().dep("count").unwrap().subscriber_count(), 0);

        app.state().set("count", 5);
        assert_eq!(app.render_count(), 0);
    }

    #[test]
    fn busy_dom_is_recorded_on_the_instance() {
        let (dom, container) = setup();
        let app = create_app(counter_options()).mount(dom.clone(), container).unwrap();

        {
            let _held = dom.borrow();
            app.state().set("count", 1);
        }
        assert!(matches!(app.take_error(), Some(PatchError::DomBusy)));
        assert_eq!(dom.borrow().inner_html(container), "<p>0</p>");

        // The stored tree is intact, so the next write patches normally.
        app.state().set("count", 2);
        assert!(app.last_error().is_none());
        assert_eq!(dom.borrow().inner_html(container), "<p>2</p>");
    }

    #[test]
    fn update_applies_a_hand_built_tree() {
        let (dom, container) = setup();
        let app = create_app(counter_options()).mount(dom.clone(), container).unwrap();

        app.update(VNode::element("p").child(VNode::text("manual"))).unwrap();
        assert_eq!(dom.borrow().inner_html(container), "<p>manual</p>");

        app.force_update();
        assert_eq!(dom.borrow().inner_html(container), "<p>0</p>");
        assert_eq!(app.render_count(), 2);
    }
}
