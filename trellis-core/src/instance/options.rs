//! App options.
//!
//! The declarative part (`template`, `data`) deserializes from JSON; render
//! closures and hooks are attached with builder methods.

use serde::Deserialize;

use super::hooks::{HookError, Hooks, LifecycleHook};
use crate::compiler::Render;
use crate::error::Result;
use crate::reactive::ReactiveObject;
use crate::vnode::VNode;

/// Options an [`App`](super::App) is created from.
///
/// A render function takes precedence over a template when both are set.
///
/// # Example
///
/// ```rust,ignore
/// let options = AppOptions::from_json(r#"{
///     "template": "<p>hello</p>",
///     "data": { "count": 0 }
/// }"#)?
/// .hook(LifecycleHook::Mounted, |_| Ok(()));
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppOptions {
    #[serde(default)]
    pub template: Option<String>,

    /// Initial state. Must be an object; `null` means no fields.
    #[serde(default)]
    pub data: serde_json::Value,

    #[serde(skip)]
    pub render: Option<Render>,

    #[serde(skip)]
    pub hooks: Hooks,
}

impl AppOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn render(mut self, render: impl Fn(&ReactiveObject) -> VNode + 'static) -> Self {
        self.render = Some(Render::new(render));
        self
    }

    pub fn hook(
        mut self,
        hook: LifecycleHook,
        handler: impl Fn(&ReactiveObject) -> Result<(), HookError> + 'static,
    ) -> Self {
        self.hooks.add(hook, handler);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    #[test]
    fn reads_declarative_options_from_json() {
        let options = AppOptions::from_json(
            r#"{ "template": "<p>hi</p>", "data": { "count": 1, "name": "x" } }"#,
        )
        .unwrap();

        assert_eq!(options.template.as_deref(), Some("<p>hi</p>"));
        assert_eq!(options.data, json!({ "count": 1, "name": "x" }));
        assert!(options.render.is_none());
        assert!(options.hooks.is_empty());
    }

    #[test]
    fn missing_fields_default() {
        let options = AppOptions::from_json("{}").unwrap();
        assert!(options.template.is_none());
        assert!(options.data.is_null());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = AppOptions::from_json(r#"{ "templat": "<p></p>" }"#).unwrap_err();
        assert!(matches!(err, Error::Options(_)));
    }

    #[test]
    fn builders_attach_closures() {
        let options = AppOptions::new()
            .render(|_| VNode::element("div"))
            .hook(LifecycleHook::Mounted, |_| Ok(()))
            .hook(LifecycleHook::Destroyed, |_| Ok(()));

        assert!(options.render.is_some());
        assert_eq!(options.hooks.len(), 2);
    }
}
