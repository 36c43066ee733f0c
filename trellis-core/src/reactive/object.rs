//! Reactive Objects
//!
//! A [`ReactiveObject`] is a map-backed container with an explicit
//! [`get`](ReactiveObject::get) / [`set`](ReactiveObject::set) contract.
//! Each field is either plain or reactive. Reactive fields own one [`Dep`]:
//! reading them inside a tracked run registers the running subscriber, and
//! writing a different value notifies every subscriber.
//!
//! # Limitations
//!
//! [`make_reactive`] snapshots the fields present at call time. A field added
//! later with `set` stays plain: it stores the value but never tracks or
//! notifies until `make_reactive` is called again.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use super::dep::Dep;
use super::value::Value;

struct Field {
    value: Value,
    /// `None` while the field is plain.
    dep: Option<Dep>,
}

/// Shared handle to a reactive (or not yet reactive) object.
///
/// Cloning shares the fields.
#[derive(Clone, Default)]
pub struct ReactiveObject {
    fields: Rc<RefCell<IndexMap<String, Field>>>,
}

impl ReactiveObject {
    /// An empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// An object whose fields are all plain.
    pub fn plain(fields: impl IntoIterator<Item = (String, Value)>) -> Self {
        let fields = fields
            .into_iter()
            .map(|(key, value)| (key, Field { value, dep: None }))
            .collect();
        Self {
            fields: Rc::new(RefCell::new(fields)),
        }
    }

    /// Build an object from JSON and make it reactive.
    ///
    /// Returns `None` if `json` is not an object.
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        match Value::from(json) {
            Value::Object(obj) => {
                make_reactive(&obj);
                Some(obj)
            }
            _ => None,
        }
    }

    /// Whether both handles point at the same object.
    pub fn ptr_eq(&self, other: &ReactiveObject) -> bool {
        Rc::ptr_eq(&self.fields, &other.fields)
    }

    /// Read a field.
    ///
    /// A reactive field registers the active subscriber, if there is one.
    /// Missing fields read as `None` and are never tracked.
    pub fn get(&self, key: &str) -> Option<Value> {
        let (value, dep) = {
            let fields = self.fields.borrow();
            let field = fields.get(key)?;
            (field.value.clone(), field.dep.clone())
        };
        if let Some(dep) = dep {
            dep.depend();
        }
        Some(value)
    }

    /// Read a field without registering a dependency.
    pub fn get_untracked(&self, key: &str) -> Option<Value> {
        self.fields.borrow().get(key).map(|f| f.value.clone())
    }

    /// Write a field.
    ///
    /// Writing a value identical to the stored one does nothing. Otherwise
    /// the value is stored, made reactive if it is an object, and the
    /// field's subscribers re-run before this call returns.
    ///
    /// Writing a field that does not exist adds it as a plain field.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let dep = {
            let mut fields = self.fields.borrow_mut();
            match fields.get_mut(key) {
                Some(field) if field.value.is_identical(&value) => return,
                Some(field) => {
                    field.value = value.clone();
                    field.dep.clone()
                }
                None => {
                    fields.insert(key.to_owned(), Field { value, dep: None });
                    return;
                }
            }
        };

        if let Value::Object(obj) = &value {
            make_reactive(obj);
        }

        if let Some(dep) = dep {
            trace!(key, "reactive write");
            dep.notify();
        }
    }

    /// Whether the object has a field named `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.borrow().contains_key(key)
    }

    /// Whether `key` exists and is reactive.
    pub fn is_reactive(&self, key: &str) -> bool {
        self.fields
            .borrow()
            .get(key)
            .is_some_and(|field| field.dep.is_some())
    }

    /// The tracker of a reactive field.
    pub fn dep(&self, key: &str) -> Option<Dep> {
        self.fields.borrow().get(key).and_then(|f| f.dep.clone())
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.fields.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.fields.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.borrow().is_empty()
    }

    /// Snapshot as JSON without registering any dependency.
    pub fn to_json(&self) -> serde_json::Value {
        let fields = self.fields.borrow();
        serde_json::Value::Object(
            fields
                .iter()
                .map(|(key, field)| (key.clone(), field.value.to_json()))
                .collect(),
        )
    }
}

/// Make every field currently on `obj` reactive.
///
/// Nested objects are made reactive before this call returns, so an
/// object-typed field is already reactive by the time it can be read. Fields
/// that are already reactive keep their tracker, which makes repeated calls
/// idempotent.
pub fn make_reactive(obj: &ReactiveObject) {
    let pending: Vec<(String, Value)> = obj
        .fields
        .borrow()
        .iter()
        .filter(|(_, field)| field.dep.is_none())
        .map(|(key, field)| (key.clone(), field.value.clone()))
        .collect();

    // Trackers go in before recursing so self-referencing objects terminate.
    // Nothing can read the fields in between, so the order is not observable.
    {
        let mut fields = obj.fields.borrow_mut();
        for (key, _) in &pending {
            if let Some(field) = fields.get_mut(key) {
                field.dep.get_or_insert_with(Dep::new);
            }
        }
    }

    for (_, value) in &pending {
        observe(value);
    }
}

/// Make `value` reactive if it is an object. Other variants are left alone.
pub fn observe(value: &Value) {
    if let Value::Object(obj) = value {
        make_reactive(obj);
    }
}

impl fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.fields.borrow();
        let mut map = f.debug_map();
        for (key, field) in fields.iter() {
            map.entry(key, &field.value);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> ReactiveObject {
        ReactiveObject::from_json(json!({
            "msg": "hello",
            "count": 1,
            "user": { "name": "ada", "address": { "city": "london" } },
            "tags": ["a"],
            "nothing": null,
        }))
        .unwrap()
    }

    #[test]
    fn make_reactive_wires_every_field() {
        let obj = state();
        for key in ["msg", "count", "user", "tags", "nothing"] {
            assert!(obj.is_reactive(key), "{key} should be reactive");
        }
    }

    #[test]
    fn nested_objects_are_reactive() {
        let obj = state();
        let user = obj.get_untracked("user").unwrap();
        let user = user.as_object().unwrap();
        assert!(user.is_reactive("name"));

        let address = user.get_untracked("address").unwrap();
        assert!(address.as_object().unwrap().is_reactive("city"));
    }

    #[test]
    fn make_reactive_twice_keeps_trackers() {
        let obj = state();
        let before = obj.dep("msg").unwrap().id();
        make_reactive(&obj);
        assert_eq!(obj.dep("msg").unwrap().id(), before);
    }

    #[test]
    fn fields_added_later_stay_plain() {
        let obj = state();
        obj.set("late", 5);
        assert!(obj.contains_key("late"));
        assert!(!obj.is_reactive("late"));
        assert_eq!(obj.get("late").and_then(|v| v.as_f64()), Some(5.0));

        make_reactive(&obj);
        assert!(obj.is_reactive("late"));
    }

    #[test]
    fn assigned_objects_become_reactive() {
        let obj = state();
        obj.set("user", Value::from(json!({ "name": "grace" })));
        let user = obj.get_untracked("user").unwrap();
        assert!(user.as_object().unwrap().is_reactive("name"));
    }

    #[test]
    fn self_referencing_objects_terminate() {
        let obj = ReactiveObject::new();
        obj.set("me", obj.clone());
        make_reactive(&obj);
        assert!(obj.is_reactive("me"));
    }

    #[test]
    fn missing_fields_read_as_none() {
        assert!(state().get("missing").is_none());
    }

    #[test]
    fn from_json_rejects_non_objects() {
        assert!(ReactiveObject::from_json(json!([1, 2])).is_none());
    }
}
