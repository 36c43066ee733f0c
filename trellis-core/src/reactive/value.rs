//! Reactive values.
//!
//! State is modelled as a closed set of variants instead of arbitrary objects.
//! Only [`Value::Object`] is recursed into when state is made reactive; arrays
//! are immutable and replaced wholesale.
//!
//! Identity follows the write rule of reactive fields: primitives compare by
//! value, arrays and objects by reference.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::object::ReactiveObject;

/// A value stored in a reactive field.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Rc<Vec<Value>>),
    Object(ReactiveObject),
}

impl Value {
    /// Build an array value.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Array(Rc::new(items.into_iter().collect()))
    }

    /// Build a plain (not yet reactive) object value.
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Object(ReactiveObject::plain(
            fields.into_iter().map(|(k, v)| (k.into(), v)),
        ))
    }

    /// Whether writing `other` over `self` would be a no-op.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ReactiveObject> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Snapshot as JSON without registering any dependency.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Array(items) => items.iter().map(Value::to_json).collect(),
            Value::Object(obj) => obj.to_json(),
        }
    }
}

impl From<serde_json::Value> for Value {
    /// JSON objects become plain objects; pass them through
    /// [`make_reactive`](super::make_reactive) to track their fields.
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.into()),
            serde_json::Value::Array(items) => Value::array(items.into_iter().map(Value::from)),
            serde_json::Value::Object(map) => {
                let fields: IndexMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
                Value::Object(ReactiveObject::plain(fields))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<ReactiveObject> for Value {
    fn from(obj: ReactiveObject) -> Self {
        Value::Object(obj)
    }
}

impl fmt::Display for Value {
    /// Text form used when a value is rendered into a text node.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Array(_) | Value::Object(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(obj) => fmt::Debug::fmt(obj, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primitives_compare_by_value() {
        assert!(Value::from(3).is_identical(&Value::from(3.0)));
        assert!(Value::from("a").is_identical(&Value::from(String::from("a"))));
        assert!(!Value::from(true).is_identical(&Value::from(1)));
        assert!(Value::Null.is_identical(&Value::Null));
    }

    #[test]
    fn arrays_and_objects_compare_by_reference() {
        let a = Value::array([Value::from(1)]);
        let b = Value::array([Value::from(1)]);
        assert!(a.is_identical(&a.clone()));
        assert!(!a.is_identical(&b));

        let o = Value::from(json!({ "x": 1 }));
        let p = Value::from(json!({ "x": 1 }));
        assert!(o.is_identical(&o.clone()));
        assert!(!o.is_identical(&p));
    }

    #[test]
    fn json_conversion_keeps_structure() {
        let value = Value::from(json!({ "name": "ada", "tags": ["x", "y"], "age": 36 }));
        assert_eq!(value.to_json(), json!({ "name": "ada", "tags": ["x", "y"], "age": 36.0 }));
    }

    #[test]
    fn display_renders_integers_without_fraction() {
        assert_eq!(Value::from(42).to_string(), "42");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::Null.to_string(), "");
    }
}
