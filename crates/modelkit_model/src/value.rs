//! Attribute values.
//!
//! An unset attribute has no [`Value`] at all (`Option::None`); [`Value::Null`]
//! is an explicit null that survives serialization.

use serde_json::Number;

use crate::instance::Instance;

/// The value of one attribute.
///
/// Equality is strict in the sense the change tracker needs: numbers compare
/// numerically (`2` equals `2.0`), nested instances compare by identity, and
/// everything else compares structurally.
#[derive(Debug, Clone)]
pub enum Value {
    /// Explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// An array or object, for attributes declared as `any`.
    Json(serde_json::Value),
    /// A nested model instance.
    Model(Instance),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the string slice if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number as `i64` if it is an integer in range.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Returns the number as `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Returns the nested instance if this is one.
    #[must_use]
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Model(instance) => Some(instance),
            _ => None,
        }
    }

    /// Converts a JSON value, keeping scalars as their own variants.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            other => Value::Json(other),
        }
    }

    /// Produces a JSON copy of this value.
    ///
    /// Nested instances are serialized through [`Instance::to_json`].
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Json(json) => json.clone(),
            Value::Model(instance) => instance.to_json(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => numbers_eq(a, b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Model(a), Value::Model(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Integers compare exactly; a float on either side compares as `f64`.
fn numbers_eq(a: &Number, b: &Number) -> bool {
    if a.is_f64() || b.is_f64() {
        matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
    } else {
        a == b
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl From<f64> for Value {
    /// Non-finite floats have no JSON number form and become [`Value::Null`].
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Instance> for Value {
    fn from(value: Instance) -> Self {
        Value::Model(value)
    }
}

impl From<&Instance> for Value {
    fn from(value: &Instance) -> Self {
        Value::Model(value.clone())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::from_json(value)
    }
}
