//! Attribute maps and the per-instance attribute store.
//!
//! - [`Attributes`] is the ordered name → value map callers pass in (initial
//!   values, bulk assignment, adapter responses) and get back (`changed()`).
//!   An entry may hold `None`, meaning "unset this attribute".
//! - [`AttributeStore`] is the instance-private state: current values plus
//!   the set of attributes changed since the last persistence point.

use indexmap::map::{IntoIter, Iter};
use indexmap::{IndexMap, IndexSet};

use crate::value::Value;

/// Ordered map of attribute names to optional values.
///
/// ```
/// use modelkit_model::{Attributes, Value};
///
/// let attrs = Attributes::new()
///     .with("name", "Tobi")
///     .with("age", 22)
///     .without("email");
///
/// assert_eq!(attrs.get("name"), Some(&Value::from("Tobi")));
/// assert!(attrs.contains_key("email"));
/// assert_eq!(attrs.get("email"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(IndexMap<String, Option<Value>>);

impl Attributes {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name = value`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), Some(value.into()));
        self
    }

    /// Adds an explicit "unset" entry for `name`.
    #[must_use]
    pub fn without(mut self, name: impl Into<String>) -> Self {
        self.0.insert(name.into(), None);
        self
    }

    /// Sets `name = value`, returning the previous entry if there was one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Option<Value>> {
        self.0.insert(name.into(), Some(value.into()))
    }

    /// Marks `name` to be unset, returning the previous entry if there was one.
    pub fn unset(&mut self, name: impl Into<String>) -> Option<Option<Value>> {
        self.0.insert(name.into(), None)
    }

    /// Drops the entry for `name` entirely, preserving the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<Option<Value>> {
        self.0.shift_remove(name)
    }

    /// Returns the value for `name`, or `None` if absent or unset.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).and_then(Option::as_ref)
    }

    /// Returns `true` if there is an entry for `name`, even an unset one.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> Iter<'_, String, Option<Value>> {
        self.0.iter()
    }

    /// Iterates names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Builds a map from a JSON object. Returns `None` for any other JSON value.
    ///
    /// JSON `null` becomes [`Value::Null`], not an unset entry.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(map) => Some(
                map.into_iter()
                    .map(|(name, value)| (name, Some(Value::from_json(value))))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl FromIterator<(String, Option<Value>)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, Option<Value>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k, Some(v))).collect())
    }
}

impl IntoIterator for Attributes {
    type Item = (String, Option<Value>);
    type IntoIter = IntoIter<String, Option<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = (&'a String, &'a Option<Value>);
    type IntoIter = Iter<'a, String, Option<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Current values and dirty set of one instance.
#[derive(Debug, Default)]
pub(crate) struct AttributeStore {
    values: IndexMap<String, Value>,
    dirty: IndexSet<String>,
}

impl AttributeStore {
    pub(crate) fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Stores `value` without touching the dirty set.
    pub(crate) fn put(&mut self, name: &str, value: Option<Value>) -> Option<Value> {
        match value {
            Some(value) => self.values.insert(name.to_owned(), value),
            None => self.values.shift_remove(name),
        }
    }

    /// Stores `value` if it differs from the current one and marks `name` dirty.
    ///
    /// Returns `Some(previous)` when the value changed, `None` for a no-op.
    pub(crate) fn replace(&mut self, name: &str, value: Option<Value>) -> Option<Option<Value>> {
        if self.values.get(name) == value.as_ref() {
            return None;
        }
        let previous = self.put(name, value);
        self.dirty.insert(name.to_owned());
        Some(previous)
    }

    pub(crate) fn is_dirty(&self, name: &str) -> bool {
        self.dirty.contains(name)
    }

    /// Copies the dirty attributes with their current values.
    pub(crate) fn changed(&self) -> Attributes {
        self.dirty
            .iter()
            .map(|name| (name.clone(), self.values.get(name).cloned()))
            .collect()
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    /// Copies the current values in the given order, skipping unset ones.
    pub(crate) fn snapshot<'a>(
        &self,
        order: impl Iterator<Item = &'a str>,
    ) -> Vec<(String, Value)> {
        order
            .filter_map(|name| {
                self.values
                    .get(name)
                    .map(|value| (name.to_owned(), value.clone()))
            })
            .collect()
    }
}
