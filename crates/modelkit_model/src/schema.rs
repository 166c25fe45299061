//! Attribute declarations.

use indexmap::IndexMap;

use crate::value::Value;

/// Declared type of an attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AttrType {
    /// Numbers.
    Number,
    /// Strings.
    String,
    /// Booleans.
    Boolean,
    /// Anything, including arrays, objects and nested instances.
    #[default]
    Any,
}

impl AttrType {
    /// Returns the type name used in validation messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttrType::Number => "number",
            AttrType::String => "string",
            AttrType::Boolean => "boolean",
            AttrType::Any => "any",
        }
    }

    /// Returns `true` if `value` conforms to this type. `null` always does.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (AttrType::Any, _)
                | (_, Value::Null)
                | (AttrType::Number, Value::Number(_))
                | (AttrType::String, Value::String(_))
                | (AttrType::Boolean, Value::Bool(_))
        )
    }
}

impl core::fmt::Display for AttrType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared attribute.
#[derive(Debug, Clone)]
pub struct AttributeDescriptor {
    name: String,
    ty: AttrType,
    default: Option<Value>,
}

impl AttributeDescriptor {
    pub(crate) fn new(name: String, ty: AttrType, default: Option<Value>) -> Self {
        Self { name, ty, default }
    }

    /// Returns the attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    #[must_use]
    pub fn ty(&self) -> AttrType {
        self.ty
    }

    /// Returns the value new instances start with when none is given.
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Ordered attribute declarations of one model plus its primary key.
///
/// Frozen once the owning [`ModelClass`](crate::ModelClass) is built.
#[derive(Debug, Clone)]
pub struct Schema {
    attrs: IndexMap<String, AttributeDescriptor>,
    primary_key: String,
}

impl Schema {
    pub(crate) fn new(
        mut attrs: IndexMap<String, AttributeDescriptor>,
        primary_key: String,
    ) -> Self {
        if !attrs.contains_key(&primary_key) {
            attrs.insert(
                primary_key.clone(),
                AttributeDescriptor::new(primary_key.clone(), AttrType::Any, None),
            );
        }
        Self { attrs, primary_key }
    }

    /// Returns `true` if `name` is a declared attribute.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Returns the declaration for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attrs.get(name)
    }

    /// Iterates declarations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.attrs.values()
    }

    /// Iterates attribute names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attrs.keys().map(String::as_str)
    }

    /// Returns the number of declared attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Returns `true` if no attributes are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Returns the primary-key attribute name.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }
}
