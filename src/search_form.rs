//! Dynamic attribute form carrying submitted search values.
//!
//! A [`SearchForm`] exposes whatever field names it was built from as readable
//! attributes, without a schema declared ahead of time. Each form owns its own
//! [`FormSchema`]; the cumulative, process-wide behaviour where every name ever
//! seen stays declared is only available by passing a [`SchemaRegistry`].

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{FilterError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::List(_) => FieldKind::List,
        }
    }

    pub fn default_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::List => FieldValue::List(Vec::new()),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }

    /// Convert a submitted JSON parameter. Nested objects have no field form.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(FieldValue::Text(String::new())),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Bool(_) | Value::Number(_) => Some(FieldValue::Text(value.to_string())),
            Value::Array(items) => Some(FieldValue::List(
                items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            Value::Object(_) => None,
        }
    }

    fn coerce(self, kind: FieldKind) -> Self {
        match (self, kind) {
            (FieldValue::List(mut items), FieldKind::Text) => {
                FieldValue::Text(items.pop().unwrap_or_default())
            }
            (FieldValue::Text(s), FieldKind::List) => FieldValue::List(vec![s]),
            (value, _) => value,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl<S: Into<String>> From<Vec<S>> for FieldValue {
    fn from(items: Vec<S>) -> Self {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Declared field names and their kinds, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSchema {
    fields: Vec<(String, FieldKind)>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the name was already declared; its kind is kept.
    pub fn declare(&mut self, name: impl Into<String>, kind: FieldKind) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.fields.push((name, kind));
        true
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.declare(name, kind);
        self
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, kind)| *kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kind_of(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Schema shared by every form built through it. Names declared by one form stay
/// declared for all later forms, so an unsubmitted name reads as its default
/// instead of failing.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    inner: Arc<RwLock<FormSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> FormSchema {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn declare_all<'a>(&self, fields: impl Iterator<Item = (&'a str, FieldKind)>) -> FormSchema {
        let mut schema = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for (name, kind) in fields {
            if schema.declare(name, kind) {
                debug!(field = name, ?kind, "declared shared search form field");
            }
        }
        schema.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchForm {
    fields: Vec<(String, FieldValue)>,
}

impl SearchForm {
    /// Build a form whose attributes are exactly the supplied names.
    pub fn new<I, K, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        Self::with_schema(FormSchema::new(), attributes)
    }

    /// Build a form that also knows the names in `schema`; those without a
    /// supplied value read as the default for their kind.
    pub fn with_schema<I, K, V>(mut schema: FormSchema, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let supplied: Vec<(String, FieldValue)> = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        for (name, value) in &supplied {
            schema.declare(name.as_str(), value.kind());
        }
        Self::assign(&schema, supplied)
    }

    /// Build a form through a shared registry, declaring new names there first.
    pub fn with_registry<I, K, V>(registry: &SchemaRegistry, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let supplied: Vec<(String, FieldValue)> = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let schema = registry.declare_all(supplied.iter().map(|(n, v)| (n.as_str(), v.kind())));
        Self::assign(&schema, supplied)
    }

    /// Build from a submitted parameter object such as `params.nested("filters")`.
    pub fn from_params(schema: FormSchema, submitted: &Map<String, Value>) -> Self {
        let attributes = submitted.iter().filter_map(|(name, raw)| {
            let value = FieldValue::from_json(raw);
            if value.is_none() {
                debug!(field = name.as_str(), "skipping nested search parameter");
            }
            value.map(|v| (name.clone(), v))
        });
        Self::with_schema(schema, attributes)
    }

    fn assign(schema: &FormSchema, supplied: Vec<(String, FieldValue)>) -> Self {
        let mut fields: Vec<(String, FieldValue)> = schema
            .fields
            .iter()
            .map(|(name, kind)| (name.clone(), FieldValue::default_for(*kind)))
            .collect();
        for (name, value) in supplied {
            if let Some(slot) = fields.iter_mut().find(|(n, _)| *n == name) {
                let kind = slot.1.kind();
                slot.1 = value.coerce(kind);
            }
        }
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Result<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| FilterError::NoSuchProperty(name.to_string()))
    }

    pub fn text(&self, name: &str) -> Result<&str> {
        match self.get(name)? {
            FieldValue::Text(s) => Ok(s),
            FieldValue::List(_) => Err(wrong_kind(name, FieldKind::Text, FieldKind::List)),
        }
    }

    pub fn list(&self, name: &str) -> Result<&[String]> {
        match self.get(name)? {
            FieldValue::List(items) => Ok(items),
            FieldValue::Text(_) => Err(wrong_kind(name, FieldKind::List, FieldKind::Text)),
        }
    }

    pub fn responds_to(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(n, v)| {
                    let value = match v {
                        FieldValue::Text(s) => Value::String(s.clone()),
                        FieldValue::List(items) => {
                            Value::Array(items.iter().cloned().map(Value::String).collect())
                        }
                    };
                    (n.clone(), value)
                })
                .collect(),
        )
    }
}

fn wrong_kind(name: &str, expected: FieldKind, actual: FieldKind) -> FilterError {
    FilterError::WrongKind {
        name: name.to_string(),
        expected,
        actual,
    }
}
