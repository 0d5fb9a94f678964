//! Decoding of submitted request parameters.
//!
//! Query strings and urlencoded form bodies are flat `key=value` pairs; bracketed
//! keys (`filters[title]=x`, `tags[]=a`) are expanded into a nested JSON object so
//! callers can pull out the two-level `filters` structure.

use serde_json::{Map, Value};
use tracing::debug;
use url::form_urlencoded;

use crate::errors::{FilterError, Result};
use crate::parser::{parse_key, KeySegment, ParseError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    root: Map<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a query string. A request path or full URL works as well: when the
    /// input starts with `/` or carries a scheme, only the part after its first
    /// `?` is decoded. A bare query keeps every `?` it contains.
    pub fn from_query(query: &str) -> Self {
        let qs = if query.starts_with('/') || query.contains("://") {
            query.split_once('?').map_or("", |(_, qs)| qs)
        } else {
            query.strip_prefix('?').unwrap_or(query)
        };
        Self::from_pairs(
            form_urlencoded::parse(qs.as_bytes()).map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (k, v) in pairs {
            params.insert(k.as_ref(), v.into());
        }
        params
    }

    /// Accept an already-structured body (e.g. a JSON request). Must be an object.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(FilterError::Parse(format!(
                "parameters must be an object, got {other}"
            ))),
        }
    }

    pub fn insert(&mut self, key: &str, value: String) {
        let path = match parse_key(key) {
            Ok(path) if valid_shape(&path.segments) => path,
            Ok(_) => return self.insert_flat(key, value, "`[]` before a nested key"),
            Err(ParseError::InvalidSyntax(reason)) => return self.insert_flat(key, value, &reason),
        };
        let slot = self.root.entry(path.root).or_insert(Value::Null);
        assign(slot, &path.segments, value);
    }

    fn insert_flat(&mut self, key: &str, value: String, reason: &str) {
        debug!(key, reason, "unparseable parameter key, storing flat");
        self.root.insert(key.to_string(), Value::String(value));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// The nested object under `key`, e.g. the submitted `filters`.
    pub fn nested(&self, key: &str) -> Option<&Map<String, Value>> {
        self.root.get(key).and_then(Value::as_object)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }
}

// `[]` is only meaningful as the final segment.
fn valid_shape(segments: &[KeySegment]) -> bool {
    segments
        .iter()
        .rev()
        .skip(1)
        .all(|s| matches!(s, KeySegment::Key(_)))
}

fn assign(slot: &mut Value, segments: &[KeySegment], value: String) {
    match segments.split_first() {
        None => *slot = Value::String(value),
        Some((KeySegment::Append, _)) => {
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(items) = slot {
                items.push(Value::String(value));
            }
        }
        Some((KeySegment::Key(name), rest)) => {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(map) = slot {
                let child = map.entry(name.clone()).or_insert(Value::Null);
                assign(child, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nested_filters_from_url() {
        let params =
            Params::from_query("/projects?page=2&filters%5Bname%5D=Al%25&filters[status]=open");
        assert_eq!(
            params.into_value(),
            json!({"page": "2", "filters": {"name": "Al%", "status": "open"}})
        );
    }

    #[test]
    fn question_marks_in_bare_query_are_kept() {
        let params = Params::from_query("filters[name]=why?&page=2");
        assert_eq!(params.nested("filters"), json!({"name": "why?"}).as_object());

        let params = Params::from_query("?filters[name]=a");
        assert_eq!(params.get("filters"), Some(&json!({"name": "a"})));

        let params = Params::from_query("https://example.test/projects?q=is?it");
        assert_eq!(params.get("q"), Some(&json!("is?it")));
        assert!(Params::from_query("/projects").is_empty());
    }

    #[test]
    fn append_keys_collect_lists() {
        let params = Params::from_query("tags[]=a&tags[]=b&name=x&name=y");
        assert_eq!(params.get("tags"), Some(&json!(["a", "b"])));
        assert_eq!(params.get("name"), Some(&json!("y")));
    }

    #[test]
    fn malformed_keys_are_kept_flat() {
        let params = Params::from_query("filters[name=x&a[][b]=y");
        assert_eq!(params.get("filters[name"), Some(&json!("x")));
        assert_eq!(params.get("a[][b]"), Some(&json!("y")));
        assert!(params.nested("filters").is_none());
    }

    #[test]
    fn json_body_must_be_object() {
        assert!(Params::from_json(json!(["x"])).is_err());
        let params = Params::from_json(json!({"filters": {"a": "1"}})).unwrap();
        assert_eq!(params.nested("filters").map(|m| m.len()), Some(1));
    }
}
