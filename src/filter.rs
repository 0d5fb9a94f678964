use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{FilterError, Result};
use crate::pattern::{contains_pattern, LikePattern, ESCAPE};

/// Narrow `column` to rows whose text contains `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringFilter {
    pub column: String,
    pub value: String,
}

impl SubstringFilter {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// The escaped `%value%` pattern.
    pub fn pattern(&self) -> String {
        contains_pattern(&self.value)
    }
}

/// A collection that can be narrowed by substring predicates.
pub trait Queryable: Sized {
    fn where_substring(self, filter: &SubstringFilter) -> Self;
}

/// The filters a submission actually produces: allow-listed keys with a
/// non-blank text value, in submission order. Everything else is dropped.
pub fn substring_filters<S: AsRef<str>>(
    allowed: &[S],
    submitted: &Map<String, Value>,
) -> Vec<SubstringFilter> {
    submitted
        .iter()
        .filter_map(|(key, value)| {
            if !allowed.iter().any(|a| a.as_ref() == key) {
                debug!(key = key.as_str(), "ignoring filter not in allow-list");
                return None;
            }
            match value {
                Value::String(s) if !s.trim().is_empty() => Some(SubstringFilter::new(key, s)),
                _ => {
                    debug!(key = key.as_str(), "ignoring blank filter");
                    None
                }
            }
        })
        .collect()
}

pub fn apply_filters<Q, S>(collection: Q, allowed: &[S], submitted: &Map<String, Value>) -> Q
where
    Q: Queryable,
    S: AsRef<str>,
{
    substring_filters(allowed, submitted)
        .iter()
        .fold(collection, |acc, filter| {
            debug!(
                column = filter.column.as_str(),
                value = filter.value.as_str(),
                "applying filter"
            );
            acc.where_substring(filter)
        })
}

/// Rows held in memory as JSON objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    rows: Vec<Value>,
}

impl RecordSet {
    pub fn new(rows: Vec<Value>) -> Self {
        Self { rows }
    }

    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Array(rows) => Ok(Self::new(rows)),
            other => Err(FilterError::Parse(format!(
                "records must be a JSON array, got {other}"
            ))),
        }
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Array(self.rows)
    }
}

impl Queryable for RecordSet {
    fn where_substring(mut self, filter: &SubstringFilter) -> Self {
        let pattern = LikePattern::new(&filter.pattern());
        self.rows.retain(|row| match row.get(&filter.column) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => pattern.matches(s),
            Some(other) => pattern.matches(&other.to_string()),
        });
        self
    }
}

/// A `SELECT` over one table with bound `ILIKE` predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlQuery {
    table: String,
    where_parts: Vec<String>,
    params: Vec<String>,
}

impl SqlQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            where_parts: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT * FROM {}", quote_ident(&self.table));
        if !self.where_parts.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_parts.join(" AND "));
        }
        sql
    }
}

impl Queryable for SqlQuery {
    fn where_substring(mut self, filter: &SubstringFilter) -> Self {
        self.params.push(filter.pattern());
        self.where_parts.push(format!(
            "{} ILIKE ${} ESCAPE '{}'",
            quote_ident(&filter.column),
            self.params.len(),
            ESCAPE
        ));
        self
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
