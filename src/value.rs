// ABOUTME: Parameter values and payloads bound to built statements
// ABOUTME: Scalar/structured value model with the JSON-wrapping walk for JSONB columns
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Statement Parameters
//!
//! A [`Payload`] is the ordered column-to-value mapping derived from an
//! entity instance by dropping absent fields. [`Params`] is what a built
//! statement carries to the executor: nothing, one payload, or a batch.
//!
//! Structured values (lists, maps) must be explicitly marked for JSON
//! serialization before execution; the JSON-params variants of the
//! executor perform that walk, mirroring the distinction the underlying
//! driver draws between native scalars and JSONB columns.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entity::Entity;
use crate::errors::{AppError, AppResult};

/// A single bound parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// Double-precision float
    Float(f64),
    /// Text
    Text(String),
    /// UUID
    Uuid(Uuid),
    /// Timestamp with time zone
    Timestamp(DateTime<Utc>),
    /// Structured value explicitly destined for a JSONB column
    Json(serde_json::Value),
    /// Unwrapped structured value. Plain execution refuses it; the
    /// JSON-params walk converts it to [`Value::Json`].
    Structured(serde_json::Value),
}

impl Value {
    /// Map a serialized JSON value onto a parameter value. Arrays and
    /// objects land as [`Value::Structured`] until a JSON-params walk
    /// claims them.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n.as_i64().map_or_else(
                || Self::Float(n.as_f64().unwrap_or(0.0)),
                Self::Int,
            ),
            serde_json::Value::String(s) => Self::Text(s),
            structured @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Self::Structured(structured)
            }
        }
    }

    /// Convert an unwrapped structured value into a JSONB-bound one
    #[must_use]
    pub fn into_json_wrapped(self) -> Self {
        match self {
            Self::Structured(v) => Self::Json(v),
            other => other,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Timestamp(t)
    }
}

/// Ordered column-to-value mapping bound to a statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    entries: Vec<(String, Value)>,
}

impl Payload {
    /// Create an empty payload
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a payload from an entity instance.
    ///
    /// Serializes the entity and drops every field whose value is absent;
    /// the remaining keys are exactly the populated columns. Descriptor
    /// constants are trait metadata and can never appear here.
    ///
    /// # Errors
    /// Returns a validation error if the entity does not serialize to a
    /// key-value map.
    pub fn from_entity<E: Entity>(entity: &E) -> AppResult<Self> {
        let serialized = serde_json::to_value(entity).map_err(|e| {
            AppError::validation(format!("entity {} failed to serialize", E::NAME)).with_source(e)
        })?;

        let serde_json::Value::Object(map) = serialized else {
            return Err(AppError::validation(format!(
                "entity {} did not serialize to a map",
                E::NAME
            )));
        };

        let mut payload = Self::new();
        for (column, value) in map {
            if value.is_null() {
                continue;
            }
            payload.insert(column, Value::from_json(value));
        }
        Ok(payload)
    }

    /// Insert a column value, replacing any existing entry for the column
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        if let Some(entry) = self.entries.iter_mut().find(|(c, _)| *c == column) {
            entry.1 = value;
        } else {
            self.entries.push((column, value));
        }
    }

    /// Look up a column value
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Column names in iteration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    /// Column/value pairs in iteration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Number of columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no columns are present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wrap every unwrapped structured value for JSONB binding
    #[must_use]
    pub fn into_json_wrapped(self) -> Self {
        Self {
            entries: self
                .entries
                .into_iter()
                .map(|(c, v)| (c, v.into_json_wrapped()))
                .collect(),
        }
    }
}

impl FromIterator<(String, Value)> for Payload {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (column, value) in iter {
            payload.insert(column, value);
        }
        payload
    }
}

/// Parameters carried by a built statement
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Statement binds no parameters
    None,
    /// One payload for a single-row statement
    Row(Payload),
    /// Payload sequence applied as a batch
    Batch(Vec<Payload>),
}

impl Params {
    /// Apply the JSON-wrapping walk to every payload
    #[must_use]
    pub fn into_json_wrapped(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Row(payload) => Self::Row(payload.into_json_wrapped()),
            Self::Batch(batch) => {
                Self::Batch(batch.into_iter().map(Payload::into_json_wrapped).collect())
            }
        }
    }
}
