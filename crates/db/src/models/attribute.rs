//! Attribute values and their stored encoding.
//!
//! Each attribute row keeps the value as text plus a `value_type` tag so that
//! `"123"` and `123` survive a round trip as different values.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single attribute value as received in an ingestion payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum AttributeValue {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    /// Arrays, objects and `null`.
    Json(Value),
}

/// Tag stored in `attribute.value_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    String,
    Number,
    Bool,
    Json,
}

impl AttributeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::String => "string",
            AttributeKind::Number => "number",
            AttributeKind::Bool => "bool",
            AttributeKind::Json => "json",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(AttributeKind::String),
            "number" => Some(AttributeKind::Number),
            "bool" => Some(AttributeKind::Bool),
            "json" => Some(AttributeKind::Json),
            _ => None,
        }
    }
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::String(_) => AttributeKind::String,
            AttributeValue::Number(_) => AttributeKind::Number,
            AttributeValue::Bool(_) => AttributeKind::Bool,
            AttributeValue::Json(_) => AttributeKind::Json,
        }
    }

    /// Textual form written to `attribute.value`.
    ///
    /// Scalars are stored as their plain text (no quotes); structured values
    /// as compact JSON.
    pub fn to_stored(&self) -> String {
        match self {
            AttributeValue::String(s) => s.clone(),
            AttributeValue::Number(n) => n.to_string(),
            AttributeValue::Bool(b) => b.to_string(),
            AttributeValue::Json(v) => v.to_string(),
        }
    }

    /// Rebuild a value from its stored text and tag.
    ///
    /// Never fails: a tag that does not match the text, or an unknown tag,
    /// degrades to JSON-decoding the text and finally to a plain string.
    pub fn from_stored(text: &str, tag: Option<&str>) -> Self {
        let exact = match tag.and_then(AttributeKind::parse) {
            Some(AttributeKind::String) => Some(AttributeValue::String(text.to_string())),
            Some(AttributeKind::Number) => serde_json::from_str::<serde_json::Number>(text)
                .ok()
                .map(AttributeValue::Number),
            Some(AttributeKind::Bool) => match text {
                "true" => Some(AttributeValue::Bool(true)),
                "false" => Some(AttributeValue::Bool(false)),
                _ => None,
            },
            Some(AttributeKind::Json) => serde_json::from_str::<Value>(text)
                .ok()
                .map(AttributeValue::Json),
            None => None,
        };

        exact.unwrap_or_else(|| match serde_json::from_str::<Value>(text) {
            Ok(value) => AttributeValue::from(value),
            Err(_) => AttributeValue::String(text.to_string()),
        })
    }
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => AttributeValue::String(s),
            Value::Number(n) => AttributeValue::Number(n),
            Value::Bool(b) => AttributeValue::Bool(b),
            other => AttributeValue::Json(other),
        }
    }
}

impl From<AttributeValue> for Value {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::String(s) => Value::String(s),
            AttributeValue::Number(n) => Value::Number(n),
            AttributeValue::Bool(b) => Value::Bool(b),
            AttributeValue::Json(v) => v,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Number(value.into())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_stored())
    }
}
