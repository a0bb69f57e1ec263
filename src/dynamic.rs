//! Dynamic tool-call content and its plain-value form.
//!
//! Providers hand back tool-call arguments as a tagged tree
//! ([`DynamicContent`]). Before the arguments can be re-encoded for an MCP
//! server they are flattened into [`PlainValue`], which serializes directly
//! to JSON.

use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Tagged value of a provider tool-call argument
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum DynamicContent {
    String(String),
    Integer(i64),
    Double(f64),
    Bool(bool),
    Null,
    Dictionary(BTreeMap<String, DynamicContent>),
    Array(Vec<DynamicContent>),
}

impl From<Value> for DynamicContent {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Double(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(fields) => Self::Dictionary(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl DynamicContent {
    /// Flatten into a plain value; see [`extract`]
    pub fn extract_value(&self) -> PlainValue {
        extract(self)
    }
}

/// Untagged value ready for JSON encoding
#[derive(Debug, Clone, PartialEq)]
pub enum PlainValue {
    /// JSON `null`
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Map(BTreeMap<String, PlainValue>),
    Array(Vec<PlainValue>),
}

/// Non-finite doubles have no JSON encoding and fail to serialize.
impl Serialize for PlainValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PlainValue::Null => serializer.serialize_unit(),
            PlainValue::Bool(b) => serializer.serialize_bool(*b),
            PlainValue::Int(i) => serializer.serialize_i64(*i),
            PlainValue::Double(d) if d.is_finite() => serializer.serialize_f64(*d),
            PlainValue::Double(d) => Err(S::Error::custom(format!(
                "{} is not representable in JSON",
                d
            ))),
            PlainValue::String(s) => serializer.serialize_str(s),
            PlainValue::Map(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            PlainValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<&str> for PlainValue {
    fn from(s: &str) -> Self {
        PlainValue::String(s.to_string())
    }
}

impl From<i64> for PlainValue {
    fn from(i: i64) -> Self {
        PlainValue::Int(i)
    }
}

impl From<f64> for PlainValue {
    fn from(d: f64) -> Self {
        PlainValue::Double(d)
    }
}

impl From<bool> for PlainValue {
    fn from(b: bool) -> Self {
        PlainValue::Bool(b)
    }
}

/// Recursively strip the tags from a dynamic value.
///
/// Keys and element order are preserved; `Null` becomes [`PlainValue::Null`].
pub fn extract(value: &DynamicContent) -> PlainValue {
    match value {
        DynamicContent::String(s) => PlainValue::String(s.clone()),
        DynamicContent::Integer(i) => PlainValue::Int(*i),
        DynamicContent::Double(d) => PlainValue::Double(*d),
        DynamicContent::Bool(b) => PlainValue::Bool(*b),
        DynamicContent::Null => PlainValue::Null,
        DynamicContent::Dictionary(fields) => PlainValue::Map(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), extract(v)))
                .collect(),
        ),
        DynamicContent::Array(items) => PlainValue::Array(items.iter().map(extract).collect()),
    }
}
