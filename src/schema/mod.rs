//! JSON-Schema to provider tool-schema translation.
//!
//! MCP servers describe tool inputs with free-form JSON Schema. Provider APIs
//! accept a narrower, typed subset. This module maps the subset both sides
//! understand into [`ToolSchema`], [`Property`] and [`Items`]:
//!
//! - a node converts only if its `type` names a known [`JsonType`]
//! - a field is kept only if its JSON value has the expected type
//! - everything else is dropped
//!
//! Root `minimum`/`maximum` are truncated to integers. Property and items
//! `minimum`/`maximum` keep their fractional part.

pub mod field;

use crate::mcp::InputSchema;
use field::{field, object};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Deepest nesting of properties/items that will be converted
pub const MAX_SCHEMA_DEPTH: usize = 32;

/// JSON value type tag understood by provider schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    Object,
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Null,
}

impl JsonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Null => "null",
        }
    }
}

impl FromStr for JsonType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "object" => Ok(Self::Object),
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "integer" => Ok(Self::Integer),
            "boolean" => Ok(Self::Boolean),
            "array" => Ok(Self::Array),
            "null" => Ok(Self::Null),
            _ => Err(()),
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root input schema of a provider tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub schema_type: JsonType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Property>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub const_value: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,
}

/// Schema of a single named property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(rename = "type")]
    pub schema_type: JsonType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Items>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub const_value: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
}

/// Element schema of an array property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Items {
    #[serde(rename = "type")]
    pub schema_type: JsonType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Property>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Items>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub const_value: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
}

/// Convert an MCP input schema into a provider root schema.
///
/// Array roots are not representable and yield `None`.
pub fn convert_input_schema(schema: &InputSchema) -> Option<ToolSchema> {
    match schema {
        InputSchema::Object(fields) => convert_schema(fields),
        InputSchema::Array(_) => None,
    }
}

/// Convert a root schema object.
///
/// Returns `None` when `type` is missing or not a known JSON type.
pub fn convert_schema(fields: &Map<String, Value>) -> Option<ToolSchema> {
    let schema_type = schema_type(fields)?;

    Some(ToolSchema {
        schema_type,
        properties: convert_properties(fields, 1),
        required: field(fields, "required"),
        pattern: field(fields, "pattern"),
        const_value: field(fields, "const"),
        enum_values: field(fields, "enum"),
        multiple_of: field(fields, "multipleOf"),
        minimum: field(fields, "minimum"),
        maximum: field(fields, "maximum"),
    })
}

/// Convert one property schema object
pub fn convert_property(fields: &Map<String, Value>) -> Option<Property> {
    property_at(fields, 1)
}

/// Convert an array `items` schema object
pub fn convert_items(fields: &Map<String, Value>) -> Option<Items> {
    items_at(fields, 1)
}

fn schema_type(fields: &Map<String, Value>) -> Option<JsonType> {
    fields
        .get("type")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}

/// Entries of `properties` that are objects and convert cleanly
fn convert_properties(
    fields: &Map<String, Value>,
    depth: usize,
) -> Option<BTreeMap<String, Property>> {
    let properties = object(fields, "properties")?;
    Some(
        properties
            .iter()
            .filter_map(|(name, value)| {
                let property = property_at(value.as_object()?, depth)?;
                Some((name.clone(), property))
            })
            .collect(),
    )
}

fn property_at(fields: &Map<String, Value>, depth: usize) -> Option<Property> {
    if depth > MAX_SCHEMA_DEPTH {
        return None;
    }
    let schema_type = schema_type(fields)?;

    Some(Property {
        schema_type,
        description: field(fields, "description"),
        format: field(fields, "format"),
        items: object(fields, "items")
            .and_then(|items| items_at(items, depth + 1))
            .map(Box::new),
        required: field(fields, "required"),
        pattern: field(fields, "pattern"),
        const_value: field(fields, "const"),
        enum_values: field(fields, "enum"),
        multiple_of: field(fields, "multipleOf"),
        minimum: field(fields, "minimum"),
        maximum: field(fields, "maximum"),
        min_items: field(fields, "minItems"),
        max_items: field(fields, "maxItems"),
        unique_items: field(fields, "uniqueItems"),
    })
}

fn items_at(fields: &Map<String, Value>, depth: usize) -> Option<Items> {
    if depth > MAX_SCHEMA_DEPTH {
        return None;
    }
    let schema_type = schema_type(fields)?;

    Some(Items {
        schema_type,
        properties: convert_properties(fields, depth + 1),
        items: object(fields, "items")
            .and_then(|items| items_at(items, depth + 1))
            .map(Box::new),
        pattern: field(fields, "pattern"),
        const_value: field(fields, "const"),
        enum_values: field(fields, "enum"),
        multiple_of: field(fields, "multipleOf"),
        minimum: field(fields, "minimum"),
        maximum: field(fields, "maximum"),
        min_items: field(fields, "minItems"),
        max_items: field(fields, "maxItems"),
        unique_items: field(fields, "uniqueItems"),
    })
}
