//! MCP (Model Context Protocol) session support.
//!
//! Defines the tool descriptor and call result shapes exchanged with an MCP
//! server, and the [`ToolSession`] capability the translators and the bridge
//! depend on. A concrete stdio client lives in [`client`].

pub mod client;
pub mod transport;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Tool definition as listed by an MCP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Tool name as provided by the server (e.g., "add")
    pub name: String,
    /// Tool description (empty when the server omits it)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// JSON Schema for tool input parameters
    pub input_schema: InputSchema,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Root of a tool's input schema.
///
/// Only the `Object` form can be translated into a provider schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputSchema {
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

impl InputSchema {
    /// Build an input schema from an arbitrary JSON value.
    ///
    /// Returns `None` for scalars, which MCP does not allow as a schema root.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::Object(fields)),
            Value::Array(items) => Some(Self::Array(items)),
            _ => None,
        }
    }
}

/// One block of a tool call result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Block type ("text", "image", "resource", ...)
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }
}

/// Result of an MCP `tools/call` request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_error: bool,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

fn null_as_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

impl CallToolResult {
    pub fn success(content: Vec<ContentBlock>) -> Self {
        Self {
            is_error: false,
            content,
        }
    }

    pub fn error(content: Vec<ContentBlock>) -> Self {
        Self {
            is_error: true,
            content,
        }
    }

    /// Text of the first content block, if it carries any
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(|block| block.text.as_deref())
    }
}

/// A connected MCP session able to list and execute tools.
///
/// Implemented by [`client::McpClient`]; tests provide in-memory stand-ins.
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// List every tool the server exposes
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Execute a tool with already-decoded JSON arguments
    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_from_wire() {
        let tool: ToolDescriptor = serde_json::from_value(json!({
            "name": "add",
            "description": "Add two numbers",
            "inputSchema": {"type": "object", "properties": {"a": {"type": "number"}}}
        }))
        .unwrap();

        assert_eq!(tool.name, "add");
        assert_eq!(tool.description, "Add two numbers");
        assert!(matches!(tool.input_schema, InputSchema::Object(_)));
    }

    #[test]
    fn test_descriptor_missing_description() {
        let tool: ToolDescriptor = serde_json::from_value(json!({
            "name": "noop",
            "description": null,
            "inputSchema": []
        }))
        .unwrap();

        assert_eq!(tool.description, "");
        assert_eq!(tool.input_schema, InputSchema::Array(vec![]));
    }

    #[test]
    fn test_scalar_schema_rejected() {
        let parsed = serde_json::from_value::<ToolDescriptor>(json!({
            "name": "bad",
            "inputSchema": "object"
        }));
        assert!(parsed.is_err());
        assert!(InputSchema::from_value(json!(42)).is_none());
    }

    #[test]
    fn test_call_result_from_wire() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "12:00"}]
        }))
        .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.first_text(), Some("12:00"));

        let result: CallToolResult = serde_json::from_value(json!({
            "isError": true,
            "content": [{"type": "image", "data": "...", "mimeType": "image/png"}]
        }))
        .unwrap();
        assert!(result.is_error);
        assert_eq!(result.first_text(), None);
    }
}
