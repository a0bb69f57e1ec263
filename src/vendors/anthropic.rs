//! Anthropic Messages API tool dialect.
//!
//! Tools are sent as `{name, description, input_schema}`; tool calls come
//! back as `tool_use` blocks whose `input` is a JSON object.

use crate::bridge::{self, RawArgument};
use crate::dynamic::DynamicContent;
use crate::mcp::{ToolDescriptor, ToolSession};
use crate::schema::{self, ToolSchema};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Tool definition in the Anthropic request format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicTool {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<ToolSchema>,
}

/// Convert an MCP tool to the Anthropic format.
///
/// A schema that cannot be translated leaves `input_schema` empty; the tool
/// itself is still returned.
pub fn to_anthropic_tool(tool: &ToolDescriptor) -> AnthropicTool {
    AnthropicTool {
        name: tool.name.clone(),
        description: tool.description.clone(),
        input_schema: schema::convert_input_schema(&tool.input_schema),
    }
}

/// List the session's tools in the Anthropic format
pub async fn anthropic_tools<S: ToolSession + ?Sized>(session: &S) -> Result<Vec<AnthropicTool>> {
    let tools = session
        .list_tools()
        .await
        .context("Failed to list MCP tools")?;
    Ok(tools.iter().map(to_anthropic_tool).collect())
}

/// Execute a `tool_use` block's input against the session.
///
/// `input` is expected to be an object; anything else is passed as no
/// arguments.
pub async fn anthropic_call_tool<S: ToolSession + ?Sized>(
    session: &S,
    name: &str,
    input: &Value,
    debug: bool,
) -> Option<String> {
    let arguments: HashMap<String, RawArgument> = match input {
        Value::Object(fields) => fields
            .iter()
            .map(|(k, v)| (k.clone(), DynamicContent::from(v.clone()).into()))
            .collect(),
        Value::Null => HashMap::new(),
        other => {
            if debug {
                warn!(tool = name, input = %other, "tool_use input is not an object");
            }
            HashMap::new()
        }
    };

    bridge::call_tool(session, name, arguments, debug).await
}
