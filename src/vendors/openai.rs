//! OpenAI Chat Completions tool dialect.
//!
//! Tools are sent as `{"type": "function", "function": {...}}`; tool calls
//! come back with their arguments encoded as a JSON string.

use crate::bridge::{self, RawArgument};
use crate::dynamic::DynamicContent;
use crate::mcp::{ToolDescriptor, ToolSession};
use crate::schema::{self, ToolSchema};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Tool definition in the OpenAI request format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiTool {
    /// Always "function"
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ToolSchema>,
}

/// Convert an MCP tool to the OpenAI format
pub fn to_openai_tool(tool: &ToolDescriptor) -> OpenAiTool {
    OpenAiTool {
        kind: "function".to_string(),
        function: FunctionDefinition {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: schema::convert_input_schema(&tool.input_schema),
        },
    }
}

/// List the session's tools in the OpenAI format
pub async fn openai_tools<S: ToolSession + ?Sized>(session: &S) -> Result<Vec<OpenAiTool>> {
    let tools = session
        .list_tools()
        .await
        .context("Failed to list MCP tools")?;
    Ok(tools.iter().map(to_openai_tool).collect())
}

/// Execute a function call's `arguments` string against the session.
///
/// An empty string means no arguments. A string that is not a JSON object
/// aborts the call.
pub async fn openai_call_tool<S: ToolSession + ?Sized>(
    session: &S,
    name: &str,
    arguments: &str,
    debug: bool,
) -> Option<String> {
    let parsed = if arguments.trim().is_empty() {
        BTreeMap::new()
    } else {
        match serde_json::from_str::<BTreeMap<String, DynamicContent>>(arguments) {
            Ok(parsed) => parsed,
            Err(e) => {
                if debug {
                    warn!(tool = name, error = %e, "failed to parse function arguments");
                }
                return None;
            }
        }
    };

    let arguments: HashMap<String, RawArgument> = parsed
        .into_iter()
        .map(|(k, v)| (k, RawArgument::Dynamic(v)))
        .collect();

    bridge::call_tool(session, name, arguments, debug).await
}
