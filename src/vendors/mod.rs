//! Vendor-specific tool dialects.
//!
//! Each provider module wraps the shared translated schema in that
//! provider's tool envelope and knows how its tool-call arguments arrive.

pub mod anthropic;
pub mod openai;

use crate::mcp::ToolDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Target LLM provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Anthropic,
    #[value(name = "openai")]
    OpenAi,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Anthropic => write!(f, "anthropic"),
            Provider::OpenAi => write!(f, "openai"),
        }
    }
}

/// Translate tools for `provider` and render them as request JSON
pub fn tools_json(provider: Provider, tools: &[ToolDescriptor]) -> serde_json::Result<Value> {
    match provider {
        Provider::Anthropic => {
            serde_json::to_value(tools.iter().map(anthropic::to_anthropic_tool).collect::<Vec<_>>())
        }
        Provider::OpenAi => {
            serde_json::to_value(tools.iter().map(openai::to_openai_tool).collect::<Vec<_>>())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::InputSchema;
    use serde_json::json;

    #[test]
    fn test_provider_names() {
        assert_eq!(Provider::OpenAi.to_string(), "openai");
        assert_eq!(
            serde_json::from_value::<Provider>(json!("openai")).unwrap(),
            Provider::OpenAi
        );
        assert_eq!(
            serde_json::to_value(Provider::Anthropic).unwrap(),
            json!("anthropic")
        );
    }

    #[test]
    fn test_tools_json_per_provider() {
        let tools = vec![ToolDescriptor::new(
            "echo",
            "Echo text",
            InputSchema::from_value(json!({"type": "object"})).unwrap(),
        )];

        assert_eq!(
            tools_json(Provider::Anthropic, &tools).unwrap(),
            json!([{"name": "echo", "description": "Echo text", "input_schema": {"type": "object"}}])
        );
        assert_eq!(
            tools_json(Provider::OpenAi, &tools).unwrap(),
            json!([{
                "type": "function",
                "function": {"name": "echo", "description": "Echo text", "parameters": {"type": "object"}}
            }])
        );
    }
}
