//! Bridge between MCP tool servers and LLM provider tool-calling APIs.
//!
//! - [`schema`] translates MCP JSON-Schema input specs into provider schemas
//! - [`vendors`] wraps them in the Anthropic and OpenAI tool formats
//! - [`dynamic`] flattens provider tool-call arguments
//! - [`bridge`] runs a tool call on an MCP session and returns its text
//! - [`mcp`] defines the session capability and a stdio client

pub mod bridge;
pub mod config;
pub mod dynamic;
pub mod mcp;
pub mod schema;
pub mod vendors;

pub use bridge::{call_tool, RawArgument};
pub use dynamic::{extract, DynamicContent, PlainValue};
pub use mcp::{CallToolResult, ContentBlock, InputSchema, ToolDescriptor, ToolSession};
pub use schema::{JsonType, Items, Property, ToolSchema};
pub use vendors::Provider;
