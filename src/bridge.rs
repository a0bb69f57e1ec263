//! Tool invocation bridge.
//!
//! Turns provider tool-call arguments into MCP `tools/call` arguments, runs
//! the call on a [`ToolSession`] and reduces the result to the text the
//! conversation continues with. Every failure collapses to `None`.

use crate::dynamic::{extract, DynamicContent, PlainValue};
use crate::mcp::{CallToolResult, ToolSession};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, warn};

/// One argument as received from a provider
#[derive(Debug, Clone, PartialEq)]
pub enum RawArgument {
    /// Tagged provider content, flattened before encoding
    Dynamic(DynamicContent),
    /// Already-plain value, encoded as is
    Plain(PlainValue),
}

impl From<DynamicContent> for RawArgument {
    fn from(value: DynamicContent) -> Self {
        RawArgument::Dynamic(value)
    }
}

impl From<PlainValue> for RawArgument {
    fn from(value: PlainValue) -> Self {
        RawArgument::Plain(value)
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to encode tool arguments: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("tool call failed: {0}")]
    Session(anyhow::Error),
    #[error("tool returned an error: {}", .0.as_deref().unwrap_or("<no text>"))]
    ToolReportedError(Option<String>),
    #[error("tool returned no text content")]
    NoTextContent,
}

/// Flatten and encode provider arguments into MCP call arguments.
///
/// The mapping goes through a JSON byte buffer, so anything JSON cannot
/// represent is rejected here rather than sent.
pub fn encode_arguments(
    raw_arguments: HashMap<String, RawArgument>,
) -> Result<Map<String, Value>, BridgeError> {
    let plain: BTreeMap<String, PlainValue> = raw_arguments
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                RawArgument::Dynamic(content) => extract(&content),
                RawArgument::Plain(plain) => plain,
            };
            (key, value)
        })
        .collect();

    let buffer = serde_json::to_vec(&plain)?;
    Ok(serde_json::from_slice(&buffer)?)
}

/// Interpret a `tools/call` result
pub fn result_text(result: CallToolResult) -> Result<String, BridgeError> {
    let text = result.first_text().map(str::to_string);

    if result.is_error {
        return Err(BridgeError::ToolReportedError(text));
    }
    text.ok_or(BridgeError::NoTextContent)
}

/// Call a tool and return its text, or the reason there is none
pub async fn try_call_tool<S: ToolSession + ?Sized>(
    session: &S,
    name: &str,
    raw_arguments: HashMap<String, RawArgument>,
) -> Result<String, BridgeError> {
    let arguments = encode_arguments(raw_arguments)?;
    let result = session
        .call_tool(name, arguments)
        .await
        .map_err(BridgeError::Session)?;
    result_text(result)
}

/// Call a tool and return its text.
///
/// Returns `None` on any failure. With `debug` set, the call and the
/// failure details are logged.
pub async fn call_tool<S: ToolSession + ?Sized>(
    session: &S,
    name: &str,
    raw_arguments: HashMap<String, RawArgument>,
    debug: bool,
) -> Option<String> {
    if debug {
        debug!(tool = name, "calling tool");
    }

    match try_call_tool(session, name, raw_arguments).await {
        Ok(text) => {
            if debug {
                debug!(tool = name, "tool execution successful");
            }
            Some(text)
        }
        Err(BridgeError::ToolReportedError(text)) => {
            warn!(tool = name, "tool returned an error");
            if debug {
                if let Some(text) = text {
                    warn!(tool = name, "tool error: {}", text);
                }
            }
            None
        }
        Err(e) => {
            if debug {
                warn!(tool = name, error = %e, "error calling tool");
            }
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mcp::{ContentBlock, ToolDescriptor};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// In-memory session returning canned results and recording calls
    #[derive(Default)]
    pub(crate) struct StubSession {
        pub tools: Vec<ToolDescriptor>,
        pub results: HashMap<String, CallToolResult>,
        pub calls: Mutex<Vec<(String, Map<String, Value>)>>,
    }

    impl StubSession {
        pub fn with_result(mut self, name: &str, result: CallToolResult) -> Self {
            self.results.insert(name.to_string(), result);
            self
        }
    }

    #[async_trait]
    impl ToolSession for StubSession {
        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
            Ok(self.tools.clone())
        }

        async fn call_tool(
            &self,
            name: &str,
            arguments: Map<String, Value>,
        ) -> Result<CallToolResult> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), arguments));
            self.results
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("unknown tool: {}", name))
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (buffer, guard)
    }

    #[tokio::test]
    async fn test_get_time_returns_text() {
        let session = StubSession::default().with_result(
            "get_time",
            CallToolResult::success(vec![ContentBlock::text("12:00")]),
        );

        let text = call_tool(&session, "get_time", HashMap::new(), false).await;
        assert_eq!(text.as_deref(), Some("12:00"));

        let calls = session.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "get_time");
        assert!(calls[0].1.is_empty());
    }

    #[tokio::test]
    async fn test_tool_error_logged_in_debug() {
        let (logs, _guard) = capture_logs();
        let session = StubSession::default().with_result(
            "broken_tool",
            CallToolResult::error(vec![ContentBlock::text("disk full")]),
        );
        let args = HashMap::from([(
            "path".to_string(),
            RawArgument::Plain(PlainValue::from("/tmp/out")),
        )]);

        let text = call_tool(&session, "broken_tool", args, true).await;
        assert_eq!(text, None);
        assert!(logs.contents().contains("disk full"));
    }

    #[tokio::test]
    async fn test_tool_error_text_hidden_without_debug() {
        let (logs, _guard) = capture_logs();
        let session = StubSession::default().with_result(
            "broken_tool",
            CallToolResult::error(vec![ContentBlock::text("disk full")]),
        );

        assert_eq!(
            call_tool(&session, "broken_tool", HashMap::new(), false).await,
            None
        );
        let output = logs.contents();
        assert!(output.contains("tool returned an error"));
        assert!(!output.contains("disk full"));
    }

    #[tokio::test]
    async fn test_no_text_content() {
        let session = StubSession::default().with_result(
            "image_tool",
            CallToolResult::success(vec![ContentBlock {
                kind: "image".to_string(),
                text: None,
            }]),
        );
        let empty = StubSession::default().with_result("empty", CallToolResult::success(vec![]));

        assert_eq!(
            call_tool(&session, "image_tool", HashMap::new(), true).await,
            None
        );
        assert!(matches!(
            try_call_tool(&empty, "empty", HashMap::new()).await,
            Err(BridgeError::NoTextContent)
        ));
    }

    #[tokio::test]
    async fn test_session_failure_is_absorbed() {
        let session = StubSession::default();
        assert_eq!(call_tool(&session, "missing", HashMap::new(), true).await, None);
        assert!(matches!(
            try_call_tool(&session, "missing", HashMap::new()).await,
            Err(BridgeError::Session(_))
        ));
    }

    #[tokio::test]
    async fn test_encoding_failure_aborts_before_call() {
        let session = StubSession::default()
            .with_result("calc", CallToolResult::success(vec![ContentBlock::text("ok")]));
        let args = HashMap::from([
            ("x".to_string(), RawArgument::Plain(PlainValue::Double(f64::NAN))),
            ("y".to_string(), RawArgument::Plain(PlainValue::Int(1))),
        ]);

        assert_eq!(call_tool(&session, "calc", args, true).await, None);
        assert!(session.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dynamic_arguments_flattened() {
        let session = StubSession::default()
            .with_result("search", CallToolResult::success(vec![ContentBlock::text("found")]));
        let args = HashMap::from([
            (
                "filters".to_string(),
                RawArgument::Dynamic(DynamicContent::from(json!({"limit": 5, "tags": ["a"]}))),
            ),
            ("query".to_string(), RawArgument::Plain(PlainValue::from("rust"))),
            ("exact".to_string(), RawArgument::Dynamic(DynamicContent::Null)),
        ]);

        assert_eq!(
            call_tool(&session, "search", args, false).await.as_deref(),
            Some("found")
        );

        let calls = session.calls.lock().unwrap();
        assert_eq!(
            Value::Object(calls[0].1.clone()),
            json!({
                "filters": {"limit": 5, "tags": ["a"]},
                "query": "rust",
                "exact": null
            })
        );
    }

    #[test]
    fn test_result_text_uses_first_block_only() {
        let result = CallToolResult::success(vec![
            ContentBlock {
                kind: "image".to_string(),
                text: None,
            },
            ContentBlock::text("second"),
        ]);
        assert!(matches!(result_text(result), Err(BridgeError::NoTextContent)));

        let result = CallToolResult::success(vec![
            ContentBlock::text("first"),
            ContentBlock::text("second"),
        ]);
        assert_eq!(result_text(result).unwrap(), "first");
    }
}
