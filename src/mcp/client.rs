//! JSON-RPC client for a single MCP server reached over stdio.

use super::transport::StdioTransport;
use super::{CallToolResult, ToolDescriptor, ToolSession};
use crate::config::McpServerConfig;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// MCP protocol revision sent during the handshake
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Client name reported to servers
pub const CLIENT_NAME: &str = env!("CARGO_PKG_NAME");

/// Upper bound on `tools/list` pages, guards against servers that loop cursors
const MAX_LIST_PAGES: usize = 64;

/// JSON-RPC error code for requests the client does not handle
const METHOD_NOT_FOUND: i64 = -32601;

/// Server identity reported in the `initialize` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListToolsPage {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
    #[serde(default)]
    next_cursor: Option<String>,
}

struct ClientInner {
    server: String,
    transport: Mutex<StdioTransport>,
    next_id: AtomicU64,
    timeout: Duration,
    server_info: ServerInfo,
}

/// A connected MCP client.
///
/// Cheap to clone; clones share the same server process. Requests are
/// serialized over the single stdio pipe.
#[derive(Clone)]
pub struct McpClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("server", &self.inner.server)
            .field("server_info", &self.inner.server_info)
            .finish()
    }
}

impl McpClient {
    /// Spawn the configured server and complete the MCP handshake.
    ///
    /// Blocks until the server answers `initialize` or the timeout elapses.
    pub fn connect(name: &str, config: &McpServerConfig) -> Result<Self> {
        if !config.enabled {
            bail!("MCP server '{}' is disabled in config", name);
        }

        let mut transport =
            StdioTransport::spawn(&config.command, &config.args, &config.env, Path::new(&config.cwd))?;
        let timeout = Duration::from_millis(config.timeout_ms);
        let next_id = AtomicU64::new(1);

        let init = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": CLIENT_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            }
        });
        let result = round_trip(&mut transport, &next_id, timeout, "initialize", init)
            .with_context(|| format!("MCP server '{}' failed to initialize", name))?;

        let server_info: ServerInfo = result
            .get("serverInfo")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .context("Malformed serverInfo in initialize response")?
            .unwrap_or_default();

        transport.send(&json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
        }))?;

        info!(
            server = name,
            remote = %server_info.name,
            version = %server_info.version,
            pid = transport.pid(),
            "MCP client initialized"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                server: name.to_string(),
                transport: Mutex::new(transport),
                next_id,
                timeout,
                server_info,
            }),
        })
    }

    /// [`connect`](Self::connect) on the blocking thread pool
    pub async fn connect_async(name: &str, config: &McpServerConfig) -> Result<Self> {
        let name = name.to_string();
        let config = config.clone();
        tokio::task::spawn_blocking(move || Self::connect(&name, &config))
            .await
            .context("initialize task panicked")?
    }

    /// Send a JSON-RPC request and wait for its result (blocking)
    pub fn request(&self, method: &str, params: Value) -> Result<Value> {
        let mut transport = self
            .inner
            .transport
            .lock()
            .map_err(|_| anyhow!("MCP transport lock poisoned"))?;
        round_trip(
            &mut transport,
            &self.inner.next_id,
            self.inner.timeout,
            method,
            params,
        )
    }

    /// Fetch every page of `tools/list` (blocking)
    pub fn list_tools_blocking(&self) -> Result<Vec<ToolDescriptor>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let params = match &cursor {
                Some(c) => json!({ "cursor": c }),
                None => json!({}),
            };
            let result = self.request("tools/list", params)?;
            let page: ListToolsPage =
                serde_json::from_value(result).context("Malformed tools/list result")?;
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(tools),
            }
        }

        bail!(
            "MCP server '{}' returned more than {} pages of tools",
            self.inner.server,
            MAX_LIST_PAGES
        )
    }

    /// Execute `tools/call` (blocking)
    pub fn call_tool_blocking(&self, name: &str, arguments: Map<String, Value>) -> Result<CallToolResult> {
        let result = self.request(
            "tools/call",
            json!({ "name": name, "arguments": arguments }),
        )?;
        serde_json::from_value(result).context("Malformed tools/call result")
    }
}

/// Write one request and read messages until the matching response arrives.
///
/// Notifications are skipped. Server-initiated `ping` requests are answered,
/// any other server request gets a method-not-found error.
fn round_trip(
    transport: &mut StdioTransport,
    next_id: &AtomicU64,
    timeout: Duration,
    method: &str,
    params: Value,
) -> Result<Value> {
    let id = next_id.fetch_add(1, Ordering::SeqCst);
    trace!(method, id, "sending MCP request");

    transport.send(&json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    }))?;

    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            bail!("Timed out waiting for response to '{}'", method);
        }
        let message = transport.recv_timeout(remaining)?;

        if let Some(server_method) = message.get("method").and_then(Value::as_str) {
            match message.get("id") {
                Some(request_id) if server_method == "ping" => {
                    transport.send(&json!({
                        "jsonrpc": "2.0",
                        "id": request_id,
                        "result": {},
                    }))?;
                }
                Some(request_id) => {
                    debug!(method = server_method, "rejecting unsupported MCP server request");
                    transport.send(&json!({
                        "jsonrpc": "2.0",
                        "id": request_id,
                        "error": {
                            "code": METHOD_NOT_FOUND,
                            "message": format!("Method not found: {}", server_method),
                        },
                    }))?;
                }
                None => debug!(method = server_method, "ignoring MCP notification"),
            }
            continue;
        }

        if !response_id_matches(message.get("id"), id) {
            trace!(?message, "skipping unmatched MCP response");
            continue;
        }

        if let Some(error) = message.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
            let text = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            bail!("MCP error {} on '{}': {}", code, method, text);
        }

        return Ok(message.get("result").cloned().unwrap_or_else(|| json!({})));
    }
}

fn response_id_matches(response_id: Option<&Value>, id: u64) -> bool {
    match response_id {
        Some(Value::Number(n)) => n.as_u64() == Some(id),
        Some(Value::String(s)) => s.parse::<u64>().ok() == Some(id),
        _ => false,
    }
}

#[async_trait]
impl ToolSession for McpClient {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let client = self.clone();
        tokio::task::spawn_blocking(move || client.list_tools_blocking())
            .await
            .context("tools/list task panicked")?
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<CallToolResult> {
        let client = self.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || client.call_tool_blocking(&name, arguments))
            .await
            .context("tools/call task panicked")?
    }
}
