//! Stdio transport layer for MCP server communication.
//!
//! Spawns an MCP server as a subprocess and exchanges newline-delimited
//! JSON-RPC messages over its stdin/stdout.

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Stdio transport for communicating with an MCP server subprocess
pub struct StdioTransport {
    child: Child,
    stdin: ChildStdin,
    incoming: Receiver<Value>,
    reader_handle: Option<JoinHandle<()>>,
}

impl StdioTransport {
    /// Spawn an MCP server subprocess and set up communication channels
    pub fn spawn(
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        cwd: &Path,
    ) -> Result<Self> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .current_dir(cwd)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit()); // Let server errors show in terminal

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn MCP server: {}", command))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("Failed to capture stdin of {}", command))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("Failed to capture stdout of {}", command))?;

        let (tx, rx) = mpsc::channel();

        let reader_handle = thread::spawn(move || {
            Self::reader_loop(stdout, tx);
        });

        debug!(command, pid = child.id(), "spawned MCP server");

        Ok(Self {
            child,
            stdin,
            incoming: rx,
            reader_handle: Some(reader_handle),
        })
    }

    /// Reader loop that forwards newline-delimited JSON from stdout
    fn reader_loop(stdout: ChildStdout, tx: Sender<Value>) {
        let reader = BufReader::new(stdout);
        for line in reader.lines() {
            match line {
                Ok(line) if !line.trim().is_empty() => match serde_json::from_str(&line) {
                    Ok(msg) => {
                        if tx.send(msg).is_err() {
                            // Receiver dropped
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, line = %line, "MCP: failed to parse JSON from server");
                    }
                },
                Err(_) => break, // Pipe closed
                _ => {}
            }
        }
    }

    /// Send a JSON-RPC message to the MCP server
    pub fn send(&mut self, message: &Value) -> Result<()> {
        let json = serde_json::to_string(message)?;
        writeln!(self.stdin, "{}", json).context("Failed to write to MCP server stdin")?;
        self.stdin
            .flush()
            .context("Failed to flush MCP server stdin")?;
        Ok(())
    }

    /// Receive the next message, waiting at most `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Value> {
        self.incoming.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => anyhow!("Timed out after {:?} waiting for MCP server", timeout),
            RecvTimeoutError::Disconnected => anyhow!("MCP server closed its output"),
        })
    }

    /// Get the process ID of the child
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();

        if let Some(handle) = self.reader_handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_echo_roundtrip_through_cat() {
        let mut transport =
            StdioTransport::spawn("cat", &[], &HashMap::new(), Path::new(".")).unwrap();
        assert!(transport.pid() > 0);

        let message = json!({"jsonrpc": "2.0", "id": 1, "method": "ping"});
        transport.send(&message).unwrap();

        let echoed = transport.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(echoed, message);
    }

    #[test]
    fn test_spawn_missing_command() {
        let result = StdioTransport::spawn(
            "definitely-not-an-mcp-server-binary",
            &[],
            &HashMap::new(),
            Path::new("."),
        );
        assert!(result.is_err());
    }
}
