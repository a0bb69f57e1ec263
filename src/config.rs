use crate::vendors::Provider;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Directory name used for user and project config
pub const CONFIG_DIR: &str = ".mcpbridge";

/// Configuration for an MCP server
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default = "default_cwd")]
    pub cwd: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_timeout_ms", alias = "timeout_ms")]
    pub timeout_ms: u64,
}

impl McpServerConfig {
    /// Server config with defaults for everything but the command
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: default_cwd(),
            enabled: true,
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_cwd() -> String {
    ".".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// MCP configuration section
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct McpConfig {
    #[serde(default)]
    pub servers: HashMap<String, McpServerConfig>,
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Verbose tool-call logging in the bridge
    #[serde(default)]
    pub debug: Option<bool>,
    /// Provider dialect used when none is given on the command line
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub mcp: McpConfig,
}

impl Config {
    /// Config with the built-in server entries.
    ///
    /// `claude` runs Claude Code as an MCP server (`claude mcp serve`).
    pub fn with_builtin_servers() -> Self {
        let mut servers = HashMap::new();
        servers.insert(
            "claude".to_string(),
            McpServerConfig {
                args: vec!["mcp".to_string(), "serve".to_string()],
                ..McpServerConfig::new("claude")
            },
        );

        Config {
            debug: None,
            provider: None,
            mcp: McpConfig { servers },
        }
    }

    /// Load configuration from default paths
    /// Priority: local (.mcpbridge/config.local.toml) > project (.mcpbridge/config.toml) > user (~/.mcpbridge/config.toml)
    /// Starts with built-in servers, then merges user/project/local configs
    pub fn load() -> Result<Self> {
        let mut config = Self::with_builtin_servers();
        for path in Self::search_paths() {
            if path.exists() {
                let layer = Self::load_from(&path)?;
                config.merge(layer);
            }
        }
        Ok(config)
    }

    /// Candidate config files, lowest priority first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(CONFIG_DIR).join("config.toml"));
        }
        paths.push(Path::new(CONFIG_DIR).join("config.toml"));
        paths.push(Path::new(CONFIG_DIR).join("config.local.toml"));
        paths
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Config) {
        if other.debug.is_some() {
            self.debug = other.debug;
        }
        if other.provider.is_some() {
            self.provider = other.provider;
        }
        for (name, server) in other.mcp.servers {
            self.mcp.servers.insert(name, server);
        }
    }

    /// Look up an enabled server by name
    pub fn server(&self, name: &str) -> Option<&McpServerConfig> {
        self.mcp.servers.get(name).filter(|s| s.enabled)
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug.unwrap_or(false)
    }
}
