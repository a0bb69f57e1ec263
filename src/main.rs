use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use mcpbridge::config::Config;
use mcpbridge::mcp::client::McpClient;
use mcpbridge::mcp::{ToolDescriptor, ToolSession};
use mcpbridge::vendors::{self, anthropic, openai, Provider};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mcpbridge", version, about = "Expose MCP server tools to LLM provider APIs")]
struct Args {
    /// Config file (defaults to the layered ~/.mcpbridge and .mcpbridge files)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log tool calls and failures in detail
    #[arg(long, global = true, env = "MCPBRIDGE_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a server's tools translated for a provider
    Tools {
        #[arg(long, short)]
        server: String,
        #[arg(long, short, value_enum)]
        provider: Option<Provider>,
    },
    /// Call a tool through the bridge and print its text result
    Call {
        #[arg(long, short)]
        server: String,
        #[arg(long, short)]
        tool: String,
        /// Arguments as a JSON object (provider tool-call input)
        #[arg(long, short, default_value = "{}")]
        args: String,
        #[arg(long, short, value_enum)]
        provider: Option<Provider>,
    },
    /// Translate a saved tools/list result without starting a server
    Translate {
        #[arg(long, short)]
        file: PathBuf,
        #[arg(long, short, value_enum)]
        provider: Option<Provider>,
    },
}

fn init_logging(debug: bool) {
    let default = if debug { "mcpbridge=debug" } else { "mcpbridge=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::with_builtin_servers();
            config.merge(Config::load_from(path)?);
            Ok(config)
        }
        None => Config::load(),
    }
}

async fn connect(config: &Config, server: &str) -> Result<McpClient> {
    let server_config = config
        .server(server)
        .ok_or_else(|| anyhow!("No enabled MCP server named '{}' in config", server))?;
    McpClient::connect_async(server, server_config).await
}

/// Accept either a full `tools/list` result or a bare array of tools
fn parse_tool_list(content: &str) -> Result<Vec<ToolDescriptor>> {
    let value: Value = serde_json::from_str(content).context("Tool list is not valid JSON")?;
    let tools = match value {
        Value::Object(mut fields) => fields
            .remove("tools")
            .ok_or_else(|| anyhow!("Expected a \"tools\" array"))?,
        array @ Value::Array(_) => array,
        _ => bail!("Expected a tools/list result or an array of tools"),
    };
    serde_json::from_value(tools).context("Malformed tool descriptor")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = load_config(args.config.as_ref())?;
    let debug = args.debug || config.debug_enabled();
    init_logging(debug);

    let resolve = |p: Option<Provider>| p.or(config.provider).unwrap_or_default();

    match &args.command {
        Command::Tools { server, provider } => {
            let client = connect(&config, server).await?;
            let tools = client.list_tools().await?;
            let rendered = vendors::tools_json(resolve(*provider), &tools)?;
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
        Command::Call {
            server,
            tool,
            args: raw,
            provider,
        } => {
            let client = connect(&config, server).await?;
            let text = match resolve(*provider) {
                Provider::Anthropic => {
                    let input: Value =
                        serde_json::from_str(raw).context("--args is not valid JSON")?;
                    anthropic::anthropic_call_tool(&client, tool, &input, debug).await
                }
                Provider::OpenAi => openai::openai_call_tool(&client, tool, raw, debug).await,
            };
            match text {
                Some(text) => println!("{}", text),
                None => bail!("Tool '{}' produced no text", tool),
            }
        }
        Command::Translate { file, provider } => {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let tools = parse_tool_list(&content)?;
            let rendered = vendors::tools_json(resolve(*provider), &tools)?;
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
    }

    Ok(())
}
