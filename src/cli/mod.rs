mod commands;
pub mod error;
pub mod utils;


use std::net::IpAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::client::{ApiContext, HttpTransport};
use crate::config::{Config, ConfigOverrides};
use crate::tools::ToolRegistry;
use commands::OutputFormat;
use commands::serve::ServeTransport;
use error::CliResult;

#[derive(Parser, Debug)]
#[command(name = "ghl-mcp")]
#[command(author, version, about = "GoHighLevel CRM tools over MCP", long_about = None)]
pub struct Cli {
    /// Private integration token (default: GHL_API_KEY env)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Override the API URL (default: GHL_BASE_URL env or https://services.leadconnectorhq.com)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Location used when a tool call omits locationId (default: GHL_LOCATION_ID env)
    #[arg(long, global = true)]
    pub location_id: Option<String>,

    /// Company used by location search tools (default: GHL_COMPANY_ID env)
    #[arg(long, global = true)]
    pub company_id: Option<String>,

    /// Value of the Version header (default: GHL_API_VERSION env or 2021-07-28)
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server
    Serve {
        /// stdio for desktop agents, http for Streamable HTTP
        #[arg(long, value_enum, default_value_t = ServeTransport::Stdio)]
        transport: ServeTransport,
        /// Host address to bind to (http only)
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,
        /// Port to listen on (http only)
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// List the available tools
    Tools {
        /// Only show one family (e.g. contacts, calendars)
        #[arg(long)]
        family: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Call one tool and print its result
    Call {
        /// Tool name, e.g. search_contacts
        tool: String,
        /// Arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            location_id: self.location_id.clone(),
            company_id: self.company_id.clone(),
            api_version: self.api_version.clone(),
            timeout_secs: self.timeout,
        }
    }
}

/// Resolve configuration and build a registry backed by the real API.
pub fn build_registry(overrides: ConfigOverrides) -> CliResult<ToolRegistry> {
    let config = Config::resolve(overrides)?;
    let transport = HttpTransport::new(&config)?;
    info!(
        base_url = transport.base_url(),
        location = config.location_id.as_deref().unwrap_or("-"),
        "HighLevel client ready"
    );
    let ctx = ApiContext::from_config(transport, &config);
    Ok(ToolRegistry::new(Arc::new(ctx)))
}

pub async fn run(cli: Cli) -> CliResult<()> {
    let overrides = cli.overrides();

    match cli.command {
        Some(Commands::Serve {
            transport,
            host,
            port,
        }) => {
            let registry = build_registry(overrides)?;
            commands::serve::serve(registry, transport, host, port).await
        }
        Some(Commands::Tools { family, format }) => {
            let output =
                commands::tools::list_tools(&ToolRegistry::catalog(), family.as_deref(), format)?;
            println!("{}", output);
            Ok(())
        }
        Some(Commands::Call { tool, args }) => {
            let registry = build_registry(overrides)?;
            let output = commands::call::call_tool(&registry, &tool, args.as_deref()).await?;
            println!("{}", output);
            Ok(())
        }
        None => {
            // Show help when no command provided
            let _ = Cli::parse_from(["ghl-mcp", "--help"]);
            Ok(())
        }
    }
}
