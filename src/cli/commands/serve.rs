use std::net::{IpAddr, SocketAddr};

use clap::ValueEnum;

use crate::cli::error::CliResult;
use crate::mcp::{McpServer, serve_stdio};
use crate::tools::ToolRegistry;

/// How the MCP server talks to its client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ServeTransport {
    #[default]
    Stdio,
    Http,
}

pub fn socket_addr(host: IpAddr, port: u16) -> SocketAddr {
    SocketAddr::new(host, port)
}

pub async fn serve(
    registry: ToolRegistry,
    transport: ServeTransport,
    host: IpAddr,
    port: u16,
) -> CliResult<()> {
    match transport {
        ServeTransport::Stdio => Ok(serve_stdio(McpServer::new(registry)).await?),
        ServeTransport::Http => serve_http(registry, socket_addr(host, port)).await,
    }
}

#[cfg(feature = "http")]
async fn serve_http(registry: ToolRegistry, addr: SocketAddr) -> CliResult<()> {
    Ok(crate::mcp::serve_http(registry, addr).await?)
}

#[cfg(not(feature = "http"))]
async fn serve_http(_registry: ToolRegistry, _addr: SocketAddr) -> CliResult<()> {
    Err(crate::cli::error::CliError::HttpDisabled)
}
