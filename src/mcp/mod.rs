//! Model Context Protocol (MCP) server.
//!
//! [`McpServer`] exposes a [`ToolRegistry`](crate::tools::ToolRegistry) over
//! MCP. It is served either over stdio (the default for desktop agents) or,
//! with the `http` feature, as a Streamable HTTP service nested in an axum
//! router next to a health endpoint.

mod error;
pub mod server;
#[cfg(feature = "http")]
mod service;

#[cfg(test)]
mod server_test;

pub use error::ServeError;
pub use server::{McpServer, serve_stdio};
#[cfg(feature = "http")]
pub use service::{create_mcp_service, router, serve_http};
