//! GoHighLevel CRM exposed as Model Context Protocol tools.
//!
//! The [`tools`] registry turns agent calls into HighLevel REST requests
//! through a [`client::Transport`]; [`mcp`] serves that registry over stdio
//! or Streamable HTTP, and [`cli`] wires both behind the `ghl-mcp` binary.

pub mod cli;
pub mod client;
pub mod config;
pub mod convert;
pub mod mcp;
pub mod tools;

#[cfg(test)]
mod config_test;
