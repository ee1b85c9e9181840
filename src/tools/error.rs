use miette::Diagnostic;
use thiserror::Error;

use crate::client::{ApiError, ApiErrorKind};

#[derive(Error, Diagnostic, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {name}")]
    #[diagnostic(
        code(highlevel::tools::unknown_tool),
        help("Run `ghl-mcp tools` to list the available tools.")
    )]
    UnknownTool { name: String },

    #[error("Invalid arguments for {tool}: {message}")]
    #[diagnostic(code(highlevel::tools::invalid_arguments))]
    InvalidArguments { tool: String, message: String },

    #[error("{message}")]
    #[diagnostic(code(highlevel::tools::api))]
    Api {
        tool: String,
        kind: ApiErrorKind,
        status: Option<u16>,
        message: String,
        #[source]
        source: ApiError,
    },
}

impl ToolError {
    pub fn unknown(name: impl Into<String>) -> Self {
        ToolError::UnknownTool { name: name.into() }
    }

    pub fn invalid(tool: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::InvalidArguments {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// API failure classification, if this came from the API.
    pub fn kind(&self) -> Option<ApiErrorKind> {
        match self {
            ToolError::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ToolError::Api { status, .. } => *status,
            _ => None,
        }
    }
}

pub type ToolResult<T> = Result<T, ToolError>;
