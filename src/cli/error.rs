use miette::Diagnostic;
use thiserror::Error;

use crate::client::ApiError;
use crate::config::ConfigError;
use crate::mcp::ServeError;
use crate::tools::ToolError;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to set up the HighLevel client")]
    #[diagnostic(code(highlevel::cli::client))]
    Client {
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Serve(#[from] ServeError),

    #[error("Invalid --args JSON: {message}")]
    #[diagnostic(
        code(highlevel::cli::invalid_json),
        help("Pass a JSON object, e.g. --args '{{\"contactId\": \"abc123\"}}'")
    )]
    InvalidJson { message: String },

    #[error("Unknown tool family: {family}")]
    #[diagnostic(code(highlevel::cli::unknown_family), help("Known families: {known}"))]
    UnknownFamily { family: String, known: String },

    #[error("HTTP transport is not available in this build")]
    #[diagnostic(
        code(highlevel::cli::http_disabled),
        help("Rebuild with the `http` feature or use --transport stdio.")
    )]
    HttpDisabled,

    #[error("Failed to render output: {message}")]
    #[diagnostic(code(highlevel::cli::output))]
    Output { message: String },
}

impl From<ApiError> for CliError {
    fn from(source: ApiError) -> Self {
        CliError::Client { source }
    }
}

pub type CliResult<T> = Result<T, CliError>;
