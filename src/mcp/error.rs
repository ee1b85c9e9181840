use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ServeError {
    #[error("Failed to bind {addr}")]
    #[diagnostic(
        code(highlevel::mcp::bind),
        help("Is another process using this port? Pick another with --port.")
    )]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server stopped unexpectedly")]
    #[diagnostic(code(highlevel::mcp::http))]
    Http {
        #[source]
        source: std::io::Error,
    },

    #[error("MCP session failed: {message}")]
    #[diagnostic(code(highlevel::mcp::session))]
    Session { message: String },
}
