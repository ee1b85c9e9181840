//! MCP server handler.
//!
//! Tools are not declared through rmcp's router macros: the registry already
//! owns names, schemas and dispatch, so `list_tools` and `call_tool` are
//! implemented by hand on top of it.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
    model::*,
    service::RequestContext,
};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use super::ServeError;
use crate::tools::{ToolDefinition, ToolError, ToolRegistry};

const INSTRUCTIONS: &str = "GoHighLevel CRM tools: contacts, conversations, calendars, \
     opportunities, payments, products, invoices, store, social planner, blogs, media, \
     associations, surveys, locations and email verification. Most tools default \
     locationId to the configured location.";

#[derive(Clone)]
pub struct McpServer {
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Registry definitions rendered as MCP tool descriptors.
    pub fn tools(&self) -> Vec<Tool> {
        self.registry.definitions().into_iter().map(to_tool).collect()
    }

    /// Run one tool and render the outcome for MCP.
    ///
    /// Handler failures become an error result the agent can read; only an
    /// unknown tool name is a protocol error.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, McpError> {
        let args = arguments.map(Value::Object).unwrap_or(Value::Null);

        match self.registry.execute(name, args).await {
            Ok(output) => {
                let text = serde_json::to_string_pretty(&output).map_err(|e| {
                    McpError::internal_error(format!("Failed to serialize result: {e}"), None)
                })?;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(err @ ToolError::UnknownTool { .. }) => {
                Err(McpError::invalid_params(err.to_string(), None))
            }
            Err(err) => {
                debug!(tool = name, error = %err, "tool call failed");
                Ok(CallToolResult::error(vec![Content::text(
                    error_body(name, &err).to_string(),
                )]))
            }
        }
    }
}

fn to_tool(definition: ToolDefinition) -> Tool {
    Tool::new(
        definition.name,
        definition.description,
        definition.input_schema,
    )
}

fn error_body(tool: &str, err: &ToolError) -> Value {
    json!({
        "success": false,
        "tool": tool,
        "error": err.to_string(),
        "kind": err.kind(),
        "status": err.status(),
    })
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(Implementation::new(
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
            ))
            .with_instructions(INSTRUCTIONS)
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(&request.name, request.arguments).await
    }
}

/// Serve over stdin/stdout until the client disconnects.
pub async fn serve_stdio(server: McpServer) -> Result<(), ServeError> {
    info!(tools = server.registry().len(), "serving MCP over stdio");

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| ServeError::Session {
            message: e.to_string(),
        })?;
    let reason = service.waiting().await.map_err(|e| ServeError::Session {
        message: e.to_string(),
    })?;

    info!(?reason, "MCP session closed");
    Ok(())
}
