use rmcp::ServerHandler;
use rmcp::model::{CallToolResult, ErrorCode, RawContent};
use serde_json::{Map, Value, json};

use crate::client::MockTransport;
use crate::mcp::McpServer;
use crate::tools::ToolRegistry;
use crate::tools::test_support::{bare_context, context, recording, status_error};

fn server(mock: MockTransport) -> McpServer {
    McpServer::new(ToolRegistry::new(context(mock)))
}

fn text_of(result: &CallToolResult) -> Value {
    let text = match &result.content[0].raw {
        RawContent::Text(text) => text.text.as_str(),
        _ => panic!("Expected text content"),
    };
    serde_json::from_str(text).unwrap()
}

fn args(value: Value) -> Option<Map<String, Value>> {
    value.as_object().cloned()
}

#[test]
fn test_server_info() {
    let info = server(MockTransport::new()).get_info();

    assert!(info.capabilities.tools.is_some(), "Server should support tools");
    assert_eq!(info.server_info.name, "highlevel-mcp");
    assert!(info.instructions.is_some_and(|text| text.contains("GoHighLevel")));
}

#[test]
fn test_tools_mirror_registry() {
    let server = server(MockTransport::new());

    let tools = server.tools();

    assert_eq!(tools.len(), server.registry().len());
    let create = tools
        .iter()
        .find(|tool| tool.name == "create_contact")
        .unwrap();
    assert_eq!(create.input_schema.get("type"), Some(&json!("object")));
    assert!(create.description.is_some());
}

#[tokio::test]
async fn test_successful_call_returns_envelope() {
    let (mock, _) = recording(vec![Ok(json!({"contact": {"id": "c1", "firstName": "Ada"}}))]);

    let result = server(mock)
        .dispatch("get_contact", args(json!({"contactId": "c1"})))
        .await
        .unwrap();

    assert_eq!(result.is_error, Some(false));
    let body = text_of(&result);
    assert_eq!(body["success"], true);
    assert_eq!(body["contact"]["id"], "c1");
}

#[tokio::test]
async fn test_api_failure_is_an_error_result() {
    let (mock, _) = recording(vec![Err(status_error(404, "Contact not found"))]);

    let result = server(mock)
        .dispatch("get_contact", args(json!({"contactId": "c-missing"})))
        .await
        .unwrap();

    assert_eq!(result.is_error, Some(true));
    let body = text_of(&result);
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "not_found");
    assert_eq!(body["status"], 404);
    assert!(body["error"].as_str().unwrap().contains("search_contacts"));
}

#[tokio::test]
async fn test_invalid_arguments_are_an_error_result() {
    let result = server(MockTransport::new())
        .dispatch("get_contact", None)
        .await
        .unwrap();

    assert_eq!(result.is_error, Some(true));
    assert!(text_of(&result)["error"].as_str().unwrap().contains("contactId"));
}

#[tokio::test]
async fn test_unknown_tool_is_a_protocol_error() {
    let err = server(MockTransport::new())
        .dispatch("not_a_real_tool", None)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    assert!(err.message.contains("not_a_real_tool"));
}

#[tokio::test]
async fn test_missing_location_reported_to_agent() {
    let server = McpServer::new(ToolRegistry::new(bare_context(MockTransport::new())));

    let result = server
        .dispatch("get_calendars", args(json!({})))
        .await
        .unwrap();

    assert_eq!(result.is_error, Some(true));
    assert!(text_of(&result)["error"].as_str().unwrap().contains("locationId"));
}
