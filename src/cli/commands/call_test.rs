use serde_json::json;

use crate::cli::commands::call::*;
use crate::cli::error::CliError;
use crate::client::MockTransport;
use crate::tools::test_support::{context, only_request, recording, status_error};
use crate::tools::{ToolError, ToolRegistry};

#[test]
fn test_parse_args_missing_is_empty_object() {
    assert_eq!(parse_args(None).unwrap(), json!({}));
    assert_eq!(parse_args(Some("   ")).unwrap(), json!({}));
}

#[test]
fn test_parse_args_object() {
    let args = parse_args(Some(r#"{"contactId": "c1"}"#)).unwrap();
    assert_eq!(args, json!({"contactId": "c1"}));
}

#[test]
fn test_parse_args_rejects_non_object() {
    let err = parse_args(Some("[1, 2]")).unwrap_err();
    assert!(
        matches!(err, CliError::InvalidJson { ref message } if message.contains("an array")),
        "got {err:?}"
    );
}

#[test]
fn test_parse_args_rejects_malformed_json() {
    let err = parse_args(Some("{contactId: c1}")).unwrap_err();
    assert!(matches!(err, CliError::InvalidJson { .. }));
}

#[tokio::test]
async fn test_call_tool_prints_envelope() {
    let (mock, seen) = recording(vec![Ok(json!({"contact": {"id": "c1"}}))]);
    let registry = ToolRegistry::new(context(mock));

    let output = call_tool(&registry, "get_contact", Some(r#"{"contactId": "c1"}"#))
        .await
        .unwrap();

    let body: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["contact"]["id"], "c1");
    assert_eq!(only_request(&seen).path, "/contacts/c1");
}

#[tokio::test]
async fn test_call_unknown_tool() {
    let registry = ToolRegistry::new(context(MockTransport::new()));

    let err = call_tool(&registry, "make_coffee", None).await.unwrap_err();

    assert!(matches!(
        err,
        CliError::Tool(ToolError::UnknownTool { ref name }) if name == "make_coffee"
    ));
}

#[tokio::test]
async fn test_call_tool_api_failure_keeps_guidance() {
    let (mock, _) = recording(vec![Err(status_error(401, "Invalid JWT"))]);
    let registry = ToolRegistry::new(context(mock));

    let err = call_tool(&registry, "get_contact", Some(r#"{"contactId": "c1"}"#))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Permission denied"), "got {err}");
}
