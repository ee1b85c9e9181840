use serde_json::{Value, json};

use crate::client::{ApiResult, Method, MockTransport};
use crate::tools::conversations::*;
use crate::tools::test_support::*;
use crate::tools::{ToolError, ToolModule};

fn conversation_tools(
    responses: Vec<ApiResult<Value>>,
) -> (ConversationTools<MockTransport>, Recorded) {
    let (mock, seen) = recording(responses);
    (ConversationTools::new(context(mock)), seen)
}

#[tokio::test]
async fn test_search_conversations_defaults() {
    let (tools, seen) = conversation_tools(vec![Ok(json!({
        "conversations": [{"id": "cv1"}, {"id": "cv2"}],
        "total": 2
    }))]);

    let output = tools
        .execute("search_conversations", json!({"status": "unread"}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.path, "/conversations/search");
    assert_eq!(request.version, Some(CONVERSATIONS_API_VERSION));
    assert_eq!(request.query_value("limit"), Some("20"));
    assert_eq!(request.query_value("status"), Some("unread"));
    assert_eq!(request.query_value("locationId"), Some(LOCATION));
    assert!(message(&output).contains('2'));
}

#[tokio::test]
async fn test_send_sms_body() {
    let (tools, seen) = conversation_tools(vec![Ok(json!({
        "conversationId": "cv1",
        "messageId": "m1"
    }))]);

    let output = tools
        .execute("send_sms", json!({"contactId": "c1", "message": "Hi there"}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.path, "/conversations/messages");
    assert_eq!(
        request.json_body().unwrap(),
        &json!({"type": "SMS", "contactId": "c1", "message": "Hi there"})
    );
    assert!(message(&output).contains("m1"));
}

#[tokio::test]
async fn test_send_email_needs_a_body() {
    let (tools, seen) = conversation_tools(vec![]);

    let err = tools
        .execute("send_email", json!({"contactId": "c1", "subject": "Hello"}))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::InvalidArguments { .. }));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_send_email_type_and_validation_guidance() {
    let (tools, seen) = conversation_tools(vec![Err(status_error(400, "contact has no email"))]);

    let err = tools
        .execute(
            "send_email",
            json!({"contactId": "c1", "subject": "Hello", "html": "<p>Hi</p>"}),
        )
        .await
        .unwrap_err();

    assert_eq!(only_request(&seen).json_body().unwrap()["type"], "Email");
    assert!(err.to_string().contains("Common mistakes"));
    assert!(err.to_string().contains("contact has no email"));
}

#[tokio::test]
async fn test_get_messages_unwraps_nested_page() {
    let (tools, _) = conversation_tools(vec![Ok(json!({
        "messages": {
            "lastMessageId": "m3",
            "nextPage": true,
            "messages": [{"id": "m1"}, {"id": "m2"}, {"id": "m3"}]
        }
    }))]);

    let output = tools
        .execute("get_messages", json!({"conversationId": "cv1"}))
        .await
        .unwrap();

    assert!(message(&output).contains('3'));
    assert_eq!(output.get("nextPage").unwrap(), true);
    assert_eq!(output.get("lastMessageId").unwrap(), "m3");
}

#[tokio::test]
async fn test_cancel_scheduled_message_path() {
    let (tools, seen) = conversation_tools(vec![Ok(json!({"status": 200}))]);

    tools
        .execute("cancel_scheduled_message", json!({"messageId": "m9"}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.path, "/conversations/messages/m9/schedule");
}

#[tokio::test]
async fn test_get_conversation_not_found() {
    let (tools, _) = conversation_tools(vec![Err(status_error(404, "Conversation not found"))]);

    let err = tools
        .execute("get_conversation", json!({"conversationId": "cv-old"}))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("cv-old"));
    assert!(err.to_string().contains("search_conversations"));
}

#[tokio::test]
async fn test_create_conversation_for_contact() {
    let (tools, seen) = conversation_tools(vec![Ok(json!({"conversation": {"id": "conv1"}}))]);

    let output = tools
        .execute("create_conversation", json!({"contactId": "c1"}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.path, "/conversations/");
    assert_eq!(request.version, Some(CONVERSATIONS_API_VERSION));
    assert_eq!(
        request.json_body(),
        Some(&json!({"locationId": LOCATION, "contactId": "c1"}))
    );
    assert_eq!(message(&output), "Conversation started with contact c1 (ID: conv1)");
}

#[tokio::test]
async fn test_update_conversation_sends_only_given_fields() {
    let (tools, seen) = conversation_tools(vec![Ok(json!({"conversation": {"id": "conv1"}}))]);

    tools
        .execute(
            "update_conversation",
            json!({"conversationId": "conv1", "starred": true}),
        )
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.path, "/conversations/conv1");
    assert_eq!(
        request.json_body(),
        Some(&json!({"locationId": LOCATION, "starred": true}))
    );
}

#[tokio::test]
async fn test_delete_conversation_and_get_message() {
    let cases = [
        (
            "delete_conversation",
            json!({"conversationId": "conv1"}),
            Method::Delete,
            "/conversations/conv1",
        ),
        (
            "get_message",
            json!({"messageId": "m1"}),
            Method::Get,
            "/conversations/messages/m1",
        ),
    ];

    for (tool, args, method, path) in cases {
        let (tools, seen) = conversation_tools(vec![Ok(json!({}))]);

        tools.execute(tool, args).await.unwrap();

        let request = only_request(&seen);
        assert_eq!(request.method, method, "{tool}");
        assert_eq!(request.path, path, "{tool}");
        assert_eq!(request.version, Some(CONVERSATIONS_API_VERSION), "{tool}");
    }
}
