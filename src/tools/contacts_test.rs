use serde_json::{Value, json};

use crate::client::{ApiErrorKind, ApiResult, Method, MockTransport};
use crate::tools::ToolModule;
use crate::tools::contacts::*;
use crate::tools::test_support::*;
use crate::tools::{ToolError, parse_args};

fn contact_tools(responses: Vec<ApiResult<Value>>) -> (ContactTools<MockTransport>, Recorded) {
    let (mock, seen) = recording(responses);
    (ContactTools::new(context(mock)), seen)
}

#[tokio::test]
async fn test_create_contact_uses_default_location() {
    let (tools, seen) = contact_tools(vec![Ok(json!({
        "contact": {"id": "c1", "firstName": "Ada", "lastName": "Lovelace"}
    }))]);

    let params = parse_args::<CreateContactParams>(
        "create_contact",
        json!({"firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.com"}),
    )
    .unwrap();
    let output = tools.create_contact(params).await.unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.path, "/contacts/");
    let body = request.json_body().unwrap();
    assert_eq!(body["locationId"], LOCATION);
    assert_eq!(body["email"], "ada@example.com");
    assert!(body.get("phone").is_none(), "unset fields are not sent");

    assert!(message(&output).contains("c1"));
    assert!(message(&output).contains("Ada Lovelace"));
    assert_eq!(output.get("contact").unwrap()["id"], "c1");
}

#[tokio::test]
async fn test_create_contact_requires_identity() {
    let (tools, seen) = contact_tools(vec![]);

    let params =
        parse_args::<CreateContactParams>("create_contact", json!({"city": "London"})).unwrap();
    let err = tools.create_contact(params).await.unwrap_err();

    assert!(matches!(err, ToolError::InvalidArguments { .. }));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_contact_without_any_location_fails() {
    let (mock, seen) = recording(vec![]);
    let tools = ContactTools::new(bare_context(mock));

    let params =
        parse_args::<CreateContactParams>("create_contact", json!({"email": "a@b.co"})).unwrap();
    let err = tools.create_contact(params).await.unwrap_err();

    assert!(err.to_string().contains("locationId is required"));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_contacts_defaults_limit_and_counts() {
    let (tools, seen) = contact_tools(vec![Ok(json!({
        "contacts": [{"id": "c1"}, {"id": "c2"}, {"id": "c3"}],
        "total": 42
    }))]);

    let output = tools
        .execute("search_contacts", json!({"query": "smith"}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.path, "/contacts/search");
    let body = request.json_body().unwrap();
    assert_eq!(body["pageLimit"], DEFAULT_SEARCH_LIMIT);
    assert_eq!(body["query"], "smith");
    assert!(body.get("filters").is_none());

    assert!(message(&output).contains('3'));
    assert_eq!(output.get("total").unwrap(), 42);
}

#[tokio::test]
async fn test_search_contacts_email_filter() {
    let (tools, seen) = contact_tools(vec![Ok(json!({"contacts": []}))]);

    tools
        .execute(
            "search_contacts",
            json!({"email": "ada@example.com", "limit": 5}),
        )
        .await
        .unwrap();

    let body = only_request(&seen).json_body().unwrap().clone();
    assert_eq!(body["pageLimit"], 5);
    assert_eq!(
        body["filters"],
        json!([{"field": "email", "operator": "eq", "value": "ada@example.com"}])
    );
}

#[tokio::test]
async fn test_get_contact_not_found_includes_guidance_and_id() {
    let (tools, _) = contact_tools(vec![Err(status_error(404, "Contact not found"))]);

    let err = tools
        .execute("get_contact", json!({"contactId": "stale-123"}))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ApiErrorKind::NotFound));
    assert_eq!(err.status(), Some(404));
    let text = err.to_string();
    assert!(text.contains("stale-123"));
    assert!(text.contains("search_contacts"));
    assert!(text.contains("Contact not found"));
}

#[tokio::test]
async fn test_get_contact_is_repeatable() {
    let contact = json!({"contact": {"id": "c1", "firstName": "Ada"}});
    let (tools, seen) = contact_tools(vec![Ok(contact.clone()), Ok(contact)]);

    let first = tools
        .execute("get_contact", json!({"contactId": "c1"}))
        .await
        .unwrap();
    let second = tools
        .execute("get_contact", json!({"contactId": "c1"}))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_contact_sends_only_changed_fields() {
    let (tools, seen) = contact_tools(vec![Ok(json!({"contact": {"id": "c1"}}))]);

    tools
        .execute(
            "update_contact",
            json!({"contactId": "c1", "phone": "+15551234567"}),
        )
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.path, "/contacts/c1");
    assert_eq!(request.json_body().unwrap(), &json!({"phone": "+15551234567"}));
}

#[tokio::test]
async fn test_update_contact_validation_lists_common_mistakes() {
    let (tools, _) = contact_tools(vec![Err(status_error(422, "phone must be valid"))]);

    let err = tools
        .execute("update_contact", json!({"contactId": "c1", "phone": "12"}))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ApiErrorKind::Validation));
    assert!(err.to_string().contains("E.164"));
}

#[tokio::test]
async fn test_upsert_contact_reports_created_or_updated() {
    let (tools, seen) = contact_tools(vec![
        Ok(json!({"new": true, "contact": {"id": "c9"}})),
        Ok(json!({"new": false, "contact": {"id": "c9"}})),
    ]);

    let created = tools
        .execute("upsert_contact", json!({"email": "x@y.z"}))
        .await
        .unwrap();
    let updated = tools
        .execute("upsert_contact", json!({"email": "x@y.z"}))
        .await
        .unwrap();

    assert!(message(&created).contains("created"));
    assert_eq!(created.get("created").unwrap(), true);
    assert!(message(&updated).contains("updated"));
    assert_eq!(seen.lock().unwrap()[0].path, "/contacts/upsert");
}

#[tokio::test]
async fn test_get_duplicate_contact_maps_phone_to_number() {
    let (tools, seen) = contact_tools(vec![Ok(json!({"contact": null}))]);

    let output = tools
        .execute("get_duplicate_contact", json!({"phone": "+15550000000"}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.path, "/contacts/search/duplicate");
    assert_eq!(request.query_value("number"), Some("+15550000000"));
    assert_eq!(request.query_value("locationId"), Some(LOCATION));
    assert_eq!(message(&output), "No duplicate contact found");
    assert_eq!(output.get("duplicate").unwrap(), false);
}

#[tokio::test]
async fn test_get_duplicate_contact_requires_email_or_phone() {
    let (tools, _) = contact_tools(vec![]);

    let err = tools
        .execute("get_duplicate_contact", json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::InvalidArguments { .. }));
}

#[tokio::test]
async fn test_tags_add_and_remove() {
    let (tools, seen) = contact_tools(vec![
        Ok(json!({"tags": ["vip", "lead"]})),
        Ok(json!({"tags": ["lead"]})),
    ]);

    let added = tools
        .execute("add_contact_tags", json!({"contactId": "c1", "tags": ["vip", "lead"]}))
        .await
        .unwrap();
    let removed = tools
        .execute("remove_contact_tags", json!({"contactId": "c1", "tags": ["vip"]}))
        .await
        .unwrap();

    let requests = seen.lock().unwrap();
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[1].method, Method::Delete);
    assert_eq!(requests[1].path, "/contacts/c1/tags");
    assert!(message(&added).contains('2'));
    assert!(message(&removed).contains('1'));
}

#[tokio::test]
async fn test_create_contact_task_defaults_completed() {
    let (tools, seen) = contact_tools(vec![Ok(json!({"task": {"id": "t1"}}))]);

    tools
        .execute(
            "create_contact_task",
            json!({"contactId": "c1", "title": "Call back", "dueDate": "2025-10-20T09:00:00Z"}),
        )
        .await
        .unwrap();

    let body = only_request(&seen).json_body().unwrap().clone();
    assert_eq!(body["completed"], false);
    assert_eq!(body["dueDate"], "2025-10-20T09:00:00Z");
}

#[tokio::test]
async fn test_get_contact_notes_counts() {
    let (tools, _) = contact_tools(vec![Ok(json!({"notes": [{"id": "n1"}, {"id": "n2"}]}))]);

    let output = tools
        .execute("get_contact_notes", json!({"contactId": "c1"}))
        .await
        .unwrap();

    assert!(message(&output).contains('2'));
}

#[tokio::test]
async fn test_workflow_paths() {
    let (tools, seen) = contact_tools(vec![Ok(json!({})), Ok(json!({}))]);

    tools
        .execute("add_contact_to_workflow", json!({"contactId": "c1", "workflowId": "w1"}))
        .await
        .unwrap();
    tools
        .execute("remove_contact_from_workflow", json!({"contactId": "c1", "workflowId": "w1"}))
        .await
        .unwrap();

    let requests = seen.lock().unwrap();
    assert_eq!(requests[0].path, "/contacts/c1/workflow/w1");
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[1].method, Method::Delete);
}

#[tokio::test]
async fn test_missing_required_argument_is_rejected_before_sending() {
    let (tools, seen) = contact_tools(vec![]);

    let err = tools.execute("get_contact", json!({})).await.unwrap_err();

    assert!(matches!(err, ToolError::InvalidArguments { ref tool, .. } if tool == "get_contact"));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_contact_and_list_tasks() {
    let cases = [
        ("delete_contact", Method::Delete, "/contacts/c1"),
        ("get_contact_tasks", Method::Get, "/contacts/c1/tasks"),
    ];

    for (tool, method, path) in cases {
        let (tools, seen) = contact_tools(vec![Ok(json!({"tasks": []}))]);

        tools.execute(tool, json!({"contactId": "c1"})).await.unwrap();

        let request = only_request(&seen);
        assert_eq!(request.method, method, "{tool}");
        assert_eq!(request.path, path, "{tool}");
    }
}

#[tokio::test]
async fn test_create_contact_note_omits_missing_author() {
    let (tools, seen) = contact_tools(vec![Ok(json!({"note": {"id": "n1", "body": "Called back"}}))]);

    let output = tools
        .execute("create_contact_note", json!({"contactId": "c1", "body": "Called back"}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.path, "/contacts/c1/notes");
    assert_eq!(request.json_body(), Some(&json!({"body": "Called back"})));
    assert_eq!(message(&output), "Note added to contact c1");
}
