use std::sync::Arc;

use serde_json::{Value, json};

use crate::client::{ApiContext, ApiResult, Method, MockTransport};
use crate::tools::locations::*;
use crate::tools::test_support::*;
use crate::tools::{ToolError, ToolModule};

fn location_tools(responses: Vec<ApiResult<Value>>) -> (LocationTools<MockTransport>, Recorded) {
    let (mock, seen) = recording(responses);
    (LocationTools::new(context(mock)), seen)
}

#[tokio::test]
async fn test_search_locations_defaults_skip_and_limit() {
    let (mock, seen) = recording(vec![Ok(json!({
        "locations": [{"id": "l1"}, {"id": "l2"}, {"id": "l3"}]
    }))]);
    let tools = LocationTools::new(Arc::new(ApiContext::new(mock).with_company("co1")));

    let output = tools.execute("search_locations", json!({})).await.unwrap();

    let request = only_request(&seen);
    assert_eq!(request.path, "/locations/search");
    assert_eq!(request.query_value("companyId"), Some("co1"));
    assert_eq!(request.query_value("skip"), Some("0"));
    assert_eq!(request.query_value("limit"), Some("10"));
    assert!(message(&output).contains('3'));
}

#[tokio::test]
async fn test_search_locations_requires_company() {
    let (tools, seen) = location_tools(vec![]);

    let err = tools.execute("search_locations", json!({})).await.unwrap_err();

    assert!(matches!(err, ToolError::InvalidArguments { .. }));
    assert!(err.to_string().contains("companyId"));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_location_defaults_to_configured_location() {
    let (tools, seen) = location_tools(vec![Ok(json!({"location": {"id": LOCATION, "name": "Main St"}}))]);

    let output = tools.execute("get_location", json!({})).await.unwrap();

    assert_eq!(only_request(&seen).path, format!("/locations/{LOCATION}"));
    assert!(message(&output).contains("Main St"));
}

#[tokio::test]
async fn test_explicit_location_overrides_default() {
    let (tools, seen) = location_tools(vec![Ok(json!({"tags": []}))]);

    tools
        .execute("get_location_tags", json!({"locationId": "other"}))
        .await
        .unwrap();

    assert_eq!(only_request(&seen).path, "/locations/other/tags");
}

#[tokio::test]
async fn test_tag_lifecycle_paths() {
    let (tools, seen) = location_tools(vec![
        Ok(json!({"tag": {"id": "t1", "name": "vip"}})),
        Ok(json!({"tag": {"id": "t1", "name": "VIP"}})),
        Ok(json!({"succeded": true})),
    ]);

    let created = tools
        .execute("create_location_tag", json!({"name": "vip"}))
        .await
        .unwrap();
    tools
        .execute("update_location_tag", json!({"tagId": "t1", "name": "VIP"}))
        .await
        .unwrap();
    tools
        .execute("delete_location_tag", json!({"tagId": "t1"}))
        .await
        .unwrap();

    assert!(message(&created).contains("t1"));
    let requests = seen.lock().unwrap();
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[1].method, Method::Put);
    assert_eq!(requests[1].path, format!("/locations/{LOCATION}/tags/t1"));
    assert_eq!(requests[2].method, Method::Delete);
}

#[tokio::test]
async fn test_custom_fields_model_filter() {
    let (tools, seen) = location_tools(vec![Ok(json!({
        "customFields": [{"id": "f1"}, {"id": "f2"}]
    }))]);

    let output = tools
        .execute("get_location_custom_fields", json!({"model": "opportunity"}))
        .await
        .unwrap();

    assert_eq!(only_request(&seen).query_value("model"), Some("opportunity"));
    assert!(message(&output).contains('2'));
}

#[tokio::test]
async fn test_delete_tag_not_found_guidance() {
    let (tools, _) = location_tools(vec![Err(status_error(404, "Tag not found"))]);

    let err = tools
        .execute("delete_location_tag", json!({"tagId": "t-missing"}))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("t-missing"));
    assert!(err.to_string().contains("get_location_tags"));
}

#[tokio::test]
async fn test_create_location_custom_field_body() {
    let (tools, seen) = location_tools(vec![Ok(json!({"customField": {"id": "cf1"}}))]);

    let output = tools
        .execute(
            "create_location_custom_field",
            json!({"name": "Shoe size", "dataType": "NUMERICAL", "model": "contact"}),
        )
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.path, format!("/locations/{LOCATION}/customFields"));
    assert_eq!(
        request.json_body(),
        Some(&json!({"name": "Shoe size", "dataType": "NUMERICAL", "model": "contact"}))
    );
    assert_eq!(message(&output), "Custom field 'Shoe size' created (ID: cf1)");
}

#[tokio::test]
async fn test_location_lookups_use_path_location() {
    let cases = [
        (
            "get_location_custom_values",
            "customValues",
            "customValues",
            "Found 1 custom values",
        ),
        ("get_timezones", "timezones", "timeZones", "Found 1 timezones"),
    ];

    for (tool, segment, key, summary) in cases {
        let (tools, seen) = location_tools(vec![Ok(json!({key: ["x"]}))]);

        let output = tools
            .execute(tool, json!({"locationId": "loc-other"}))
            .await
            .unwrap();

        let request = only_request(&seen);
        assert_eq!(request.method, Method::Get, "{tool}");
        assert_eq!(request.path, format!("/locations/loc-other/{segment}"), "{tool}");
        assert_eq!(message(&output), summary, "{tool}");
    }
}
