use serde_json::{Value, json};

use crate::client::{ApiErrorKind, ApiResult, Method, MockTransport};
use crate::tools::ToolModule;
use crate::tools::opportunities::*;
use crate::tools::parse_args;
use crate::tools::test_support::*;

fn opportunity_tools(
    responses: Vec<ApiResult<Value>>,
) -> (OpportunityTools<MockTransport>, Recorded) {
    let (mock, seen) = recording(responses);
    (OpportunityTools::new(context(mock)), seen)
}

#[test]
fn test_search_query_renames_to_snake_case() {
    let params = parse_args::<SearchOpportunitiesParams>(
        "search_opportunities",
        json!({
            "pipelineId": "p1",
            "pipelineStageId": "s1",
            "contactId": "c1",
            "assignedTo": "u1",
            "query": "acme",
            "status": "won"
        }),
    )
    .unwrap();

    let request = search_query("loc1", &params);

    assert_eq!(request.query_value("pipeline_id"), Some("p1"));
    assert_eq!(request.query_value("pipeline_stage_id"), Some("s1"));
    assert_eq!(request.query_value("contact_id"), Some("c1"));
    assert_eq!(request.query_value("assigned_to"), Some("u1"));
    assert_eq!(request.query_value("q"), Some("acme"));
    assert_eq!(request.query_value("location_id"), Some("loc1"));
    assert_eq!(request.query_value("status"), Some("won"));
    for camel in ["pipelineId", "pipelineStageId", "contactId", "assignedTo", "query", "locationId"] {
        assert_eq!(request.query_value(camel), None, "{camel} must not be sent");
    }
}

#[tokio::test]
async fn test_search_opportunities_defaults_and_counts() {
    let (tools, seen) = opportunity_tools(vec![Ok(json!({
        "opportunities": [{"id": "o1"}, {"id": "o2"}, {"id": "o3"}],
        "meta": {"total": 3}
    }))]);

    let output = tools
        .execute("search_opportunities", json!({"pipelineId": "p1"}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.path, "/opportunities/search");
    assert_eq!(request.query_value("pipeline_id"), Some("p1"));
    assert_eq!(request.query_value("limit"), Some("20"));
    assert_eq!(request.query_value("location_id"), Some(LOCATION));
    assert!(message(&output).contains('3'));
}

#[tokio::test]
async fn test_create_opportunity_defaults_status_and_keeps_cents() {
    let (tools, seen) = opportunity_tools(vec![Ok(json!({"opportunity": {"id": "o1"}}))]);

    let output = tools
        .execute(
            "create_opportunity",
            json!({
                "name": "Acme renewal",
                "pipelineId": "p1",
                "contactId": "c1",
                "monetaryValue": 150000
            }),
        )
        .await
        .unwrap();

    let body = only_request(&seen).json_body().unwrap().clone();
    assert_eq!(body["status"], "open");
    assert_eq!(body["monetaryValue"], 150000);
    assert_eq!(body["locationId"], LOCATION);
    assert!(message(&output).contains("$1,500.00"));
    assert!(message(&output).contains("o1"));
}

#[tokio::test]
async fn test_create_opportunity_rejects_fractional_cents() {
    let (tools, _) = opportunity_tools(vec![]);

    let err = tools
        .execute(
            "create_opportunity",
            json!({"name": "x", "pipelineId": "p1", "contactId": "c1", "monetaryValue": 12.5}),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, crate::tools::ToolError::InvalidArguments { .. }));
}

#[tokio::test]
async fn test_update_status_path_and_body() {
    let (tools, seen) = opportunity_tools(vec![Ok(json!({"succeded": true}))]);

    let output = tools
        .execute(
            "update_opportunity_status",
            json!({"opportunityId": "o1", "status": "lost"}),
        )
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.path, "/opportunities/o1/status");
    assert_eq!(request.json_body().unwrap(), &json!({"status": "lost"}));
    assert!(message(&output).contains("lost"));
}

#[tokio::test]
async fn test_upsert_without_followers_is_one_call() {
    let (tools, seen) = opportunity_tools(vec![Ok(json!({
        "new": true,
        "opportunity": {"id": "o7"}
    }))]);

    let output = tools
        .execute(
            "upsert_opportunity",
            json!({"pipelineId": "p1", "contactId": "c1"}),
        )
        .await
        .unwrap();

    assert_eq!(only_request(&seen).path, "/opportunities/upsert");
    assert!(message(&output).contains("created"));
}

#[tokio::test]
async fn test_upsert_with_followers_is_two_calls() {
    let (tools, seen) = opportunity_tools(vec![
        Ok(json!({"new": false, "opportunity": {"id": "o7"}})),
        Ok(json!({"followers": ["u1", "u2"]})),
    ]);

    let output = tools
        .execute(
            "upsert_opportunity",
            json!({"pipelineId": "p1", "contactId": "c1", "followers": ["u1", "u2"]}),
        )
        .await
        .unwrap();

    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/opportunities/upsert");
    assert_eq!(requests[1].path, "/opportunities/o7/followers");
    assert_eq!(
        requests[1].json_body().unwrap(),
        &json!({"followers": ["u1", "u2"]})
    );
    assert!(message(&output).contains("updated"));
    assert!(message(&output).contains('2'));
}

#[tokio::test]
async fn test_upsert_follower_failure_surfaces_without_rollback() {
    let (tools, seen) = opportunity_tools(vec![
        Ok(json!({"new": true, "opportunity": {"id": "o8"}})),
        Err(status_error(404, "user not found")),
    ]);

    let err = tools
        .execute(
            "upsert_opportunity",
            json!({"pipelineId": "p1", "contactId": "c1", "followers": ["ghost"]}),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ApiErrorKind::NotFound));
    assert!(err.to_string().contains("o8"));
    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.method == Method::Post));
}

#[tokio::test]
async fn test_upsert_without_id_skips_followers() {
    let (tools, seen) = opportunity_tools(vec![Ok(json!({"new": true}))]);

    let err = tools
        .execute(
            "upsert_opportunity",
            json!({"pipelineId": "p1", "contactId": "c1", "followers": ["u1"]}),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ApiErrorKind::Other));
    assert!(err.to_string().contains("followers were not added"), "got {err}");
    assert_eq!(only_request(&seen).path, "/opportunities/upsert");
}

#[tokio::test]
async fn test_get_opportunity_not_found_suggests_search() {
    let (tools, _) = opportunity_tools(vec![Err(status_error(404, "Opportunity not found"))]);

    let err = tools
        .execute("get_opportunity", json!({"opportunityId": "old-1"}))
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("old-1"));
    assert!(text.contains("search_opportunities"));
}

#[tokio::test]
async fn test_remove_followers_uses_delete() {
    let (tools, seen) = opportunity_tools(vec![Ok(json!({}))]);

    tools
        .execute(
            "remove_opportunity_followers",
            json!({"opportunityId": "o1", "followers": ["u1"]}),
        )
        .await
        .unwrap();

    assert_eq!(only_request(&seen).method, Method::Delete);
}

#[tokio::test]
async fn test_get_pipelines_scoped_to_location() {
    let (tools, seen) = opportunity_tools(vec![Ok(json!({"pipelines": [{"id": "p1"}]}))]);

    let output = tools.execute("get_pipelines", json!({})).await.unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.path, "/opportunities/pipelines");
    assert_eq!(request.query_value("locationId"), Some(LOCATION));
    assert_eq!(message(&output), "Found 1 pipelines");
}

#[tokio::test]
async fn test_update_opportunity_sends_only_given_fields() {
    let (tools, seen) = opportunity_tools(vec![Ok(json!({"opportunity": {"id": "op1"}}))]);

    tools
        .execute(
            "update_opportunity",
            json!({"opportunityId": "op1", "status": "won", "monetaryValue": 5000}),
        )
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.path, "/opportunities/op1");
    assert_eq!(
        request.json_body(),
        Some(&json!({"status": "won", "monetaryValue": 5000}))
    );
}

#[tokio::test]
async fn test_delete_opportunity() {
    let (tools, seen) = opportunity_tools(vec![Ok(json!({}))]);

    let output = tools
        .execute("delete_opportunity", json!({"opportunityId": "op1"}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.path, "/opportunities/op1");
    assert_eq!(message(&output), "Opportunity op1 deleted");
}

#[tokio::test]
async fn test_add_opportunity_followers_body() {
    let (tools, seen) = opportunity_tools(vec![Ok(json!({"followers": ["u1", "u2"]}))]);

    let output = tools
        .execute(
            "add_opportunity_followers",
            json!({"opportunityId": "op1", "followers": ["u1", "u2"]}),
        )
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.path, "/opportunities/op1/followers");
    assert_eq!(request.json_body(), Some(&json!({"followers": ["u1", "u2"]})));
    assert_eq!(message(&output), "Added 2 followers to opportunity op1");
}
