use serde_json::{Value, json};

use crate::client::{ApiResult, Method, MockTransport};
use crate::tools::social::*;
use crate::tools::test_support::*;
use crate::tools::{ToolError, ToolModule};

fn social_tools(responses: Vec<ApiResult<Value>>) -> (SocialMediaTools<MockTransport>, Recorded) {
    let (mock, seen) = recording(responses);
    (SocialMediaTools::new(context(mock)), seen)
}

#[tokio::test]
async fn test_search_posts_sends_string_paging() {
    let (tools, seen) = social_tools(vec![Ok(json!({
        "results": {"posts": [{"_id": "p1"}, {"_id": "p2"}], "count": 12}
    }))]);

    let output = tools
        .execute("search_social_posts", json!({"type": "scheduled", "accounts": ["a1", "a2"]}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.path, format!("/social-media-posting/{LOCATION}/posts/list"));
    let body = request.json_body().unwrap();
    assert_eq!(body["skip"], "0");
    assert_eq!(body["limit"], "10");
    assert_eq!(body["type"], "scheduled");
    assert_eq!(body["accounts"], "a1,a2");
    assert!(body.get("fromDate").is_none());
    assert_eq!(message(&output), "Found 2 social posts");
    assert_eq!(output.get("total"), Some(&json!(12)));
}

#[tokio::test]
async fn test_create_post_defaults_to_draft() {
    let (tools, seen) = social_tools(vec![Ok(json!({
        "results": {"post": {"_id": "p9", "status": "draft"}}
    }))]);

    let output = tools
        .execute(
            "create_social_post",
            json!({"accountIds": ["a1"], "summary": "Open house this Saturday"}),
        )
        .await
        .unwrap();

    let body = only_request(&seen).json_body().unwrap().clone();
    assert_eq!(body["status"], "draft");
    assert_eq!(body["type"], "post");
    assert!(message(&output).contains("p9"));
}

#[tokio::test]
async fn test_scheduled_post_requires_date() {
    let (tools, seen) = social_tools(vec![]);

    let err = tools
        .execute(
            "create_social_post",
            json!({"accountIds": ["a1"], "summary": "hi", "status": "scheduled"}),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::InvalidArguments { .. }));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_bulk_delete_reports_count() {
    let (tools, seen) = social_tools(vec![Ok(json!({"results": {"deletedCount": 3}}))]);

    let output = tools
        .execute("bulk_delete_social_posts", json!({"postIds": ["p1", "p2", "p3"]}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(
        request.path,
        format!("/social-media-posting/{LOCATION}/posts/bulk-delete")
    );
    assert_eq!(message(&output), "Deleted 3 social posts");
}

#[tokio::test]
async fn test_bulk_delete_rejects_empty_list() {
    let (tools, _) = social_tools(vec![]);

    let err = tools
        .execute("bulk_delete_social_posts", json!({"postIds": []}))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::InvalidArguments { .. }));
}

#[tokio::test]
async fn test_accounts_and_groups_listed() {
    let (tools, _) = social_tools(vec![Ok(json!({
        "results": {"accounts": [{"id": "a1"}, {"id": "a2"}], "groups": [{"id": "g1"}]}
    }))]);

    let output = tools.execute("get_social_accounts", json!({})).await.unwrap();

    assert_eq!(message(&output), "Found 2 social accounts in 1 groups");
}

#[tokio::test]
async fn test_oauth_start_uses_platform_path() {
    let (tools, seen) = social_tools(vec![Ok(json!({"url": "https://auth.example"}))]);

    tools
        .execute(
            "start_social_oauth",
            json!({"platform": "tiktok-business", "userId": "u1"}),
        )
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.path, "/social-media-posting/oauth/tiktok-business/start");
    assert_eq!(request.query_value("locationId"), Some(LOCATION));
    assert_eq!(request.query_value("userId"), Some("u1"));
}

#[tokio::test]
async fn test_get_post_not_found_points_to_search() {
    let (tools, _) = social_tools(vec![Err(status_error(404, "Post not found"))]);

    let err = tools
        .execute("get_social_post", json!({"postId": "p-gone"}))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("p-gone"));
    assert!(err.to_string().contains("search_social_posts"));
}

#[tokio::test]
async fn test_tags_paging_defaults() {
    let (tools, seen) = social_tools(vec![Ok(json!({"results": {"tags": [{"_id": "t1"}]}}))]);

    tools.execute("get_social_tags", json!({})).await.unwrap();

    let request = only_request(&seen);
    assert_eq!(request.query_value("skip"), Some("0"));
    assert_eq!(request.query_value("limit"), Some("10"));
    assert_eq!(request.query_value("searchText"), None);
}

#[tokio::test]
async fn test_update_social_post_body() {
    let (tools, seen) = social_tools(vec![Ok(json!({"results": {"post": {"_id": "post1"}}}))]);

    let output = tools
        .execute(
            "update_social_post",
            json!({"postId": "post1", "summary": "Open house Saturday", "type": "post"}),
        )
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.path, format!("/social-media-posting/{LOCATION}/posts/post1"));
    assert_eq!(
        request.json_body(),
        Some(&json!({"summary": "Open house Saturday", "type": "post"}))
    );
    assert_eq!(message(&output), "Social post post1 updated");
}

#[tokio::test]
async fn test_delete_social_post() {
    let (tools, seen) = social_tools(vec![Ok(json!({}))]);

    tools
        .execute("delete_social_post", json!({"postId": "post1"}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.path, format!("/social-media-posting/{LOCATION}/posts/post1"));
}

#[tokio::test]
async fn test_delete_social_account_passes_owner_query() {
    let (tools, seen) = social_tools(vec![Ok(json!({}))]);

    let output = tools
        .execute(
            "delete_social_account",
            json!({"accountId": "acc1", "companyId": "co-1", "userId": "u1"}),
        )
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.path, format!("/social-media-posting/{LOCATION}/accounts/acc1"));
    assert_eq!(request.query_value("companyId"), Some("co-1"));
    assert_eq!(request.query_value("userId"), Some("u1"));
    assert_eq!(message(&output), "Social account acc1 disconnected");
}

#[tokio::test]
async fn test_get_social_categories_string_paging() {
    let (tools, seen) = social_tools(vec![Ok(json!({"results": {"categories": [{"_id": "cat1"}]}}))]);

    let output = tools
        .execute("get_social_categories", json!({"searchText": "promo"}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.path, format!("/social-media-posting/{LOCATION}/categories"));
    assert_eq!(request.query_value("searchText"), Some("promo"));
    assert_eq!(request.query_value("skip"), Some("0"));
    assert_eq!(request.query_value("limit"), Some("10"));
    assert_eq!(message(&output), "Found 1 categories");
}
