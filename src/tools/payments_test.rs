use serde_json::{Value, json};

use crate::client::{ApiResult, Method, MockTransport};
use crate::tools::ToolModule;
use crate::tools::payments::*;
use crate::tools::test_support::*;

fn payment_tools(responses: Vec<ApiResult<Value>>) -> (PaymentTools<MockTransport>, Recorded) {
    let (mock, seen) = recording(responses);
    (PaymentTools::new(context(mock)), seen)
}

#[tokio::test]
async fn test_listings_apply_default_paging_and_alt_scope() {
    for (tool, path) in [
        ("list_transactions", "/payments/transactions"),
        ("list_orders", "/payments/orders"),
        ("list_subscriptions", "/payments/subscriptions"),
        ("list_coupons", "/payments/coupon/list"),
    ] {
        let (tools, seen) = payment_tools(vec![Ok(json!({"data": [], "totalCount": 0}))]);

        tools.execute(tool, json!({})).await.unwrap();

        let request = only_request(&seen);
        assert_eq!(request.path, path, "{tool}");
        assert_eq!(request.query_value("limit"), Some("10"), "{tool}");
        assert_eq!(request.query_value("offset"), Some("0"), "{tool}");
        assert_eq!(request.query_value("altId"), Some(LOCATION), "{tool}");
        assert_eq!(request.query_value("altType"), Some("location"), "{tool}");
    }
}

#[tokio::test]
async fn test_list_transactions_counts_items() {
    let (tools, seen) = payment_tools(vec![Ok(json!({
        "data": [{"_id": "t1"}, {"_id": "t2"}, {"_id": "t3"}],
        "totalCount": 57
    }))]);

    let output = tools
        .execute(
            "list_transactions",
            json!({"contactId": "c1", "limit": 3, "offset": 6}),
        )
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.query_value("limit"), Some("3"));
    assert_eq!(request.query_value("offset"), Some("6"));
    assert_eq!(request.query_value("contactId"), Some("c1"));
    assert!(message(&output).contains('3'));
    assert_eq!(output.get("total").unwrap(), 57);
}

#[tokio::test]
async fn test_get_order_not_found_mentions_id() {
    let (tools, _) = payment_tools(vec![Err(status_error(404, "Order not found"))]);

    let err = tools
        .execute("get_order", json!({"id": "ord-404"}))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("ord-404"));
    assert!(err.to_string().contains("list_orders"));
}

#[tokio::test]
async fn test_create_amount_coupon_keeps_dollars() {
    let (tools, seen) = payment_tools(vec![Ok(json!({"data": {"_id": "cp1"}}))]);

    let output = tools
        .execute(
            "create_coupon",
            json!({
                "name": "Spring",
                "code": "SPRING10",
                "discountType": "amount",
                "discountValue": 10.5,
                "startDate": "2025-03-01T00:00:00Z"
            }),
        )
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Post);
    let body = request.json_body().unwrap();
    assert_eq!(body["discountValue"], 10.5);
    assert_eq!(body["altType"], "location");
    assert!(message(&output).contains("$10.50"));
    assert!(message(&output).contains("cp1"));
}

#[tokio::test]
async fn test_delete_coupon_sends_id_in_body() {
    let (tools, seen) = payment_tools(vec![Ok(json!({"success": true}))]);

    tools
        .execute("delete_coupon", json!({"id": "cp1"}))
        .await
        .unwrap();

    let request = only_request(&seen);
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.path, "/payments/coupon");
    assert_eq!(request.json_body().unwrap()["id"], "cp1");
}

#[tokio::test]
async fn test_permission_denied_guidance() {
    let (tools, _) = payment_tools(vec![Err(status_error(403, "scope missing"))]);

    let err = tools.execute("list_orders", json!({})).await.unwrap_err();

    assert!(err.to_string().contains("Permission denied"));
    assert!(err.to_string().contains("scope missing"));
}

#[tokio::test]
async fn test_record_lookups_are_alt_scoped() {
    let cases = [
        ("get_transaction", "/payments/transactions/rec1", "Retrieved transaction rec1"),
        ("get_subscription", "/payments/subscriptions/rec1", "Retrieved subscription rec1"),
    ];

    for (tool, path, summary) in cases {
        let (tools, seen) = payment_tools(vec![Ok(json!({"_id": "rec1"}))]);

        let output = tools.execute(tool, json!({"id": "rec1"})).await.unwrap();

        let request = only_request(&seen);
        assert_eq!(request.method, Method::Get, "{tool}");
        assert_eq!(request.path, path, "{tool}");
        assert_eq!(request.query_value("altId"), Some(LOCATION), "{tool}");
        assert_eq!(request.query_value("altType"), Some(ALT_TYPE), "{tool}");
        assert_eq!(message(&output), summary, "{tool}");
    }
}
