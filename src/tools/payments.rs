//! Payment tools: transactions, orders, subscriptions and coupons.
//!
//! Every payments endpoint is scoped by `altId`/`altType` instead of
//! `locationId`; tools always scope to a location.

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    Guidance, ToolOutput, ToolResult, array_at, resolve_location, send, str_at, strip_nulls,
    unwrap_key,
};
use crate::client::{ApiRequest, Transport};
use crate::convert::format_dollars;

pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_OFFSET: u32 = 0;
pub const ALT_TYPE: &str = "location";

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
    #[schemars(description = "Only transactions for this contact")]
    pub contact_id: Option<String>,
    #[schemars(description = "Only transactions for this subscription")]
    pub subscription_id: Option<String>,
    #[schemars(description = "live or test")]
    pub payment_mode: Option<String>,
    #[schemars(description = "Range start (YYYY-MM-DD)")]
    pub start_at: Option<String>,
    #[schemars(description = "Range end (YYYY-MM-DD)")]
    pub end_at: Option<String>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersParams {
    pub location_id: Option<String>,
    pub contact_id: Option<String>,
    #[schemars(description = "Order status filter, e.g. completed or pending")]
    pub status: Option<String>,
    pub payment_mode: Option<String>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListSubscriptionsParams {
    pub location_id: Option<String>,
    pub contact_id: Option<String>,
    #[schemars(description = "Product or price the subscription is for")]
    pub entity_id: Option<String>,
    pub payment_mode: Option<String>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListCouponsParams {
    pub location_id: Option<String>,
    #[schemars(description = "scheduled, active or expired")]
    pub status: Option<String>,
    #[schemars(description = "Search by name or code")]
    pub search: Option<String>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecordParams {
    #[schemars(description = "Record ID")]
    pub id: String,
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Amount,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponParams {
    pub location_id: Option<String>,
    #[schemars(description = "Coupon name")]
    pub name: String,
    #[schemars(description = "Code customers enter at checkout")]
    pub code: String,
    pub discount_type: DiscountType,
    #[schemars(description = "Percent off, or amount off in dollars (e.g. 10.5)")]
    pub discount_value: f64,
    #[schemars(description = "Start date (ISO-8601)")]
    pub start_date: String,
    #[schemars(description = "End date (ISO-8601)")]
    pub end_date: Option<String>,
    #[schemars(description = "Maximum number of redemptions")]
    pub usage_limit: Option<u32>,
    #[schemars(description = "Restrict to these product IDs")]
    pub product_ids: Option<Vec<String>>,
    pub apply_to_future_payments: Option<bool>,
}

// =============================================================================
// Tool table
// =============================================================================

tool_module! {
    /// Payment tools.
    PaymentTools, family = "payments";
    "list_transactions" => list_transactions(ListTransactionsParams):
        "List payment transactions. Defaults: limit 10, offset 0.";
    "get_transaction" => get_transaction(PaymentRecordParams):
        "Get a transaction by ID";
    "list_orders" => list_orders(ListOrdersParams):
        "List orders. Defaults: limit 10, offset 0.";
    "get_order" => get_order(PaymentRecordParams):
        "Get an order by ID";
    "list_subscriptions" => list_subscriptions(ListSubscriptionsParams):
        "List subscriptions. Defaults: limit 10, offset 0.";
    "get_subscription" => get_subscription(PaymentRecordParams):
        "Get a subscription by ID";
    "list_coupons" => list_coupons(ListCouponsParams):
        "List coupons. Defaults: limit 10, offset 0.";
    "create_coupon" => create_coupon(CreateCouponParams):
        "Create a percentage or fixed-amount coupon";
    "delete_coupon" => delete_coupon(PaymentRecordParams):
        "Delete a coupon";
}

fn scoped(request: ApiRequest, location_id: &str) -> ApiRequest {
    request.query("altId", location_id).query("altType", ALT_TYPE)
}

fn paged(request: ApiRequest, limit: Option<u32>, offset: Option<u32>) -> ApiRequest {
    request
        .query("limit", limit.unwrap_or(DEFAULT_LIMIT))
        .query("offset", offset.unwrap_or(DEFAULT_OFFSET))
}

/// `(items, total)` from a `{data, totalCount}` listing.
fn listing(response: &Value) -> (Vec<Value>, u64) {
    let items = array_at(response, "data");
    let total = response
        .get("totalCount")
        .and_then(Value::as_u64)
        .unwrap_or(items.len() as u64);
    (items, total)
}

impl<T: Transport + 'static> PaymentTools<T> {
    pub async fn list_transactions(
        &self,
        params: ListTransactionsParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("list_transactions", "list transactions", "location")
            .validation("startAt/endAt must be YYYY-MM-DD and paymentMode is live or test.");

        let location_id = resolve_location(&self.ctx, "list_transactions", params.location_id)?;
        let request = paged(
            scoped(ApiRequest::get("/payments/transactions"), &location_id),
            params.limit,
            params.offset,
        )
        .query_opt("contactId", params.contact_id.as_deref())
        .query_opt("subscriptionId", params.subscription_id.as_deref())
        .query_opt("paymentMode", params.payment_mode.as_deref())
        .query_opt("startAt", params.start_at.as_deref())
        .query_opt("endAt", params.end_at.as_deref());

        let response = send(&self.ctx, &GUIDE, Some(&location_id), request).await?;
        let (transactions, total) = listing(&response);

        Ok(ToolOutput::new(format!("Found {} transactions", transactions.len()))
            .with("total", total)
            .with("transactions", transactions))
    }

    pub async fn get_transaction(&self, params: PaymentRecordParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_transaction", "get the transaction", "transaction")
            .lookup("list_transactions");

        let location_id = resolve_location(&self.ctx, "get_transaction", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.id),
            scoped(
                ApiRequest::get(format!("/payments/transactions/{}", params.id)),
                &location_id,
            ),
        )
        .await?;

        Ok(ToolOutput::new(format!("Retrieved transaction {}", params.id))
            .with("transaction", response))
    }

    pub async fn list_orders(&self, params: ListOrdersParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("list_orders", "list orders", "location");

        let location_id = resolve_location(&self.ctx, "list_orders", params.location_id)?;
        let request = paged(
            scoped(ApiRequest::get("/payments/orders"), &location_id),
            params.limit,
            params.offset,
        )
        .query_opt("contactId", params.contact_id.as_deref())
        .query_opt("status", params.status.as_deref())
        .query_opt("paymentMode", params.payment_mode.as_deref());

        let response = send(&self.ctx, &GUIDE, Some(&location_id), request).await?;
        let (orders, total) = listing(&response);

        Ok(ToolOutput::new(format!("Found {} orders", orders.len()))
            .with("total", total)
            .with("orders", orders))
    }

    pub async fn get_order(&self, params: PaymentRecordParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("get_order", "get the order", "order").lookup("list_orders");

        let location_id = resolve_location(&self.ctx, "get_order", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.id),
            scoped(ApiRequest::get(format!("/payments/orders/{}", params.id)), &location_id),
        )
        .await?;

        Ok(ToolOutput::new(format!("Retrieved order {}", params.id)).with("order", response))
    }

    pub async fn list_subscriptions(
        &self,
        params: ListSubscriptionsParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("list_subscriptions", "list subscriptions", "location");

        let location_id = resolve_location(&self.ctx, "list_subscriptions", params.location_id)?;
        let request = paged(
            scoped(ApiRequest::get("/payments/subscriptions"), &location_id),
            params.limit,
            params.offset,
        )
        .query_opt("contactId", params.contact_id.as_deref())
        .query_opt("entityId", params.entity_id.as_deref())
        .query_opt("paymentMode", params.payment_mode.as_deref());

        let response = send(&self.ctx, &GUIDE, Some(&location_id), request).await?;
        let (subscriptions, total) = listing(&response);

        Ok(ToolOutput::new(format!("Found {} subscriptions", subscriptions.len()))
            .with("total", total)
            .with("subscriptions", subscriptions))
    }

    pub async fn get_subscription(&self, params: PaymentRecordParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_subscription", "get the subscription", "subscription")
            .lookup("list_subscriptions");

        let location_id = resolve_location(&self.ctx, "get_subscription", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.id),
            scoped(
                ApiRequest::get(format!("/payments/subscriptions/{}", params.id)),
                &location_id,
            ),
        )
        .await?;

        Ok(ToolOutput::new(format!("Retrieved subscription {}", params.id))
            .with("subscription", response))
    }

    pub async fn list_coupons(&self, params: ListCouponsParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("list_coupons", "list coupons", "location");

        let location_id = resolve_location(&self.ctx, "list_coupons", params.location_id)?;
        let request = paged(
            scoped(ApiRequest::get("/payments/coupon/list"), &location_id),
            params.limit,
            params.offset,
        )
        .query_opt("status", params.status.as_deref())
        .query_opt("search", params.search.as_deref());

        let response = send(&self.ctx, &GUIDE, Some(&location_id), request).await?;
        let (coupons, total) = listing(&response);

        Ok(ToolOutput::new(format!("Found {} coupons", coupons.len()))
            .with("total", total)
            .with("coupons", coupons))
    }

    pub async fn create_coupon(&self, params: CreateCouponParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_coupon", "create the coupon", "location")
            .conflict("A coupon with this code already exists; pick a different code.")
            .validation("percentage discounts are 0-100, amount discounts are dollars, and startDate is ISO-8601.");

        let location_id = resolve_location(&self.ctx, "create_coupon", params.location_id)?;
        let body = json!({
            "altId": location_id,
            "altType": ALT_TYPE,
            "name": params.name,
            "code": params.code,
            "discountType": params.discount_type,
            "discountValue": params.discount_value,
            "startDate": params.start_date,
            "endDate": params.end_date,
            "usageLimit": params.usage_limit,
            "productIds": params.product_ids,
            "applyToFuturePayments": params.apply_to_future_payments,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            None,
            ApiRequest::post("/payments/coupon").json(strip_nulls(body)),
        )
        .await?;
        let coupon = unwrap_key(response, "data");
        let id = str_at(&coupon, &["_id", "id"]).unwrap_or("unknown").to_string();

        let discount = match params.discount_type {
            DiscountType::Percentage => format!("{}%", params.discount_value),
            DiscountType::Amount => format_dollars(params.discount_value),
        };
        Ok(ToolOutput::new(format!(
            "Coupon {} ({discount} off) created (ID: {id})",
            params.code
        ))
        .with("coupon", coupon))
    }

    pub async fn delete_coupon(&self, params: PaymentRecordParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("delete_coupon", "delete the coupon", "coupon").lookup("list_coupons");

        let location_id = resolve_location(&self.ctx, "delete_coupon", params.location_id)?;
        send(
            &self.ctx,
            &GUIDE,
            Some(&params.id),
            ApiRequest::delete("/payments/coupon").json(json!({
                "altId": location_id,
                "altType": ALT_TYPE,
                "id": params.id,
            })),
        )
        .await?;

        Ok(ToolOutput::new(format!("Coupon {} deleted", params.id)).with("couponId", params.id))
    }
}
