//! Store tools: shipping zones, rates, carriers and store settings.
//!
//! Store endpoints are scoped with `altId`/`altType` like payments. Rate
//! amounts are decimal dollars.

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    Guidance, ToolError, ToolOutput, ToolResult, array_at, resolve_location, send, str_at,
    strip_nulls, unwrap_key,
};
use crate::client::{ApiRequest, Transport};
use crate::convert::format_dollars;

pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_OFFSET: u32 = 0;
const ALT_TYPE: &str = "location";

const ZONE_HAS_RATES: &str = "The shipping zone still has active shipping rates. \
     Delete them with list_shipping_rates and delete_shipping_rate first.";

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StateCode {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneCountry {
    #[schemars(description = "ISO 3166-1 alpha-2 country code, e.g. US")]
    pub code: String,
    #[schemars(description = "Limit the zone to these states (all when omitted)")]
    pub states: Option<Vec<StateCode>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RateCondition {
    None,
    ByPrice,
    ByWeight,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateZoneParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
    pub name: String,
    pub countries: Vec<ZoneCountry>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListZonesParams {
    pub location_id: Option<String>,
    #[schemars(description = "Include each zone's rates")]
    pub with_shipping_rate: Option<bool>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneIdParams {
    pub location_id: Option<String>,
    #[schemars(description = "Shipping zone ID")]
    pub shipping_zone_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateZoneParams {
    pub location_id: Option<String>,
    #[schemars(description = "Shipping zone ID")]
    pub shipping_zone_id: String,
    pub name: Option<String>,
    pub countries: Option<Vec<ZoneCountry>>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRateParams {
    pub location_id: Option<String>,
    #[schemars(description = "Shipping zone ID")]
    pub shipping_zone_id: String,
    pub name: String,
    pub description: Option<String>,
    #[schemars(description = "Currency code, e.g. USD")]
    pub currency: String,
    #[schemars(description = "Rate in dollars, e.g. 4.99")]
    pub amount: f64,
    #[schemars(description = "none, by_price or by_weight")]
    pub condition_type: RateCondition,
    pub min_condition: Option<f64>,
    pub max_condition: Option<f64>,
    #[schemars(description = "Use a carrier-calculated rate")]
    pub is_carrier_rate: Option<bool>,
    pub shipping_carrier_id: Option<String>,
    #[schemars(description = "Markup on the carrier rate, in percent")]
    pub percentage_of_rate_fee: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListRatesParams {
    pub location_id: Option<String>,
    #[schemars(description = "Shipping zone ID")]
    pub shipping_zone_id: String,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateIdParams {
    pub location_id: Option<String>,
    #[schemars(description = "Shipping zone ID")]
    pub shipping_zone_id: String,
    #[schemars(description = "Shipping rate ID")]
    pub shipping_rate_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailableRatesParams {
    pub location_id: Option<String>,
    #[schemars(description = "Destination country code")]
    pub country: String,
    #[schemars(description = "Destination address (street, city, state, zip)")]
    pub address: Option<Value>,
    #[schemars(description = "Order total in dollars")]
    pub total_order_amount: f64,
    pub total_order_weight: f64,
    #[schemars(description = "Order lines: [{id, quantity}]")]
    pub products: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarrierService {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarrierParams {
    pub location_id: Option<String>,
    pub name: String,
    #[schemars(description = "Endpoint the store calls to quote rates")]
    pub callback_url: String,
    pub services: Option<Vec<CarrierService>>,
    pub allows_multiple_service_selection: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreLocationParams {
    pub location_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsParams {
    pub location_id: Option<String>,
    #[schemars(description = "Ship-from address")]
    pub shipping_origin: Value,
    #[schemars(description = "Order notification email settings")]
    pub store_order_notification: Option<Value>,
    #[schemars(description = "Fulfillment notification email settings")]
    pub store_order_fulfillment_notification: Option<Value>,
}

// =============================================================================
// Tool table
// =============================================================================

tool_module! {
    /// Store tools.
    StoreTools, family = "store";
    "create_shipping_zone" => create_shipping_zone(CreateZoneParams):
        "Create a shipping zone";
    "list_shipping_zones" => list_shipping_zones(ListZonesParams):
        "List shipping zones. Defaults: limit 10, offset 0.";
    "get_shipping_zone" => get_shipping_zone(ZoneIdParams):
        "Get a shipping zone by ID";
    "update_shipping_zone" => update_shipping_zone(UpdateZoneParams):
        "Update a shipping zone";
    "delete_shipping_zone" => delete_shipping_zone(ZoneIdParams):
        "Delete a shipping zone (it must have no rates)";
    "create_shipping_rate" => create_shipping_rate(CreateRateParams):
        "Add a shipping rate to a zone. Amount is in dollars.";
    "list_shipping_rates" => list_shipping_rates(ListRatesParams):
        "List the rates of a shipping zone";
    "delete_shipping_rate" => delete_shipping_rate(RateIdParams):
        "Delete a shipping rate";
    "get_available_shipping_rates" => get_available_shipping_rates(AvailableRatesParams):
        "Quote the shipping rates available for an order";
    "create_shipping_carrier" => create_shipping_carrier(CreateCarrierParams):
        "Register a shipping carrier";
    "list_shipping_carriers" => list_shipping_carriers(StoreLocationParams):
        "List shipping carriers";
    "get_store_settings" => get_store_settings(StoreLocationParams):
        "Get store settings";
    "update_store_settings" => update_store_settings(UpdateSettingsParams):
        "Create or update store settings";
}

fn scoped(request: ApiRequest, location_id: &str) -> ApiRequest {
    request.query("altId", location_id).query("altType", ALT_TYPE)
}

fn scoped_body(location_id: &str, mut body: Value) -> Value {
    body["altId"] = json!(location_id);
    body["altType"] = json!(ALT_TYPE);
    strip_nulls(body)
}

fn zone_path(zone_id: &str) -> String {
    format!("/store/shipping-zone/{zone_id}")
}

/// `(items, total)` from a `{data, total}` listing.
fn listing(response: &Value) -> (Vec<Value>, u64) {
    let items = array_at(response, "data");
    let total = response
        .get("total")
        .and_then(Value::as_u64)
        .unwrap_or(items.len() as u64);
    (items, total)
}

impl<T: Transport + 'static> StoreTools<T> {
    pub async fn create_shipping_zone(&self, params: CreateZoneParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_shipping_zone", "create the shipping zone", "location")
            .conflict("A shipping zone already covers one of these countries.")
            .validation("countries use ISO alpha-2 codes and states belong to their country.");

        if params.countries.is_empty() {
            return Err(ToolError::invalid(
                "create_shipping_zone",
                "countries must list at least one country",
            ));
        }
        let location_id = resolve_location(&self.ctx, "create_shipping_zone", params.location_id)?;
        let body = scoped_body(
            &location_id,
            json!({"name": params.name, "countries": params.countries}),
        );

        let response = send(
            &self.ctx,
            &GUIDE,
            None,
            ApiRequest::post("/store/shipping-zone").json(body),
        )
        .await?;
        let zone = unwrap_key(response, "data");
        let id = str_at(&zone, &["_id", "id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!(
            "Shipping zone '{}' created for {} countries (ID: {id})",
            params.name,
            params.countries.len()
        ))
        .with("shippingZone", zone))
    }

    pub async fn list_shipping_zones(&self, params: ListZonesParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("list_shipping_zones", "list shipping zones", "location");

        let location_id = resolve_location(&self.ctx, "list_shipping_zones", params.location_id)?;
        let request = scoped(ApiRequest::get("/store/shipping-zone"), &location_id)
            .query("limit", params.limit.unwrap_or(DEFAULT_LIMIT))
            .query("offset", params.offset.unwrap_or(DEFAULT_OFFSET))
            .query_opt("withShippingRate", params.with_shipping_rate);
        let response = send(&self.ctx, &GUIDE, Some(&location_id), request).await?;
        let (zones, total) = listing(&response);

        Ok(ToolOutput::new(format!("Found {} shipping zones", zones.len()))
            .with("total", total)
            .with("shippingZones", zones))
    }

    pub async fn get_shipping_zone(&self, params: ZoneIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_shipping_zone", "get the shipping zone", "shipping zone")
            .lookup("list_shipping_zones");

        let location_id = resolve_location(&self.ctx, "get_shipping_zone", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.shipping_zone_id),
            scoped(ApiRequest::get(zone_path(&params.shipping_zone_id)), &location_id),
        )
        .await?;

        Ok(ToolOutput::new(format!("Retrieved shipping zone {}", params.shipping_zone_id))
            .with("shippingZone", unwrap_key(response, "data")))
    }

    pub async fn update_shipping_zone(&self, params: UpdateZoneParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("update_shipping_zone", "update the shipping zone", "shipping zone")
            .lookup("list_shipping_zones")
            .conflict("A shipping zone already covers one of these countries.");

        let location_id = resolve_location(&self.ctx, "update_shipping_zone", params.location_id)?;
        let body = scoped_body(
            &location_id,
            json!({"name": params.name, "countries": params.countries}),
        );

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.shipping_zone_id),
            ApiRequest::put(zone_path(&params.shipping_zone_id)).json(body),
        )
        .await?;

        Ok(ToolOutput::new(format!("Shipping zone {} updated", params.shipping_zone_id))
            .with("shippingZone", unwrap_key(response, "data")))
    }

    pub async fn delete_shipping_zone(&self, params: ZoneIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("delete_shipping_zone", "delete the shipping zone", "shipping zone")
            .lookup("list_shipping_zones")
            .conflict(ZONE_HAS_RATES);

        let location_id = resolve_location(&self.ctx, "delete_shipping_zone", params.location_id)?;
        send(
            &self.ctx,
            &GUIDE,
            Some(&params.shipping_zone_id),
            scoped(ApiRequest::delete(zone_path(&params.shipping_zone_id)), &location_id),
        )
        .await?;

        Ok(ToolOutput::new(format!("Shipping zone {} deleted", params.shipping_zone_id))
            .with("shippingZoneId", params.shipping_zone_id))
    }

    pub async fn create_shipping_rate(&self, params: CreateRateParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_shipping_rate", "create the shipping rate", "shipping zone")
            .lookup("list_shipping_zones")
            .validation("amount is in dollars, by_price and by_weight need minCondition, and carrier rates need shippingCarrierId.");

        if params.amount < 0.0 {
            return Err(ToolError::invalid("create_shipping_rate", "amount cannot be negative"));
        }
        let location_id = resolve_location(&self.ctx, "create_shipping_rate", params.location_id)?;
        let body = scoped_body(
            &location_id,
            json!({
                "name": params.name,
                "description": params.description,
                "currency": params.currency,
                "amount": params.amount,
                "conditionType": params.condition_type,
                "minCondition": params.min_condition,
                "maxCondition": params.max_condition,
                "isCarrierRate": params.is_carrier_rate,
                "shippingCarrierId": params.shipping_carrier_id,
                "percentageOfRateFee": params.percentage_of_rate_fee,
            }),
        );

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.shipping_zone_id),
            ApiRequest::post(format!("{}/shipping-rate", zone_path(&params.shipping_zone_id)))
                .json(body),
        )
        .await?;

        Ok(ToolOutput::new(format!(
            "Shipping rate '{}' ({}) added to zone {}",
            params.name,
            format_dollars(params.amount),
            params.shipping_zone_id
        ))
        .with("shippingRate", unwrap_key(response, "data")))
    }

    pub async fn list_shipping_rates(&self, params: ListRatesParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("list_shipping_rates", "list shipping rates", "shipping zone")
            .lookup("list_shipping_zones");

        let location_id = resolve_location(&self.ctx, "list_shipping_rates", params.location_id)?;
        let request = scoped(
            ApiRequest::get(format!("{}/shipping-rate", zone_path(&params.shipping_zone_id))),
            &location_id,
        )
        .query("limit", params.limit.unwrap_or(DEFAULT_LIMIT))
        .query("offset", params.offset.unwrap_or(DEFAULT_OFFSET));
        let response = send(&self.ctx, &GUIDE, Some(&params.shipping_zone_id), request).await?;
        let (rates, total) = listing(&response);

        Ok(ToolOutput::new(format!(
            "Found {} shipping rates in zone {}",
            rates.len(),
            params.shipping_zone_id
        ))
        .with("total", total)
        .with("shippingRates", rates))
    }

    pub async fn delete_shipping_rate(&self, params: RateIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("delete_shipping_rate", "delete the shipping rate", "shipping rate")
            .lookup("list_shipping_rates");

        let location_id = resolve_location(&self.ctx, "delete_shipping_rate", params.location_id)?;
        send(
            &self.ctx,
            &GUIDE,
            Some(&params.shipping_rate_id),
            scoped(
                ApiRequest::delete(format!(
                    "{}/shipping-rate/{}",
                    zone_path(&params.shipping_zone_id),
                    params.shipping_rate_id
                )),
                &location_id,
            ),
        )
        .await?;

        Ok(ToolOutput::new(format!("Shipping rate {} deleted", params.shipping_rate_id))
            .with("shippingRateId", params.shipping_rate_id))
    }

    pub async fn get_available_shipping_rates(
        &self,
        params: AvailableRatesParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_available_shipping_rates", "quote shipping rates", "location")
            .validation("country is an ISO alpha-2 code and products reference existing product IDs.");

        let location_id =
            resolve_location(&self.ctx, "get_available_shipping_rates", params.location_id)?;
        let body = scoped_body(
            &location_id,
            json!({
                "country": params.country,
                "address": params.address,
                "totalOrderAmount": params.total_order_amount,
                "totalOrderWeight": params.total_order_weight,
                "products": params.products,
            }),
        );

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::post("/store/shipping-zone/shipping-rates").json(body),
        )
        .await?;
        let rates = array_at(&response, "data");

        Ok(ToolOutput::new(format!(
            "{} shipping rates available to {}",
            rates.len(),
            params.country
        ))
        .with("shippingRates", rates))
    }

    pub async fn create_shipping_carrier(
        &self,
        params: CreateCarrierParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_shipping_carrier", "create the shipping carrier", "location")
            .validation("callbackUrl must be a reachable HTTPS URL.");

        let location_id =
            resolve_location(&self.ctx, "create_shipping_carrier", params.location_id)?;
        let body = scoped_body(
            &location_id,
            json!({
                "name": params.name,
                "callbackUrl": params.callback_url,
                "services": params.services,
                "allowsMultipleServiceSelection": params.allows_multiple_service_selection,
            }),
        );

        let response = send(
            &self.ctx,
            &GUIDE,
            None,
            ApiRequest::post("/store/shipping-carrier").json(body),
        )
        .await?;

        Ok(ToolOutput::new(format!("Shipping carrier '{}' created", params.name))
            .with("shippingCarrier", unwrap_key(response, "data")))
    }

    pub async fn list_shipping_carriers(
        &self,
        params: StoreLocationParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("list_shipping_carriers", "list shipping carriers", "location");

        let location_id =
            resolve_location(&self.ctx, "list_shipping_carriers", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            scoped(ApiRequest::get("/store/shipping-carrier"), &location_id),
        )
        .await?;
        let carriers = array_at(&response, "data");

        Ok(ToolOutput::new(format!("Found {} shipping carriers", carriers.len()))
            .with("shippingCarriers", carriers))
    }

    pub async fn get_store_settings(&self, params: StoreLocationParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_store_settings", "get store settings", "location");

        let location_id = resolve_location(&self.ctx, "get_store_settings", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            scoped(ApiRequest::get("/store/store-setting"), &location_id),
        )
        .await?;

        Ok(ToolOutput::new("Retrieved store settings")
            .with("settings", unwrap_key(response, "data")))
    }

    pub async fn update_store_settings(
        &self,
        params: UpdateSettingsParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("update_store_settings", "update store settings", "location")
            .validation("shippingOrigin needs name, country, street1, city and zip.");

        let location_id =
            resolve_location(&self.ctx, "update_store_settings", params.location_id)?;
        let body = scoped_body(
            &location_id,
            json!({
                "shippingOrigin": params.shipping_origin,
                "storeOrderNotification": params.store_order_notification,
                "storeOrderFulfillmentNotification": params.store_order_fulfillment_notification,
            }),
        );

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::post("/store/store-setting").json(body),
        )
        .await?;

        Ok(ToolOutput::new("Store settings updated")
            .with("settings", unwrap_key(response, "data")))
    }
}
