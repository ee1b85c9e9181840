//! Product catalog tools: products, prices, inventory and collections.
//!
//! Prices are decimal dollars on the wire, unlike opportunity values.

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    Guidance, ToolError, ToolOutput, ToolResult, array_at, resolve_location, send, str_at, strip_nulls,
    unwrap_key,
};
use crate::client::{ApiRequest, Transport};
use crate::convert::format_dollars;

pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_OFFSET: u32 = 0;

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Digital,
    Physical,
    Service,
    #[serde(rename = "PHYSICAL/DIGITAL")]
    PhysicalDigital,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    OneTime,
    Recurring,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecurringInterval {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recurring {
    pub interval: RecurringInterval,
    #[schemars(description = "Number of intervals between charges (default: 1)")]
    pub interval_count: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
    #[schemars(description = "Product name")]
    pub name: String,
    pub description: Option<String>,
    pub product_type: ProductType,
    #[schemars(description = "Image URL")]
    pub image: Option<String>,
    #[schemars(description = "List the product in the online store")]
    pub available_in_store: Option<bool>,
    #[schemars(description = "Text shown on card statements")]
    pub statement_descriptor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsParams {
    pub location_id: Option<String>,
    #[schemars(description = "Search by product name")]
    pub search: Option<String>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductIdParams {
    #[schemars(description = "Product ID")]
    pub product_id: String,
    pub location_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductParams {
    #[schemars(description = "Product ID to update")]
    pub product_id: String,
    pub location_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub product_type: Option<ProductType>,
    pub image: Option<String>,
    pub available_in_store: Option<bool>,
    pub statement_descriptor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePriceParams {
    #[schemars(description = "Product the price belongs to")]
    pub product_id: String,
    pub location_id: Option<String>,
    #[schemars(description = "Price name, e.g. Monthly")]
    pub name: String,
    #[serde(rename = "type")]
    pub price_type: PriceType,
    #[schemars(description = "ISO currency code, e.g. USD")]
    pub currency: String,
    #[schemars(description = "Amount in dollars, e.g. 49.99")]
    pub amount: f64,
    #[schemars(description = "Billing interval; required for recurring prices")]
    pub recurring: Option<Recurring>,
    #[schemars(description = "Original price in dollars shown struck through")]
    pub compare_at_price: Option<f64>,
    #[schemars(description = "Trial length in days")]
    pub trial_period: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListPricesParams {
    #[schemars(description = "Product ID")]
    pub product_id: String,
    pub location_id: Option<String>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListInventoryParams {
    pub location_id: Option<String>,
    #[schemars(description = "Search by product or variant name")]
    pub search: Option<String>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionParams {
    pub location_id: Option<String>,
    #[schemars(description = "Collection name")]
    pub name: String,
    #[schemars(description = "URL slug")]
    pub slug: Option<String>,
    #[schemars(description = "Image URL")]
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListCollectionsParams {
    pub location_id: Option<String>,
    #[schemars(description = "Filter by collection name")]
    pub name: Option<String>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub offset: Option<u32>,
}

// =============================================================================
// Tool table
// =============================================================================

tool_module! {
    /// Product catalog tools.
    ProductTools, family = "products";
    "create_product" => create_product(CreateProductParams):
        "Create a product";
    "list_products" => list_products(ListProductsParams):
        "List products. Defaults: limit 10, offset 0.";
    "get_product" => get_product(ProductIdParams):
        "Get a product by ID";
    "update_product" => update_product(UpdateProductParams):
        "Update a product";
    "delete_product" => delete_product(ProductIdParams):
        "Delete a product";
    "create_price" => create_price(CreatePriceParams):
        "Add a price to a product. amount is in dollars (e.g. 49.99).";
    "list_prices" => list_prices(ListPricesParams):
        "List a product's prices";
    "list_inventory" => list_inventory(ListInventoryParams):
        "List inventory levels for products and variants";
    "create_product_collection" => create_product_collection(CreateCollectionParams):
        "Create a product collection";
    "list_product_collections" => list_product_collections(ListCollectionsParams):
        "List product collections";
}

fn paged(request: ApiRequest, limit: Option<u32>, offset: Option<u32>) -> ApiRequest {
    request
        .query("limit", limit.unwrap_or(DEFAULT_LIMIT))
        .query("offset", offset.unwrap_or(DEFAULT_OFFSET))
}

/// Total from either `total: n` or the catalog's `total: [{"total": n}]`.
fn total_of(response: &Value, fallback: usize) -> u64 {
    match response.get("total") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(fallback as u64),
        Some(Value::Array(entries)) => entries
            .first()
            .and_then(|entry| entry.get("total"))
            .and_then(Value::as_u64)
            .unwrap_or(fallback as u64),
        _ => fallback as u64,
    }
}

impl<T: Transport + 'static> ProductTools<T> {
    pub async fn create_product(&self, params: CreateProductParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_product", "create the product", "location")
            .validation("productType must be DIGITAL, PHYSICAL, SERVICE or PHYSICAL/DIGITAL and image must be a URL.");

        let location_id = resolve_location(&self.ctx, "create_product", params.location_id)?;
        let body = json!({
            "locationId": location_id,
            "name": params.name,
            "description": params.description,
            "productType": params.product_type,
            "image": params.image,
            "availableInStore": params.available_in_store,
            "statementDescriptor": params.statement_descriptor,
        });

        let product = send(
            &self.ctx,
            &GUIDE,
            None,
            ApiRequest::post("/products/").json(strip_nulls(body)),
        )
        .await?;
        let id = str_at(&product, &["_id", "id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!("Product '{}' created (ID: {id})", params.name))
            .with("product", product))
    }

    pub async fn list_products(&self, params: ListProductsParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("list_products", "list products", "location");

        let location_id = resolve_location(&self.ctx, "list_products", params.location_id)?;
        let request = paged(
            ApiRequest::get("/products/").query("locationId", &location_id),
            params.limit,
            params.offset,
        )
        .query_opt("search", params.search.as_deref());

        let response = send(&self.ctx, &GUIDE, Some(&location_id), request).await?;
        let products = array_at(&response, "products");
        let total = total_of(&response, products.len());

        Ok(ToolOutput::new(format!("Found {} products", products.len()))
            .with("total", total)
            .with("products", products))
    }

    pub async fn get_product(&self, params: ProductIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("get_product", "get the product", "product").lookup("list_products");

        let location_id = resolve_location(&self.ctx, "get_product", params.location_id)?;
        let product = send(
            &self.ctx,
            &GUIDE,
            Some(&params.product_id),
            ApiRequest::get(format!("/products/{}", params.product_id)).query("locationId", &location_id),
        )
        .await?;
        let name = str_at(&product, &["name"]).unwrap_or(&params.product_id).to_string();

        Ok(ToolOutput::new(format!("Retrieved product {name}")).with("product", product))
    }

    pub async fn update_product(&self, params: UpdateProductParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("update_product", "update the product", "product").lookup("list_products");

        let location_id = resolve_location(&self.ctx, "update_product", params.location_id)?;
        let body = json!({
            "locationId": location_id,
            "name": params.name,
            "description": params.description,
            "productType": params.product_type,
            "image": params.image,
            "availableInStore": params.available_in_store,
            "statementDescriptor": params.statement_descriptor,
        });

        let product = send(
            &self.ctx,
            &GUIDE,
            Some(&params.product_id),
            ApiRequest::put(format!("/products/{}", params.product_id)).json(strip_nulls(body)),
        )
        .await?;

        Ok(ToolOutput::new(format!("Product {} updated", params.product_id)).with("product", product))
    }

    pub async fn delete_product(&self, params: ProductIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("delete_product", "delete the product", "product").lookup("list_products");

        let location_id = resolve_location(&self.ctx, "delete_product", params.location_id)?;
        send(
            &self.ctx,
            &GUIDE,
            Some(&params.product_id),
            ApiRequest::delete(format!("/products/{}", params.product_id))
                .query("locationId", &location_id),
        )
        .await?;

        Ok(ToolOutput::new(format!("Product {} deleted", params.product_id))
            .with("productId", params.product_id))
    }

    pub async fn create_price(&self, params: CreatePriceParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_price", "create the price", "product")
            .lookup("list_products")
            .validation("amount is in dollars (49.99, not 4999), currency is a 3-letter code, and recurring prices need an interval.");

        if params.price_type == PriceType::Recurring && params.recurring.is_none() {
            return Err(ToolError::invalid(
                "create_price",
                "recurring prices need a recurring.interval",
            ));
        }
        let location_id = resolve_location(&self.ctx, "create_price", params.location_id)?;
        let body = json!({
            "locationId": location_id,
            "name": params.name,
            "type": params.price_type,
            "currency": params.currency,
            "amount": params.amount,
            "recurring": params.recurring,
            "compareAtPrice": params.compare_at_price,
            "trialPeriod": params.trial_period,
        });

        let price = send(
            &self.ctx,
            &GUIDE,
            Some(&params.product_id),
            ApiRequest::post(format!("/products/{}/price", params.product_id)).json(strip_nulls(body)),
        )
        .await?;
        let id = str_at(&price, &["_id", "id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!(
            "Price '{}' of {} {} created (ID: {id})",
            params.name,
            format_dollars(params.amount),
            params.currency
        ))
        .with("price", price))
    }

    pub async fn list_prices(&self, params: ListPricesParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("list_prices", "list prices", "product").lookup("list_products");

        let location_id = resolve_location(&self.ctx, "list_prices", params.location_id)?;
        let request = paged(
            ApiRequest::get(format!("/products/{}/price", params.product_id))
                .query("locationId", &location_id),
            params.limit,
            params.offset,
        );

        let response = send(&self.ctx, &GUIDE, Some(&params.product_id), request).await?;
        let prices = array_at(&response, "prices");
        let total = total_of(&response, prices.len());

        Ok(ToolOutput::new(format!(
            "Found {} prices for product {}",
            prices.len(),
            params.product_id
        ))
        .with("total", total)
        .with("prices", prices))
    }

    pub async fn list_inventory(&self, params: ListInventoryParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("list_inventory", "list inventory", "location");

        let location_id = resolve_location(&self.ctx, "list_inventory", params.location_id)?;
        let request = paged(
            ApiRequest::get("/products/inventory")
                .query("altId", &location_id)
                .query("altType", "location"),
            params.limit,
            params.offset,
        )
        .query_opt("search", params.search.as_deref());

        let response = send(&self.ctx, &GUIDE, Some(&location_id), request).await?;
        let inventory = array_at(&response, "inventory");
        let total = total_of(&response, inventory.len());

        Ok(ToolOutput::new(format!("Found {} inventory items", inventory.len()))
            .with("total", total)
            .with("inventory", inventory))
    }

    pub async fn create_product_collection(
        &self,
        params: CreateCollectionParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("create_product_collection", "create the collection", "location")
                .conflict("A collection with this slug already exists; choose another slug.");

        let location_id =
            resolve_location(&self.ctx, "create_product_collection", params.location_id)?;
        let body = json!({
            "altId": location_id,
            "altType": "location",
            "name": params.name,
            "slug": params.slug,
            "image": params.image,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            None,
            ApiRequest::post("/products/collections").json(strip_nulls(body)),
        )
        .await?;
        let collection = unwrap_key(response, "data");
        let id = str_at(&collection, &["_id", "id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!("Collection '{}' created (ID: {id})", params.name))
            .with("collection", collection))
    }

    pub async fn list_product_collections(
        &self,
        params: ListCollectionsParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("list_product_collections", "list collections", "location");

        let location_id =
            resolve_location(&self.ctx, "list_product_collections", params.location_id)?;
        let request = paged(
            ApiRequest::get("/products/collections")
                .query("altId", &location_id)
                .query("altType", "location"),
            params.limit,
            params.offset,
        )
        .query_opt("name", params.name.as_deref());

        let response = send(&self.ctx, &GUIDE, Some(&location_id), request).await?;
        let collections = array_at(&response, "data");
        let total = total_of(&response, collections.len());

        Ok(ToolOutput::new(format!("Found {} collections", collections.len()))
            .with("total", total)
            .with("collections", collections))
    }
}
