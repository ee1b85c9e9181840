//! Location (sub-account) tools: lookup, tags, custom fields and values.

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    Guidance, ToolError, ToolOutput, ToolResult, array_at, resolve_location, send, str_at,
    strip_nulls, unwrap_key, wire_str,
};
use crate::client::{ApiRequest, Transport};

pub const DEFAULT_SKIP: u32 = 0;
pub const DEFAULT_LIMIT: u32 = 10;

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchLocationsParams {
    #[schemars(description = "Agency company ID (defaults to the configured company)")]
    pub company_id: Option<String>,
    #[schemars(description = "Filter by location email")]
    pub email: Option<String>,
    #[schemars(description = "asc or desc")]
    pub order: Option<String>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub skip: Option<u32>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationIdParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagParams {
    pub location_id: Option<String>,
    #[schemars(description = "Tag name")]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTagParams {
    pub location_id: Option<String>,
    #[schemars(description = "Tag ID")]
    pub tag_id: String,
    #[schemars(description = "New tag name")]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagIdParams {
    pub location_id: Option<String>,
    #[schemars(description = "Tag ID")]
    pub tag_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldModel {
    Contact,
    Opportunity,
    All,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetCustomFieldsParams {
    pub location_id: Option<String>,
    #[schemars(description = "Which object's fields to list (default: all)")]
    pub model: Option<CustomFieldModel>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomFieldParams {
    pub location_id: Option<String>,
    #[schemars(description = "Field label")]
    pub name: String,
    #[schemars(description = "TEXT, LARGE_TEXT, NUMERICAL, PHONE, MONETORY, CHECKBOX, SINGLE_OPTIONS, MULTIPLE_OPTIONS, DATE, FILE_UPLOAD, ...")]
    pub data_type: String,
    pub placeholder: Option<String>,
    pub position: Option<u32>,
    #[schemars(description = "contact or opportunity (default: contact)")]
    pub model: Option<CustomFieldModel>,
    #[schemars(description = "Choices for option-type fields")]
    pub options: Option<Vec<String>>,
}

// =============================================================================
// Tool table
// =============================================================================

tool_module! {
    /// Location tools.
    LocationTools, family = "locations";
    "search_locations" => search_locations(SearchLocationsParams):
        "Search locations under the agency. Defaults: skip 0, limit 10.";
    "get_location" => get_location(LocationIdParams):
        "Get location details";
    "get_location_tags" => get_location_tags(LocationIdParams):
        "List tags defined in a location";
    "create_location_tag" => create_location_tag(CreateTagParams):
        "Create a tag in a location";
    "update_location_tag" => update_location_tag(UpdateTagParams):
        "Rename a location tag";
    "delete_location_tag" => delete_location_tag(TagIdParams):
        "Delete a location tag";
    "get_location_custom_fields" => get_location_custom_fields(GetCustomFieldsParams):
        "List custom field definitions";
    "create_location_custom_field" => create_location_custom_field(CreateCustomFieldParams):
        "Create a custom field";
    "get_location_custom_values" => get_location_custom_values(LocationIdParams):
        "List custom values (location-wide merge fields)";
    "get_timezones" => get_timezones(LocationIdParams):
        "List timezones available to a location";
}

impl<T: Transport + 'static> LocationTools<T> {
    pub async fn search_locations(&self, params: SearchLocationsParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("search_locations", "search locations", "company");

        let company_id = params
            .company_id
            .filter(|id| !id.trim().is_empty())
            .or_else(|| self.ctx.default_company_id().map(str::to_string))
            .ok_or_else(|| {
                ToolError::invalid(
                    "search_locations",
                    "companyId is required: pass it explicitly or configure GHL_COMPANY_ID",
                )
            })?;

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&company_id),
            ApiRequest::get("/locations/search")
                .query("companyId", &company_id)
                .query("skip", params.skip.unwrap_or(DEFAULT_SKIP))
                .query("limit", params.limit.unwrap_or(DEFAULT_LIMIT))
                .query_opt("order", params.order.as_deref())
                .query_opt("email", params.email.as_deref()),
        )
        .await?;
        let locations = array_at(&response, "locations");

        Ok(ToolOutput::new(format!("Found {} locations", locations.len()))
            .with("locations", locations))
    }

    pub async fn get_location(&self, params: LocationIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("get_location", "get the location", "location").lookup("search_locations");

        let location_id = resolve_location(&self.ctx, "get_location", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get(format!("/locations/{location_id}")),
        )
        .await?;
        let location = unwrap_key(response, "location");
        let name = str_at(&location, &["name"]).unwrap_or(&location_id).to_string();

        Ok(ToolOutput::new(format!("Retrieved location {name}")).with("location", location))
    }

    pub async fn get_location_tags(&self, params: LocationIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_location_tags", "list tags", "location")
            .lookup("search_locations");

        let location_id = resolve_location(&self.ctx, "get_location_tags", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get(format!("/locations/{location_id}/tags")),
        )
        .await?;
        let tags = array_at(&response, "tags");

        Ok(ToolOutput::new(format!("Found {} tags", tags.len())).with("tags", tags))
    }

    pub async fn create_location_tag(&self, params: CreateTagParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_location_tag", "create the tag", "location")
            .conflict("A tag with this name already exists.");

        let location_id = resolve_location(&self.ctx, "create_location_tag", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::post(format!("/locations/{location_id}/tags")).json(json!({"name": params.name})),
        )
        .await?;
        let tag = unwrap_key(response, "tag");
        let id = str_at(&tag, &["id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!("Tag '{}' created (ID: {id})", params.name)).with("tag", tag))
    }

    pub async fn update_location_tag(&self, params: UpdateTagParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("update_location_tag", "rename the tag", "tag")
            .lookup("get_location_tags")
            .conflict("A tag with this name already exists.");

        let location_id = resolve_location(&self.ctx, "update_location_tag", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.tag_id),
            ApiRequest::put(format!("/locations/{location_id}/tags/{}", params.tag_id))
                .json(json!({"name": params.name})),
        )
        .await?;

        Ok(ToolOutput::new(format!("Tag {} renamed to '{}'", params.tag_id, params.name))
            .with("tag", unwrap_key(response, "tag")))
    }

    pub async fn delete_location_tag(&self, params: TagIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("delete_location_tag", "delete the tag", "tag")
            .lookup("get_location_tags");

        let location_id = resolve_location(&self.ctx, "delete_location_tag", params.location_id)?;
        send(
            &self.ctx,
            &GUIDE,
            Some(&params.tag_id),
            ApiRequest::delete(format!("/locations/{location_id}/tags/{}", params.tag_id)),
        )
        .await?;

        Ok(ToolOutput::new(format!("Tag {} deleted", params.tag_id)).with("tagId", params.tag_id))
    }

    pub async fn get_location_custom_fields(
        &self,
        params: GetCustomFieldsParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("get_location_custom_fields", "list custom fields", "location")
                .lookup("search_locations");

        let location_id =
            resolve_location(&self.ctx, "get_location_custom_fields", params.location_id)?;
        let model = params.model.as_ref().map(wire_str);
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get(format!("/locations/{location_id}/customFields")).query_opt("model", model),
        )
        .await?;
        let fields = array_at(&response, "customFields");

        Ok(ToolOutput::new(format!("Found {} custom fields", fields.len()))
            .with("customFields", fields))
    }

    pub async fn create_location_custom_field(
        &self,
        params: CreateCustomFieldParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("create_location_custom_field", "create the custom field", "location")
                .conflict("A custom field with this name already exists.")
                .validation("dataType must be one of the documented field types and option fields need options.");

        let location_id =
            resolve_location(&self.ctx, "create_location_custom_field", params.location_id)?;
        let body = json!({
            "name": params.name,
            "dataType": params.data_type,
            "placeholder": params.placeholder,
            "position": params.position,
            "model": params.model,
            "options": params.options,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::post(format!("/locations/{location_id}/customFields")).json(strip_nulls(body)),
        )
        .await?;
        let field = unwrap_key(response, "customField");
        let id = str_at(&field, &["id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!("Custom field '{}' created (ID: {id})", params.name))
            .with("customField", field))
    }

    pub async fn get_location_custom_values(
        &self,
        params: LocationIdParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("get_location_custom_values", "list custom values", "location")
                .lookup("search_locations");

        let location_id =
            resolve_location(&self.ctx, "get_location_custom_values", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get(format!("/locations/{location_id}/customValues")),
        )
        .await?;
        let values = array_at(&response, "customValues");

        Ok(ToolOutput::new(format!("Found {} custom values", values.len()))
            .with("customValues", values))
    }

    pub async fn get_timezones(&self, params: LocationIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_timezones", "list timezones", "location");

        let location_id = resolve_location(&self.ctx, "get_timezones", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get(format!("/locations/{location_id}/timezones")),
        )
        .await?;
        let timezones = array_at(&response, "timeZones");

        Ok(ToolOutput::new(format!("Found {} timezones", timezones.len()))
            .with("timezones", timezones))
    }
}
