//! Opportunity (deal) and pipeline tools.
//!
//! Opportunity values are integer cents on the wire. The search endpoint is
//! the one place the API wants snake_case query keys, so the camelCase tool
//! arguments are renamed field by field in [`search_query`].

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use super::{
    Guidance, ToolError, ToolOutput, ToolResult, array_at, resolve_location, send, str_at,
    strip_nulls, unwrap_key, wire_str,
};
use crate::client::{ApiError, ApiRequest, Transport};
use crate::convert::format_cents;

pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

const OPPORTUNITY_VALIDATION: &str = "pipelineStageId must belong to pipelineId (see get_pipelines), \
     monetaryValue is an integer number of cents, and status is one of open, won, lost or abandoned.";

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityStatus {
    #[default]
    Open,
    Won,
    Lost,
    Abandoned,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Open,
    Won,
    Lost,
    Abandoned,
    All,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchOpportunitiesParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
    #[schemars(description = "Free-text search on opportunity and contact names")]
    pub query: Option<String>,
    #[schemars(description = "Only opportunities in this pipeline")]
    pub pipeline_id: Option<String>,
    #[schemars(description = "Only opportunities in this pipeline stage")]
    pub pipeline_stage_id: Option<String>,
    #[schemars(description = "Only opportunities for this contact")]
    pub contact_id: Option<String>,
    #[schemars(description = "Only opportunities assigned to this user")]
    pub assigned_to: Option<String>,
    pub status: Option<StatusFilter>,
    #[schemars(description = "Maximum results (default: 20)")]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetPipelinesParams {
    pub location_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityIdParams {
    #[schemars(description = "Opportunity ID")]
    pub opportunity_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOpportunityParams {
    pub location_id: Option<String>,
    #[schemars(description = "Opportunity name")]
    pub name: String,
    #[schemars(description = "Pipeline ID (see get_pipelines)")]
    pub pipeline_id: String,
    #[schemars(description = "Stage ID within the pipeline")]
    pub pipeline_stage_id: Option<String>,
    #[schemars(description = "Contact the opportunity belongs to")]
    pub contact_id: String,
    #[schemars(description = "Status (default: open)")]
    pub status: Option<OpportunityStatus>,
    #[schemars(description = "Deal value in integer cents, e.g. 150000 for $1,500.00")]
    pub monetary_value: Option<i64>,
    #[schemars(description = "User ID of the owner")]
    pub assigned_to: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOpportunityParams {
    #[schemars(description = "Opportunity ID to update")]
    pub opportunity_id: String,
    pub name: Option<String>,
    pub pipeline_id: Option<String>,
    pub pipeline_stage_id: Option<String>,
    pub status: Option<OpportunityStatus>,
    #[schemars(description = "Deal value in integer cents")]
    pub monetary_value: Option<i64>,
    pub assigned_to: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOpportunityStatusParams {
    #[schemars(description = "Opportunity ID")]
    pub opportunity_id: String,
    pub status: OpportunityStatus,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertOpportunityParams {
    pub location_id: Option<String>,
    #[schemars(description = "Pipeline ID")]
    pub pipeline_id: String,
    #[schemars(description = "Contact ID; the contact's opportunity in this pipeline is updated if one exists")]
    pub contact_id: String,
    pub name: Option<String>,
    pub pipeline_stage_id: Option<String>,
    pub status: Option<OpportunityStatus>,
    #[schemars(description = "Deal value in integer cents")]
    pub monetary_value: Option<i64>,
    pub assigned_to: Option<String>,
    #[schemars(description = "User IDs to add as followers after the upsert")]
    pub followers: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityFollowersParams {
    #[schemars(description = "Opportunity ID")]
    pub opportunity_id: String,
    #[schemars(description = "User IDs")]
    pub followers: Vec<String>,
}

// =============================================================================
// Tool table
// =============================================================================

tool_module! {
    /// Opportunity tools.
    OpportunityTools, family = "opportunities";
    "search_opportunities" => search_opportunities(SearchOpportunitiesParams):
        "Search opportunities by pipeline, stage, contact, owner, status or text. Default limit: 20.";
    "get_pipelines" => get_pipelines(GetPipelinesParams):
        "List sales pipelines and their stages";
    "get_opportunity" => get_opportunity(OpportunityIdParams):
        "Get an opportunity by ID";
    "create_opportunity" => create_opportunity(CreateOpportunityParams):
        "Create an opportunity. monetaryValue is in cents; status defaults to open.";
    "update_opportunity" => update_opportunity(UpdateOpportunityParams):
        "Update an opportunity";
    "update_opportunity_status" => update_opportunity_status(UpdateOpportunityStatusParams):
        "Set an opportunity's status (open, won, lost, abandoned)";
    "delete_opportunity" => delete_opportunity(OpportunityIdParams):
        "Delete an opportunity";
    "upsert_opportunity" => upsert_opportunity(UpsertOpportunityParams):
        "Create or update the contact's opportunity in a pipeline, then optionally add followers";
    "add_opportunity_followers" => add_opportunity_followers(OpportunityFollowersParams):
        "Add followers to an opportunity";
    "remove_opportunity_followers" => remove_opportunity_followers(OpportunityFollowersParams):
        "Remove followers from an opportunity";
}

/// Query for `GET /opportunities/search`, with the API's snake_case keys.
pub fn search_query(location_id: &str, params: &SearchOpportunitiesParams) -> ApiRequest {
    ApiRequest::get("/opportunities/search")
        .query("location_id", location_id)
        .query_opt("q", params.query.as_deref())
        .query_opt("pipeline_id", params.pipeline_id.as_deref())
        .query_opt("pipeline_stage_id", params.pipeline_stage_id.as_deref())
        .query_opt("contact_id", params.contact_id.as_deref())
        .query_opt("assigned_to", params.assigned_to.as_deref())
        .query_opt("status", params.status.as_ref().map(wire_str))
        .query("limit", params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
}

fn value_label(monetary_value: Option<i64>) -> String {
    monetary_value
        .map(|cents| format!(" worth {}", format_cents(cents)))
        .unwrap_or_default()
}

impl<T: Transport + 'static> OpportunityTools<T> {
    pub async fn search_opportunities(
        &self,
        params: SearchOpportunitiesParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("search_opportunities", "search opportunities", "pipeline")
            .lookup("get_pipelines");

        let location_id =
            resolve_location(&self.ctx, "search_opportunities", params.location_id.clone())?;
        let response = send(
            &self.ctx,
            &GUIDE,
            params.pipeline_id.as_deref(),
            search_query(&location_id, &params),
        )
        .await?;

        let opportunities = array_at(&response, "opportunities");
        let total = response
            .pointer("/meta/total")
            .and_then(Value::as_u64)
            .unwrap_or(opportunities.len() as u64);

        Ok(ToolOutput::new(format!("Found {} opportunities", opportunities.len()))
            .with("total", total)
            .with("opportunities", opportunities))
    }

    pub async fn get_pipelines(&self, params: GetPipelinesParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_pipelines", "list pipelines", "location");

        let location_id = resolve_location(&self.ctx, "get_pipelines", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get("/opportunities/pipelines").query("locationId", &location_id),
        )
        .await?;
        let pipelines = array_at(&response, "pipelines");

        Ok(ToolOutput::new(format!("Found {} pipelines", pipelines.len())).with("pipelines", pipelines))
    }

    pub async fn get_opportunity(&self, params: OpportunityIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_opportunity", "get the opportunity", "opportunity")
            .lookup("search_opportunities");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.opportunity_id),
            ApiRequest::get(format!("/opportunities/{}", params.opportunity_id)),
        )
        .await?;
        let opportunity = unwrap_key(response, "opportunity");
        let name = str_at(&opportunity, &["name"]).unwrap_or(&params.opportunity_id).to_string();

        Ok(ToolOutput::new(format!("Retrieved opportunity {name}")).with("opportunity", opportunity))
    }

    pub async fn create_opportunity(
        &self,
        params: CreateOpportunityParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_opportunity", "create the opportunity", "pipeline or contact")
            .lookup("get_pipelines")
            .conflict("This contact already has an opportunity in the pipeline; use upsert_opportunity instead.")
            .validation(OPPORTUNITY_VALIDATION);

        let location_id = resolve_location(&self.ctx, "create_opportunity", params.location_id)?;
        let body = json!({
            "locationId": location_id,
            "name": params.name,
            "pipelineId": params.pipeline_id,
            "pipelineStageId": params.pipeline_stage_id,
            "contactId": params.contact_id,
            "status": params.status.unwrap_or_default(),
            "monetaryValue": params.monetary_value,
            "assignedTo": params.assigned_to,
            "source": params.source,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.pipeline_id),
            ApiRequest::post("/opportunities/").json(strip_nulls(body)),
        )
        .await?;
        let opportunity = unwrap_key(response, "opportunity");
        let id = str_at(&opportunity, &["id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!(
            "Opportunity '{}'{} created (ID: {id})",
            params.name,
            value_label(params.monetary_value)
        ))
        .with("opportunity", opportunity))
    }

    pub async fn update_opportunity(
        &self,
        params: UpdateOpportunityParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("update_opportunity", "update the opportunity", "opportunity")
            .lookup("search_opportunities")
            .validation(OPPORTUNITY_VALIDATION);

        let body = json!({
            "name": params.name,
            "pipelineId": params.pipeline_id,
            "pipelineStageId": params.pipeline_stage_id,
            "status": params.status,
            "monetaryValue": params.monetary_value,
            "assignedTo": params.assigned_to,
            "source": params.source,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.opportunity_id),
            ApiRequest::put(format!("/opportunities/{}", params.opportunity_id)).json(strip_nulls(body)),
        )
        .await?;

        Ok(ToolOutput::new(format!("Opportunity {} updated", params.opportunity_id))
            .with("opportunity", unwrap_key(response, "opportunity")))
    }

    pub async fn update_opportunity_status(
        &self,
        params: UpdateOpportunityStatusParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("update_opportunity_status", "change the opportunity status", "opportunity")
                .lookup("search_opportunities");

        send(
            &self.ctx,
            &GUIDE,
            Some(&params.opportunity_id),
            ApiRequest::put(format!("/opportunities/{}/status", params.opportunity_id))
                .json(json!({"status": params.status})),
        )
        .await?;

        let status = wire_str(&params.status);
        Ok(ToolOutput::new(format!(
            "Opportunity {} marked {status}",
            params.opportunity_id
        ))
        .with("opportunityId", params.opportunity_id)
        .with("status", status))
    }

    pub async fn delete_opportunity(&self, params: OpportunityIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("delete_opportunity", "delete the opportunity", "opportunity")
            .lookup("search_opportunities");

        send(
            &self.ctx,
            &GUIDE,
            Some(&params.opportunity_id),
            ApiRequest::delete(format!("/opportunities/{}", params.opportunity_id)),
        )
        .await?;

        Ok(ToolOutput::new(format!("Opportunity {} deleted", params.opportunity_id))
            .with("opportunityId", params.opportunity_id))
    }

    /// Upsert, then add followers when requested. The two calls are
    /// independent: a follower failure leaves the upserted opportunity in
    /// place and is reported as the tool's error.
    pub async fn upsert_opportunity(
        &self,
        params: UpsertOpportunityParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("upsert_opportunity", "upsert the opportunity", "pipeline or contact")
            .lookup("get_pipelines")
            .validation(OPPORTUNITY_VALIDATION);
        const FOLLOWERS: Guidance =
            Guidance::new("upsert_opportunity", "add followers to the upserted opportunity", "opportunity");

        let location_id = resolve_location(&self.ctx, "upsert_opportunity", params.location_id)?;
        let body = json!({
            "locationId": location_id,
            "pipelineId": params.pipeline_id,
            "contactId": params.contact_id,
            "name": params.name,
            "pipelineStageId": params.pipeline_stage_id,
            "status": params.status,
            "monetaryValue": params.monetary_value,
            "assignedTo": params.assigned_to,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.pipeline_id),
            ApiRequest::post("/opportunities/upsert").json(strip_nulls(body)),
        )
        .await?;

        let created = response.get("new").and_then(Value::as_bool).unwrap_or(false);
        let opportunity = unwrap_key(response, "opportunity");
        let id = str_at(&opportunity, &["id"]).map(str::to_string);
        let verb = if created { "created" } else { "updated" };
        let label = id.as_deref().unwrap_or("unknown");

        let mut output = ToolOutput::new(format!("Opportunity {verb} (ID: {label})"))
            .with("created", created)
            .with("opportunity", opportunity);

        if let Some(followers) = params.followers.filter(|f| !f.is_empty()) {
            // Without an id there is nowhere to send the followers.
            let Some(id) = id else {
                let source = ApiError::InvalidResponse {
                    message: "upsert response carried no opportunity id".to_string(),
                };
                return Err(ToolError::Api {
                    tool: "upsert_opportunity".to_string(),
                    kind: source.kind(),
                    status: None,
                    message: format!(
                        "Opportunity {verb}, but followers were not added: the response had no \
                         opportunity ID. Use search_opportunities to find it, then \
                         add_opportunity_followers. (Details: {source})"
                    ),
                    source,
                });
            };
            info!(opportunity = %id, count = followers.len(), "adding followers after upsert");
            send(
                &self.ctx,
                &FOLLOWERS,
                Some(&id),
                ApiRequest::post(format!("/opportunities/{id}/followers"))
                    .json(json!({"followers": followers})),
            )
            .await?;
            output.message = format!(
                "Opportunity {verb} (ID: {id}) with {} followers added",
                followers.len()
            );
            output = output.with("followers", followers);
        }

        Ok(output)
    }

    pub async fn add_opportunity_followers(
        &self,
        params: OpportunityFollowersParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("add_opportunity_followers", "add followers", "opportunity")
                .lookup("search_opportunities");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.opportunity_id),
            ApiRequest::post(format!("/opportunities/{}/followers", params.opportunity_id))
                .json(json!({"followers": params.followers})),
        )
        .await?;

        Ok(ToolOutput::new(format!(
            "Added {} followers to opportunity {}",
            params.followers.len(),
            params.opportunity_id
        ))
        .with("result", response))
    }

    pub async fn remove_opportunity_followers(
        &self,
        params: OpportunityFollowersParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("remove_opportunity_followers", "remove followers", "opportunity")
                .lookup("search_opportunities");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.opportunity_id),
            ApiRequest::delete(format!("/opportunities/{}/followers", params.opportunity_id))
                .json(json!({"followers": params.followers})),
        )
        .await?;

        Ok(ToolOutput::new(format!(
            "Removed {} followers from opportunity {}",
            params.followers.len(),
            params.opportunity_id
        ))
        .with("result", response))
    }
}
