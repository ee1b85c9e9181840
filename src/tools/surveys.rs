//! Survey tools.

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Guidance, ToolOutput, ToolResult, array_at, resolve_location, send};
use crate::client::{ApiRequest, Transport};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetSurveysParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    #[schemars(description = "Survey type filter, e.g. folder")]
    #[serde(rename = "type")]
    pub survey_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveySubmissionsParams {
    pub location_id: Option<String>,
    #[schemars(description = "Only submissions of this survey")]
    pub survey_id: Option<String>,
    #[schemars(description = "Search by contact name, email or phone")]
    pub q: Option<String>,
    #[schemars(description = "Submitted on or after (YYYY-MM-DD)")]
    pub start_at: Option<String>,
    #[schemars(description = "Submitted on or before (YYYY-MM-DD)")]
    pub end_at: Option<String>,
    #[schemars(description = "Page number (default: 1)")]
    pub page: Option<u32>,
    #[schemars(description = "Page size (default: 20)")]
    pub limit: Option<u32>,
}

tool_module! {
    /// Survey tools.
    SurveyTools, family = "surveys";
    "get_surveys" => get_surveys(GetSurveysParams):
        "List surveys for a location";
    "get_survey_submissions" => get_survey_submissions(SurveySubmissionsParams):
        "List survey submissions. Defaults: page 1, limit 20.";
}

impl<T: Transport + 'static> SurveyTools<T> {
    pub async fn get_surveys(&self, params: GetSurveysParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_surveys", "list surveys", "location");

        let location_id = resolve_location(&self.ctx, "get_surveys", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get("/surveys/")
                .query("locationId", &location_id)
                .query_opt("skip", params.skip)
                .query_opt("limit", params.limit)
                .query_opt("type", params.survey_type.as_deref()),
        )
        .await?;
        let surveys = array_at(&response, "surveys");
        let total = response
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(surveys.len() as u64);

        Ok(ToolOutput::new(format!("Found {} surveys", surveys.len()))
            .with("total", total)
            .with("surveys", surveys))
    }

    pub async fn get_survey_submissions(
        &self,
        params: SurveySubmissionsParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_survey_submissions", "list submissions", "survey")
            .lookup("get_surveys")
            .validation("startAt and endAt are YYYY-MM-DD and surveyId comes from get_surveys.");

        let location_id = resolve_location(&self.ctx, "get_survey_submissions", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            params.survey_id.as_deref(),
            ApiRequest::get("/surveys/submissions")
                .query("locationId", &location_id)
                .query("page", params.page.unwrap_or(DEFAULT_PAGE))
                .query("limit", params.limit.unwrap_or(DEFAULT_LIMIT))
                .query_opt("surveyId", params.survey_id.as_deref())
                .query_opt("q", params.q.as_deref())
                .query_opt("startAt", params.start_at.as_deref())
                .query_opt("endAt", params.end_at.as_deref()),
        )
        .await?;
        let submissions = array_at(&response, "submissions");
        let total = response
            .pointer("/meta/total")
            .and_then(Value::as_u64)
            .unwrap_or(submissions.len() as u64);

        Ok(ToolOutput::new(format!(
            "Found {} survey submissions ({total} total)",
            submissions.len()
        ))
        .with("total", total)
        .with("submissions", submissions))
    }
}
