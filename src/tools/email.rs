//! Email verification.

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{Guidance, ToolError, ToolOutput, ToolResult, resolve_location, send, str_at};
use crate::client::{ApiRequest, Transport};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
    #[schemars(description = "Email address to verify")]
    pub email: String,
}

tool_module! {
    /// Email verification tools.
    EmailTools, family = "email";
    "verify_email" => verify_email(VerifyEmailParams):
        "Check whether an email address is deliverable";
}

impl<T: Transport + 'static> EmailTools<T> {
    pub async fn verify_email(&self, params: VerifyEmailParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("verify_email", "verify the email", "location")
            .validation("the address must be a single well-formed email.");

        let email = params.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ToolError::invalid(
                "verify_email",
                format!("'{}' is not an email address", params.email),
            ));
        }
        let location_id = resolve_location(&self.ctx, "verify_email", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(email),
            ApiRequest::post("/email/verify")
                .query("locationId", &location_id)
                .json(json!({"type": "email", "verify": email})),
        )
        .await?;

        let result = str_at(&response, &["result"]).unwrap_or("unknown").to_string();
        let risky = response
            .get("riskyStatus")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let mut message = format!("{email}: {result}");
        if risky {
            message.push_str(" (risky)");
        }

        Ok(ToolOutput::new(message)
            .with("email", email)
            .with("verification", response))
    }
}
