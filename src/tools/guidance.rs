use tracing::warn;

use super::ToolError;
use crate::client::{ApiError, ApiErrorKind};

const PERMISSION_HINT: &str = "Verify the API key is valid, carries the scopes for these endpoints, \
     and has access to the location being used.";
const DEFAULT_CONFLICT_HINT: &str = "Another record already uses these values.";
const DEFAULT_VALIDATION_HINT: &str =
    "missing required fields, IDs from another location, or malformed dates and emails.";

/// Canned explanations attached to a tool's API failures.
///
/// Selection is driven by [`ApiErrorKind`]; the original API message is
/// always appended so nothing is lost.
#[derive(Debug, Clone, Copy)]
pub struct Guidance {
    pub tool: &'static str,
    /// Verb phrase, e.g. "update the contact".
    pub action: &'static str,
    /// Noun used for not-found messages, e.g. "contact".
    pub entity: &'static str,
    /// Tool that lists current IDs for the entity.
    pub lookup: Option<&'static str>,
    pub conflict: Option<&'static str>,
    pub validation: Option<&'static str>,
}

impl Guidance {
    pub const fn new(tool: &'static str, action: &'static str, entity: &'static str) -> Self {
        Self {
            tool,
            action,
            entity,
            lookup: None,
            conflict: None,
            validation: None,
        }
    }

    pub const fn lookup(mut self, tool: &'static str) -> Self {
        self.lookup = Some(tool);
        self
    }

    pub const fn conflict(mut self, hint: &'static str) -> Self {
        self.conflict = Some(hint);
        self
    }

    pub const fn validation(mut self, hint: &'static str) -> Self {
        self.validation = Some(hint);
        self
    }

    /// Explanation for a failure of `kind`, without the original details.
    pub fn explain(&self, kind: ApiErrorKind, subject: Option<&str>) -> String {
        let action = self.action;
        match kind {
            ApiErrorKind::Unauthorized | ApiErrorKind::Forbidden => {
                format!("Permission denied while trying to {action}. {PERMISSION_HINT}")
            }
            ApiErrorKind::NotFound => {
                let what = match subject {
                    Some(id) => format!("{} '{}'", self.entity, id),
                    None => format!("the requested {}", self.entity),
                };
                let mut text = format!(
                    "Could not {action}: {what} was not found. The ID may be stale or belong to another location."
                );
                if let Some(lookup) = self.lookup {
                    text.push_str(&format!(" Use {lookup} to find a current ID."));
                }
                text
            }
            ApiErrorKind::Conflict => format!(
                "Could not {action}: the request conflicts with existing data. {}",
                self.conflict.unwrap_or(DEFAULT_CONFLICT_HINT)
            ),
            ApiErrorKind::Validation => format!(
                "Could not {action}: the request was rejected as invalid. Common mistakes: {}",
                self.validation.unwrap_or(DEFAULT_VALIDATION_HINT)
            ),
            ApiErrorKind::RateLimited => {
                format!("Could not {action}: the API rate limit was reached. Wait before calling again.")
            }
            ApiErrorKind::Transport => {
                format!("Could not {action}: the HighLevel API could not be reached.")
            }
            ApiErrorKind::Server | ApiErrorKind::Other => format!("Failed to {action}."),
        }
    }

    /// Wrap an API failure into a [`ToolError`] carrying the explanation.
    pub fn decorate(&self, subject: Option<&str>, err: ApiError) -> ToolError {
        let kind = err.kind();
        let status = err.status();
        let message = format!("{} (Details: {})", self.explain(kind, subject), err);

        warn!(tool = self.tool, ?kind, ?status, "api call failed");

        ToolError::Api {
            tool: self.tool.to_string(),
            kind,
            status,
            message,
            source: err,
        }
    }
}
