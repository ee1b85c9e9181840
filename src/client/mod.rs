//! HighLevel API client seam.
//!
//! The [`Transport`] trait is the only thing tools depend on. Production code
//! uses [`HttpTransport`]; tests use the generated `MockTransport`.

mod error;
mod http;
mod request;


use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use http::HttpTransport;
pub use request::{ApiRequest, Method, RequestBody};

use crate::config::Config;

/// Sends one request and returns the decoded JSON body.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ApiResult<Value>;
}

/// Transport plus the scoping defaults every tool may fall back to.
pub struct ApiContext<T> {
    transport: T,
    location_id: Option<String>,
    company_id: Option<String>,
}

impl<T: Transport> ApiContext<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            location_id: None,
            company_id: None,
        }
    }

    pub fn from_config(transport: T, config: &Config) -> Self {
        Self {
            transport,
            location_id: config.location_id.clone(),
            company_id: config.company_id.clone(),
        }
    }

    pub fn with_location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }

    pub fn with_company(mut self, company_id: impl Into<String>) -> Self {
        self.company_id = Some(company_id.into());
        self
    }

    pub fn default_location_id(&self) -> Option<&str> {
        self.location_id.as_deref()
    }

    pub fn default_company_id(&self) -> Option<&str> {
        self.company_id.as_deref()
    }

    pub async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        debug!(method = %request.method, path = %request.path, "api call");
        self.transport.send(request).await
    }
}
