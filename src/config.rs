//! Runtime configuration.
//!
//! Every field resolves in the same order: explicit value (usually a CLI
//! flag), then the matching `GHL_*` environment variable, then the default.
//! The resolved [`Config`] is handed to the API context once at startup and
//! never read from the environment again.

use std::env;
use std::time::Duration;

use miette::Diagnostic;
use secrecy::SecretString;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://services.leadconnectorhq.com";
pub const DEFAULT_API_VERSION: &str = "2021-07-28";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_KEY: &str = "GHL_API_KEY";
pub const ENV_BASE_URL: &str = "GHL_BASE_URL";
pub const ENV_LOCATION_ID: &str = "GHL_LOCATION_ID";
pub const ENV_COMPANY_ID: &str = "GHL_COMPANY_ID";
pub const ENV_API_VERSION: &str = "GHL_API_VERSION";

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("No API key configured")]
    #[diagnostic(
        code(highlevel::config::missing_api_key),
        help("Pass --api-key or set GHL_API_KEY to a private integration token.")
    )]
    MissingApiKey,

    #[error("Invalid base URL '{url}': expected an http(s) URL")]
    #[diagnostic(code(highlevel::config::invalid_base_url))]
    InvalidBaseUrl { url: String },
}

/// Resolved configuration for talking to the HighLevel API.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: SecretString,
    pub base_url: String,
    /// Location used whenever a tool call omits `locationId`.
    pub location_id: Option<String>,
    /// Agency/company used by the location search tools.
    pub company_id: Option<String>,
    pub api_version: String,
    pub timeout: Duration,
}

/// Unresolved overrides, typically straight from clap.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub location_id: Option<String>,
    pub company_id: Option<String>,
    pub api_version: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Resolve configuration from overrides and the process environment.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let api_key = overrides
            .api_key
            .or_else(|| non_empty_env(ENV_API_KEY))
            .ok_or(ConfigError::MissingApiKey)?;

        let base_url = overrides
            .base_url
            .or_else(|| non_empty_env(ENV_BASE_URL))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl { url: base_url });
        }

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url: base_url.trim_end_matches('/').to_string(),
            location_id: overrides
                .location_id
                .or_else(|| non_empty_env(ENV_LOCATION_ID)),
            company_id: overrides
                .company_id
                .or_else(|| non_empty_env(ENV_COMPANY_ID)),
            api_version: overrides
                .api_version
                .or_else(|| non_empty_env(ENV_API_VERSION))
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            timeout: Duration::from_secs(overrides.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
