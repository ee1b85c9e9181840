use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use super::{ApiError, ApiRequest, ApiResult, Method, RequestBody, Transport};
use crate::config::Config;

/// reqwest-backed transport for the HighLevel REST API.
pub struct HttpTransport {
    base_url: String,
    api_key: SecretString,
    api_version: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &Config) -> ApiResult<Self> {
        // reqwest is built without a bundled provider.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
            client,
        })
    }

    /// Root every request path is appended to, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn builder(&self, request: &ApiRequest) -> reqwest::RequestBuilder {
        let url = self.url(&request.path);
        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        };

        let version = match request.version {
            Some(version) => version,
            None => self.api_version.as_str(),
        };
        let builder = builder
            .bearer_auth(self.api_key.expose_secret())
            .header("Version", version)
            .header("Accept", "application/json");

        let builder = if request.query.is_empty() {
            builder
        } else {
            builder.query(&request.query)
        };

        match &request.body {
            Some(RequestBody::Json(body)) => builder.json(body),
            Some(RequestBody::Multipart(fields)) => {
                let form = fields
                    .iter()
                    .fold(reqwest::multipart::Form::new(), |form, (k, v)| {
                        form.text(k.clone(), v.clone())
                    });
                builder.multipart(form)
            }
            None => builder,
        }
    }

    /// Decode a response body, or turn a non-2xx status into
    /// [`ApiError::Status`]. Empty success bodies (DELETE mostly) become `{}`.
    async fn decode(response: Response) -> ApiResult<Value> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Object(Default::default()));
            }
            Ok(serde_json::from_str(&text)?)
        } else {
            Err(ApiError::from_response(status.as_u16(), &text))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        debug!(method = %request.method, path = %request.path, "sending request");
        let response = self.builder(&request).send().await?;
        debug!(status = response.status().as_u16(), path = %request.path, "received response");
        Self::decode(response).await
    }
}
