/*
[INPUT]:  HTTP configuration (base URL, timeouts, VPS API key)
[OUTPUT]: Configured reqwest client ready for registry calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use crate::http::{RegistryError, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default backend base URL
pub const DEFAULT_API_URL: &str = "https://api.rendr.app";

/// Header carrying the pre-shared VPS key
pub const API_KEY_HEADER: &str = "X-VPS-API-Key";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the account registry backend
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http_client: Client,
    base_url: Url,
}

impl RegistryClient {
    /// Create a new client with default configuration
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Self::with_config(ClientConfig::default(), base_url, api_key)
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig, base_url: &str, api_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(RegistryError::Config("VPS API key must not be empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        let name = HeaderName::from_bytes(API_KEY_HEADER.as_bytes())
            .map_err(|err| RegistryError::Config(format!("invalid header name: {err}")))?;
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|err| RegistryError::Config(format!("invalid VPS API key: {err}")))?;
        key.set_sensitive(true);
        headers.insert(name, key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Base URL every endpoint is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build full URL for an endpoint, keeping any path prefix of the base URL
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.endpoint_url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Send a request and decode a JSON body from a 2xx response
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a request, mapping non-2xx responses to `RegistryError::Api`
    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RegistryError::api_error(status, body))
    }
}

/// Parse the configured base URL so relative joins append instead of replace
fn parse_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Ok(Url::parse(&normalized)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_keeps_base_path() {
        let client = RegistryClient::new("https://example.com/backend", "key").expect("client");
        let url = client.endpoint_url("/api/vps/pending-accounts").expect("url");
        assert_eq!(url.as_str(), "https://example.com/backend/api/vps/pending-accounts");
    }

    #[test]
    fn test_endpoint_url_with_trailing_slash() {
        let client = RegistryClient::new("http://127.0.0.1:3000/", "key").expect("client");
        let url = client.endpoint_url("api/vps/account-status").expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:3000/api/vps/account-status");
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let err = RegistryClient::new(DEFAULT_API_URL, "  ").unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = RegistryClient::new("not a url", "key").unwrap_err();
        assert!(matches!(err, RegistryError::UrlParse(_)));
    }
}
