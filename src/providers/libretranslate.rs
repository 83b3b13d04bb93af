use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::app_config::ConnectionEntry;
use crate::errors::ProviderError;
use crate::providers::{DetectionCandidate, LanguageDescriptor, Provider, TranslateResponse};

/// LibreTranslate client for interacting with a self-hosted server
#[derive(Debug, Clone)]
pub struct LibreTranslate {
    /// Base URL of the server, without a trailing slash
    base_url: String,
    /// API key sent in the request body; empty means none
    api_key: String,
    /// HTTP client for making requests
    client: Client,
}

/// Body of `POST /translate`
#[derive(Debug, Serialize)]
struct TranslatePayload<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

/// Body of `POST /detect`
#[derive(Debug, Serialize)]
struct DetectPayload<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

impl LibreTranslate {
    /// Create a new client from a base URL
    pub fn from_url(base_url: &Url, api_key: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a new client for a configured connection
    pub fn from_entry(entry: &ConnectionEntry, timeout_secs: u64) -> anyhow::Result<Self> {
        let base_url = entry.base_url()?;
        Ok(Self::from_url(&base_url, entry.api_key.clone(), timeout_secs))
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> Option<&str> {
        if self.api_key.is_empty() {
            None
        } else {
            Some(&self.api_key)
        }
    }

    /// Make a request and classify the outcome.
    ///
    /// Returns the parsed JSON body for any status below 400.
    pub async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::ConnectionError("Request timed out".to_string())
            } else {
                ProviderError::ConnectionError(e.to_string())
            }
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to read response body: {}", e)))?;

        let reason = status.canonical_reason().unwrap_or("Unknown status");
        if let Some(err) = ProviderError::from_status(status.as_u16(), &server_message(&bytes, reason)) {
            debug!("LibreTranslate rejected {}: {}", path, err);
            return Err(err);
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::ParseError(format!("{} returned invalid JSON: {}", path, e)))
    }

    async fn call_typed<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ProviderError> {
        let value = self.call(method, path, body).await?;
        serde_json::from_value(value)
            .map_err(|e| ProviderError::ParseError(format!("Unexpected {} response: {}", path, e)))
    }
}

/// Prefer the server's own `{"error": "..."}` message over the status reason
fn server_message(body: &[u8], reason: &str) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| reason.to_string())
}

#[async_trait]
impl Provider for LibreTranslate {
    async fn languages(&self) -> Result<Vec<LanguageDescriptor>, ProviderError> {
        self.call_typed(Method::GET, "/languages", None::<&Value>).await
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<TranslateResponse, ProviderError> {
        let payload = TranslatePayload {
            q: text,
            source,
            target,
            api_key: self.api_key(),
        };
        self.call_typed(Method::POST, "/translate", Some(&payload)).await
    }

    async fn detect(&self, text: &str) -> Result<Vec<DetectionCandidate>, ProviderError> {
        let payload = DetectPayload {
            q: text,
            api_key: self.api_key(),
        };
        self.call_typed(Method::POST, "/detect", Some(&payload)).await
    }
}
