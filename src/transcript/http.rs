/*!
 * HTTP transport shared by every strategy.
 *
 * All upstream traffic goes through the `HttpFetcher` trait so strategies can
 * be exercised against scripted responses. The reqwest implementation applies
 * the browser-like headers from configuration to every request.
 */

use async_trait::async_trait;
use log::trace;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;

use crate::app_config::HttpConfig;
use crate::errors::FetchError;

/// Fully-read upstream response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Canonical reason phrase for the status
    pub status_text: String,
    /// Content-Type header, if any
    pub content_type: Option<String>,
    /// Response body
    pub body: String,
}

impl HttpResponse {
    /// Build a response (mostly useful for test doubles)
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or_default()
                .to_string(),
            content_type: None,
            body: body.into(),
        }
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Fail with `FetchError::Status` unless the status is 2xx
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Status {
                status_code: self.status,
                message: self.status_text,
            })
        }
    }
}

/// Transport used by every upstream strategy
#[async_trait]
pub trait HttpFetcher: Send + Sync + Debug {
    /// Issue a GET request with optional extra headers
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, FetchError>;

    /// Issue a POST request with a JSON body
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, FetchError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    /// HTTP client carrying the default headers
    client: Client,
    /// Per-request timeout, reported in errors
    timeout_secs: u64,
}

impl ReqwestFetcher {
    /// Create a new fetcher from the HTTP configuration
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, header_value(&config.user_agent)?);
        headers.insert(header::ACCEPT_LANGUAGE, header_value(&config.accept_language)?);
        headers.insert(header::REFERER, header_value(&config.referer)?);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: config.request_timeout_secs,
        })
    }

    fn map_send_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::RequestFailed(error.to_string())
        }
    }

    async fn read_response(&self, response: reqwest::Response) -> Result<HttpResponse, FetchError> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            content_type,
            body,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value).map_err(|e| FetchError::Client(format!("Invalid header value '{}': {}", value, e)))
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, FetchError> {
        trace!("GET {}", url);
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        self.read_response(response).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, FetchError> {
        trace!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.read_response(response).await
    }
}
