//! Resource client for the VMS REST API.
//!
//! Every call goes through [`ResourceClient::request`], which normalises the
//! response the same way for all endpoints:
//!
//! - `204 No Content` is the success sentinel regardless of body
//! - JSON bodies are parsed and returned
//! - non-JSON 2xx bodies become the success sentinel
//! - non-2xx responses become [`ClientError::Http`] carrying the server's
//!   `message` field, or `HTTP <status>: <reason>` when there is none

pub mod inflight;
pub mod retry;

pub use inflight::InFlight;
pub use retry::{retry, RetryPolicy};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use crate::config::AppConfig;
use crate::error::ClientError;

/// Normalised result of a successful request.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    /// Body-less or non-JSON success.
    Success,
}

impl ApiResponse {
    pub fn is_success_sentinel(&self) -> bool {
        matches!(self, ApiResponse::Success)
    }

    /// JSON view of the response; the sentinel reads as `{"message": "Success"}`.
    pub fn into_value(self) -> Value {
        match self {
            ApiResponse::Json(value) => value,
            ApiResponse::Success => json!({ "message": "Success" }),
        }
    }

    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        Ok(serde_json::from_value(self.into_value())?)
    }
}

#[derive(Debug, Clone)]
pub struct ResourceClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    health_timeout: Duration,
}

impl ResourceClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::build(base_url, Duration::from_secs(30), Duration::from_secs(5), false)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::build(
            &config.api.base_url,
            config.api.request_timeout(),
            config.api.health_timeout(),
            config.api.accept_invalid_certs,
        )
    }

    fn build(
        base_url: &str,
        timeout: Duration,
        health_timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self, ClientError> {
        // Trailing slash so endpoint paths join under the base rather than replace its last segment
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            token: None,
            health_timeout,
        })
    }

    /// Attach the session token as a bearer credential on every request.
    pub fn with_token(mut self, token: Option<&str>) -> Self {
        self.token = token.map(str::to_owned);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn health_timeout(&self) -> Duration {
        self.health_timeout
    }

    pub fn url(&self, endpoint: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    fn prepare(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Issue one request. A JSON content-type is set only when `body` is present.
    pub async fn request(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        let url = self.url(endpoint)?;
        tracing::debug!("{} {}", method, url);

        let mut builder = self.prepare(method.clone(), url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!("{} {} failed: {}", method, endpoint, e);
            ClientError::from(e)
        })?;

        normalize(response).await
    }

    /// Issue a request under `policy`, retrying with backoff before surfacing
    /// the last error.
    pub async fn request_with_retry(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
        policy: &RetryPolicy,
    ) -> Result<ApiResponse, ClientError> {
        retry(policy, move |attempt| {
            tracing::debug!("{} {} (attempt {})", method, endpoint, attempt);
            self.request(endpoint, method.clone(), body)
        })
        .await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        self.request(endpoint, Method::GET, None).await?.decode()
    }

    pub async fn send_json<B, T>(
        &self,
        endpoint: &str,
        method: Method,
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.request(endpoint, method, Some(&body)).await?.decode()
    }

    pub async fn delete(&self, endpoint: &str) -> Result<ApiResponse, ClientError> {
        self.request(endpoint, Method::DELETE, None).await
    }

    /// Multipart upload (photos). Not retried: the form body is consumed.
    pub async fn multipart(
        &self,
        endpoint: &str,
        method: Method,
        form: reqwest::multipart::Form,
    ) -> Result<ApiResponse, ClientError> {
        let url = self.url(endpoint)?;
        tracing::debug!("{} {} (multipart)", method, url);

        let response = self.prepare(method, url).multipart(form).send().await?;
        normalize(response).await
    }
}

/// Build `path?k=v&...` with each pair form-urlencoded.
pub fn endpoint_with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }

    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter())
        .finish();
    format!("{}?{}", path, query)
}

async fn normalize(response: reqwest::Response) -> Result<ApiResponse, ClientError> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(ApiResponse::Success);
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);

    if !status.is_success() {
        let fallback = ClientError::http_status(status.as_u16(), status.canonical_reason().unwrap_or(""));
        if !is_json {
            return Err(fallback);
        }

        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_owned));

        return Err(match message {
            Some(message) => ClientError::Http {
                status: status.as_u16(),
                message,
            },
            None => fallback,
        });
    }

    if is_json {
        Ok(ApiResponse::Json(response.json().await?))
    } else {
        Ok(ApiResponse::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_join_under_base_path() {
        let client = ResourceClient::new("https://vms.example.com/api").unwrap();
        assert_eq!(
            client.url("visitors/12").unwrap().as_str(),
            "https://vms.example.com/api/visitors/12"
        );
        assert_eq!(
            client.url("/gender").unwrap().as_str(),
            "https://vms.example.com/api/gender"
        );
    }

    #[test]
    fn test_query_pairs_are_encoded() {
        assert_eq!(
            endpoint_with_query("users/search", &[("query", "Jane Doe & Co")]),
            "users/search?query=Jane+Doe+%26+Co"
        );
        assert_eq!(endpoint_with_query("gender", &[]), "gender");
    }

    #[test]
    fn test_sentinel_json_view() {
        let value = ApiResponse::Success.into_value();
        assert_eq!(value["message"], "Success");
        assert!(ApiResponse::Success.is_success_sentinel());
    }
}
