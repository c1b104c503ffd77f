//! # HTTP Exploration Service
//!
//! Wrapper around the dexplore REST API, addressed by exploration id.

use crate::api::ErrorResponse;
use crate::service::{ConvertedGraphs, ExplorationService};
use dexplore_core::{DexploreError, Event, ExplorationState, Graph};
use serde::de::DeserializeOwned;

/// Errors from the HTTP client layer.
#[derive(Debug)]
pub enum ClientError {
    /// Cannot reach the service.
    ConnectionFailed(String),
    /// 401 Unauthorized - invalid or missing API key.
    Unauthorized,
    /// 429 Too Many Requests.
    RateLimited,
    /// The service rejected the request with a structured error.
    Rejected(u16, ErrorResponse),
    /// Service returned a 5xx error or an unstructured 4xx.
    ServerError(u16, String),
    /// Failed to parse response body.
    ParseError(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed(url) => write!(f, "Cannot connect to exploration service at {url}"),
            Self::Unauthorized => write!(f, "Unauthorized: invalid or missing API key"),
            Self::RateLimited => write!(f, "Rate limited: too many requests"),
            Self::Rejected(status, body) => write!(f, "Rejected ({status}): {}", body.error),
            Self::ServerError(status, msg) => write!(f, "Server error ({status}): {msg}"),
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<ClientError> for DexploreError {
    /// Structured rejections map back to their contract variant; every
    /// transport failure is a recoverable `Service` error.
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Rejected(_, body) => DexploreError::from_parts(&body.kind, body.detail),
            other => DexploreError::Service(other.to_string()),
        }
    }
}

/// Exploration service reached over HTTP.
#[derive(Clone)]
pub struct HttpService {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    exploration_id: String,
}

impl HttpService {
    /// Create a client for one exploration on the given service.
    pub fn new(base_url: &str, api_key: Option<String>, exploration_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            exploration_id: exploration_id.to_string(),
        }
    }

    #[must_use]
    pub fn exploration_id(&self) -> &str {
        &self.exploration_id
    }

    /// Build a request with optional Bearer auth.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    fn exploration_path(&self, action: &str) -> String {
        format!("{}/{action}", self.snapshot_path())
    }

    fn snapshot_path(&self) -> String {
        format!("/api/explorations/{}", self.exploration_id)
    }

    /// Send a request and handle connection errors.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        req.send()
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.base_url)))
    }

    /// Check status codes and parse the JSON body.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ClientError::RateLimited);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(parsed) if status.is_client_error() => {
                    ClientError::Rejected(status.as_u16(), parsed)
                }
                Ok(parsed) => ClientError::ServerError(status.as_u16(), parsed.error),
                Err(_) => ClientError::ServerError(status.as_u16(), body),
            });
        }
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }

    /// GET /health
    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        let req = self.request(reqwest::Method::GET, "/health");
        let resp = self.send(req).await?;
        self.handle_response(resp).await
    }
}

impl ExplorationService for HttpService {
    /// POST /api/explorations/{id}/start
    async fn start(&self, system: &str) -> Result<ExplorationState, DexploreError> {
        let body = serde_json::json!({ "system": system });
        let req = self
            .request(reqwest::Method::POST, &self.exploration_path("start"))
            .json(&body);
        let resp = self.send(req).await?;
        Ok(self.handle_response(resp).await?)
    }

    /// POST /api/explorations/{id}/{action}
    async fn submit(&self, event: &Event) -> Result<ExplorationState, DexploreError> {
        let req = self
            .request(reqwest::Method::POST, &self.exploration_path(event.name()))
            .json(event);
        let resp = self.send(req).await?;
        Ok(self.handle_response(resp).await?)
    }

    /// GET /api/explorations/{id}
    async fn current(&self) -> Result<ExplorationState, DexploreError> {
        let req = self.request(reqwest::Method::GET, &self.snapshot_path());
        let resp = self.send(req).await?;
        Ok(self.handle_response(resp).await?)
    }

    /// POST /api/convert
    async fn convert(&self, de: &Graph) -> Result<ConvertedGraphs, DexploreError> {
        let req = self.request(reqwest::Method::POST, "/api/convert").json(de);
        let resp = self.send(req).await?;
        let converted: ConvertedGraphs = self.handle_response(resp).await?;
        converted.check()?;
        Ok(converted)
    }
}

// =============================================================================
// TESTS
// =============================================================================
