//! HTTP access to the incident API.
//!
//! [`ApiClient`] performs one request and returns either the decoded payload
//! or an [`AppError`] whose display text is the only thing a user ever sees:
//! the server's `{"error": "..."}` message when present, a generic fallback
//! otherwise.

use crate::config::ApiConfig;
use crate::error::{AppError, Result};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Error payload returned by the server on non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Thin JSON client rooted at the API base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client from configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("incident-report-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Self::with_client(client, &config.base_url)
    }

    /// Wrap an existing reqwest client
    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Configuration(format!("Invalid API base URL '{}': {}", base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(AppError::Configuration(format!(
                "API base URL '{}' cannot carry paths",
                base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve path segments and query pairs against the base URL
    pub fn url<I, K, V>(&self, segments: &[&str], query: I) -> Url
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<(K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }

        let mut pairs = query.into_iter().peekable();
        if pairs.peek().is_some() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        url
    }

    /// GET a JSON payload
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.decode(self.client.get(url)).await
    }

    /// Send a JSON body and decode the JSON response
    pub async fn send_json<T, B>(&self, method: Method, url: Url, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.decode(self.client.request(method, url).json(body)).await
    }

    /// DELETE a resource; the success response carries no payload
    pub async fn delete(&self, url: Url) -> Result<()> {
        let response = self.send(self.client.delete(url)).await?;
        // Drain so the connection can be reused.
        let _ = response.bytes().await;
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(|e| {
            warn!(error = %e, "Failed to decode response body");
            AppError::from(e)
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = request
            .build()
            .map_err(|e| AppError::transport(format!("failed to build request: {}", e)))?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self.client.execute(request).await.map_err(|e| {
            warn!(method = %method, path = %path, error = %e, "Request failed before a response arrived");
            AppError::from(e)
        })?;

        let status = response.status();
        debug!(method = %method, path = %path, status = status.as_u16(), "API response");

        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => Some(body.error),
            Err(_) => None,
        };
        let err = AppError::api(status.as_u16(), message);
        warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            message = %err,
            "API returned an error"
        );
        Err(err)
    }
}
