//! REST client for the birdbook API.

use birdbook_core::{FarmError, FarmResult, Record};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Environment variable holding the API base URL.
pub const API_URL_VAR: &str = "BIRDBOOK_API_URL";

/// Base URL used when [`API_URL_VAR`] is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:4000";

/// HTTP client for the three record resources.
#[derive(Debug, Clone)]
pub struct FarmClient {
    client: Client,
    base_url: String,
}

impl FarmClient {
    /// Constructs a client for `base_url` with a 30-second request timeout.
    ///
    /// # Errors
    ///
    /// Returns `FarmError::Http` if building the underlying HTTP client fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use birdbook_http::FarmClient;
    /// let client = FarmClient::new("http://localhost:4000/").unwrap();
    /// assert_eq!(client.base_url(), "http://localhost:4000");
    /// ```
    pub fn new(base_url: &str) -> FarmResult<Self> {
        Self::with_timeout(base_url, 30)
    }

    /// Constructs a client with a custom per-request timeout.
    pub fn with_timeout(base_url: &str, timeout_secs: u64) -> FarmResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            // Disable system proxy lookup to avoid macOS system-configuration issues
            .no_proxy()
            .build()
            .map_err(|e| FarmError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client for the URL in `BIRDBOOK_API_URL`, or the local default.
    pub fn from_env() -> FarmResult<Self> {
        let url = std::env::var(API_URL_VAR).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(&url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url<R: Record>(&self) -> String {
        format!("{}/{}", self.base_url, R::RESOURCE)
    }

    fn member_url<R: Record>(&self, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, R::RESOURCE, id)
    }

    /// Fetch every record of one type.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a record list.
    pub async fn list<R: Record>(&self) -> FarmResult<Vec<R>> {
        let response = send::<R>(self.client.get(self.collection_url::<R>()), None).await?;
        response
            .json()
            .await
            .map_err(|e| FarmError::Http(format!("Failed to parse JSON: {e}")))
    }

    /// Create a record and return the id the server assigned.
    ///
    /// A response without `success: true` is a failure even when the status
    /// is 2xx.
    pub async fn create<R: Record>(&self, input: &R::Input) -> FarmResult<String> {
        let request = self.client.post(self.collection_url::<R>()).json(input);
        let response = send::<R>(request, None).await?;
        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| FarmError::Http(format!("Failed to parse JSON: {e}")))?;

        if body.get("success").and_then(JsonValue::as_bool) != Some(true) {
            return Err(FarmError::NotAcknowledged(format!(
                "create {}",
                R::KIND.to_lowercase()
            )));
        }

        let id = body
            .get(R::ID_FIELD)
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string();
        tracing::debug!(kind = R::KIND, id = %id, "created");
        Ok(id)
    }

    /// Overwrite the record with `id`.
    pub async fn update<R: Record>(&self, id: &str, input: &R::Input) -> FarmResult<()> {
        send::<R>(self.client.put(self.member_url::<R>(id)).json(input), Some(id)).await?;
        Ok(())
    }

    /// Delete the record with `id`.
    pub async fn delete<R: Record>(&self, id: &str) -> FarmResult<()> {
        send::<R>(self.client.delete(self.member_url::<R>(id)), Some(id)).await?;
        Ok(())
    }
}

/// Send a request; a 404 on a member URL is reported as a missing record.
async fn send<R: Record>(request: RequestBuilder, id: Option<&str>) -> FarmResult<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| FarmError::Http(e.to_string()))?;

    let status = response.status();
    if let (StatusCode::NOT_FOUND, Some(id)) = (status, id) {
        return Err(FarmError::not_found(R::KIND, id));
    }
    if !status.is_success() {
        return Err(FarmError::Http(format!(
            "HTTP {} - {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )));
    }

    Ok(response)
}
