//! Google Sheets v4 `values` backend.
//!
//! Authenticates as a service account: a short-lived RS256 JWT assertion is
//! exchanged for a bearer token at the key's `token_uri`. Tokens are reused
//! until shortly before they expire; cell values are never cached.

use crate::backend::{SheetBackend, Values};
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Public Sheets API endpoint.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
/// OAuth scope granting read/write access to spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the reported expiry.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account key file this backend needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Parse a key from its JSON text and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: Self =
            serde_json::from_str(json).map_err(|e| StoreError::InvalidKey(e.to_string()))?;
        key.validate()?;
        Ok(key)
    }

    /// Reject keys missing the email or private key.
    pub fn validate(&self) -> Result<()> {
        if self.client_email.trim().is_empty() {
            return Err(StoreError::InvalidKey("missing client_email".to_string()));
        }
        if self.private_key.trim().is_empty() {
            return Err(StoreError::InvalidKey("missing private_key".to_string()));
        }
        Ok(())
    }

    /// The private key with escaped `\n` sequences turned into newlines.
    ///
    /// Keys pasted into environment variables often arrive with their line
    /// breaks escaped.
    pub fn normalized_private_key(&self) -> String {
        if self.private_key.contains("\\n") {
            self.private_key.replace("\\n", "\n")
        } else {
            self.private_key.clone()
        }
    }
}

/// Supplies bearer tokens for API calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// A fixed token, for tests and for tokens minted outside the process.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges signed JWT assertions for access tokens.
pub struct ServiceAccountTokens {
    client: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokens {
    /// Build a token source from a validated key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidKey` if the private key is not RSA PEM.
    pub fn new(client: Client, key: ServiceAccountKey) -> Result<Self> {
        key.validate()?;
        let encoding_key = EncodingKey::from_rsa_pem(key.normalized_private_key().as_bytes())
            .map_err(|e| StoreError::InvalidKey(e.to_string()))?;
        Ok(Self {
            client,
            key,
            encoding_key,
            cached: Mutex::new(None),
        })
    }

    /// Sign a fresh assertion for the spreadsheets scope.
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| StoreError::Auth(format!("failed to sign assertion: {e}")))
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!("token endpoint returned {status}: {body}")));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS);
        tracing::debug!(email = %self.key.client_email, lifetime, "obtained access token");
        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + ChronoDuration::seconds(lifetime - TOKEN_REFRESH_MARGIN_SECS),
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.token.clone());
            }
        }
        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<JsonValue>>,
}

#[derive(Debug, Serialize)]
struct ValueBody<'a> {
    values: &'a Values,
}

/// Spreadsheet values addressed over the Sheets REST API.
pub struct GoogleSheetsBackend {
    client: Client,
    base: Url,
    spreadsheet_id: String,
    tokens: Arc<dyn TokenSource>,
}

impl GoogleSheetsBackend {
    /// Connect to a spreadsheet using a service-account key.
    pub fn from_service_account(spreadsheet_id: &str, key: ServiceAccountKey) -> Result<Self> {
        let client = build_client()?;
        let tokens = Arc::new(ServiceAccountTokens::new(client.clone(), key)?);
        Self::with_endpoint(client, SHEETS_API_BASE, spreadsheet_id, tokens)
    }

    /// Connect to an arbitrary API root, e.g. a local mock server.
    pub fn with_endpoint(
        client: Client,
        base: &str,
        spreadsheet_id: &str,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self> {
        let base = Url::parse(base).map_err(|e| StoreError::InvalidRange(e.to_string()))?;
        Ok(Self {
            client,
            base,
            spreadsheet_id: spreadsheet_id.to_string(),
            tokens,
        })
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}{suffix}`, each segment
    /// percent-encoded.
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidRange(format!("cannot extend {}", self.base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{range}{suffix}"));
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        check_status(response).await
    }
}

fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| StoreError::Transport(e.to_string()))
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(StoreError::Backend {
        status: status.as_u16(),
        message,
    })
}

/// Cells come back as formatted strings, but numbers and booleans can appear
/// when a different render option is in effect.
fn cell_to_string(value: JsonValue) -> String {
    match value {
        JsonValue::String(s) => s,
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetBackend for GoogleSheetsBackend {
    async fn get_values(&self, range: &str) -> Result<Values> {
        let url = self.values_url(range, "")?;
        let response = self.send(self.client.get(url)).await?;
        let body: ValueRange = response.json().await?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn append_rows(&self, range: &str, rows: Values) -> Result<()> {
        let url = self.values_url(range, ":append")?;
        let request = self
            .client
            .post(url)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&ValueBody { values: &rows });
        self.send(request).await?;
        Ok(())
    }

    async fn update_values(&self, range: &str, rows: Values) -> Result<()> {
        let url = self.values_url(range, "")?;
        let request = self
            .client
            .put(url)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&ValueBody { values: &rows });
        self.send(request).await?;
        Ok(())
    }

    async fn clear_values(&self, range: &str) -> Result<()> {
        let url = self.values_url(range, ":clear")?;
        self.send(self.client.post(url).json(&serde_json::json!({})))
            .await?;
        Ok(())
    }
}
