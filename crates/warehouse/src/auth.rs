use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use logdash_core::error::{DashError, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

pub const BIGQUERY_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery.readonly";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Google rejects assertions that live longer than an hour.
const MAX_ASSERTION_LIFETIME: Duration = Duration::from_secs(60 * 60);
const REFRESH_SKEW_SECS: i64 = 60;

/// How the client authenticates against the warehouse.
#[derive(Clone)]
pub enum Credentials {
    /// Path to a service-account key file, read when a token is first needed.
    KeyFile(PathBuf),
    /// A pre-issued bearer token (emulators, tests, `gcloud auth print-access-token`).
    StaticToken(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyFile(path) => f.debug_tuple("KeyFile").field(path).finish(),
            Self::StaticToken(_) => f.write_str("StaticToken(<redacted>)"),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn parse(raw: &str) -> Result<Self> {
        // serde_json errors quote the offending input, so keep only the position.
        serde_json::from_str(raw).map_err(|e| {
            DashError::Config(format!(
                "service account key is not valid JSON (line {}, column {})",
                e.line(),
                e.column()
            ))
        })
    }

    pub async fn read(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            DashError::UpstreamUnavailable(format!(
                "failed reading service account key {}: {e}",
                path.display()
            ))
        })?;
        Self::parse(&raw)
    }

    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(key: &ServiceAccountKey, now: DateTime<Utc>, lifetime: Duration) -> Self {
        let lifetime = lifetime.min(MAX_ASSERTION_LIFETIME).as_secs() as i64;
        let iat = now.timestamp();
        Self {
            iss: key.client_email.clone(),
            scope: BIGQUERY_READONLY_SCOPE.to_string(),
            aud: key.token_uri().to_string(),
            iat,
            exp: iat + lifetime,
        }
    }
}

pub fn sign_assertion(key: &ServiceAccountKey, claims: &AssertionClaims) -> Result<String> {
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
        DashError::UpstreamUnavailable(format!("service account private key is unusable: {e}"))
    })?;
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();
    jsonwebtoken::encode(&header, claims, &encoding_key)
        .map_err(|e| DashError::UpstreamUnavailable(format!("failed to sign token request: {e}")))
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Clone)]
struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - chrono::Duration::seconds(REFRESH_SKEW_SECS) > now
    }
}

/// Hands out bearer tokens, exchanging a signed assertion when the cached one is stale.
pub struct TokenProvider {
    credentials: Credentials,
    http: reqwest::Client,
    lifetime: Duration,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenProvider {
    pub fn new(credentials: Credentials, http: reqwest::Client, lifetime: Duration) -> Self {
        Self {
            credentials,
            http,
            lifetime,
            cached: Mutex::new(None),
        }
    }

    pub async fn bearer(&self) -> Result<String> {
        let key_path = match &self.credentials {
            Credentials::StaticToken(token) => return Ok(token.clone()),
            Credentials::KeyFile(path) => path,
        };

        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.token.clone());
        }

        let key = ServiceAccountKey::read(key_path).await?;
        let token = self.exchange(&key, now).await?;
        let bearer = token.token.clone();
        *cached = Some(token);
        Ok(bearer)
    }

    async fn exchange(&self, key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<AccessToken> {
        let claims = AssertionClaims::new(key, now, self.lifetime);
        let assertion = sign_assertion(key, &claims)?;

        tracing::debug!(issuer = %claims.iss, "requesting warehouse access token");
        let response = self
            .http
            .post(key.token_uri())
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| {
                DashError::UpstreamUnavailable(format!("token request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<TokenErrorResponse>()
                .await
                .map(|e| match e.error_description {
                    Some(desc) => format!("{}: {desc}", e.error),
                    None => e.error,
                })
                .unwrap_or_else(|_| "unexpected response".to_string());
            return Err(DashError::UpstreamUnavailable(format!(
                "token request rejected with status {status}: {detail}"
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            DashError::UpstreamUnavailable(format!(
                "token response unreadable: {}",
                e.without_url()
            ))
        })?;
        let expires_in = body
            .expires_in
            .unwrap_or(self.lifetime.as_secs() as i64);

        Ok(AccessToken {
            token: body.access_token,
            expires_at: now + chrono::Duration::seconds(expires_in),
        })
    }
}
