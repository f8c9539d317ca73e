//! Service-account authentication for the Admin SDK.
//!
//! The directory is read with domain-wide delegation: a JWT assertion signed
//! with the service-account key, impersonating an admin user (`subject`), is
//! exchanged for a bearer token at the key's token endpoint. Tokens are
//! cached until shortly before expiry.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{GwsError, GwsResult};

/// Read-only directory scopes the sync needs.
pub const DIRECTORY_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/admin.directory.group.readonly",
    "https://www.googleapis.com/auth/admin.directory.group.member.readonly",
    "https://www.googleapis.com/auth/admin.directory.user.readonly",
];

/// Anything able to produce a bearer token for directory calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> GwsResult<String>;
}

/// Service-account key document as downloaded from the cloud console.
#[derive(Debug, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub client_email: String,
    #[serde(default)]
    pub private_key_id: String,
    pub private_key: SecretString,
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Parse a key document.
    pub fn from_json(bytes: &[u8]) -> GwsResult<Self> {
        let key: Self = serde_json::from_slice(bytes)?;
        if key.kind != "service_account" {
            return Err(GwsError::Config(format!(
                "credentials file is of type {:?}, expected a service account key",
                key.kind
            )));
        }
        Ok(key)
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_expired(&self, grace: Duration) -> bool {
        Utc::now() + grace >= self.expires_at
    }
}

/// Token source performing the JWT-bearer grant, with caching.
pub struct TokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    subject: String,
    scopes: Vec<String>,
    http: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
    grace: Duration,
}

impl TokenSource {
    /// Build a token source impersonating `subject` with the default
    /// read-only directory scopes.
    pub fn new(key: ServiceAccountKey, subject: impl Into<String>) -> GwsResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())?;
        Ok(Self {
            key,
            encoding_key,
            subject: subject.into(),
            scopes: DIRECTORY_SCOPES.iter().map(|s| s.to_string()).collect(),
            http: reqwest::Client::new(),
            cached: RwLock::new(None),
            grace: Duration::minutes(5),
        })
    }

    async fn acquire(&self) -> GwsResult<CachedToken> {
        let now = Utc::now();
        let claims = Claims {
            iss: &self.key.client_email,
            sub: &self.subject,
            scope: self.scopes.join(" "),
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        let mut header = Header::new(Algorithm::RS256);
        if !self.key.private_key_id.is_empty() {
            header.kid = Some(self.key.private_key_id.clone());
        }
        let assertion = jsonwebtoken::encode(&header, &claims, &self.encoding_key)?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| GwsError::Auth(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GwsError::Auth(format!(
                "token request failed with status {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GwsError::Auth(format!("failed to parse token response: {e}")))?;

        let expires_at = now + Duration::seconds(token.expires_in);
        debug!(subject = %self.subject, %expires_at, "directory token acquired");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenProvider for TokenSource {
    async fn token(&self) -> GwsResult<String> {
        {
            let cache = self.cached.read().await;
            if let Some(token) = cache.as_ref() {
                if !token.is_expired(self.grace) {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let token = self.acquire().await?;
        let access_token = token.access_token.clone();
        *self.cached.write().await = Some(token);
        Ok(access_token)
    }
}
