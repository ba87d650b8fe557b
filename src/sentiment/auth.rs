// src/sentiment/auth.rs
//! Google credentials from an explicit file path.
//!
//! Supported `type`s: `service_account` (JWT bearer grant), `authorized_user`
//! (refresh-token grant, what `gcloud auth application-default login` writes)
//! and `api_key` (`{"type": "api_key", "api_key": "..."}`).

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::AnalyzeError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const JWT_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Refresh this long before the token actually expires.
const EXPIRY_SLACK: Duration = Duration::from_secs(60);

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialsFile {
    ServiceAccount {
        client_email: String,
        private_key: String,
        #[serde(default = "default_token_uri")]
        token_uri: String,
    },
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        #[serde(default = "default_token_uri")]
        token_uri: String,
    },
    ApiKey {
        api_key: String,
    },
}

impl CredentialsFile {
    pub fn load(path: &Path) -> Result<Self, AnalyzeError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AnalyzeError::Auth(format!("reading credentials {}: {e}", path.display())))?;
        Self::parse(&data)
    }

    pub fn parse(s: &str) -> Result<Self, AnalyzeError> {
        serde_json::from_str(s).map_err(|e| AnalyzeError::Auth(format!("credentials file: {e}")))
    }
}

/// How a request gets authorised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    ApiKey(String),
    Bearer(String),
}

#[derive(Debug)]
struct CachedToken {
    token: String,
    refresh_at: Instant,
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

pub struct Authenticator {
    creds: CredentialsFile,
    cached: Mutex<Option<CachedToken>>,
}

impl Authenticator {
    pub fn new(creds: CredentialsFile) -> Self {
        Self {
            creds,
            cached: Mutex::new(None),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, AnalyzeError> {
        CredentialsFile::load(path).map(Self::new)
    }

    /// Current credential; OAuth tokens are fetched on first use and reused
    /// until shortly before they expire.
    pub async fn credential(&self, http: &reqwest::Client) -> Result<Credential, AnalyzeError> {
        if let CredentialsFile::ApiKey { api_key } = &self.creds {
            return Ok(Credential::ApiKey(api_key.clone()));
        }

        let mut cached = self.cached.lock().await;
        if let Some(tok) = cached.as_ref() {
            if Instant::now() < tok.refresh_at {
                return Ok(Credential::Bearer(tok.token.clone()));
            }
        }

        let (token_uri, form) = self.token_request()?;
        let resp = http
            .post(&token_uri)
            .form(&form)
            .send()
            .await
            .map_err(AnalyzeError::Network)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalyzeError::Auth(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }
        let tok: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AnalyzeError::Auth(format!("token response: {e}")))?;

        let lifetime = Duration::from_secs(tok.expires_in.unwrap_or(3600));
        *cached = Some(CachedToken {
            token: tok.access_token.clone(),
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_SLACK),
        });
        tracing::debug!(target: "sentiment", lifetime_secs = lifetime.as_secs(), "access token refreshed");
        Ok(Credential::Bearer(tok.access_token))
    }

    fn token_request(&self) -> Result<(String, Vec<(&'static str, String)>), AnalyzeError> {
        match &self.creds {
            CredentialsFile::ServiceAccount {
                client_email,
                private_key,
                token_uri,
            } => {
                let iat = chrono::Utc::now().timestamp();
                let claims = Claims {
                    iss: client_email,
                    scope: SCOPE,
                    aud: token_uri,
                    iat,
                    exp: iat + 3600,
                };
                let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
                    .map_err(|e| AnalyzeError::Auth(format!("service account key: {e}")))?;
                let assertion = encode(&Header::new(Algorithm::RS256), &claims, &key)
                    .map_err(|e| AnalyzeError::Auth(format!("signing assertion: {e}")))?;
                Ok((
                    token_uri.clone(),
                    vec![("grant_type", JWT_GRANT.to_string()), ("assertion", assertion)],
                ))
            }
            CredentialsFile::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => Ok((
                token_uri.clone(),
                vec![
                    ("grant_type", "refresh_token".to_string()),
                    ("client_id", client_id.clone()),
                    ("client_secret", client_secret.clone()),
                    ("refresh_token", refresh_token.clone()),
                ],
            )),
            CredentialsFile::ApiKey { .. } => Err(AnalyzeError::Auth(
                "api key credentials have no token endpoint".to_string(),
            )),
        }
    }
}
