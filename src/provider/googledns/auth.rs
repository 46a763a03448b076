//! Service account authentication using the OAuth 2.0 JWT bearer grant

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::debug;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::provider::ProviderError;

pub const CLOUD_DNS_SCOPE: &str = "https://www.googleapis.com/auth/ndev.clouddns.readwrite";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The parts of a service account key file needed to request access tokens
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

// Keep the private key out of logs
impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_json(data: &[u8]) -> Result<Self, ProviderError> {
        serde_json::from_slice(data)
            .map_err(|e| ProviderError::Setup(format!("invalid service account key: {}", e)))
    }

    fn claims(&self, now: u64) -> Claims<'_> {
        Claims {
            iss: &self.client_email,
            scope: CLOUD_DNS_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Build the signed JWT that is exchanged for an access token
    pub fn assertion(&self, now: u64) -> Result<String, ProviderError> {
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| ProviderError::Setup(format!("invalid service account private key: {}", e)))?;
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.to_owned();

        encode(&header, &self.claims(now), &key)
            .map_err(|e| ProviderError::Setup(format!("signing token request failed: {}", e)))
    }
}

/// Exchange a signed assertion for an OAuth access token
pub fn fetch_access_token(http: &Client, key: &ServiceAccountKey) -> Result<String, ProviderError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ProviderError::Internal(e.to_string()))?
        .as_secs();
    let assertion = key.assertion(now)?;

    debug!("Requesting access token for {}", key.client_email);
    let res = http
        .post(&key.token_uri)
        .form(&[
            ("grant_type", JWT_BEARER_GRANT_TYPE),
            ("assertion", assertion.as_str()),
        ])
        .send()?;

    let status = res.status();
    let body = res.text()?;
    if !status.is_success() {
        let msg = match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(e) => match e.error_description {
                Some(desc) => format!("{}: {}", e.error, desc),
                None => e.error,
            },
            Err(_) => format!("token endpoint returned status {}: {}", status, body),
        };
        return Err(ProviderError::Setup(msg));
    }

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| ProviderError::Setup(format!("invalid token response: {}", e)))?;
    debug!("Received access token valid for {:?} seconds", token.expires_in);
    Ok(token.access_token)
}
