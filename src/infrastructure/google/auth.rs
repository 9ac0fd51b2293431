use crate::config::FirebaseCredentials;
use crate::core::errors::BillbusterError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
pub const MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Clone, Debug)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Still usable, leaving a margin so the token cannot expire mid-request.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now
    }
}

/// OAuth2 access tokens for a Google service account (JWT-bearer grant).
pub struct ServiceAccountAuth {
    client: Client,
    credentials: FirebaseCredentials,
    scopes: String,
    cached: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(client: Client, credentials: FirebaseCredentials, scopes: &[&str]) -> Self {
        ServiceAccountAuth {
            client,
            credentials,
            scopes: scopes.join(" "),
            cached: RwLock::new(None),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.credentials.project_id
    }

    pub async fn access_token(&self) -> Result<String, BillbusterError> {
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.access_token.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.access_token.clone());
            }
        }

        let now = Utc::now();
        let assertion = self.sign_assertion(now)?;
        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| BillbusterError::AuthError(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BillbusterError::AuthError(format!(
                "Token exchange failed: {} - {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| BillbusterError::AuthError(format!("Malformed token response: {}", e)))?;
        debug!(expires_in = token.expires_in, "Obtained Google access token");

        let fresh = CachedToken {
            access_token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        };
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    pub fn claims(&self, now: DateTime<Utc>) -> AssertionClaims {
        AssertionClaims {
            iss: self.credentials.client_email.clone(),
            scope: self.scopes.clone(),
            aud: self.credentials.token_uri.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        }
    }

    fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, BillbusterError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.credentials.private_key_id.clone());
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| BillbusterError::AuthError(format!("Invalid service account key: {}", e)))?;

        encode(&header, &self.claims(now), &key)
            .map_err(|e| BillbusterError::AuthError(format!("JWT encoding error: {}", e)))
    }
}
