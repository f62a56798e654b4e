//! Google ID token verification through the tokeninfo endpoint

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token rejected by provider (status {0})")]
    Rejected(u16),

    #[error("Token issued for another client: {0}")]
    WrongAudience(String),

    #[error("Token carries no email")]
    MissingEmail,
}

/// Identity extracted from a verified ID token
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleIdentity {
    pub subject: String,
    pub email: String,
}

#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, OAuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// Asks Google to validate the token and checks it was minted for `client_id`
pub struct GoogleTokenInfo {
    client: reqwest::Client,
    client_id: String,
    endpoint: String,
}

impl GoogleTokenInfo {
    pub fn new(client_id: String) -> Self {
        Self::with_endpoint(client_id, TOKENINFO_URL.to_string())
    }

    pub fn with_endpoint(client_id: String, endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            endpoint,
        }
    }
}

#[async_trait]
impl IdTokenVerifier for GoogleTokenInfo {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, OAuthError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::Rejected(response.status().as_u16()));
        }

        let info: TokenInfo = response.json().await?;
        if info.aud != self.client_id {
            return Err(OAuthError::WrongAudience(info.aud));
        }

        Ok(GoogleIdentity {
            subject: info.sub,
            email: info.email.ok_or(OAuthError::MissingEmail)?,
        })
    }
}
