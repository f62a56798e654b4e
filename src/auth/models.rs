//! Data models for the credential store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored account. Password-less accounts come from Google sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub is_verified: bool,
    pub verification_token: Option<String>,
    pub google_id: Option<String>,
    pub reset_token: Option<String>,
    pub reset_expires_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Unverified account waiting for its email link
    pub fn registered(email: String, password_hash: String, verification_token: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash: Some(password_hash),
            is_verified: false,
            verification_token: Some(verification_token),
            google_id: None,
            reset_token: None,
            reset_expires_at: None,
        }
    }

    /// Verified account created from a Google identity
    pub fn from_google(email: String, google_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash: None,
            is_verified: true,
            verification_token: None,
            google_id: Some(google_id),
            reset_token: None,
            reset_expires_at: None,
        }
    }

    /// Whether `token` is the current reset token and still valid at `now`
    pub fn reset_token_matches(&self, token: &str, now: DateTime<Utc>) -> bool {
        use subtle::ConstantTimeEq;

        match (&self.reset_token, self.reset_expires_at) {
            (Some(stored), Some(expires)) if expires > now => {
                bool::from(stored.as_bytes().ct_eq(token.as_bytes()))
            }
            _ => false,
        }
    }
}

/// Claims of the bearer token both services accept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// What an emailed token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailTokenPurpose {
    Verify,
    Reset,
}

/// Claims of verification and password reset tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailClaims {
    pub email: String,
    pub purpose: EmailTokenPurpose,
    pub iat: i64,
    pub exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_reset_token_match() {
        let now = Utc::now();
        let mut user = UserRecord::registered(
            "a@example.com".to_string(),
            "hash".to_string(),
            "verify".to_string(),
        );
        assert!(!user.reset_token_matches("t", now));

        user.reset_token = Some("token-1".to_string());
        user.reset_expires_at = Some(now + Duration::hours(1));
        assert!(user.reset_token_matches("token-1", now));
        assert!(!user.reset_token_matches("token-2", now));
        assert!(!user.reset_token_matches("token-1", now + Duration::hours(2)));
    }
}
