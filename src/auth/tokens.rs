//! HS256 JSON Web Tokens shared by both services

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::models::{EmailClaims, EmailTokenPurpose, SessionClaims};

/// Lifetime of a login session token
pub fn session_ttl() -> Duration {
    Duration::hours(1)
}

/// Lifetime of an email verification link
pub fn verify_ttl() -> Duration {
    Duration::days(1)
}

/// Lifetime of a password reset link
pub fn reset_ttl() -> Duration {
    Duration::hours(1)
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Token issued for {found:?}, expected {expected:?}")]
    WrongPurpose {
        expected: EmailTokenPurpose,
        found: EmailTokenPurpose,
    },
}

pub type Result<T> = std::result::Result<T, TokenError>;

/// Signs and verifies tokens with one shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    fn check<C: DeserializeOwned>(&self, token: &str) -> Result<C> {
        Ok(decode::<C>(token, &self.decoding, &self.validation)?.claims)
    }

    /// Bearer token for an authenticated user
    pub fn issue_session(&self, user_id: Uuid, email: &str) -> Result<String> {
        self.issue_session_with_ttl(user_id, email, session_ttl())
    }

    pub fn issue_session_with_ttl(&self, user_id: Uuid, email: &str, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        self.sign(&SessionClaims {
            user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        })
    }

    pub fn verify_session(&self, token: &str) -> Result<SessionClaims> {
        self.check(token)
    }

    /// Token embedded in a verification or reset link
    pub fn issue_email_token(&self, email: &str, purpose: EmailTokenPurpose, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        self.sign(&EmailClaims {
            email: email.to_string(),
            purpose,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        })
    }

    pub fn verify_email_token(&self, token: &str, expected: EmailTokenPurpose) -> Result<EmailClaims> {
        let claims: EmailClaims = self.check(token)?;
        if claims.purpose != expected {
            return Err(TokenError::WrongPurpose {
                expected,
                found: claims.purpose,
            });
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_round_trip() {
        let issuer = TokenIssuer::new(b"secret");
        let user_id = Uuid::new_v4();
        let token = issuer.issue_session(user_id, "a@example.com").unwrap();
        let claims = issuer.verify_session(&token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "a@example.com");
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = TokenIssuer::new(b"one")
            .issue_session(Uuid::new_v4(), "a@example.com")
            .unwrap();
        assert!(TokenIssuer::new(b"two").verify_session(&token).is_err());
    }

    #[test]
    fn test_expired_session_rejected() {
        let issuer = TokenIssuer::new(b"secret");
        let token = issuer
            .issue_session_with_ttl(Uuid::new_v4(), "a@example.com", Duration::hours(-2))
            .unwrap();
        assert!(issuer.verify_session(&token).is_err());
    }

    #[test]
    fn test_email_token_purpose_checked() {
        let issuer = TokenIssuer::new(b"secret");
        let token = issuer
            .issue_email_token("a@example.com", EmailTokenPurpose::Verify, verify_ttl())
            .unwrap();
        assert!(issuer
            .verify_email_token(&token, EmailTokenPurpose::Verify)
            .is_ok());
        assert!(matches!(
            issuer.verify_email_token(&token, EmailTokenPurpose::Reset),
            Err(TokenError::WrongPurpose { .. })
        ));
        // A link token is not a bearer token
        assert!(issuer.verify_session(&token).is_err());
    }
}
