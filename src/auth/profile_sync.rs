//! Makes sure the user-service knows about a freshly authenticated user

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProfileSyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("User service answered {0}")]
    Status(u16),
}

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Create the profile unless it already exists. `bearer` is the user's session token.
    async fn ensure_profile(&self, bearer: &str, user_id: Uuid, email: &str) -> Result<(), ProfileSyncError>;
}

/// REST client for the user-service `/profile` endpoints
pub struct UserServiceProfiles {
    client: reqwest::Client,
    base_url: String,
}

impl UserServiceProfiles {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ProfileDirectory for UserServiceProfiles {
    async fn ensure_profile(&self, bearer: &str, user_id: Uuid, email: &str) -> Result<(), ProfileSyncError> {
        let url = format!("{}/profile", self.base_url);

        let existing = self.client.get(&url).bearer_auth(bearer).send().await?;
        match existing.status() {
            s if s.is_success() => {
                log::debug!("Profile found in user-service for {}", user_id);
                return Ok(());
            }
            StatusCode::NOT_FOUND => {}
            other => return Err(ProfileSyncError::Status(other.as_u16())),
        }

        let created = self
            .client
            .post(&url)
            .bearer_auth(bearer)
            .json(&json!({ "userId": user_id, "email": email, "name": "" }))
            .send()
            .await?;
        if !created.status().is_success() {
            return Err(ProfileSyncError::Status(created.status().as_u16()));
        }

        log::info!("User created in user-service: {} <{}>", user_id, email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenIssuer;
    use crate::flashcards::ContentStorage;
    use crate::server::{self, content_api, ContentState};
    use std::net::SocketAddr;

    #[tokio::test]
    async fn test_creates_profile_once() {
        let tokens = TokenIssuer::new(b"sync-secret");
        let state = ContentState::new(ContentStorage::open_in_memory().unwrap(), tokens.clone());
        let storage = state.storage.clone();
        let handle = server::start(
            "user-service",
            SocketAddr::from(([127, 0, 0, 1], 0)),
            content_api::router(state),
        )
        .await
        .unwrap();

        let user_id = Uuid::new_v4();
        let bearer = tokens.issue_session(user_id, "lan@example.com").unwrap();
        let profiles = UserServiceProfiles::new(&format!("{}/", handle.base_url()));

        profiles
            .ensure_profile(&bearer, user_id, "lan@example.com")
            .await
            .unwrap();
        let created = storage.lock().unwrap().get_profile(user_id).unwrap().unwrap();
        assert_eq!(created.email, "lan@example.com");
        assert_eq!(created.name, "");

        // A second sync finds the profile and leaves it alone
        storage
            .lock()
            .unwrap()
            .upsert_profile(user_id, Some("Lan"), "lan@example.com")
            .unwrap();
        profiles
            .ensure_profile(&bearer, user_id, "other@example.com")
            .await
            .unwrap();
        let kept = storage.lock().unwrap().get_profile(user_id).unwrap().unwrap();
        assert_eq!(kept.name, "Lan");
        assert_eq!(kept.email, "lan@example.com");
    }

    #[tokio::test]
    async fn test_foreign_token_is_rejected() {
        let state = ContentState::new(
            ContentStorage::open_in_memory().unwrap(),
            TokenIssuer::new(b"sync-secret"),
        );
        let handle = server::start(
            "user-service",
            SocketAddr::from(([127, 0, 0, 1], 0)),
            content_api::router(state),
        )
        .await
        .unwrap();

        let user_id = Uuid::new_v4();
        let bearer = TokenIssuer::new(b"wrong-secret")
            .issue_session(user_id, "lan@example.com")
            .unwrap();
        let profiles = UserServiceProfiles::new(&handle.base_url());

        match profiles.ensure_profile(&bearer, user_id, "lan@example.com").await {
            Err(ProfileSyncError::Status(401)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let profiles = UserServiceProfiles::new("http://127.0.0.1:9");
        let result = profiles
            .ensure_profile("token", Uuid::new_v4(), "lan@example.com")
            .await;
        assert!(matches!(result, Err(ProfileSyncError::Http(_))));
    }
}
