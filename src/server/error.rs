//! Error responses shared by both services: a status code and `{"message": ...}`

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::{CredentialStorageError, TokenError};
use crate::flashcards::{ContentStorageError, GeneratorError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

/// JSON body used for errors and plain acknowledgements
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a content storage error, reporting `context` for unexpected failures
    pub fn content(err: ContentStorageError, context: &str) -> Self {
        match err {
            ContentStorageError::SetNotFound(_) => Self::not_found("Flashcard set not found"),
            ContentStorageError::CardNotFound(_) => Self::not_found("Flashcard not found"),
            other => {
                log::error!("{}: {}", context, other);
                Self::Internal(context.to_string())
            }
        }
    }

    /// Map a credential storage error, reporting `context` for unexpected failures
    pub fn credentials(err: CredentialStorageError, context: &str) -> Self {
        match err {
            CredentialStorageError::UserNotFound(_) => Self::not_found("User not found"),
            other => {
                log::error!("{}: {}", context, other);
                Self::Internal(context.to_string())
            }
        }
    }

    pub fn internal(context: &str, cause: impl std::fmt::Display) -> Self {
        log::error!("{}: {}", context, cause);
        Self::Internal(context.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), MessageBody::new(self.to_string())).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<GeneratorError> for ApiError {
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::EmptyPool => Self::not_found("No flashcards found"),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        Self::internal("Failed to issue token", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_error_body_is_message_json() {
        let response = ApiError::not_found("No flashcards found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "No flashcards found" }));
    }

    #[test]
    fn test_storage_mapping() {
        let err = ApiError::content(ContentStorageError::SetNotFound(Uuid::new_v4()), "ctx");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::content(
            ContentStorageError::Corrupt("bad mode".to_string()),
            "Failed to fetch quiz data",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to fetch quiz data");
    }
}
