//! Routes of the auth-service: registration, verification, login and password reset

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::{ApiError, MessageBody};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::tokens::{reset_ttl, verify_ttl};
use crate::auth::{
    CredentialStorage, EmailTokenPurpose, IdTokenVerifier, Mailer, OutgoingMail,
    ProfileDirectory, TokenIssuer, UserRecord,
};

/// Public URLs that end up inside emailed links
#[derive(Debug, Clone)]
pub struct AuthLinks {
    pub public_auth_url: String,
    pub frontend_url: String,
}

impl AuthLinks {
    fn verify(&self, token: &str) -> String {
        format!("{}/verify?token={}", self.public_auth_url.trim_end_matches('/'), token)
    }

    fn reset(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url.trim_end_matches('/'), token)
    }
}

/// Shared state of the auth-service
#[derive(Clone)]
pub struct AuthState {
    pub credentials: Arc<Mutex<CredentialStorage>>,
    pub tokens: TokenIssuer,
    pub mailer: Arc<dyn Mailer>,
    /// `None` when no Google client id is configured
    pub google: Option<Arc<dyn IdTokenVerifier>>,
    pub profiles: Arc<dyn ProfileDirectory>,
    pub links: AuthLinks,
}

impl AuthState {
    fn credentials(&self) -> Result<MutexGuard<'_, CredentialStorage>, ApiError> {
        self.credentials
            .lock()
            .map_err(|e| ApiError::internal("Credential store unavailable", e))
    }

    /// Issue a session token and make sure the user-service has a profile for it.
    /// Sync failures are logged and never fail the login.
    async fn open_session(&self, user: &UserRecord) -> Result<String, ApiError> {
        let token = self.tokens.issue_session(user.id, &user.email)?;
        self.sync_profile(&token, user).await;
        Ok(token)
    }

    async fn sync_profile(&self, token: &str, user: &UserRecord) {
        if let Err(e) = self.profiles.ensure_profile(token, user.id, &user.email).await {
            log::warn!("Error syncing user {} with user-service: {}", user.id, e);
        }
    }
}

pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/verify", get(verify))
        .route("/login", post(login))
        .route("/google-login", post(google_login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .with_state(state)
}

async fn hash_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal("Password hashing task failed", e))?
        .map_err(|e| ApiError::internal("Failed to hash password", e))
}

async fn verify_blocking(password: String, stored: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| ApiError::internal("Password verification task failed", e))?
        .map_err(|e| ApiError::internal("Failed to verify password", e))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
struct CredentialsRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    token: String,
}

// ==================== Registration ====================

async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let Json(body) = payload?;
    let (Some(email), Some(password)) = (present(body.email), present(body.password)) else {
        return Err(ApiError::validation("Email and password are required"));
    };

    let existing = state
        .credentials()?
        .find_by_email(&email)
        .map_err(|e| ApiError::credentials(e, "Registration failed"))?;
    if existing.is_some() {
        return Err(ApiError::validation("Email already registered"));
    }

    let password_hash = hash_blocking(password).await?;
    let verification_token =
        state
            .tokens
            .issue_email_token(&email, EmailTokenPurpose::Verify, verify_ttl())?;
    let user = UserRecord::registered(email, password_hash, verification_token.clone());
    state
        .credentials()?
        .insert_user(&user)
        .map_err(|e| ApiError::credentials(e, "Registration failed"))?;
    log::info!("Registered user {} <{}>", user.id, user.email);

    let mail = OutgoingMail::verification(&user.email, &state.links.verify(&verification_token));
    if let Err(e) = state.mailer.send(&mail).await {
        log::error!("Verification email to {} failed: {}", user.email, e);
        return Err(ApiError::Internal("Failed to send verification email".to_string()));
    }

    Ok(MessageBody::new(
        "Registration successful. Please check your email to verify.",
    ))
}

#[derive(Debug, Deserialize)]
struct VerifyQuery {
    token: Option<String>,
}

fn page(status: StatusCode, title: &str, text: &str) -> Response {
    let html = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1><p>{text}</p></body></html>"
    );
    (status, Html(html)).into_response()
}

async fn verify(State(state): State<AuthState>, Query(query): Query<VerifyQuery>) -> Response {
    let invalid = || {
        page(
            StatusCode::BAD_REQUEST,
            "Verification failed",
            "The verification link is invalid or has expired.",
        )
    };

    let Some(token) = present(query.token) else {
        return invalid();
    };
    let claims = match state
        .tokens
        .verify_email_token(&token, EmailTokenPurpose::Verify)
    {
        Ok(claims) => claims,
        Err(e) => {
            log::info!("Rejected verification token: {}", e);
            return invalid();
        }
    };

    let lookup = state
        .credentials()
        .and_then(|store| {
            store
                .find_by_email(&claims.email)
                .map_err(|e| ApiError::credentials(e, "Verification failed"))
        });
    let user = match lookup {
        Ok(Some(user)) => user,
        Ok(None) => {
            return page(
                StatusCode::NOT_FOUND,
                "Verification failed",
                "No account exists for this link.",
            )
        }
        Err(e) => return page(e.status(), "Verification failed", &e.to_string()),
    };

    if user.is_verified {
        return page(
            StatusCode::OK,
            "Already verified",
            "Your account is already verified. You can log in.",
        );
    }
    if user.verification_token.as_deref() != Some(token.as_str()) {
        return invalid();
    }

    let marked = state.credentials().and_then(|store| {
        store
            .mark_verified(user.id)
            .map_err(|e| ApiError::credentials(e, "Verification failed"))
    });
    if let Err(e) = marked {
        return page(e.status(), "Verification failed", &e.to_string());
    }
    log::info!("Verified user {}", user.id);

    match state.tokens.issue_session(user.id, &user.email) {
        Ok(session) => state.sync_profile(&session, &user).await,
        Err(e) => log::warn!("Could not issue a token to sync user {}: {}", user.id, e),
    }

    page(
        StatusCode::OK,
        "Account verified",
        "Your email has been verified. You can now log in.",
    )
}

// ==================== Login ====================

async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(body) = payload?;
    let (Some(email), Some(password)) = (present(body.email), present(body.password)) else {
        return Err(ApiError::validation("Email and password are required"));
    };

    let user = state
        .credentials()?
        .find_by_email(&email)
        .map_err(|e| ApiError::credentials(e, "Login failed"))?
        .filter(|u| u.is_verified)
        .ok_or_else(|| {
            ApiError::Unauthorized("Invalid credentials or unverified email".to_string())
        })?;

    let matches = match user.password_hash.clone() {
        Some(stored) => verify_blocking(password, stored).await?,
        None => false,
    };
    if !matches {
        log::info!("Password mismatch for {}", user.id);
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state.open_session(&user).await?;
    Ok(Json(TokenResponse { token }))
}

#[derive(Debug, Deserialize)]
struct GoogleLoginRequest {
    token: Option<String>,
}

async fn google_login(
    State(state): State<AuthState>,
    payload: Result<Json<GoogleLoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let failed = || ApiError::validation("Google login failed");

    let id_token = payload
        .ok()
        .and_then(|Json(body)| present(body.token))
        .ok_or_else(failed)?;
    let Some(verifier) = state.google.clone() else {
        log::warn!("Google login attempted without a configured client id");
        return Err(failed());
    };

    let identity = verifier.verify(&id_token).await.map_err(|e| {
        log::info!("Google token rejected: {}", e);
        failed()
    })?;

    let user = {
        let store = state.credentials()?;
        let found = store.find_by_google_id(&identity.subject).map_err(|e| {
            log::error!("Google login lookup failed: {}", e);
            failed()
        })?;
        match found {
            Some(user) => user,
            None => {
                let user = UserRecord::from_google(identity.email, identity.subject);
                store.insert_user(&user).map_err(|e| {
                    log::error!("Google login insert failed: {}", e);
                    failed()
                })?;
                log::info!("Created Google user {} <{}>", user.id, user.email);
                user
            }
        }
    };

    let token = state.open_session(&user).await.map_err(|_| failed())?;
    Ok(Json(TokenResponse { token }))
}

// ==================== Password Reset ====================

#[derive(Debug, Deserialize)]
struct ForgotPasswordRequest {
    email: Option<String>,
}

async fn forgot_password(
    State(state): State<AuthState>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let Json(body) = payload?;
    let email = present(body.email).ok_or_else(|| ApiError::validation("Email is required"))?;

    let user = state
        .credentials()?
        .find_by_email(&email)
        .map_err(|e| ApiError::credentials(e, "Password reset failed"))?
        .ok_or_else(|| ApiError::not_found("Email not found"))?;

    let reset_token = state
        .tokens
        .issue_email_token(&user.email, EmailTokenPurpose::Reset, reset_ttl())?;
    state
        .credentials()?
        .set_reset_token(user.id, &reset_token, Utc::now() + reset_ttl())
        .map_err(|e| ApiError::credentials(e, "Password reset failed"))?;

    let mail = OutgoingMail::password_reset(&user.email, &state.links.reset(&reset_token));
    if let Err(e) = state.mailer.send(&mail).await {
        log::error!("Reset email to {} failed: {}", user.email, e);
        return Err(ApiError::Internal("Failed to send password reset email".to_string()));
    }

    Ok(MessageBody::new("Password reset link sent to your email"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest {
    token: Option<String>,
    new_password: Option<String>,
}

async fn reset_password(
    State(state): State<AuthState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let Json(body) = payload?;
    let invalid = || ApiError::validation("Invalid or expired reset token");

    let token = present(body.token).ok_or_else(invalid)?;
    let new_password = present(body.new_password)
        .ok_or_else(|| ApiError::validation("New password is required"))?;

    let claims = state
        .tokens
        .verify_email_token(&token, EmailTokenPurpose::Reset)
        .map_err(|e| {
            log::info!("Rejected reset token: {}", e);
            invalid()
        })?;

    let user: UserRecord = state
        .credentials()?
        .find_by_email(&claims.email)
        .map_err(|e| ApiError::credentials(e, "Password reset failed"))?
        .filter(|u| u.reset_token_matches(&token, Utc::now()))
        .ok_or_else(invalid)?;

    let password_hash = hash_blocking(new_password).await?;
    state
        .credentials()?
        .replace_password(user.id, &password_hash)
        .map_err(|e| ApiError::credentials(e, "Password reset failed"))?;
    log::info!("Password reset for user {}", user.id);

    Ok(MessageBody::new("Password reset successful"))
}
