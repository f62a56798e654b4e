//! Accounts and credentials for the auth-service
//!
//! Password hashing, token issuing and the credential store live here, along
//! with the outside collaborators (mail delivery, Google sign-in and profile
//! sync with the user-service) behind async traits.

pub mod google;
pub mod mail;
pub mod models;
pub mod password;
pub mod profile_sync;
pub mod storage;
pub mod tokens;

pub use google::{GoogleIdentity, GoogleTokenInfo, IdTokenVerifier, OAuthError};
pub use mail::{LogMailer, MailError, Mailer, OutgoingMail};
pub use models::*;
pub use profile_sync::{ProfileDirectory, ProfileSyncError, UserServiceProfiles};
pub use storage::{CredentialStorage, CredentialStorageError};
pub use tokens::{TokenError, TokenIssuer};
