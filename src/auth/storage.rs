//! SQLite credential store for the auth-service

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use uuid::Uuid;

use super::models::UserRecord;

#[derive(Error, Debug)]
pub enum CredentialStorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),
}

pub type Result<T> = std::result::Result<T, CredentialStorageError>;

pub struct CredentialStorage {
    conn: Connection,
}

const USER_COLUMNS: &str = "id, email, password_hash, is_verified, verification_token, \
                            google_id, reset_token, reset_expires_at";

fn user_from_row(row: &Row) -> rusqlite::Result<UserRecord> {
    let id: String = row.get(0)?;
    let reset_expires_at: Option<String> = row.get(7)?;
    let conversion = |e: Box<dyn std::error::Error + Send + Sync>| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e)
    };

    Ok(UserRecord {
        id: Uuid::parse_str(&id).map_err(|e| conversion(Box::new(e)))?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        is_verified: row.get(3)?,
        verification_token: row.get(4)?,
        google_id: row.get(5)?,
        reset_token: row.get(6)?,
        reset_expires_at: reset_expires_at
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| conversion(Box::new(e)))
            })
            .transpose()?,
    })
}

impl CredentialStorage {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                password_hash TEXT,
                is_verified INTEGER NOT NULL DEFAULT 0,
                verification_token TEXT,
                google_id TEXT,
                reset_token TEXT,
                reset_expires_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
            CREATE INDEX IF NOT EXISTS idx_users_google_id ON users(google_id);
            "#,
        )?;
        Ok(Self { conn })
    }

    pub fn insert_user(&self, user: &UserRecord) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO users ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                USER_COLUMNS
            ),
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.is_verified,
                user.verification_token,
                user.google_id,
                user.reset_token,
                user.reset_expires_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn find_one(&self, column: &str, value: &str) -> Result<Option<UserRecord>> {
        let user = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM users WHERE {} = ?1 ORDER BY rowid LIMIT 1",
                    USER_COLUMNS, column
                ),
                params![value],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// First account registered with `email`
    pub fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.find_one("email", email)
    }

    pub fn find_by_google_id(&self, google_id: &str) -> Result<Option<UserRecord>> {
        self.find_one("google_id", google_id)
    }

    pub fn get_user(&self, id: Uuid) -> Result<UserRecord> {
        self.find_one("id", &id.to_string())?
            .ok_or(CredentialStorageError::UserNotFound(id))
    }

    fn expect_one(&self, id: Uuid, changed: usize) -> Result<()> {
        if changed == 0 {
            return Err(CredentialStorageError::UserNotFound(id));
        }
        Ok(())
    }

    /// Mark the account verified and drop its verification token
    pub fn mark_verified(&self, id: Uuid) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE users SET is_verified = 1, verification_token = NULL WHERE id = ?1",
            params![id.to_string()],
        )?;
        self.expect_one(id, changed)
    }

    pub fn set_reset_token(&self, id: Uuid, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE users SET reset_token = ?1, reset_expires_at = ?2 WHERE id = ?3",
            params![token, expires_at.to_rfc3339(), id.to_string()],
        )?;
        self.expect_one(id, changed)
    }

    /// Store a new password hash and clear any pending reset
    pub fn replace_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE users SET password_hash = ?1, reset_token = NULL, reset_expires_at = NULL
             WHERE id = ?2",
            params![password_hash, id.to_string()],
        )?;
        self.expect_one(id, changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn registered(email: &str) -> UserRecord {
        UserRecord::registered(email.to_string(), "hash".to_string(), "verify".to_string())
    }

    #[test]
    fn test_insert_and_find() {
        let storage = CredentialStorage::open_in_memory().unwrap();
        let user = registered("a@example.com");
        storage.insert_user(&user).unwrap();

        assert_eq!(storage.find_by_email("a@example.com").unwrap(), Some(user.clone()));
        assert_eq!(storage.get_user(user.id).unwrap().email, "a@example.com");
        assert!(storage.find_by_email("b@example.com").unwrap().is_none());
    }

    #[test]
    fn test_verify_clears_token() {
        let storage = CredentialStorage::open_in_memory().unwrap();
        let user = registered("a@example.com");
        storage.insert_user(&user).unwrap();

        storage.mark_verified(user.id).unwrap();
        let stored = storage.get_user(user.id).unwrap();
        assert!(stored.is_verified);
        assert!(stored.verification_token.is_none());

        assert!(matches!(
            storage.mark_verified(Uuid::new_v4()),
            Err(CredentialStorageError::UserNotFound(_))
        ));
    }

    #[test]
    fn test_reset_cycle() {
        let storage = CredentialStorage::open_in_memory().unwrap();
        let user = registered("a@example.com");
        storage.insert_user(&user).unwrap();

        let expires = Utc::now() + Duration::hours(1);
        storage.set_reset_token(user.id, "reset-1", expires).unwrap();
        let stored = storage.get_user(user.id).unwrap();
        assert!(stored.reset_token_matches("reset-1", Utc::now()));

        storage.replace_password(user.id, "new-hash").unwrap();
        let stored = storage.get_user(user.id).unwrap();
        assert_eq!(stored.password_hash.as_deref(), Some("new-hash"));
        assert!(stored.reset_token.is_none());
        assert!(stored.reset_expires_at.is_none());
    }

    #[test]
    fn test_google_account() {
        let temp = TempDir::new().unwrap();
        let storage = CredentialStorage::open(&temp.path().join("auth.db")).unwrap();
        let user = UserRecord::from_google("g@example.com".to_string(), "sub-1".to_string());
        storage.insert_user(&user).unwrap();

        let found = storage.find_by_google_id("sub-1").unwrap().unwrap();
        assert!(found.is_verified);
        assert!(found.password_hash.is_none());
    }
}
