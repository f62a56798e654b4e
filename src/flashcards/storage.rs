//! SQLite storage for profiles, flashcard sets, flashcards and study sessions
//!
//! Every query is scoped to an owner. Flashcards come back in insertion
//! order (`rowid`), which is the order the quiz and test generators use.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use uuid::Uuid;

use super::models::*;

#[derive(Error, Debug)]
pub enum ContentStorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Flashcard set not found: {0}")]
    SetNotFound(Uuid),

    #[error("Flashcard not found: {0}")]
    CardNotFound(Uuid),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, ContentStorageError>;

/// Storage manager for the user-service content
pub struct ContentStorage {
    conn: Connection,
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS profiles (
        user_id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS flashcard_sets (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        owner_id TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS flashcards (
        id TEXT PRIMARY KEY,
        front TEXT NOT NULL,
        back TEXT NOT NULL,
        set_id TEXT NOT NULL,
        owner_id TEXT NOT NULL,
        is_memorized INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS study_sessions (
        id TEXT PRIMARY KEY,
        set_id TEXT NOT NULL,
        owner_id TEXT NOT NULL,
        mode TEXT NOT NULL,
        score INTEGER NOT NULL,
        total_questions INTEGER NOT NULL,
        completed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_sets_owner ON flashcard_sets(owner_id);
    CREATE INDEX IF NOT EXISTS idx_cards_set_owner ON flashcards(set_id, owner_id);
    CREATE INDEX IF NOT EXISTS idx_sessions_owner ON study_sessions(owner_id);
"#;

fn parse_uuid(raw: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_time(raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn set_from_row(row: &Row) -> rusqlite::Result<FlashcardSet> {
    Ok(FlashcardSet {
        id: parse_uuid(row.get(0)?)?,
        title: row.get(1)?,
        owner_id: parse_uuid(row.get(2)?)?,
        created_at: parse_time(row.get(3)?)?,
    })
}

fn card_from_row(row: &Row) -> rusqlite::Result<Flashcard> {
    Ok(Flashcard {
        id: parse_uuid(row.get(0)?)?,
        front: row.get(1)?,
        back: row.get(2)?,
        set_id: parse_uuid(row.get(3)?)?,
        owner_id: parse_uuid(row.get(4)?)?,
        is_memorized: row.get(5)?,
        created_at: parse_time(row.get(6)?)?,
    })
}

/// Raw session row; the mode is checked after the query
type SessionRow = (StudySession, String);

fn session_from_row(row: &Row) -> rusqlite::Result<SessionRow> {
    let session = StudySession {
        id: parse_uuid(row.get(0)?)?,
        set_id: parse_uuid(row.get(1)?)?,
        owner_id: parse_uuid(row.get(2)?)?,
        mode: StudyMode::Flashcard,
        score: row.get(4)?,
        total_questions: row.get(5)?,
        completed_at: parse_time(row.get(6)?)?,
    };
    Ok((session, row.get(3)?))
}

fn with_mode((mut session, mode): SessionRow) -> Result<StudySession> {
    session.mode = mode.parse().map_err(ContentStorageError::Corrupt)?;
    Ok(session)
}

const CARD_COLUMNS: &str = "id, front, back, set_id, owner_id, is_memorized, created_at";
const SESSION_COLUMNS: &str = "id, set_id, owner_id, mode, score, total_questions, completed_at";

impl ContentStorage {
    /// Open (or create) the database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ==================== Profile Operations ====================

    /// Create the profile or update its name and email
    pub fn upsert_profile(&self, user_id: Uuid, name: Option<&str>, email: &str) -> Result<Profile> {
        let existing = self.get_profile(user_id)?;
        let name = match (name.filter(|n| !n.is_empty()), existing) {
            (Some(n), _) => n.to_string(),
            (None, Some(p)) => p.name,
            (None, None) => String::new(),
        };

        self.conn.execute(
            "INSERT INTO profiles (user_id, name, email) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET name = excluded.name, email = excluded.email",
            params![user_id.to_string(), name, email],
        )?;

        Ok(Profile {
            user_id,
            name,
            email: email.to_string(),
        })
    }

    pub fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT user_id, name, email FROM profiles WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| {
                    Ok(Profile {
                        user_id: parse_uuid(row.get(0)?)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    // ==================== Set Operations ====================

    pub fn list_sets(&self, owner_id: Uuid) -> Result<Vec<FlashcardSet>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, owner_id, created_at FROM flashcard_sets
             WHERE owner_id = ?1 ORDER BY rowid",
        )?;
        let sets = stmt
            .query_map(params![owner_id.to_string()], set_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sets)
    }

    pub fn get_set(&self, owner_id: Uuid, set_id: Uuid) -> Result<FlashcardSet> {
        self.conn
            .query_row(
                "SELECT id, title, owner_id, created_at FROM flashcard_sets
                 WHERE id = ?1 AND owner_id = ?2",
                params![set_id.to_string(), owner_id.to_string()],
                set_from_row,
            )
            .optional()?
            .ok_or(ContentStorageError::SetNotFound(set_id))
    }

    pub fn create_set(&self, owner_id: Uuid, title: String) -> Result<FlashcardSet> {
        let set = FlashcardSet::new(owner_id, title);
        self.conn.execute(
            "INSERT INTO flashcard_sets (id, title, owner_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                set.id.to_string(),
                set.title,
                set.owner_id.to_string(),
                set.created_at.to_rfc3339(),
            ],
        )?;
        Ok(set)
    }

    /// Delete a set, then its cards, then its sessions.
    ///
    /// The three deletes are separate statements; a failure part way leaves
    /// the earlier ones applied.
    pub fn delete_set(&self, owner_id: Uuid, set_id: Uuid) -> Result<()> {
        let owner = owner_id.to_string();
        let set = set_id.to_string();

        let removed = self.conn.execute(
            "DELETE FROM flashcard_sets WHERE id = ?1 AND owner_id = ?2",
            params![set, owner],
        )?;
        if removed == 0 {
            return Err(ContentStorageError::SetNotFound(set_id));
        }

        let cards = self.conn.execute(
            "DELETE FROM flashcards WHERE set_id = ?1 AND owner_id = ?2",
            params![set, owner],
        )?;
        let sessions = self.conn.execute(
            "DELETE FROM study_sessions WHERE set_id = ?1 AND owner_id = ?2",
            params![set, owner],
        )?;
        log::debug!(
            "Deleted set {} with {} cards and {} sessions",
            set_id,
            cards,
            sessions
        );
        Ok(())
    }

    // ==================== Card Operations ====================

    /// Cards of a set in insertion order
    pub fn list_cards(&self, owner_id: Uuid, set_id: Uuid) -> Result<Vec<Flashcard>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM flashcards WHERE set_id = ?1 AND owner_id = ?2 ORDER BY rowid",
            CARD_COLUMNS
        ))?;
        let cards = stmt
            .query_map(params![set_id.to_string(), owner_id.to_string()], card_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    pub fn get_card(&self, owner_id: Uuid, card_id: Uuid) -> Result<Flashcard> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM flashcards WHERE id = ?1 AND owner_id = ?2",
                    CARD_COLUMNS
                ),
                params![card_id.to_string(), owner_id.to_string()],
                card_from_row,
            )
            .optional()?
            .ok_or(ContentStorageError::CardNotFound(card_id))
    }

    fn insert_card(conn: &Connection, card: &Flashcard) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT INTO flashcards ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                CARD_COLUMNS
            ),
            params![
                card.id.to_string(),
                card.front,
                card.back,
                card.set_id.to_string(),
                card.owner_id.to_string(),
                card.is_memorized,
                card.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Create a card in an owned set
    pub fn create_card(
        &self,
        owner_id: Uuid,
        set_id: Uuid,
        front: String,
        back: String,
    ) -> Result<Flashcard> {
        self.get_set(owner_id, set_id)?;
        let card = Flashcard::new(set_id, owner_id, front, back);
        Self::insert_card(&self.conn, &card)?;
        Ok(card)
    }

    /// Create many cards at once. Every target set must be owned by `owner_id`;
    /// nothing is written otherwise.
    pub fn create_cards(&mut self, owner_id: Uuid, cards: &[(Uuid, String, String)]) -> Result<Vec<Flashcard>> {
        for (set_id, _, _) in cards {
            self.get_set(owner_id, *set_id)?;
        }

        let tx = self.conn.transaction()?;
        let mut created = Vec::with_capacity(cards.len());
        for (set_id, front, back) in cards {
            let card = Flashcard::new(*set_id, owner_id, front.clone(), back.clone());
            Self::insert_card(&tx, &card)?;
            created.push(card);
        }
        tx.commit()?;

        Ok(created)
    }

    /// Replace the text of a card, optionally setting its memorized flag
    pub fn update_card(
        &self,
        owner_id: Uuid,
        card_id: Uuid,
        front: String,
        back: String,
        is_memorized: Option<bool>,
    ) -> Result<Flashcard> {
        let mut card = self.get_card(owner_id, card_id)?;
        card.front = front;
        card.back = back;
        if let Some(m) = is_memorized {
            card.is_memorized = m;
        }

        self.conn.execute(
            "UPDATE flashcards SET front = ?1, back = ?2, is_memorized = ?3
             WHERE id = ?4 AND owner_id = ?5",
            params![
                card.front,
                card.back,
                card.is_memorized,
                card_id.to_string(),
                owner_id.to_string(),
            ],
        )?;
        Ok(card)
    }

    pub fn delete_card(&self, owner_id: Uuid, card_id: Uuid) -> Result<()> {
        let removed = self.conn.execute(
            "DELETE FROM flashcards WHERE id = ?1 AND owner_id = ?2",
            params![card_id.to_string(), owner_id.to_string()],
        )?;
        if removed == 0 {
            return Err(ContentStorageError::CardNotFound(card_id));
        }
        Ok(())
    }

    // ==================== Session Operations ====================

    /// Append a study session for an owned set
    pub fn append_session(&self, owner_id: Uuid, new: &NewStudySession) -> Result<StudySession> {
        self.get_set(owner_id, new.set_id)?;
        let session = StudySession::record(owner_id, new);

        self.conn.execute(
            &format!(
                "INSERT INTO study_sessions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                SESSION_COLUMNS
            ),
            params![
                session.id.to_string(),
                session.set_id.to_string(),
                session.owner_id.to_string(),
                session.mode.as_str(),
                session.score,
                session.total_questions,
                session.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(session)
    }

    /// Sessions whose set still exists, oldest first, with set titles
    pub fn session_history(&self, owner_id: Uuid) -> Result<Vec<SessionHistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.set_id, s.owner_id, s.mode, s.score, s.total_questions, s.completed_at,
                    f.title
             FROM study_sessions s
             JOIN flashcard_sets f ON f.id = s.set_id
             WHERE s.owner_id = ?1
             ORDER BY s.rowid",
        )?;
        let rows = stmt
            .query_map(params![owner_id.to_string()], |row| {
                Ok((session_from_row(row)?, row.get::<_, String>(7)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(raw, set_title)| {
                Ok(SessionHistoryEntry {
                    session: with_mode(raw)?,
                    set_title,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> ContentStorage {
        ContentStorage::open_in_memory().unwrap()
    }

    fn session(set_id: Uuid, mode: StudyMode, score: u32) -> NewStudySession {
        NewStudySession {
            set_id,
            mode,
            score,
            total_questions: 5,
        }
    }

    #[test]
    fn test_cards_come_back_in_insertion_order() {
        let storage = create_test_storage();
        let owner = Uuid::new_v4();
        let set = storage.create_set(owner, "Animals".to_string()).unwrap();

        for (f, b) in [("dog", "chó"), ("cat", "mèo"), ("bird", "chim")] {
            storage
                .create_card(owner, set.id, f.to_string(), b.to_string())
                .unwrap();
        }

        let fronts: Vec<_> = storage
            .list_cards(owner, set.id)
            .unwrap()
            .into_iter()
            .map(|c| c.front)
            .collect();
        assert_eq!(fronts, vec!["dog", "cat", "bird"]);
    }

    #[test]
    fn test_cards_are_owner_scoped() {
        let storage = create_test_storage();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let set = storage.create_set(owner, "Mine".to_string()).unwrap();
        let card = storage
            .create_card(owner, set.id, "a".to_string(), "b".to_string())
            .unwrap();

        assert!(storage.list_cards(stranger, set.id).unwrap().is_empty());
        assert!(matches!(
            storage.get_card(stranger, card.id),
            Err(ContentStorageError::CardNotFound(_))
        ));
        assert!(matches!(
            storage.create_card(stranger, set.id, "x".to_string(), "y".to_string()),
            Err(ContentStorageError::SetNotFound(_))
        ));
    }

    #[test]
    fn test_delete_set_cascades() {
        let storage = create_test_storage();
        let owner = Uuid::new_v4();
        let set = storage.create_set(owner, "Doomed".to_string()).unwrap();
        let keep = storage.create_set(owner, "Kept".to_string()).unwrap();
        storage
            .create_card(owner, set.id, "a".to_string(), "b".to_string())
            .unwrap();
        storage
            .create_card(owner, keep.id, "c".to_string(), "d".to_string())
            .unwrap();
        storage
            .append_session(owner, &session(set.id, StudyMode::Quiz, 3))
            .unwrap();

        storage.delete_set(owner, set.id).unwrap();

        assert!(storage.list_cards(owner, set.id).unwrap().is_empty());
        let sessions: i64 = storage
            .conn
            .query_row(
                "SELECT COUNT(*) FROM study_sessions WHERE set_id = ?1",
                params![set.id.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(sessions, 0);
        assert_eq!(storage.list_cards(owner, keep.id).unwrap().len(), 1);
        assert!(matches!(
            storage.delete_set(owner, set.id),
            Err(ContentStorageError::SetNotFound(_))
        ));
    }

    #[test]
    fn test_update_card_keeps_memorized_flag_when_absent() {
        let storage = create_test_storage();
        let owner = Uuid::new_v4();
        let set = storage.create_set(owner, "S".to_string()).unwrap();
        let card = storage
            .create_card(owner, set.id, "a".to_string(), "b".to_string())
            .unwrap();

        let updated = storage
            .update_card(owner, card.id, "a".to_string(), "b".to_string(), Some(true))
            .unwrap();
        assert!(updated.is_memorized);

        let updated = storage
            .update_card(owner, card.id, "A".to_string(), "B".to_string(), None)
            .unwrap();
        assert!(updated.is_memorized);
        assert_eq!(storage.get_card(owner, card.id).unwrap().front, "A");
    }

    #[test]
    fn test_bulk_create_rejects_foreign_set() {
        let mut storage = create_test_storage();
        let owner = Uuid::new_v4();
        let set = storage.create_set(owner, "S".to_string()).unwrap();
        let foreign = Uuid::new_v4();

        let result = storage.create_cards(
            owner,
            &[
                (set.id, "a".to_string(), "b".to_string()),
                (foreign, "c".to_string(), "d".to_string()),
            ],
        );
        assert!(matches!(result, Err(ContentStorageError::SetNotFound(id)) if id == foreign));
        assert!(storage.list_cards(owner, set.id).unwrap().is_empty());

        let created = storage
            .create_cards(owner, &[(set.id, "a".to_string(), "b".to_string())])
            .unwrap();
        assert_eq!(created.len(), 1);
        assert!(!created[0].is_memorized);
    }

    #[test]
    fn test_history_skips_deleted_sets() {
        let storage = create_test_storage();
        let owner = Uuid::new_v4();
        let live = storage.create_set(owner, "Live".to_string()).unwrap();
        storage
            .append_session(owner, &session(live.id, StudyMode::Test, 4))
            .unwrap();

        // A session left behind by an interrupted cascade
        storage
            .conn
            .execute(
                "INSERT INTO study_sessions (id, set_id, owner_id, mode, score, total_questions, completed_at)
                 VALUES (?1, ?2, ?3, 'quiz', 1, 2, ?4)",
                params![
                    Uuid::new_v4().to_string(),
                    Uuid::new_v4().to_string(),
                    owner.to_string(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .unwrap();

        let history = storage.session_history(owner).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].set_title, "Live");
        assert_eq!(history[0].session.mode, StudyMode::Test);
    }

    #[test]
    fn test_profile_upsert_keeps_name() {
        let storage = create_test_storage();
        let user = Uuid::new_v4();
        storage.upsert_profile(user, Some("Lan"), "lan@example.com").unwrap();
        let updated = storage.upsert_profile(user, None, "lan@new.example").unwrap();
        assert_eq!(updated.name, "Lan");
        assert_eq!(
            storage.get_profile(user).unwrap().map(|p| p.email),
            Some("lan@new.example".to_string())
        );
    }

    #[test]
    fn test_reopen_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data").join("content.db");
        let owner = Uuid::new_v4();
        let set_id = {
            let storage = ContentStorage::open(&path).unwrap();
            storage.create_set(owner, "Persisted".to_string()).unwrap().id
        };

        let storage = ContentStorage::open(&path).unwrap();
        assert_eq!(storage.get_set(owner, set_id).unwrap().title, "Persisted");
    }
}
