//! Data models for flashcard sets, study sessions and generated questions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display profile kept by the user-service, keyed by the auth-service user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: Uuid,
    #[serde(default)]
    pub name: String,
    pub email: String,
}

/// A named collection of flashcards owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSet {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl FlashcardSet {
    pub fn new(owner_id: Uuid, title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            owner_id,
            created_at: Utc::now(),
        }
    }
}

/// A flashcard with a prompt (front) and an answer (back)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: Uuid,
    pub front: String,
    pub back: String,
    pub set_id: Uuid,
    pub owner_id: Uuid,
    #[serde(default)]
    pub is_memorized: bool,
    pub created_at: DateTime<Utc>,
}

impl Flashcard {
    pub fn new(set_id: Uuid, owner_id: Uuid, front: String, back: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            front,
            back,
            set_id,
            owner_id,
            is_memorized: false,
            created_at: Utc::now(),
        }
    }
}

/// Fields accepted when creating a card, alone or in bulk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFlashcard {
    #[serde(default)]
    pub front: String,
    #[serde(default)]
    pub back: String,
    #[serde(default)]
    pub set_id: Option<Uuid>,
}

/// Study mode a session was recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyMode {
    Flashcard,
    Match,
    Quiz,
    Test,
}

impl StudyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flashcard => "flashcard",
            Self::Match => "match",
            Self::Quiz => "quiz",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for StudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flashcard" => Ok(Self::Flashcard),
            "match" => Ok(Self::Match),
            "quiz" => Ok(Self::Quiz),
            "test" => Ok(Self::Test),
            other => Err(format!("Unknown study mode: {}", other)),
        }
    }
}

/// One completed attempt at a study mode. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: Uuid,
    pub set_id: Uuid,
    pub owner_id: Uuid,
    pub mode: StudyMode,
    pub score: u32,
    pub total_questions: u32,
    pub completed_at: DateTime<Utc>,
}

/// Score submission produced when an attempt completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudySession {
    pub set_id: Uuid,
    pub mode: StudyMode,
    pub score: u32,
    pub total_questions: u32,
}

impl StudySession {
    pub fn record(owner_id: Uuid, new: &NewStudySession) -> Self {
        Self {
            id: Uuid::new_v4(),
            set_id: new.set_id,
            owner_id,
            mode: new.mode,
            score: new.score,
            total_questions: new.total_questions,
            completed_at: Utc::now(),
        }
    }
}

/// A study session joined with the title of its (still existing) set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistoryEntry {
    #[serde(flatten)]
    pub session: StudySession,
    pub set_title: String,
}

/// Kind of a generated question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Pick one of the listed options
    Multiple,
    /// Judge a "front - back" pairing
    #[serde(rename = "truefalse")]
    TrueFalse,
    /// Type the answer
    Fill,
}

/// Multiple-choice question built from one flashcard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub answer: String,
    pub options: Vec<String>,
}

/// Question produced by the mixed test generator. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
}

impl GeneratedQuestion {
    pub fn multiple(question: String, answer: String, options: Vec<String>) -> Self {
        Self {
            question,
            answer,
            options: Some(options),
            kind: QuestionType::Multiple,
            front: None,
            back: None,
        }
    }

    pub fn fill(question: String, answer: String) -> Self {
        Self {
            question,
            answer,
            options: None,
            kind: QuestionType::Fill,
            front: None,
            back: None,
        }
    }
}

impl From<QuizQuestion> for GeneratedQuestion {
    fn from(q: QuizQuestion) -> Self {
        Self::multiple(q.question, q.answer, q.options)
    }
}

/// A front/back pair for match mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPair {
    pub front: String,
    pub back: String,
}
