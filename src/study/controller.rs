//! One study attempt: load items, answer them one by one, report the result once

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::flashcards::{
    Flashcard, GeneratedQuestion, NewStudySession, QuestionType, QuizQuestion, StudyMode,
};

/// How long answer feedback stays on screen before moving on
pub const FEEDBACK_DELAY: Duration = Duration::from_secs(1);

const CORRECT_FEEDBACK: &str = "Đúng!";
const WRONG_FEEDBACK_PREFIX: &str = "Sai! Đáp án đúng là: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Selecting,
    InProgress,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Selecting => "selecting",
            Self::InProgress => "in progress",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum StudyError {
    #[error("Cannot do that while {found} (expected {expected})")]
    WrongPhase { expected: Phase, found: Phase },

    #[error("The current item is not a {0}")]
    WrongItem(&'static str),

    #[error("The current item was already answered")]
    AlreadyAnswered,

    #[error("Answer the current item before moving on")]
    NotAnswered,

    #[error("Nothing to study")]
    Empty,

    #[error("No missed cards to review")]
    NothingToReview,

    #[error("No entry at position {0}")]
    OutOfRange(usize),

    #[error("Study mode {0} is played on a match board")]
    UnsupportedMode(StudyMode),
}

pub type Result<T> = std::result::Result<T, StudyError>;

/// A card shown front first, then flipped
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewCard {
    /// `None` for cards rebuilt from missed questions
    pub id: Option<Uuid>,
    pub front: String,
    pub back: String,
}

impl From<&Flashcard> for ReviewCard {
    fn from(card: &Flashcard) -> Self {
        Self {
            id: Some(card.id),
            front: card.front.clone(),
            back: card.back.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StudyItem {
    Card(ReviewCard),
    Question(GeneratedQuestion),
}

impl StudyItem {
    pub fn from_cards(cards: &[Flashcard]) -> Vec<Self> {
        cards.iter().map(|c| Self::Card(c.into())).collect()
    }

    pub fn from_quiz(questions: Vec<QuizQuestion>) -> Vec<Self> {
        questions
            .into_iter()
            .map(|q| Self::Question(q.into()))
            .collect()
    }

    pub fn from_test(questions: Vec<GeneratedQuestion>) -> Vec<Self> {
        questions.into_iter().map(Self::Question).collect()
    }

    /// The card to review again when this item is missed
    fn as_review_card(&self) -> ReviewCard {
        match self {
            Self::Card(card) => card.clone(),
            Self::Question(q) => ReviewCard {
                id: None,
                front: q.front.clone().unwrap_or_else(|| q.question.clone()),
                back: q.back.clone().unwrap_or_else(|| q.answer.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub correct: bool,
    pub message: String,
}

impl Feedback {
    fn for_answer(correct: bool, expected: &str) -> Self {
        let message = if correct {
            CORRECT_FEEDBACK.to_string()
        } else {
            format!("{}{}", WRONG_FEEDBACK_PREFIX, expected)
        };
        Self { correct, message }
    }
}

/// Whether `given` answers `question`. Multiple choice compares the option
/// string exactly; typed and true/false answers ignore case and surrounding space.
pub fn is_correct(question: &GeneratedQuestion, given: &str) -> bool {
    match question.kind {
        QuestionType::Multiple => given == question.answer,
        QuestionType::Fill | QuestionType::TrueFalse => {
            given.trim().to_lowercase() == question.answer.trim().to_lowercase()
        }
    }
}

/// Sequencing for flashcard, quiz and test attempts. Match mode has no
/// item order and is played on a [`MatchBoard`](super::MatchBoard).
#[derive(Debug)]
pub struct StudyController {
    phase: Phase,
    set_id: Option<Uuid>,
    mode: StudyMode,
    items: Vec<StudyItem>,
    index: usize,
    score: u32,
    answered: bool,
    feedback: Option<Feedback>,
    missed: Vec<ReviewCard>,
}

impl Default for StudyController {
    fn default() -> Self {
        Self::new()
    }
}

impl StudyController {
    pub fn new() -> Self {
        Self {
            phase: Phase::Selecting,
            set_id: None,
            mode: StudyMode::Flashcard,
            items: Vec::new(),
            index: 0,
            score: 0,
            answered: false,
            feedback: None,
            missed: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    pub fn set_id(&self) -> Option<Uuid> {
        self.set_id
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total(&self) -> u32 {
        u32::try_from(self.items.len()).unwrap_or(u32::MAX)
    }

    /// Zero-based position of the current item
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&StudyItem> {
        match self.phase {
            Phase::InProgress => self.items.get(self.index),
            _ => None,
        }
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn missed(&self) -> &[ReviewCard] {
        &self.missed
    }

    fn expect_phase(&self, expected: Phase) -> Result<()> {
        if self.phase != expected {
            return Err(StudyError::WrongPhase {
                expected,
                found: self.phase,
            });
        }
        Ok(())
    }

    fn load(&mut self, set_id: Uuid, mode: StudyMode, items: Vec<StudyItem>) -> Result<()> {
        if mode == StudyMode::Match {
            return Err(StudyError::UnsupportedMode(mode));
        }
        if items.is_empty() {
            return Err(StudyError::Empty);
        }

        self.phase = Phase::InProgress;
        self.set_id = Some(set_id);
        self.mode = mode;
        self.items = items;
        self.index = 0;
        self.score = 0;
        self.answered = false;
        self.feedback = None;
        self.missed.clear();
        Ok(())
    }

    /// Start an attempt with items fetched for `set_id` in `mode`
    pub fn begin(&mut self, set_id: Uuid, mode: StudyMode, items: Vec<StudyItem>) -> Result<()> {
        self.expect_phase(Phase::Selecting)?;
        self.load(set_id, mode, items)
    }

    fn current_unanswered(&self) -> Result<&StudyItem> {
        self.expect_phase(Phase::InProgress)?;
        if self.answered {
            return Err(StudyError::AlreadyAnswered);
        }
        self.items.get(self.index).ok_or(StudyError::Empty)
    }

    /// Answer the current question
    pub fn submit_answer(&mut self, given: &str) -> Result<Feedback> {
        let StudyItem::Question(question) = self.current_unanswered()? else {
            return Err(StudyError::WrongItem("question"));
        };

        let correct = is_correct(question, given);
        let feedback = Feedback::for_answer(correct, &question.answer);
        if correct {
            self.score += 1;
        } else {
            let card = self.items[self.index].as_review_card();
            self.missed.push(card);
        }

        self.answered = true;
        self.feedback = Some(feedback.clone());
        Ok(feedback)
    }

    /// Rate the current card as memorized or not
    pub fn mark_card(&mut self, memorized: bool) -> Result<()> {
        let StudyItem::Card(card) = self.current_unanswered()? else {
            return Err(StudyError::WrongItem("card"));
        };

        if memorized {
            self.score += 1;
        } else {
            let card = card.clone();
            self.missed.push(card);
        }
        self.answered = true;
        Ok(())
    }

    /// Move past an answered item. Returns the session to record when this
    /// completes the attempt; later calls fail with a phase error.
    pub fn advance(&mut self) -> Result<Option<NewStudySession>> {
        self.expect_phase(Phase::InProgress)?;
        if !self.answered {
            return Err(StudyError::NotAnswered);
        }

        self.answered = false;
        self.feedback = None;
        self.index += 1;
        if self.index < self.items.len() {
            return Ok(None);
        }

        self.phase = Phase::Complete;
        let Some(set_id) = self.set_id else {
            return Ok(None);
        };
        Ok(Some(NewStudySession {
            set_id,
            mode: self.mode,
            score: self.score,
            total_questions: self.total(),
        }))
    }

    /// Start the same set and mode again with freshly generated items
    pub fn retry(&mut self, items: Vec<StudyItem>) -> Result<()> {
        self.expect_phase(Phase::Complete)?;
        let set_id = self.set_id.ok_or(StudyError::Empty)?;
        self.load(set_id, self.mode, items)
    }

    /// Go through the cards missed in the last attempt in flashcard mode
    pub fn review_missed(&mut self) -> Result<()> {
        self.expect_phase(Phase::Complete)?;
        if self.missed.is_empty() {
            return Err(StudyError::NothingToReview);
        }
        let set_id = self.set_id.ok_or(StudyError::Empty)?;
        let items = self.missed.drain(..).map(StudyItem::Card).collect();
        self.load(set_id, StudyMode::Flashcard, items)
    }

    pub fn back_to_select(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(front: &str, back: &str) -> Flashcard {
        Flashcard::new(Uuid::nil(), Uuid::nil(), front.to_string(), back.to_string())
    }

    fn questions() -> Vec<StudyItem> {
        StudyItem::from_test(vec![
            GeneratedQuestion::multiple(
                "A".to_string(),
                "1".to_string(),
                vec!["1".to_string(), "2".to_string()],
            ),
            GeneratedQuestion::fill("B".to_string(), "Hai".to_string()),
        ])
    }

    #[test]
    fn test_answer_matching() {
        let multiple = GeneratedQuestion::multiple("q".into(), "Paris".into(), vec![]);
        assert!(is_correct(&multiple, "Paris"));
        assert!(!is_correct(&multiple, "paris"));
        assert!(!is_correct(&multiple, " Paris"));

        let fill = GeneratedQuestion::fill("q".into(), "Paris".into());
        assert!(is_correct(&fill, "  pArIs "));
        assert!(!is_correct(&fill, "Lyon"));
    }

    #[test]
    fn test_full_attempt_reports_once() {
        let set_id = Uuid::new_v4();
        let mut study = StudyController::new();
        study.begin(set_id, StudyMode::Test, questions()).unwrap();
        assert_eq!(study.phase(), Phase::InProgress);

        let feedback = study.submit_answer("1").unwrap();
        assert_eq!(feedback.message, "Đúng!");
        assert_eq!(study.submit_answer("1"), Err(StudyError::AlreadyAnswered));
        assert_eq!(study.advance().unwrap(), None);

        let feedback = study.submit_answer("Ba").unwrap();
        assert!(!feedback.correct);
        assert_eq!(feedback.message, "Sai! Đáp án đúng là: Hai");

        let session = study.advance().unwrap().unwrap();
        assert_eq!(session.set_id, set_id);
        assert_eq!(session.mode, StudyMode::Test);
        assert_eq!(session.score, 1);
        assert_eq!(session.total_questions, 2);
        assert_eq!(study.phase(), Phase::Complete);

        assert!(matches!(study.advance(), Err(StudyError::WrongPhase { .. })));
    }

    #[test]
    fn test_advance_requires_answer() {
        let mut study = StudyController::new();
        study
            .begin(Uuid::new_v4(), StudyMode::Quiz, questions())
            .unwrap();
        assert_eq!(study.advance(), Err(StudyError::NotAnswered));
        assert_eq!(study.mark_card(true), Err(StudyError::WrongItem("card")));
    }

    #[test]
    fn test_flashcard_marking_and_review() {
        let cards = vec![card("A", "1"), card("B", "2"), card("C", "3")];
        let mut study = StudyController::new();
        study
            .begin(Uuid::new_v4(), StudyMode::Flashcard, StudyItem::from_cards(&cards))
            .unwrap();

        for memorized in [true, false, false] {
            study.mark_card(memorized).unwrap();
            study.advance().unwrap();
        }
        assert_eq!(study.score(), 1);
        assert_eq!(study.missed().len(), 2);

        study.review_missed().unwrap();
        assert_eq!(study.mode(), StudyMode::Flashcard);
        assert_eq!(study.total(), 2);
        match study.current() {
            Some(StudyItem::Card(c)) => assert_eq!(c.front, "B"),
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_missed_questions_become_cards() {
        let mut study = StudyController::new();
        study
            .begin(Uuid::new_v4(), StudyMode::Quiz, questions())
            .unwrap();
        study.submit_answer("2").unwrap();
        study.advance().unwrap();
        study.submit_answer("hai").unwrap();
        study.advance().unwrap();

        assert_eq!(
            study.missed(),
            &[ReviewCard {
                id: None,
                front: "A".to_string(),
                back: "1".to_string(),
            }]
        );
    }

    #[test]
    fn test_retry_resets_score() {
        let mut study = StudyController::new();
        let set_id = Uuid::new_v4();
        study.begin(set_id, StudyMode::Quiz, questions()).unwrap();
        assert!(matches!(study.retry(questions()), Err(StudyError::WrongPhase { .. })));

        study.submit_answer("1").unwrap();
        study.advance().unwrap();
        study.submit_answer("Hai").unwrap();
        study.advance().unwrap();
        assert_eq!(study.review_missed(), Err(StudyError::NothingToReview));

        study.retry(questions()).unwrap();
        assert_eq!(study.score(), 0);
        assert_eq!(study.position(), 0);
        assert_eq!(study.set_id(), Some(set_id));

        study.back_to_select();
        assert_eq!(study.phase(), Phase::Selecting);
        assert!(study.current().is_none());
    }

    #[test]
    fn test_begin_rejects_empty_and_match() {
        let mut study = StudyController::new();
        assert_eq!(
            study.begin(Uuid::new_v4(), StudyMode::Quiz, Vec::new()),
            Err(StudyError::Empty)
        );
        assert_eq!(
            study.begin(Uuid::new_v4(), StudyMode::Match, questions()),
            Err(StudyError::UnsupportedMode(StudyMode::Match))
        );
    }
}
