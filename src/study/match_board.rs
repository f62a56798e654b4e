//! Match mode: fronts and backs in two shuffled columns, picked off in pairs

use uuid::Uuid;

use super::controller::{Phase, Result, StudyError};
use crate::flashcards::generator::shuffle;
use crate::flashcards::{MatchPair, NewStudySession, RandomSource, StudyMode};

/// What a single pick did to the board
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPick {
    pub matched: bool,
    /// Set on the pick that clears the board, and only then
    pub session: Option<NewStudySession>,
}

#[derive(Debug)]
pub struct MatchBoard {
    set_id: Uuid,
    remaining: Vec<MatchPair>,
    fronts: Vec<String>,
    backs: Vec<String>,
    total: u32,
    misses: u32,
}

impl MatchBoard {
    /// Lay out `pairs` with both columns shuffled independently
    pub fn new<R: RandomSource + ?Sized>(
        set_id: Uuid,
        pairs: Vec<MatchPair>,
        rng: &mut R,
    ) -> Result<Self> {
        if pairs.is_empty() {
            return Err(StudyError::Empty);
        }

        let mut fronts: Vec<String> = pairs.iter().map(|p| p.front.clone()).collect();
        let mut backs: Vec<String> = pairs.iter().map(|p| p.back.clone()).collect();
        shuffle(&mut fronts, rng);
        shuffle(&mut backs, rng);

        Ok(Self {
            set_id,
            total: u32::try_from(pairs.len()).unwrap_or(u32::MAX),
            remaining: pairs,
            fronts,
            backs,
            misses: 0,
        })
    }

    pub fn set_id(&self) -> Uuid {
        self.set_id
    }

    /// Unmatched fronts in display order
    pub fn fronts(&self) -> &[String] {
        &self.fronts
    }

    /// Unmatched backs in display order
    pub fn backs(&self) -> &[String] {
        &self.backs
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn matched(&self) -> u32 {
        self.total - u32::try_from(self.remaining.len()).unwrap_or(self.total)
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn is_complete(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Pair the `front`-th front with the `back`-th back (zero-based, in
    /// display order). A correct pick removes both entries.
    pub fn pick(&mut self, front: usize, back: usize) -> Result<MatchPick> {
        if self.is_complete() {
            return Err(StudyError::WrongPhase {
                expected: Phase::InProgress,
                found: Phase::Complete,
            });
        }
        let (Some(front_text), Some(back_text)) = (self.fronts.get(front), self.backs.get(back))
        else {
            return Err(StudyError::OutOfRange(front.max(back)));
        };

        let Some(pos) = self
            .remaining
            .iter()
            .position(|p| &p.front == front_text && &p.back == back_text)
        else {
            self.misses += 1;
            return Ok(MatchPick {
                matched: false,
                session: None,
            });
        };

        self.remaining.remove(pos);
        self.fronts.remove(front);
        self.backs.remove(back);

        // Every pair ends up matched, so score and total are both the pair count
        let session = self.is_complete().then(|| NewStudySession {
            set_id: self.set_id,
            mode: StudyMode::Match,
            score: self.total,
            total_questions: self.total,
        });
        Ok(MatchPick {
            matched: true,
            session,
        })
    }
}
