//! Question generation for quiz, test and match modes
//!
//! All generators are pure: they take flashcards that were already fetched
//! from storage plus a [`RandomSource`], so the same inputs and a seeded
//! source always produce the same questions.
//!
//! Test mode cycles through three slots by position:
//! - `i % 3 == 0`: a coin flip picks multiple choice or fill-in-the-blank
//! - `i % 3 == 1`: fill-in-the-blank
//! - `i % 3 == 2`: a true/false judgement of a "front - back" pairing

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use super::models::{Flashcard, GeneratedQuestion, MatchPair, QuestionType, QuizQuestion};

/// Number of options shown for a multiple-choice question
pub const OPTION_COUNT: usize = 4;

/// Answer label for a true pairing
pub const TRUE_LABEL: &str = "Đúng";

/// Answer label for a false pairing
pub const FALSE_LABEL: &str = "Sai";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("No flashcards found")]
    EmptyPool,
}

pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Source of uniformly distributed floats in `[0, 1)`
pub trait RandomSource {
    fn next_float(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> usize {
        let idx = (self.next_float() * len as f64).floor() as usize;
        idx.min(len - 1)
    }
}

/// Process-wide thread RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_float(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Deterministic source for reproducible generation
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_float(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Fisher-Yates shuffle driven by `rng`
pub fn shuffle<T, R: RandomSource + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.next_index(i + 1);
        items.swap(i, j);
    }
}

/// Build the options for a multiple-choice question.
///
/// `backs` is the answer of every card in the set, the queried card included.
/// Duplicated backs are not collapsed. Pools smaller than [`OPTION_COUNT`]
/// yield every non-matching back plus the correct answer. Larger pools sample
/// distractors without replacement and pad with `"Option N"` if they run out.
pub fn answer_options<'a, I, R>(correct: &str, backs: I, rng: &mut R) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
    R: RandomSource + ?Sized,
{
    let backs: Vec<&str> = backs.into_iter().collect();
    let mut candidates: Vec<&str> = backs.iter().copied().filter(|b| *b != correct).collect();

    if backs.len() < OPTION_COUNT {
        let mut options: Vec<String> = candidates.into_iter().map(str::to_string).collect();
        options.push(correct.to_string());
        shuffle(&mut options, rng);
        return options;
    }

    let mut options = vec![correct.to_string()];
    while options.len() < OPTION_COUNT && !candidates.is_empty() {
        let idx = rng.next_index(candidates.len());
        options.push(candidates.remove(idx).to_string());
    }
    while options.len() < OPTION_COUNT {
        options.push(format!("Option {}", options.len() + 1));
    }

    shuffle(&mut options, rng);
    options
}

fn card_backs(cards: &[Flashcard]) -> impl Iterator<Item = &str> {
    cards.iter().map(|c| c.back.as_str())
}

/// One multiple-choice question per card, in storage order
pub fn generate_quiz<R: RandomSource + ?Sized>(
    cards: &[Flashcard],
    rng: &mut R,
) -> Result<Vec<QuizQuestion>> {
    if cards.is_empty() {
        return Err(GeneratorError::EmptyPool);
    }

    Ok(cards
        .iter()
        .map(|card| QuizQuestion {
            question: card.front.clone(),
            answer: card.back.clone(),
            options: answer_options(&card.back, card_backs(cards), rng),
        })
        .collect())
}

/// Mixed test: one question per card, type chosen by position
pub fn generate_test<R: RandomSource + ?Sized>(
    cards: &[Flashcard],
    rng: &mut R,
) -> Result<Vec<GeneratedQuestion>> {
    if cards.is_empty() {
        return Err(GeneratorError::EmptyPool);
    }

    let questions = cards
        .iter()
        .enumerate()
        .map(|(index, card)| match index % 3 {
            0 => {
                if rng.next_float() > 0.5 {
                    let options = answer_options(&card.back, card_backs(cards), rng);
                    GeneratedQuestion::multiple(card.front.clone(), card.back.clone(), options)
                } else {
                    GeneratedQuestion::fill(card.front.clone(), card.back.clone())
                }
            }
            1 => GeneratedQuestion::fill(card.front.clone(), card.back.clone()),
            _ => true_false_question(cards, index, rng),
        })
        .collect();

    Ok(questions)
}

/// Pair the card at `index` with its own back or with a random card's back.
///
/// The label only reflects the coin: when the random card differs from the
/// current one but carries the same back text, the shown pairing is true and
/// the label still reads [`FALSE_LABEL`].
fn true_false_question<R: RandomSource + ?Sized>(
    cards: &[Flashcard],
    index: usize,
    rng: &mut R,
) -> GeneratedQuestion {
    let current = &cards[index % cards.len()];
    let random = &cards[rng.next_index(cards.len())];
    let is_correct_pair = rng.next_float() > 0.5 && random.id != current.id;

    let shown_back = if is_correct_pair {
        &current.back
    } else {
        &random.back
    };
    let label = if is_correct_pair { TRUE_LABEL } else { FALSE_LABEL };

    GeneratedQuestion {
        question: format!("{} - {}", current.front, shown_back),
        answer: label.to_string(),
        options: None,
        kind: QuestionType::TrueFalse,
        front: Some(current.front.clone()),
        back: Some(shown_back.clone()),
    }
}

/// Shuffled front/back pairs for match mode
pub fn match_pairs<R: RandomSource + ?Sized>(
    cards: &[Flashcard],
    rng: &mut R,
) -> Result<Vec<MatchPair>> {
    if cards.is_empty() {
        return Err(GeneratorError::EmptyPool);
    }

    let mut pairs: Vec<MatchPair> = cards
        .iter()
        .map(|c| MatchPair {
            front: c.front.clone(),
            back: c.back.clone(),
        })
        .collect();
    shuffle(&mut pairs, rng);
    Ok(pairs)
}
