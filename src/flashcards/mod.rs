//! Flashcard content for the user-service
//!
//! This module provides:
//! - Set, card, profile and study session storage (SQLite)
//! - Quiz, test and match question generation
//! - Plain-text card import

pub mod generator;
pub mod import;
pub mod models;
pub mod storage;

pub use generator::{GeneratorError, RandomSource, SeededRandom, ThreadRandom};
pub use models::*;
pub use storage::{ContentStorage, ContentStorageError};
