//! Flashcard study services: an auth-service issuing tokens and a user-service
//! storing sets, cards and study sessions and generating quiz and test questions.

pub mod auth;
pub mod client;
pub mod config;
pub mod flashcards;
pub mod server;
pub mod study;
