pub mod cards;
pub mod history;
pub mod import;
pub mod login;
pub mod profile;
pub mod sets;
pub mod study;
