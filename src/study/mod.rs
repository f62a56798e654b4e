//! Study-mode sequencing shared by the terminal client

pub mod controller;
pub mod match_board;

pub use controller::{
    is_correct, Feedback, Phase, ReviewCard, StudyController, StudyError, StudyItem, FEEDBACK_DELAY,
};
pub use match_board::{MatchBoard, MatchPick};
