#![deny(warnings)]

//! Feedback on simulated campaigns: rule findings, letter grades,
//! prompt assembly and pluggable narrators.

pub mod grade;
pub mod insights;
pub mod narrator;
pub mod prompt;

pub use grade::{grade, score_card, utility, Grade, GradeWeights, ScoreCard};
pub use insights::{analyze, Area, Insight, Severity};
pub use narrator::{FeedbackProvider, RuleBasedNarrator};
pub use prompt::{build_ab_prompt, build_prompt, FeedbackPrompt};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FeedbackError {
    #[error("invalid grade weights: {0}")]
    Weights(String),
    #[error("narration failed: {0}")]
    Narration(String),
}
