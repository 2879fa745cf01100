#![deny(warnings)]

//! Practice simulators that sit beside the ad engine:
//! A/B tests of ad copy, on-page SEO edits, chart-choice challenges and
//! multiple-choice quizzes.

pub mod abtest;
pub mod dataviz;
pub mod quiz;
pub mod seo;
pub mod stats;

pub use abtest::{required_sample_size, run_ab_test};
pub use dataviz::{
    generate_challenge, grade_chart, grade_submission, Challenge, ChallengeResult, ChartGrade,
    ChartKind, DataShape, Submission, Verdict,
};
pub use quiz::{
    check_answer, draw_quiz, grade_quiz, question_bank, MarkedAnswer, Question, Quiz, QuizResult,
    Topic,
};
pub use seo::{
    audit, estimate_rank, organic_clicks, simulate_edit, SeoAudit, SeoEdit, SeoIssue, SeoOutcome,
    SeoPage,
};

use sim_core::ValidationError;
use thiserror::Error;

/// Errors produced by the lab simulators.
#[derive(Debug, Error, PartialEq)]
pub enum LabError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
