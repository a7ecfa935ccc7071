//! Error types for the quiz client.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::{OptionId, QuestionId, TaskId};

/// Transport-level failures talking to the Task API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("task api responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("task api returned an unreadable payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("task api returned a malformed payload: {0}")]
    Malformed(String),
}

/// The question set could not be loaded. Terminal for the session.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{message}")]
    Rejected { message: String },
    #[error("this quiz has no questions yet")]
    Empty,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A single answer could not be checked. The player may try again.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("{message}")]
    Rejected { message: String },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Submission was attempted with unanswered questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{missing} question(s) still need an answer")]
pub struct IncompleteAnswersError {
    pub missing: usize,
}

/// The final submission failed. Answers are kept for a retry.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{message}")]
    Rejected { message: String },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A feedback cycle is already checking or showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a feedback cycle is already running")]
pub struct SequencerBusy;

/// Errors loading the TOML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Errors loading a local question bank.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("failed to read question bank {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse question bank: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("question bank contains no tasks")]
    Empty,
    #[error("task {0} has no questions")]
    EmptyTask(TaskId),
    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),
    #[error("question {question} marks unknown option {option} as correct")]
    UnknownCorrectOption {
        question: QuestionId,
        option: OptionId,
    },
}

/// Top-level error for running the quiz client.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("no task api configured: pass --base-url or --bank")]
    NoBackend,
    #[error("failed to encode result: {0}")]
    Output(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
