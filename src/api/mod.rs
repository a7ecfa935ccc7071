//! The Task/Quiz API the quiz client talks to.
//!
//! Every endpoint replies with an envelope (`success`, `data`, `message`). The
//! envelope is decoded once at this boundary into an [`ApiReply`], so session
//! code only ever sees either validated data or a rejection message.

mod http;
mod local;
mod wire;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{AnswerCheck, AnswerSubmission, OptionId, Question, QuestionId, SessionResult, TaskId};

pub use http::HttpTaskApi;
pub use local::LocalTaskApi;

/// Outcome of a request the service understood.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiReply<T> {
    /// `success: true` with a well-formed payload.
    Accepted(T),
    /// `success: false`, with the server's message when it sent one.
    Rejected { message: String },
}

impl<T> ApiReply<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiReply<U> {
        match self {
            ApiReply::Accepted(data) => ApiReply::Accepted(f(data)),
            ApiReply::Rejected { message } => ApiReply::Rejected { message },
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ApiReply::Accepted(_))
    }
}

/// Operations of the remote Task/Quiz API used by a quiz session.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Fetch the ordered question set for a task.
    async fn fetch_questions(&self, task_id: TaskId) -> Result<ApiReply<Vec<Question>>, ApiError>;

    /// Ask the server whether a single selection is correct.
    async fn check_answer(
        &self,
        question_id: QuestionId,
        selected_option_id: OptionId,
    ) -> Result<ApiReply<AnswerCheck>, ApiError>;

    /// Submit the full answer set, in question order.
    async fn submit_quiz(
        &self,
        task_id: TaskId,
        answers: &[AnswerSubmission],
    ) -> Result<ApiReply<SessionResult>, ApiError>;
}
