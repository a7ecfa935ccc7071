//! reqwest client for the remote Task API.
//!
//! Calls are instrumented with task/question ids and latency. Answer
//! payloads are never logged.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::{info, instrument, warn};

use super::wire::{self, CheckAnswerRequest, SubmitQuizRequest};
use super::{ApiReply, TaskApi};
use crate::error::ApiError;
use crate::models::{AnswerCheck, AnswerSubmission, OptionId, Question, QuestionId, SessionResult, TaskId};

const USER_AGENT: &str = concat!("attraction-quiz/", env!("CARGO_PKG_VERSION"));

type Decoder<T> = fn(&str) -> Result<ApiReply<T>, ApiError>;

#[derive(Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTaskApi {
    /// Build a client for the API rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn read_reply<T>(
        response: reqwest::Response,
        decode: Decoder<T>,
    ) -> Result<ApiReply<T>, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return match wire::rejection_message(&body) {
                Some(message) => Ok(ApiReply::Rejected { message }),
                None => {
                    warn!(target: "attraction_quiz", %status, "task api returned an error status");
                    Err(ApiError::Status(status))
                }
            };
        }

        decode(&body)
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    #[instrument(level = "info", skip_all, fields(task_id = %task_id))]
    async fn fetch_questions(&self, task_id: TaskId) -> Result<ApiReply<Vec<Question>>, ApiError> {
        let started = Instant::now();
        let response = self
            .client
            .get(self.endpoint(&format!("tasks/{task_id}/questions")))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let reply = Self::read_reply(response, wire::decode_questions).await;

        info!(
            target: "attraction_quiz",
            elapsed_ms = started.elapsed().as_millis() as u64,
            accepted = matches!(reply, Ok(ApiReply::Accepted(_))),
            "fetched questions"
        );
        reply
    }

    #[instrument(level = "info", skip_all, fields(question_id = %question_id))]
    async fn check_answer(
        &self,
        question_id: QuestionId,
        selected_option_id: OptionId,
    ) -> Result<ApiReply<AnswerCheck>, ApiError> {
        let started = Instant::now();
        let response = self
            .client
            .post(self.endpoint("quiz/check-answer"))
            .header(ACCEPT, "application/json")
            .json(&CheckAnswerRequest {
                question_id,
                selected_option_id,
            })
            .send()
            .await?;
        let reply = Self::read_reply(response, wire::decode_check).await;

        info!(
            target: "attraction_quiz",
            elapsed_ms = started.elapsed().as_millis() as u64,
            accepted = matches!(reply, Ok(ApiReply::Accepted(_))),
            "checked answer"
        );
        reply
    }

    #[instrument(level = "info", skip_all, fields(task_id = %task_id, answers = answers.len()))]
    async fn submit_quiz(
        &self,
        task_id: TaskId,
        answers: &[AnswerSubmission],
    ) -> Result<ApiReply<SessionResult>, ApiError> {
        let started = Instant::now();
        let response = self
            .client
            .post(self.endpoint(&format!("tasks/{task_id}/submit")))
            .header(ACCEPT, "application/json")
            .json(&SubmitQuizRequest { answers })
            .send()
            .await?;
        let reply = Self::read_reply(response, wire::decode_submit).await;

        info!(
            target: "attraction_quiz",
            elapsed_ms = started.elapsed().as_millis() as u64,
            accepted = matches!(reply, Ok(ApiReply::Accepted(_))),
            "submitted quiz"
        );
        reply
    }
}
