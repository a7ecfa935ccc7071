//! JSON shapes of the Task API and their conversion into domain types.
//!
//! The backend is loose about scalar types (ids and counts arrive as numbers
//! or numeric strings, flags as booleans or 0/1), so the DTOs accept both.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiReply;
use crate::error::ApiError;
use crate::models::{
    AnswerCheck, AnswerSubmission, OptionId, Question, QuestionId, QuizOption, Rewards,
    SessionResult,
};

const DEFAULT_REJECTION: &str = "the task service rejected the request";

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl Envelope {
    fn rejection(self) -> String {
        self.message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct QuestionsData {
    questions: Vec<QuestionDto>,
}

#[derive(Debug, Deserialize)]
struct QuestionDto {
    #[serde(deserialize_with = "flexible_u64")]
    question_id: u64,
    question_text: String,
    #[serde(default)]
    options: Vec<OptionDto>,
}

#[derive(Debug, Deserialize)]
struct OptionDto {
    #[serde(deserialize_with = "flexible_u64")]
    option_id: u64,
    option_text: String,
}

#[derive(Debug, Deserialize)]
struct CheckData {
    #[serde(deserialize_with = "flexible_flag")]
    is_correct: bool,
    #[serde(deserialize_with = "flexible_u64")]
    selected_option_id: u64,
    #[serde(deserialize_with = "flexible_u64")]
    correct_option_id: u64,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    #[serde(deserialize_with = "flexible_u64")]
    correct_answers: u64,
    #[serde(deserialize_with = "flexible_u64")]
    total_questions: u64,
    #[serde(deserialize_with = "flexible_f64")]
    score: f64,
    #[serde(deserialize_with = "flexible_flag")]
    is_perfect: bool,
    #[serde(default)]
    rewards: Option<RewardsDto>,
}

#[derive(Debug, Deserialize)]
struct RewardsDto {
    #[serde(default, deserialize_with = "flexible_u64")]
    xp_earned: u64,
    #[serde(default, deserialize_with = "flexible_u64")]
    ep_earned: u64,
}

/// Body of the single-answer check request.
#[derive(Debug, Serialize)]
pub(crate) struct CheckAnswerRequest {
    pub question_id: QuestionId,
    pub selected_option_id: OptionId,
}

/// Body of the quiz submission request.
#[derive(Debug, Serialize)]
pub(crate) struct SubmitQuizRequest<'a> {
    pub answers: &'a [AnswerSubmission],
}

impl TryFrom<QuestionDto> for Question {
    type Error = ApiError;

    fn try_from(dto: QuestionDto) -> Result<Self, Self::Error> {
        if dto.options.is_empty() {
            return Err(ApiError::Malformed(format!(
                "question {} has no options",
                dto.question_id
            )));
        }

        Ok(Question {
            id: QuestionId(dto.question_id),
            text: dto.question_text,
            options: dto
                .options
                .into_iter()
                .map(|option| QuizOption {
                    id: OptionId(option.option_id),
                    text: option.option_text,
                })
                .collect(),
        })
    }
}

impl TryFrom<SubmitData> for SessionResult {
    type Error = ApiError;

    fn try_from(data: SubmitData) -> Result<Self, Self::Error> {
        Ok(SessionResult {
            correct_count: narrow(data.correct_answers, "correct_answers")?,
            total_questions: narrow(data.total_questions, "total_questions")?,
            score_percent: data.score,
            is_perfect: data.is_perfect,
            rewards: data
                .rewards
                .map(|rewards| -> Result<Rewards, ApiError> {
                    Ok(Rewards {
                        xp_earned: narrow(rewards.xp_earned, "xp_earned")?,
                        ep_earned: narrow(rewards.ep_earned, "ep_earned")?,
                    })
                })
                .transpose()?,
        })
    }
}

fn narrow(value: u64, field: &str) -> Result<u32, ApiError> {
    u32::try_from(value).map_err(|_| ApiError::Malformed(format!("{field} out of range: {value}")))
}

fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<ApiReply<T>, ApiError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    if !envelope.success {
        return Ok(ApiReply::Rejected {
            message: envelope.rejection(),
        });
    }

    let data = envelope
        .data
        .filter(|data| !data.is_null())
        .ok_or_else(|| ApiError::Malformed("successful reply without data".to_string()))?;
    Ok(ApiReply::Accepted(serde_json::from_value(data)?))
}

/// The server's message when `body` is a failure envelope.
///
/// Used for non-2xx responses, which the backend also wraps in an envelope.
pub(crate) fn rejection_message(body: &str) -> Option<String> {
    serde_json::from_str::<Envelope>(body)
        .ok()
        .filter(|envelope| !envelope.success)
        .map(Envelope::rejection)
}

pub(crate) fn decode_questions(body: &str) -> Result<ApiReply<Vec<Question>>, ApiError> {
    match decode_envelope::<QuestionsData>(body)? {
        ApiReply::Accepted(data) => data
            .questions
            .into_iter()
            .map(Question::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map(ApiReply::Accepted),
        ApiReply::Rejected { message } => Ok(ApiReply::Rejected { message }),
    }
}

pub(crate) fn decode_check(body: &str) -> Result<ApiReply<AnswerCheck>, ApiError> {
    Ok(decode_envelope::<CheckData>(body)?.map(|data| AnswerCheck {
        is_correct: data.is_correct,
        selected_option_id: OptionId(data.selected_option_id),
        correct_option_id: OptionId(data.correct_option_id),
    }))
}

pub(crate) fn decode_submit(body: &str) -> Result<ApiReply<SessionResult>, ApiError> {
    match decode_envelope::<SubmitData>(body)? {
        ApiReply::Accepted(data) => SessionResult::try_from(data).map(ApiReply::Accepted),
        ApiReply::Rejected { message } => Ok(ApiReply::Rejected { message }),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Bool(bool),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

fn flexible_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match RawScalar::deserialize(deserializer)? {
        RawScalar::Unsigned(value) => Ok(value),
        RawScalar::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected an unsigned integer, got {text:?}"))),
        RawScalar::Float(value) => Err(de::Error::custom(format!(
            "expected an unsigned integer, got {value}"
        ))),
        RawScalar::Bool(value) => Err(de::Error::custom(format!(
            "expected an unsigned integer, got {value}"
        ))),
    }
}

fn flexible_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match RawScalar::deserialize(deserializer)? {
        RawScalar::Unsigned(value) => Ok(value as f64),
        RawScalar::Float(value) => Ok(value),
        RawScalar::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected a number, got {text:?}"))),
        RawScalar::Bool(value) => Err(de::Error::custom(format!(
            "expected a number, got {value}"
        ))),
    }
}

fn flexible_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match RawScalar::deserialize(deserializer)? {
        RawScalar::Bool(value) => Ok(value),
        RawScalar::Unsigned(value) => Ok(value != 0),
        RawScalar::Text(text) => match text.trim() {
            "1" | "true" => Ok(true),
            "0" | "false" | "" => Ok(false),
            other => Err(de::Error::custom(format!("expected a flag, got {other:?}"))),
        },
        RawScalar::Float(value) => Err(de::Error::custom(format!(
            "expected a flag, got {value}"
        ))),
    }
}
