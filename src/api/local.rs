//! In-process Task API backed by a question bank file.
//!
//! The answer key stays inside this type, behind the [`TaskApi`] trait, so a
//! session played against a bank sees exactly what it would see from the
//! remote service.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{ApiReply, TaskApi};
use crate::error::{ApiError, BankError};
use crate::models::{
    AnswerCheck, AnswerSubmission, OptionId, Question, QuestionId, QuizOption, Rewards,
    SessionResult, TaskId,
};

#[derive(Deserialize)]
struct BankFile {
    tasks: HashMap<TaskId, BankTask>,
}

#[derive(Deserialize)]
struct BankTask {
    questions: Vec<BankQuestion>,
    #[serde(default)]
    rewards: Option<RewardRates>,
}

#[derive(Deserialize)]
struct BankQuestion {
    id: QuestionId,
    text: String,
    options: Vec<BankOption>,
    correct_option_id: OptionId,
}

#[derive(Deserialize)]
struct BankOption {
    id: OptionId,
    text: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RewardRates {
    #[serde(default)]
    xp_per_correct: u32,
    #[serde(default)]
    ep_per_correct: u32,
    #[serde(default)]
    perfect_bonus_xp: u32,
}

struct LocalTask {
    questions: Vec<Question>,
    rewards: Option<RewardRates>,
}

pub struct LocalTaskApi {
    tasks: HashMap<TaskId, LocalTask>,
    answer_key: HashMap<QuestionId, OptionId>,
}

impl LocalTaskApi {
    /// Load a question bank from a JSON file.
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self, BankError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| BankError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a question bank.
    pub fn from_json_str(content: &str) -> Result<Self, BankError> {
        let bank: BankFile = serde_json::from_str(content)?;
        if bank.tasks.is_empty() {
            return Err(BankError::Empty);
        }

        let mut tasks = HashMap::with_capacity(bank.tasks.len());
        let mut answer_key = HashMap::new();

        for (task_id, task) in bank.tasks {
            if task.questions.is_empty() {
                return Err(BankError::EmptyTask(task_id));
            }

            let mut questions = Vec::with_capacity(task.questions.len());
            for entry in task.questions {
                if !entry.options.iter().any(|option| option.id == entry.correct_option_id) {
                    return Err(BankError::UnknownCorrectOption {
                        question: entry.id,
                        option: entry.correct_option_id,
                    });
                }
                if answer_key.insert(entry.id, entry.correct_option_id).is_some() {
                    return Err(BankError::DuplicateQuestion(entry.id));
                }

                questions.push(Question {
                    id: entry.id,
                    text: entry.text,
                    options: entry
                        .options
                        .into_iter()
                        .map(|option| QuizOption {
                            id: option.id,
                            text: option.text,
                        })
                        .collect(),
                });
            }

            tasks.insert(
                task_id,
                LocalTask {
                    questions,
                    rewards: task.rewards,
                },
            );
        }

        Ok(Self { tasks, answer_key })
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.tasks.keys().copied().collect();
        ids.sort();
        ids
    }

    fn question(&self, question_id: QuestionId) -> Option<&Question> {
        self.tasks
            .values()
            .flat_map(|task| task.questions.iter())
            .find(|question| question.id == question_id)
    }
}

fn score_percent(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (correct as f64 / total as f64 * 10_000.0).round() / 100.0
}

fn rewards_for(rates: RewardRates, correct: u32, is_perfect: bool) -> Rewards {
    let bonus = if is_perfect { rates.perfect_bonus_xp } else { 0 };
    Rewards {
        xp_earned: rates.xp_per_correct.saturating_mul(correct).saturating_add(bonus),
        ep_earned: rates.ep_per_correct.saturating_mul(correct),
    }
}

fn rejected<T>(message: impl Into<String>) -> Result<ApiReply<T>, ApiError> {
    Ok(ApiReply::Rejected {
        message: message.into(),
    })
}

#[async_trait]
impl TaskApi for LocalTaskApi {
    async fn fetch_questions(&self, task_id: TaskId) -> Result<ApiReply<Vec<Question>>, ApiError> {
        match self.tasks.get(&task_id) {
            Some(task) => Ok(ApiReply::Accepted(task.questions.clone())),
            None => rejected(format!("Task {task_id} was not found")),
        }
    }

    async fn check_answer(
        &self,
        question_id: QuestionId,
        selected_option_id: OptionId,
    ) -> Result<ApiReply<AnswerCheck>, ApiError> {
        let (Some(question), Some(&correct_option_id)) =
            (self.question(question_id), self.answer_key.get(&question_id))
        else {
            return rejected(format!("Question {question_id} was not found"));
        };
        if !question.has_option(selected_option_id) {
            return rejected("Selected option does not belong to this question");
        }

        debug!(target: "attraction_quiz", %question_id, "checked answer against local bank");
        Ok(ApiReply::Accepted(AnswerCheck {
            is_correct: selected_option_id == correct_option_id,
            selected_option_id,
            correct_option_id,
        }))
    }

    async fn submit_quiz(
        &self,
        task_id: TaskId,
        answers: &[AnswerSubmission],
    ) -> Result<ApiReply<SessionResult>, ApiError> {
        let Some(task) = self.tasks.get(&task_id) else {
            return rejected(format!("Task {task_id} was not found"));
        };

        let mut correct = 0usize;
        for question in &task.questions {
            let Some(answer) = answers.iter().find(|answer| answer.question_id == question.id)
            else {
                return rejected("All questions must be answered before submitting");
            };
            if self.answer_key.get(&question.id) == Some(&answer.selected_option_id) {
                correct += 1;
            }
        }

        let total = task.questions.len();
        let is_perfect = correct == total;
        let correct_count = u32::try_from(correct).unwrap_or(u32::MAX);

        debug!(target: "attraction_quiz", %task_id, correct, total, "scored local submission");
        Ok(ApiReply::Accepted(SessionResult {
            correct_count,
            total_questions: u32::try_from(total).unwrap_or(u32::MAX),
            score_percent: score_percent(correct, total),
            is_perfect,
            rewards: task
                .rewards
                .map(|rates| rewards_for(rates, correct_count, is_perfect)),
        }))
    }
}
