use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::question::{OptionId, Question, QuestionId};

/// One entry of the submission payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    pub selected_option_id: OptionId,
}

/// Server verdict for a single answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerCheck {
    pub is_correct: bool,
    pub selected_option_id: OptionId,
    pub correct_option_id: OptionId,
}

/// Selected option per question. Selecting again overwrites.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerMap {
    selections: HashMap<QuestionId, OptionId>,
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a selection, returning the option it replaced.
    pub fn select(&mut self, question_id: QuestionId, option_id: OptionId) -> Option<OptionId> {
        self.selections.insert(question_id, option_id)
    }

    pub fn get(&self, question_id: QuestionId) -> Option<OptionId> {
        self.selections.get(&question_id).copied()
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Number of questions in `questions` that have no selection.
    pub fn missing_count(&self, questions: &[Question]) -> usize {
        questions
            .iter()
            .filter(|question| !self.selections.contains_key(&question.id))
            .count()
    }

    /// Selections in question order, skipping unanswered questions.
    pub fn ordered(&self, questions: &[Question]) -> Vec<AnswerSubmission> {
        questions
            .iter()
            .filter_map(|question| {
                self.get(question.id).map(|selected_option_id| AnswerSubmission {
                    question_id: question.id,
                    selected_option_id,
                })
            })
            .collect()
    }
}
