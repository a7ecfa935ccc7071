use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a quiz task on the Task API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

/// Identifier of a question within the Task API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

/// Identifier of an answer option within the Task API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single answer option. Carries no correctness information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOption {
    pub id: OptionId,
    pub text: String,
}

/// A question as delivered by the Task API, options in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<QuizOption>,
}

impl Question {
    pub fn has_option(&self, option_id: OptionId) -> bool {
        self.options.iter().any(|option| option.id == option_id)
    }

    /// Position of the option in display order.
    pub fn option_position(&self, option_id: OptionId) -> Option<usize> {
        self.options.iter().position(|option| option.id == option_id)
    }

    pub fn option_at(&self, position: usize) -> Option<&QuizOption> {
        self.options.get(position)
    }
}
