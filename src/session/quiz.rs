//! The loaded question set and the player's answers.

use tracing::info;

use crate::api::{ApiReply, TaskApi};
use crate::error::LoadError;
use crate::models::{AnswerMap, AnswerSubmission, OptionId, Question, QuestionId, TaskId};

#[derive(Debug, Clone)]
pub struct QuizSession {
    task_id: TaskId,
    questions: Vec<Question>,
    index: usize,
    answers: AnswerMap,
}

impl QuizSession {
    /// Create a session over an already fetched question set.
    pub fn new(task_id: TaskId, questions: Vec<Question>) -> Result<Self, LoadError> {
        if questions.is_empty() {
            return Err(LoadError::Empty);
        }

        Ok(Self {
            task_id,
            questions,
            index: 0,
            answers: AnswerMap::new(),
        })
    }

    /// Fetch the question set for `task_id`.
    pub async fn load(api: &dyn TaskApi, task_id: TaskId) -> Result<Self, LoadError> {
        match api.fetch_questions(task_id).await? {
            ApiReply::Accepted(questions) => {
                let session = Self::new(task_id, questions)?;
                info!(target: "attraction_quiz", %task_id, questions = session.len(), "quiz loaded");
                Ok(session)
            }
            ApiReply::Rejected { message } => Err(LoadError::Rejected { message }),
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false: a session holds at least one question.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.questions.len()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn selected_for(&self, question_id: QuestionId) -> Option<OptionId> {
        self.answers.get(question_id)
    }

    /// Record a selection. Returns false, changing nothing, when the question
    /// is not part of this session or the option is not one of its options.
    pub fn select_answer(&mut self, question_id: QuestionId, option_id: OptionId) -> bool {
        let valid = self
            .questions
            .iter()
            .any(|question| question.id == question_id && question.has_option(option_id));
        if valid {
            self.answers.select(question_id, option_id);
        }
        valid
    }

    pub fn missing_answers(&self) -> usize {
        self.answers.missing_count(&self.questions)
    }

    /// Answers in question order, as the submission endpoint expects them.
    pub fn submission(&self) -> Vec<AnswerSubmission> {
        self.answers.ordered(&self.questions)
    }

    /// Move to the next question. Never moves past the last one.
    pub fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::LocalTaskApi;
    use crate::models::QuizOption;

    fn questions(count: u64) -> Vec<Question> {
        (1..=count)
            .map(|id| Question {
                id: QuestionId(id),
                text: format!("Question {id}"),
                options: vec![
                    QuizOption { id: OptionId(id * 10 + 1), text: "yes".into() },
                    QuizOption { id: OptionId(id * 10 + 2), text: "no".into() },
                ],
            })
            .collect()
    }

    #[test]
    fn test_empty_question_set_is_rejected() {
        assert!(matches!(
            QuizSession::new(TaskId(1), Vec::new()),
            Err(LoadError::Empty)
        ));
    }

    #[test]
    fn test_advance_stops_at_last_question() {
        let mut session = QuizSession::new(TaskId(1), questions(3)).unwrap();
        assert!(!session.is_last());

        assert!(session.advance());
        assert!(session.advance());
        assert!(session.is_last());
        assert!(!session.advance());
        assert_eq!(session.index(), 2);
        assert_eq!(session.current_question().map(|q| q.id), Some(QuestionId(3)));
    }

    #[test]
    fn test_select_answer_validates_ids() {
        let mut session = QuizSession::new(TaskId(1), questions(2)).unwrap();

        assert!(!session.select_answer(QuestionId(9), OptionId(91)));
        assert!(!session.select_answer(QuestionId(1), OptionId(21)));
        assert!(session.answers().is_empty());

        assert!(session.select_answer(QuestionId(1), OptionId(11)));
        assert!(session.select_answer(QuestionId(1), OptionId(12)));
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.selected_for(QuestionId(1)), Some(OptionId(12)));
        assert_eq!(session.missing_answers(), 1);
    }

    #[tokio::test]
    async fn test_load_reports_rejection() {
        let api = LocalTaskApi::from_json_str(
            r#"{"tasks": {"1": {"questions": [
                {"id": 1, "text": "?", "options": [{"id": 2, "text": "a"}], "correct_option_id": 2}
            ]}}}"#,
        )
        .unwrap();

        let session = QuizSession::load(&api, TaskId(1)).await.unwrap();
        assert_eq!(session.len(), 1);
        assert!(session.is_last());

        let err = QuizSession::load(&api, TaskId(2)).await.unwrap_err();
        assert!(matches!(err, LoadError::Rejected { .. }));
    }
}
