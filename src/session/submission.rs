//! Guarding and posting the final answer set.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::events::{EventSender, SessionEvent, SessionId};
use super::timer::TimerHandle;
use super::QuizSession;
use crate::api::{ApiReply, TaskApi};
use crate::error::{IncompleteAnswersError, SubmitError};
use crate::models::SessionResult;

/// How long a result stays on screen before the host is told the task is done.
pub const DEFAULT_RESULT_LINGER: Duration = Duration::from_secs(3);

/// Receives the result once per session, after it has been shown.
pub type CompletionHook = Arc<dyn Fn(&SessionResult) + Send + Sync>;

pub struct SubmissionCoordinator {
    session: SessionId,
    events: EventSender,
    linger: Duration,
    on_complete: CompletionHook,
    posting: bool,
    result: Option<SessionResult>,
    viewing: Option<TimerHandle>,
    completed: bool,
}

impl SubmissionCoordinator {
    pub fn new(
        session: SessionId,
        events: EventSender,
        linger: Duration,
        on_complete: CompletionHook,
    ) -> Self {
        Self {
            session,
            events,
            linger,
            on_complete,
            posting: false,
            result: None,
            viewing: None,
            completed: false,
        }
    }

    /// Check that every question has an answer. Makes no network call.
    pub fn try_submit(&self, quiz: &QuizSession) -> Result<(), IncompleteAnswersError> {
        match quiz.missing_answers() {
            0 => Ok(()),
            missing => Err(IncompleteAnswersError { missing }),
        }
    }

    pub fn is_posting(&self) -> bool {
        self.posting
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// True once the completion hook ran.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Post the answers. Returns `Ok(false)` when a submission is already in
    /// flight or a result already exists.
    pub fn post(
        &mut self,
        api: Arc<dyn TaskApi>,
        quiz: &QuizSession,
    ) -> Result<bool, IncompleteAnswersError> {
        self.try_submit(quiz)?;
        if self.posting || self.result.is_some() {
            return Ok(false);
        }

        self.posting = true;
        let session = self.session;
        let events = self.events.clone();
        let task_id = quiz.task_id();
        let answers = quiz.submission();
        info!(target: "attraction_quiz", %task_id, answers = answers.len(), "submitting quiz");

        tokio::spawn(async move {
            let outcome = match api.submit_quiz(task_id, &answers).await {
                Ok(ApiReply::Accepted(result)) => Ok(result),
                Ok(ApiReply::Rejected { message }) => Err(SubmitError::Rejected { message }),
                Err(e) => Err(SubmitError::Api(e)),
            };
            let _ = events.send(SessionEvent::Submitted { session, outcome });
        });

        Ok(true)
    }

    /// Apply the submission reply. Returns the stored result the first time
    /// one arrives; the viewing timer starts at the same moment.
    pub fn on_submitted(
        &mut self,
        outcome: Result<SessionResult, SubmitError>,
    ) -> Result<Option<&SessionResult>, SubmitError> {
        self.posting = false;
        if self.result.is_some() {
            return Ok(None);
        }

        let result = outcome.inspect_err(|e| {
            warn!(target: "attraction_quiz", error = %e, "quiz submission failed");
        })?;
        info!(
            target: "attraction_quiz",
            correct = result.correct_count,
            total = result.total_questions,
            perfect = result.is_perfect,
            "quiz submitted"
        );

        let session = self.session;
        let events = self.events.clone();
        self.viewing = Some(TimerHandle::delay(self.linger, move || {
            let _ = events.send(SessionEvent::ResultViewed { session });
        }));

        Ok(Some(&*self.result.insert(result)))
    }

    /// The result has been visible long enough: hand it to the host, once.
    pub fn on_viewed(&mut self) -> bool {
        self.viewing = None;
        if self.completed {
            return false;
        }
        let Some(result) = &self.result else {
            return false;
        };

        self.completed = true;
        (self.on_complete)(result);
        true
    }

    pub fn cancel(&mut self) {
        self.viewing = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::sync::mpsc;

    use super::*;
    use crate::models::{OptionId, Question, QuestionId, QuizOption, TaskId};

    fn quiz() -> QuizSession {
        let questions = (1..=3)
            .map(|id| Question {
                id: QuestionId(id),
                text: format!("Question {id}"),
                options: vec![QuizOption { id: OptionId(id * 10), text: "only".into() }],
            })
            .collect();
        QuizSession::new(TaskId(1), questions).unwrap()
    }

    fn result() -> SessionResult {
        SessionResult {
            correct_count: 3,
            total_questions: 3,
            score_percent: 100.0,
            is_perfect: true,
            rewards: None,
        }
    }

    #[test]
    fn test_try_submit_counts_missing_answers() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let coordinator = SubmissionCoordinator::new(
            SessionId::new(),
            tx,
            DEFAULT_RESULT_LINGER,
            Arc::new(|_: &SessionResult| {}),
        );
        let mut quiz = quiz();
        quiz.select_answer(QuestionId(2), OptionId(20));

        assert_eq!(
            coordinator.try_submit(&quiz),
            Err(IncompleteAnswersError { missing: 2 })
        );

        quiz.select_answer(QuestionId(1), OptionId(10));
        quiz.select_answer(QuestionId(3), OptionId(30));
        assert_eq!(coordinator.try_submit(&quiz), Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_hook_runs_once_after_linger() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hook_seen = Arc::clone(&seen);
        let mut coordinator = SubmissionCoordinator::new(
            SessionId::new(),
            tx,
            Duration::from_secs(4),
            Arc::new(move |result: &SessionResult| hook_seen.lock().unwrap().push(result.clone())),
        );

        let started = tokio::time::Instant::now();
        assert!(coordinator.on_submitted(Ok(result())).unwrap().is_some());
        assert!(!coordinator.is_completed());
        assert!(coordinator.on_submitted(Ok(result())).unwrap().is_none());

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, SessionEvent::ResultViewed { .. }));
        assert_eq!(started.elapsed(), Duration::from_secs(4));

        assert!(coordinator.on_viewed());
        assert!(!coordinator.on_viewed());
        assert_eq!(*seen.lock().unwrap(), vec![result()]);
    }
}
