use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, timeout};

use attraction_quiz::api::{ApiReply, TaskApi};
use attraction_quiz::audio::Silent;
use attraction_quiz::error::{ApiError, IncompleteAnswersError};
use attraction_quiz::models::{
    AnswerCheck, AnswerSubmission, OptionId, Question, QuestionId, QuizOption, SessionResult,
    TaskId,
};
use attraction_quiz::session::{
    ControllerSettings, EventReceiver, FeedbackState, Phase, QuizController, SessionEvent,
};

const TASK: TaskId = TaskId(7);

/// A Task API with a fixed answer key that counts every call.
struct ScriptedApi {
    questions: Vec<Question>,
    key: HashMap<QuestionId, OptionId>,
    reject_load: bool,
    failing_submits: AtomicUsize,
    fetches: AtomicUsize,
    checks: Mutex<Vec<(QuestionId, OptionId)>>,
    submissions: Mutex<Vec<Vec<AnswerSubmission>>>,
}

impl ScriptedApi {
    /// `count` questions with two options each; the second option is correct.
    fn new(count: u64) -> Self {
        let questions: Vec<Question> = (1..=count)
            .map(|id| Question {
                id: QuestionId(id),
                text: format!("Question {id}"),
                options: vec![
                    QuizOption { id: OptionId(id * 10), text: "wrong".into() },
                    QuizOption { id: OptionId(id * 10 + 1), text: "right".into() },
                ],
            })
            .collect();
        let key = questions
            .iter()
            .map(|question| (question.id, question.options[1].id))
            .collect();

        Self {
            questions,
            key,
            reject_load: false,
            failing_submits: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            checks: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    fn rejecting_load(mut self) -> Self {
        self.reject_load = true;
        self
    }

    fn failing_submits(self, count: usize) -> Self {
        self.failing_submits.store(count, Ordering::SeqCst);
        self
    }

    fn check_count(&self) -> usize {
        self.checks.lock().unwrap().len()
    }

    fn submit_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl TaskApi for ScriptedApi {
    async fn fetch_questions(&self, _task_id: TaskId) -> Result<ApiReply<Vec<Question>>, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.reject_load {
            return Ok(ApiReply::Rejected {
                message: "Task is closed".into(),
            });
        }
        Ok(ApiReply::Accepted(self.questions.clone()))
    }

    async fn check_answer(
        &self,
        question_id: QuestionId,
        selected_option_id: OptionId,
    ) -> Result<ApiReply<AnswerCheck>, ApiError> {
        self.checks.lock().unwrap().push((question_id, selected_option_id));
        let correct_option_id = self.key[&question_id];
        Ok(ApiReply::Accepted(AnswerCheck {
            is_correct: selected_option_id == correct_option_id,
            selected_option_id,
            correct_option_id,
        }))
    }

    async fn submit_quiz(
        &self,
        _task_id: TaskId,
        answers: &[AnswerSubmission],
    ) -> Result<ApiReply<SessionResult>, ApiError> {
        self.submissions.lock().unwrap().push(answers.to_vec());
        let pending_failures = self.failing_submits.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.failing_submits.store(pending_failures - 1, Ordering::SeqCst);
            return Ok(ApiReply::Rejected {
                message: "Service unavailable".into(),
            });
        }

        let correct = answers
            .iter()
            .filter(|answer| self.key.get(&answer.question_id) == Some(&answer.selected_option_id))
            .count() as u32;
        let total = self.questions.len() as u32;
        Ok(ApiReply::Accepted(SessionResult {
            correct_count: correct,
            total_questions: total,
            score_percent: f64::from(correct) / f64::from(total) * 100.0,
            is_perfect: correct == total,
            rewards: None,
        }))
    }
}

struct Harness {
    api: Arc<ScriptedApi>,
    controller: QuizController,
    events: EventReceiver,
    completed: Arc<Mutex<Vec<SessionResult>>>,
}

impl Harness {
    fn new(api: ScriptedApi) -> Self {
        let api = Arc::new(api);
        let completed = Arc::new(Mutex::new(Vec::new()));
        let hook_completed = Arc::clone(&completed);
        let (controller, events) = QuizController::new(
            api.clone(),
            TASK,
            ControllerSettings::default(),
            Arc::new(Silent),
            Arc::new(move |result: &SessionResult| {
                hook_completed.lock().unwrap().push(result.clone())
            }),
        );
        Self {
            api,
            controller,
            events,
            completed,
        }
    }

    /// Apply events until `done` holds.
    async fn pump_until(&mut self, done: impl Fn(&QuizController) -> bool) {
        let controller = &mut self.controller;
        let events = &mut self.events;
        timeout(Duration::from_secs(30), async {
            while !done(controller) {
                let event = events.recv().await.expect("event channel closed");
                controller.handle_event(event);
            }
        })
        .await
        .expect("condition was never reached");
    }

    async fn started(api: ScriptedApi) -> Self {
        let mut harness = Self::new(api);
        harness.controller.start();
        harness
            .pump_until(|c| c.phase() == &Phase::Answering)
            .await;
        harness
    }

    async fn answer_and_confirm(&mut self, position: usize) {
        let (number, _) = self.controller.progress().unwrap();
        assert!(self.controller.select_position(position));
        self.controller.confirm();
        self.pump_until(|c| {
            c.progress().is_some_and(|(n, _)| n > number) || c.phase() != &Phase::Answering
        })
        .await;
    }

    fn completions(&self) -> Vec<SessionResult> {
        self.completed.lock().unwrap().clone()
    }
}

#[tokio::test(start_paused = true)]
async fn test_two_question_quiz_end_to_end() {
    let mut h = Harness::started(ScriptedApi::new(2)).await;
    assert_eq!(h.controller.progress(), Some((1, 2)));

    // Wrong answer on the first question.
    assert!(h.controller.select_position(0));
    h.controller.confirm();
    assert!(h.controller.is_locked());
    h.pump_until(|c| matches!(c.feedback(), FeedbackState::Showing(_)))
        .await;
    let FeedbackState::Showing(feedback) = *h.controller.feedback() else {
        unreachable!()
    };
    assert!(!feedback.is_correct);
    assert_eq!(feedback.correct_option_id, OptionId(11));

    let shown_at = Instant::now();
    h.pump_until(|c| c.progress() == Some((2, 2))).await;
    assert!(shown_at.elapsed() >= Duration::from_secs(2));
    assert!(!h.controller.is_locked());

    // Right answer on the last question submits after its feedback.
    h.answer_and_confirm(1).await;
    h.pump_until(|c| c.phase() == &Phase::Results).await;

    assert_eq!(h.api.check_count(), 2);
    assert_eq!(h.api.submit_count(), 1);
    assert_eq!(
        h.api.submissions.lock().unwrap()[0],
        vec![
            AnswerSubmission { question_id: QuestionId(1), selected_option_id: OptionId(10) },
            AnswerSubmission { question_id: QuestionId(2), selected_option_id: OptionId(21) },
        ]
    );

    let result = h.controller.result().cloned().unwrap();
    assert_eq!(result.correct_count, 1);
    assert_eq!(result.total_questions, 2);
    assert!(!result.is_perfect);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_load_is_terminal() {
    let mut h = Harness::new(ScriptedApi::new(2).rejecting_load());
    h.controller.start();
    h.pump_until(|c| matches!(c.phase(), Phase::Unavailable { .. }))
        .await;

    assert_eq!(
        h.controller.phase(),
        &Phase::Unavailable {
            reason: "Task is closed".into()
        }
    );
    assert!(h.controller.current_question().is_none());
    assert!(!h.controller.select_position(0));
    h.controller.confirm();
    assert_eq!(h.controller.request_submit(), Ok(()));

    assert_eq!(h.api.check_count(), 0);
    assert_eq!(h.api.submit_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_empty_question_set_is_unavailable() {
    let mut api = ScriptedApi::new(1);
    api.questions.clear();
    let mut h = Harness::new(api);
    h.controller.start();
    h.pump_until(|c| matches!(c.phase(), Phase::Unavailable { .. }))
        .await;
    assert!(h.controller.quiz().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_incomplete_submission_makes_no_call() {
    let mut h = Harness::started(ScriptedApi::new(3)).await;
    assert!(h.controller.select_position(1));

    assert_eq!(
        h.controller.request_submit(),
        Err(IncompleteAnswersError { missing: 2 })
    );
    assert_eq!(h.controller.phase(), &Phase::Answering);
    assert!(!h.controller.is_locked());
    assert!(h.controller.notice().is_some());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(h.events.try_recv().is_err());
    assert_eq!(h.api.check_count(), 0);
    assert_eq!(h.api.submit_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_last_selection_wins() {
    let mut h = Harness::started(ScriptedApi::new(2)).await;
    assert!(h.controller.select_position(0));
    assert!(h.controller.select_position(1));
    assert!(h.controller.select_position(0));
    assert_eq!(
        h.controller.quiz().unwrap().selected_for(QuestionId(1)),
        Some(OptionId(10))
    );
    assert_eq!(h.controller.quiz().unwrap().answers().len(), 1);

    h.controller.confirm();
    h.pump_until(|c| matches!(c.feedback(), FeedbackState::Showing(_)))
        .await;
    assert_eq!(
        *h.api.checks.lock().unwrap(),
        vec![(QuestionId(1), OptionId(10))]
    );
}

#[tokio::test(start_paused = true)]
async fn test_input_is_ignored_during_feedback() {
    let mut h = Harness::started(ScriptedApi::new(2)).await;
    assert!(h.controller.select_position(1));
    h.controller.confirm();

    // Still checking.
    assert!(h.controller.is_locked());
    assert!(!h.controller.select_position(0));
    h.controller.confirm();
    h.controller.cursor_up();
    assert_eq!(h.controller.cursor(), 1);

    h.pump_until(|c| matches!(c.feedback(), FeedbackState::Showing(_)))
        .await;
    assert!(!h.controller.select_position(0));
    h.controller.confirm();
    assert_eq!(h.controller.request_submit(), Ok(()));

    h.pump_until(|c| c.progress() == Some((2, 2))).await;
    assert_eq!(h.api.check_count(), 1);
    assert_eq!(
        h.controller.quiz().unwrap().selected_for(QuestionId(1)),
        Some(OptionId(11))
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_submission_retries_with_same_answers() {
    let mut h = Harness::started(ScriptedApi::new(2).failing_submits(1)).await;
    h.answer_and_confirm(1).await;
    h.answer_and_confirm(1).await;
    h.pump_until(|c| c.phase() == &Phase::SubmitFailed).await;

    assert_eq!(h.controller.quiz().unwrap().answers().len(), 2);
    assert!(h.controller.result().is_none());
    assert!(h.controller.notice().is_some());

    h.controller.retry_submission();
    assert_eq!(h.controller.phase(), &Phase::Posting);
    h.pump_until(|c| c.phase() == &Phase::Results).await;

    assert_eq!(h.api.check_count(), 2);
    assert_eq!(h.api.submit_count(), 2);
    let submissions = h.api.submissions.lock().unwrap().clone();
    assert_eq!(submissions[0], submissions[1]);

    let mut clean = Harness::started(ScriptedApi::new(2)).await;
    clean.answer_and_confirm(1).await;
    clean.answer_and_confirm(1).await;
    clean.pump_until(|c| c.phase() == &Phase::Results).await;
    assert_eq!(h.controller.result(), clean.controller.result());
    assert!(h.controller.result().unwrap().is_perfect);
}

#[tokio::test(start_paused = true)]
async fn test_completion_hook_fires_once_after_linger() {
    let mut h = Harness::started(ScriptedApi::new(1)).await;
    h.answer_and_confirm(1).await;
    h.pump_until(|c| c.phase() == &Phase::Results).await;
    assert!(h.completions().is_empty());

    let shown_at = Instant::now();
    h.pump_until(|c| c.is_completed()).await;
    assert!(shown_at.elapsed() >= ControllerSettings::default().result_linger);
    assert_eq!(h.completions().len(), 1);
    assert_eq!(Some(&h.completions()[0]), h.controller.result());

    tokio::time::sleep(Duration::from_secs(30)).await;
    while let Ok(event) = h.events.try_recv() {
        h.controller.handle_event(event);
    }
    assert_eq!(h.completions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restart_discards_replies_from_old_session() {
    let mut h = Harness::new(ScriptedApi::new(2));
    h.controller.start();
    let stale = h.events.recv().await.unwrap();
    assert!(matches!(stale, SessionEvent::Loaded { .. }));

    h.controller.restart();
    h.controller.handle_event(stale);
    assert_eq!(h.controller.phase(), &Phase::Loading);

    h.pump_until(|c| c.phase() == &Phase::Answering).await;
    assert_eq!(h.api.fetches.load(Ordering::SeqCst), 2);

    // A check reply that lands after another restart changes nothing.
    assert!(h.controller.select_position(0));
    h.controller.confirm();
    let stale = h.events.recv().await.unwrap();
    assert!(matches!(stale, SessionEvent::Checked { .. }));
    h.controller.restart();
    h.controller.handle_event(stale);
    assert_eq!(h.controller.feedback(), &FeedbackState::Idle);

    h.pump_until(|c| c.phase() == &Phase::Answering).await;
    assert_eq!(h.controller.progress(), Some((1, 2)));
    assert!(h.controller.quiz().unwrap().answers().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_pending_feedback() {
    let mut h = Harness::started(ScriptedApi::new(2)).await;
    assert!(h.controller.select_position(1));
    h.controller.confirm();
    h.pump_until(|c| matches!(c.feedback(), FeedbackState::Showing(_)))
        .await;

    h.controller.close();
    tokio::time::sleep(Duration::from_secs(10)).await;
    while let Ok(event) = h.events.try_recv() {
        h.controller.handle_event(event);
    }
    assert_eq!(h.controller.progress(), Some((1, 2)));
}
