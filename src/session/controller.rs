//! The quiz task view.
//!
//! A [`QuizController`] owns one session at a time together with its feedback
//! sequencer and submission coordinator. Player actions arrive as method
//! calls, everything asynchronous arrives as a [`SessionEvent`]; both are
//! applied from a single task, one at a time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::events::{EventReceiver, EventSender, SessionEvent, SessionId};
use super::feedback::{DEFAULT_COUNTDOWN_SECS, FeedbackSequencer, FeedbackState};
use super::submission::{CompletionHook, DEFAULT_RESULT_LINGER, SubmissionCoordinator};
use super::QuizSession;
use crate::api::TaskApi;
use crate::audio::AudioCue;
use crate::error::{IncompleteAnswersError, LoadError, SubmitError};
use crate::models::{Question, SessionResult, TaskId};

/// How long a notice stays visible.
const NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Seconds feedback is shown before moving on.
    pub countdown_secs: u32,
    /// How long the result is shown before the host is notified.
    pub result_linger: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            result_linger: DEFAULT_RESULT_LINGER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the question set.
    Loading,
    /// The quiz could not be loaded. Terminal for this session.
    Unavailable { reason: String },
    /// Questions on screen; feedback cycles run inside this phase.
    Answering,
    /// Final submission in flight.
    Posting,
    /// Final submission failed; answers are kept for a retry.
    SubmitFailed,
    /// Result on screen.
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient message for the player.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    raised_at: Instant,
}

impl Notice {
    fn new(level: NoticeLevel, text: String) -> Self {
        Self {
            level,
            text,
            raised_at: Instant::now(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.raised_at.elapsed() < NOTICE_TTL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterFeedback {
    Advance,
    Submit,
}

pub struct QuizController {
    api: Arc<dyn TaskApi>,
    task_id: TaskId,
    settings: ControllerSettings,
    audio: Arc<dyn AudioCue>,
    on_complete: CompletionHook,
    events: EventSender,
    session: SessionId,
    phase: Phase,
    quiz: Option<QuizSession>,
    sequencer: FeedbackSequencer,
    submission: SubmissionCoordinator,
    after_feedback: Option<AfterFeedback>,
    cursor: usize,
    notice: Option<Notice>,
}

impl QuizController {
    /// Create a controller for `task_id`. Nothing is fetched until [`start`](Self::start).
    ///
    /// The returned receiver must be drained into [`handle_event`](Self::handle_event).
    pub fn new(
        api: Arc<dyn TaskApi>,
        task_id: TaskId,
        settings: ControllerSettings,
        audio: Arc<dyn AudioCue>,
        on_complete: CompletionHook,
    ) -> (Self, EventReceiver) {
        let (events, receiver) = mpsc::unbounded_channel();
        let session = SessionId::new();
        let sequencer = FeedbackSequencer::new(
            session,
            events.clone(),
            Arc::clone(&audio),
            settings.countdown_secs,
        );
        let submission = SubmissionCoordinator::new(
            session,
            events.clone(),
            settings.result_linger,
            Arc::clone(&on_complete),
        );

        let controller = Self {
            api,
            task_id,
            settings,
            audio,
            on_complete,
            events,
            session,
            phase: Phase::Loading,
            quiz: None,
            sequencer,
            submission,
            after_feedback: None,
            cursor: 0,
            notice: None,
        };
        (controller, receiver)
    }

    /// Begin a fresh session and fetch its questions.
    ///
    /// Any previous session is torn down: its timers stop and its pending
    /// replies will be discarded.
    pub fn start(&mut self) {
        self.reset_session();

        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        let session = self.session;
        let task_id = self.task_id;
        info!(target: "attraction_quiz", %task_id, %session, "loading quiz");

        tokio::spawn(async move {
            let outcome = QuizSession::load(api.as_ref(), task_id).await;
            let _ = events.send(SessionEvent::Loaded { session, outcome });
        });
    }

    pub fn restart(&mut self) {
        self.start();
    }

    /// Stop all timers. Replies still in flight will be ignored.
    pub fn close(&mut self) {
        self.sequencer.cancel();
        self.submission.cancel();
        self.session = SessionId::new();
    }

    pub fn session_id(&self) -> SessionId {
        self.session
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn quiz(&self) -> Option<&QuizSession> {
        self.quiz.as_ref()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.as_ref().and_then(QuizSession::current_question)
    }

    /// One-based question number and total.
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.quiz.as_ref().map(|quiz| (quiz.index() + 1, quiz.len()))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn feedback(&self) -> &FeedbackState {
        self.sequencer.state()
    }

    /// True while option input is ignored.
    pub fn is_locked(&self) -> bool {
        self.phase != Phase::Answering || self.sequencer.is_locked()
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.submission.result()
    }

    /// True once the host has been handed the result.
    pub fn is_completed(&self) -> bool {
        self.submission.is_completed()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref().filter(|notice| notice.is_visible())
    }

    pub fn cursor_down(&mut self) {
        self.move_cursor(1);
    }

    pub fn cursor_up(&mut self) {
        self.move_cursor(-1);
    }

    /// Select the option at `position` of the current question.
    pub fn select_position(&mut self, position: usize) -> bool {
        if self.is_locked() {
            return false;
        }
        let Some(quiz) = self.quiz.as_mut() else {
            return false;
        };
        let Some((question_id, option_id)) = quiz
            .current_question()
            .and_then(|question| question.option_at(position).map(|option| (question.id, option.id)))
        else {
            return false;
        };

        let selected = quiz.select_answer(question_id, option_id);
        if selected {
            self.cursor = position;
        }
        selected
    }

    /// Select the option under the cursor.
    pub fn select_cursor(&mut self) -> bool {
        self.select_position(self.cursor)
    }

    /// Enter: select the highlighted option if nothing is selected yet, then
    /// check it and move on (or submit on the last question). Retries a
    /// failed submission.
    pub fn confirm(&mut self) {
        match self.phase {
            Phase::Answering => {
                if self.sequencer.is_locked() {
                    return;
                }
                let Some(quiz) = self.quiz.as_ref() else {
                    return;
                };
                let unanswered = quiz
                    .current_question()
                    .is_some_and(|question| quiz.selected_for(question.id).is_none());
                let is_last = quiz.is_last();
                if unanswered {
                    self.select_cursor();
                }

                if is_last {
                    // The error is already surfaced as a notice.
                    let _ = self.request_submit();
                } else {
                    self.start_feedback(AfterFeedback::Advance);
                }
            }
            Phase::SubmitFailed => self.retry_submission(),
            _ => {}
        }
    }

    /// Validate the answers, run feedback for the current question and then
    /// submit. Fails without any network call when answers are missing.
    pub fn request_submit(&mut self) -> Result<(), IncompleteAnswersError> {
        match self.phase {
            Phase::Answering if !self.sequencer.is_locked() => {}
            Phase::SubmitFailed => {
                self.retry_submission();
                return Ok(());
            }
            _ => return Ok(()),
        }
        let Some(quiz) = self.quiz.as_ref() else {
            return Ok(());
        };

        if let Err(e) = self.submission.try_submit(quiz) {
            debug!(target: "attraction_quiz", missing = e.missing, "submission blocked");
            self.notify(
                NoticeLevel::Error,
                format!("Please answer all questions: {e}."),
            );
            return Err(e);
        }

        self.start_feedback(AfterFeedback::Submit);
        Ok(())
    }

    /// Post the kept answers again after a failed submission.
    pub fn retry_submission(&mut self) {
        if self.phase == Phase::SubmitFailed {
            info!(target: "attraction_quiz", "retrying submission");
            self.post_submission();
        }
    }

    /// Apply an event produced by this controller's background tasks.
    pub fn handle_event(&mut self, event: SessionEvent) {
        if event.session() != self.session {
            debug!(target: "attraction_quiz", stale = %event.session(), "discarding event from an old session");
            return;
        }

        match event {
            SessionEvent::Loaded { outcome, .. } => self.on_loaded(outcome),
            SessionEvent::Checked { cycle, outcome, .. } => {
                if let Err(e) = self.sequencer.on_checked(cycle, outcome) {
                    self.after_feedback = None;
                    self.notify(
                        NoticeLevel::Error,
                        format!("Could not check your answer: {e}. Press Enter to try again."),
                    );
                }
            }
            SessionEvent::Tick {
                cycle, remaining, ..
            } => self.sequencer.on_tick(cycle, remaining),
            SessionEvent::CountdownElapsed { cycle, .. } => {
                if self.sequencer.on_elapsed(cycle) {
                    self.finish_feedback();
                }
            }
            SessionEvent::Submitted { outcome, .. } => self.on_submitted(outcome),
            SessionEvent::ResultViewed { .. } => {
                if self.submission.on_viewed() {
                    info!(target: "attraction_quiz", task_id = %self.task_id, "task completed");
                }
            }
        }
    }

    fn reset_session(&mut self) {
        self.session = SessionId::new();
        // Replacing the sequencer and coordinator drops their timers.
        self.sequencer = FeedbackSequencer::new(
            self.session,
            self.events.clone(),
            Arc::clone(&self.audio),
            self.settings.countdown_secs,
        );
        self.submission = SubmissionCoordinator::new(
            self.session,
            self.events.clone(),
            self.settings.result_linger,
            Arc::clone(&self.on_complete),
        );
        self.phase = Phase::Loading;
        self.quiz = None;
        self.after_feedback = None;
        self.cursor = 0;
        self.notice = None;
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.is_locked() {
            return;
        }
        let Some(count) = self.current_question().map(|question| question.options.len()) else {
            return;
        };
        if count == 0 {
            return;
        }
        self.cursor = (self.cursor as isize + delta).rem_euclid(count as isize) as usize;
    }

    fn cursor_for_current(&self) -> usize {
        self.quiz
            .as_ref()
            .and_then(|quiz| {
                let question = quiz.current_question()?;
                question.option_position(quiz.selected_for(question.id)?)
            })
            .unwrap_or(0)
    }

    fn start_feedback(&mut self, after: AfterFeedback) {
        let Some(question) = self.current_question() else {
            return;
        };
        let question_id = question.id;
        let Some(selected) = self.quiz.as_ref().and_then(|quiz| quiz.selected_for(question_id))
        else {
            self.notify(NoticeLevel::Info, "Pick an answer first.".to_string());
            return;
        };

        match self.sequencer.begin(Arc::clone(&self.api), question_id, selected) {
            Ok(_) => self.after_feedback = Some(after),
            Err(e) => debug!(target: "attraction_quiz", error = %e, "ignoring confirm"),
        }
    }

    fn finish_feedback(&mut self) {
        match self.after_feedback.take() {
            Some(AfterFeedback::Advance) => {
                if let Some(quiz) = self.quiz.as_mut() {
                    if quiz.advance() {
                        self.cursor = self.cursor_for_current();
                    }
                }
            }
            Some(AfterFeedback::Submit) => self.post_submission(),
            None => {}
        }
    }

    fn post_submission(&mut self) {
        let Some(quiz) = self.quiz.as_ref() else {
            return;
        };

        match self.submission.post(Arc::clone(&self.api), quiz) {
            Ok(true) => self.phase = Phase::Posting,
            Ok(false) => {}
            Err(e) => {
                self.phase = Phase::Answering;
                self.notify(NoticeLevel::Error, format!("Please answer all questions: {e}."));
            }
        }
    }

    fn on_loaded(&mut self, outcome: Result<QuizSession, LoadError>) {
        if self.phase != Phase::Loading {
            return;
        }

        match outcome {
            Ok(quiz) => {
                self.quiz = Some(quiz);
                self.cursor = 0;
                self.phase = Phase::Answering;
            }
            Err(e) => {
                warn!(target: "attraction_quiz", task_id = %self.task_id, error = %e, "quiz unavailable");
                self.phase = Phase::Unavailable {
                    reason: e.to_string(),
                };
                self.notify(NoticeLevel::Error, "This quiz is not available right now.".to_string());
            }
        }
    }

    fn on_submitted(&mut self, outcome: Result<SessionResult, SubmitError>) {
        let stored = self
            .submission
            .on_submitted(outcome)
            .map(|result| result.is_some());

        match stored {
            Ok(true) => {
                self.phase = Phase::Results;
                self.notice = None;
            }
            Ok(false) => {}
            Err(e) => {
                self.phase = Phase::SubmitFailed;
                self.notify(
                    NoticeLevel::Error,
                    format!("Submission failed: {e}. Press Enter to retry."),
                );
            }
        }
    }

    fn notify(&mut self, level: NoticeLevel, text: String) {
        self.notice = Some(Notice::new(level, text));
    }
}
