//! # attraction-quiz
//!
//! A terminal client for attraction-task quizzes. Questions come from a Task
//! API, every answer is checked by the service and shown with a short
//! countdown, and the final answer set is submitted for a scored result.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use attraction_quiz::{HttpTaskApi, Quiz, QuizError, TaskId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), QuizError> {
//!     let api = HttpTaskApi::new("https://tasks.example.org/api", std::time::Duration::from_secs(10))?;
//!
//!     Quiz::new(Arc::new(api), TaskId(42))
//!         .on_complete(|result| eprintln!("scored {}%", result.score_percent))
//!         .run()
//!         .await
//! }
//! ```

pub mod api;
mod app;
pub mod audio;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod telemetry;
pub mod terminal;
pub mod ui;

use std::sync::Arc;

pub use api::{ApiReply, HttpTaskApi, LocalTaskApi, TaskApi};
pub use app::App;
pub use audio::{AudioCue, Cue, Silent, TerminalBell};
pub use config::Config;
pub use error::{
    ApiError, BankError, CheckError, ConfigError, IncompleteAnswersError, LoadError, QuizError,
    SequencerBusy, SubmitError,
};
pub use models::{
    AnswerCheck, AnswerSubmission, OptionId, Question, QuestionId, QuizOption, Rewards,
    SessionResult, TaskId,
};
pub use session::{CompletionHook, ControllerSettings, Phase, QuizController};

/// A quiz task that can be run in the terminal.
pub struct Quiz {
    api: Arc<dyn TaskApi>,
    task_id: TaskId,
    settings: ControllerSettings,
    audio: Arc<dyn AudioCue>,
    on_complete: CompletionHook,
    exit_on_complete: bool,
}

impl Quiz {
    pub fn new(api: Arc<dyn TaskApi>, task_id: TaskId) -> Self {
        Self {
            api,
            task_id,
            settings: ControllerSettings::default(),
            audio: Arc::new(TerminalBell),
            on_complete: Arc::new(|_: &SessionResult| {}),
            exit_on_complete: false,
        }
    }

    pub fn with_settings(mut self, settings: ControllerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_audio(mut self, audio: Arc<dyn AudioCue>) -> Self {
        self.audio = audio;
        self
    }

    /// Called once with the result, after it has been on screen for the
    /// configured linger time.
    pub fn on_complete<F>(mut self, hook: F) -> Self
    where
        F: Fn(&SessionResult) + Send + Sync + 'static,
    {
        self.on_complete = Arc::new(hook);
        self
    }

    /// Leave the terminal as soon as the completion hook has run.
    pub fn exit_on_complete(mut self, exit: bool) -> Self {
        self.exit_on_complete = exit;
        self
    }

    /// Take over the terminal and run until the player quits.
    pub async fn run(self) -> Result<(), QuizError> {
        let (controller, events) = QuizController::new(
            self.api,
            self.task_id,
            self.settings,
            self.audio,
            self.on_complete,
        );
        let app = App::new(controller, events, self.exit_on_complete);

        let mut guard = terminal::TerminalGuard::enter()?;
        app.run(guard.terminal()).await?;
        Ok(())
    }
}
