//! Quiz session state machine.
//!
//! [`QuizSession`] holds the questions and answers, [`FeedbackSequencer`]
//! runs the check/show/countdown cycle for one question,
//! [`SubmissionCoordinator`] guards and posts the final answer set, and
//! [`QuizController`] drives all three from a single event stream.

mod controller;
mod events;
mod feedback;
mod quiz;
mod submission;
mod timer;

pub use controller::{ControllerSettings, Notice, NoticeLevel, Phase, QuizController};
pub use events::{CycleId, EventReceiver, EventSender, SessionEvent, SessionId};
pub use feedback::{
    DEFAULT_COUNTDOWN_SECS, Feedback, FeedbackSequencer, FeedbackState, OptionMark,
};
pub use quiz::QuizSession;
pub use submission::{CompletionHook, DEFAULT_RESULT_LINGER, SubmissionCoordinator};
