//! Events delivered to a [`QuizController`](super::QuizController).
//!
//! Network calls and timers run as spawned tasks and report back through a
//! single channel. Every event names the session it belongs to, so replies
//! that arrive after a restart or teardown are dropped instead of applied.

use std::fmt;

use tokio::sync::mpsc;
use uuid::Uuid;

use super::QuizSession;
use crate::error::{CheckError, LoadError, SubmitError};
use crate::models::{AnswerCheck, SessionResult};

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Identity of one quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one feedback cycle within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct CycleId(u64);

impl CycleId {
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Debug)]
pub enum SessionEvent {
    /// The question set arrived (or could not be loaded).
    Loaded {
        session: SessionId,
        outcome: Result<QuizSession, LoadError>,
    },
    /// The server judged the answer of a feedback cycle.
    Checked {
        session: SessionId,
        cycle: CycleId,
        outcome: Result<AnswerCheck, CheckError>,
    },
    /// One second of the feedback countdown passed.
    Tick {
        session: SessionId,
        cycle: CycleId,
        remaining: u32,
    },
    /// The feedback countdown reached zero.
    CountdownElapsed { session: SessionId, cycle: CycleId },
    /// The final submission finished.
    Submitted {
        session: SessionId,
        outcome: Result<SessionResult, SubmitError>,
    },
    /// The result has been on screen for the viewing duration.
    ResultViewed { session: SessionId },
}

impl SessionEvent {
    pub fn session(&self) -> SessionId {
        match self {
            SessionEvent::Loaded { session, .. }
            | SessionEvent::Checked { session, .. }
            | SessionEvent::Tick { session, .. }
            | SessionEvent::CountdownElapsed { session, .. }
            | SessionEvent::Submitted { session, .. }
            | SessionEvent::ResultViewed { session } => *session,
        }
    }
}
