//! Per-question answer feedback.
//!
//! A cycle runs `Idle -> Checking -> Showing -> Idle`. While a cycle is
//! checking or showing the sequencer is locked: option input is ignored and
//! no second cycle can start. The countdown timer belongs to the sequencer
//! and is aborted whenever it is replaced, cancelled or dropped.

use std::sync::Arc;

use tracing::{debug, warn};

use super::events::{CycleId, EventSender, SessionEvent, SessionId};
use super::timer::TimerHandle;
use crate::api::{ApiReply, TaskApi};
use crate::audio::{self, AudioCue, Cue};
use crate::error::{CheckError, SequencerBusy};
use crate::models::{AnswerCheck, OptionId, QuestionId};

/// Seconds feedback stays on screen before the quiz moves on.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 3;

/// A checked answer on display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feedback {
    pub is_correct: bool,
    pub selected_option_id: OptionId,
    pub correct_option_id: OptionId,
    pub remaining_secs: u32,
}

/// How an option is highlighted while feedback is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    /// The player's selection, and it was right.
    Correct,
    /// The player's selection, and it was wrong.
    Incorrect,
    /// The right answer the player missed.
    Revealed,
}

impl Feedback {
    pub fn mark(&self, option_id: OptionId) -> Option<OptionMark> {
        if option_id == self.selected_option_id {
            Some(if self.is_correct {
                OptionMark::Correct
            } else {
                OptionMark::Incorrect
            })
        } else if !self.is_correct && option_id == self.correct_option_id {
            Some(OptionMark::Revealed)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackState {
    #[default]
    Idle,
    Checking {
        question_id: QuestionId,
        selected_option_id: OptionId,
    },
    Showing(Feedback),
}

pub struct FeedbackSequencer {
    session: SessionId,
    events: EventSender,
    audio: Arc<dyn AudioCue>,
    countdown_secs: u32,
    state: FeedbackState,
    cycle: CycleId,
    countdown: Option<TimerHandle>,
}

impl FeedbackSequencer {
    pub fn new(
        session: SessionId,
        events: EventSender,
        audio: Arc<dyn AudioCue>,
        countdown_secs: u32,
    ) -> Self {
        Self {
            session,
            events,
            audio,
            countdown_secs,
            state: FeedbackState::Idle,
            cycle: CycleId::default(),
            countdown: None,
        }
    }

    pub fn state(&self) -> &FeedbackState {
        &self.state
    }

    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    /// True while a cycle is checking or showing.
    pub fn is_locked(&self) -> bool {
        !matches!(self.state, FeedbackState::Idle)
    }

    /// True while a countdown timer is running.
    pub fn has_countdown(&self) -> bool {
        self.countdown.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Start a cycle by asking the server to check `selected_option_id`.
    pub fn begin(
        &mut self,
        api: Arc<dyn TaskApi>,
        question_id: QuestionId,
        selected_option_id: OptionId,
    ) -> Result<CycleId, SequencerBusy> {
        if self.is_locked() {
            return Err(SequencerBusy);
        }

        self.cycle = self.cycle.next();
        self.state = FeedbackState::Checking {
            question_id,
            selected_option_id,
        };

        let cycle = self.cycle;
        let session = self.session;
        let events = self.events.clone();
        debug!(target: "attraction_quiz", %question_id, ?cycle, "checking answer");

        tokio::spawn(async move {
            let outcome = match api.check_answer(question_id, selected_option_id).await {
                Ok(ApiReply::Accepted(check)) => Ok(check),
                Ok(ApiReply::Rejected { message }) => Err(CheckError::Rejected { message }),
                Err(e) => Err(CheckError::Api(e)),
            };
            // The receiver is gone once the controller is torn down.
            let _ = events.send(SessionEvent::Checked {
                session,
                cycle,
                outcome,
            });
        });

        Ok(cycle)
    }

    /// Apply a check reply. Returns `Ok(true)` when feedback is now showing,
    /// `Ok(false)` when the reply belonged to an older cycle.
    pub fn on_checked(
        &mut self,
        cycle: CycleId,
        outcome: Result<AnswerCheck, CheckError>,
    ) -> Result<bool, CheckError> {
        if cycle != self.cycle || !matches!(self.state, FeedbackState::Checking { .. }) {
            debug!(target: "attraction_quiz", ?cycle, "ignoring stale check reply");
            return Ok(false);
        }

        let check = match outcome {
            Ok(check) => check,
            Err(e) => {
                warn!(target: "attraction_quiz", ?cycle, error = %e, "answer check failed");
                self.state = FeedbackState::Idle;
                return Err(e);
            }
        };

        self.state = FeedbackState::Showing(Feedback {
            is_correct: check.is_correct,
            selected_option_id: check.selected_option_id,
            correct_option_id: check.correct_option_id,
            remaining_secs: self.countdown_secs,
        });
        audio::play_best_effort(self.audio.as_ref(), Cue::for_answer(check.is_correct));
        self.start_countdown();

        Ok(true)
    }

    pub fn on_tick(&mut self, cycle: CycleId, remaining: u32) {
        if cycle != self.cycle {
            return;
        }
        if let FeedbackState::Showing(feedback) = &mut self.state {
            // Ticks only count down.
            if remaining < feedback.remaining_secs {
                feedback.remaining_secs = remaining;
            }
        }
    }

    /// Finish the cycle. Returns true when the caller should advance or submit.
    pub fn on_elapsed(&mut self, cycle: CycleId) -> bool {
        if cycle != self.cycle || !matches!(self.state, FeedbackState::Showing(_)) {
            return false;
        }

        self.state = FeedbackState::Idle;
        self.countdown = None;
        true
    }

    /// Abort any running cycle. Replies still in flight become stale.
    pub fn cancel(&mut self) {
        self.countdown = None;
        self.state = FeedbackState::Idle;
        self.cycle = self.cycle.next();
    }

    fn start_countdown(&mut self) {
        let session = self.session;
        let cycle = self.cycle;
        let tick_events = self.events.clone();
        let done_events = self.events.clone();

        // Assigning drops the previous handle, which aborts its timer.
        self.countdown = Some(TimerHandle::countdown(
            self.countdown_secs,
            move |remaining| {
                let _ = tick_events.send(SessionEvent::Tick {
                    session,
                    cycle,
                    remaining,
                });
            },
            move || {
                let _ = done_events.send(SessionEvent::CountdownElapsed { session, cycle });
            },
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::api::LocalTaskApi;
    use crate::audio::Silent;

    const BANK: &str = r#"{"tasks": {"1": {"questions": [
        {"id": 1, "text": "Pick b", "options": [{"id": 11, "text": "a"}, {"id": 12, "text": "b"}],
         "correct_option_id": 12}
    ]}}}"#;

    struct BrokenSpeaker;

    impl AudioCue for BrokenSpeaker {
        fn play(&self, _cue: Cue) -> io::Result<()> {
            Err(io::Error::other("no audio device"))
        }
    }

    fn api() -> Arc<dyn TaskApi> {
        Arc::new(LocalTaskApi::from_json_str(BANK).unwrap())
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
        tokio::time::timeout(Duration::from_secs(30), rx.recv())
            .await
            .expect("event before timeout")
            .expect("channel open")
    }

    #[test]
    fn test_marks_for_wrong_answer() {
        let feedback = Feedback {
            is_correct: false,
            selected_option_id: OptionId(11),
            correct_option_id: OptionId(12),
            remaining_secs: 3,
        };
        assert_eq!(feedback.mark(OptionId(11)), Some(OptionMark::Incorrect));
        assert_eq!(feedback.mark(OptionId(12)), Some(OptionMark::Revealed));
        assert_eq!(feedback.mark(OptionId(13)), None);

        let feedback = Feedback {
            is_correct: true,
            selected_option_id: OptionId(12),
            ..feedback
        };
        assert_eq!(feedback.mark(OptionId(12)), Some(OptionMark::Correct));
        assert_eq!(feedback.mark(OptionId(11)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_cycle_with_broken_audio() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = SessionId::new();
        let mut sequencer =
            FeedbackSequencer::new(session, tx, Arc::new(BrokenSpeaker), DEFAULT_COUNTDOWN_SECS);

        let cycle = sequencer.begin(api(), QuestionId(1), OptionId(11)).unwrap();
        assert!(sequencer.is_locked());
        assert_eq!(
            sequencer.begin(api(), QuestionId(1), OptionId(12)),
            Err(SequencerBusy)
        );

        let SessionEvent::Checked { outcome, .. } = next_event(&mut rx).await else {
            panic!("expected check reply");
        };
        assert!(sequencer.on_checked(cycle, outcome).unwrap());
        assert!(sequencer.has_countdown());
        assert!(matches!(
            sequencer.state(),
            FeedbackState::Showing(Feedback { is_correct: false, remaining_secs: 3, .. })
        ));

        let mut ticks = Vec::new();
        loop {
            match next_event(&mut rx).await {
                SessionEvent::Tick { cycle, remaining, .. } => {
                    sequencer.on_tick(cycle, remaining);
                    ticks.push(remaining);
                }
                SessionEvent::CountdownElapsed { cycle, .. } => {
                    assert!(sequencer.on_elapsed(cycle));
                    break;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }

        assert_eq!(ticks, vec![2, 1]);
        assert_eq!(sequencer.state(), &FeedbackState::Idle);
        assert!(!sequencer.has_countdown());
        assert!(sequencer.begin(api(), QuestionId(1), OptionId(12)).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_check_unlocks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sequencer = FeedbackSequencer::new(SessionId::new(), tx, Arc::new(Silent), 3);

        let cycle = sequencer.begin(api(), QuestionId(99), OptionId(1)).unwrap();
        let SessionEvent::Checked { outcome, .. } = next_event(&mut rx).await else {
            panic!("expected check reply");
        };

        let err = sequencer.on_checked(cycle, outcome).unwrap_err();
        assert!(matches!(err, CheckError::Rejected { .. }));
        assert!(!sequencer.is_locked());
        assert!(!sequencer.has_countdown());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_replies_are_ignored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sequencer = FeedbackSequencer::new(SessionId::new(), tx, Arc::new(Silent), 3);

        let old_cycle = sequencer.begin(api(), QuestionId(1), OptionId(12)).unwrap();
        sequencer.cancel();
        assert!(!sequencer.is_locked());

        let SessionEvent::Checked { cycle, outcome, .. } = next_event(&mut rx).await else {
            panic!("expected check reply");
        };
        assert_eq!(cycle, old_cycle);
        assert!(!sequencer.on_checked(cycle, outcome).unwrap());
        assert_eq!(sequencer.state(), &FeedbackState::Idle);

        sequencer.on_tick(old_cycle, 1);
        assert!(!sequencer.on_elapsed(old_cycle));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_never_raise_the_countdown() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sequencer = FeedbackSequencer::new(SessionId::new(), tx, Arc::new(Silent), 5);

        let cycle = sequencer.begin(api(), QuestionId(1), OptionId(12)).unwrap();
        let SessionEvent::Checked { outcome, .. } = next_event(&mut rx).await else {
            panic!("expected check reply");
        };
        sequencer.on_checked(cycle, outcome).unwrap();

        sequencer.on_tick(cycle, 2);
        sequencer.on_tick(cycle, 4);
        let FeedbackState::Showing(feedback) = sequencer.state() else {
            panic!("expected feedback");
        };
        assert_eq!(feedback.remaining_secs, 2);
    }
}
