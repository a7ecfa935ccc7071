//! Feedback sounds.
//!
//! Playback is best effort: a cue that fails to play is logged and dropped,
//! it never holds up the feedback countdown.

use std::io::{self, Write};

use tracing::debug;

/// Which sound to play after an answer was checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Correct,
    Incorrect,
}

impl Cue {
    pub fn for_answer(is_correct: bool) -> Self {
        if is_correct { Cue::Correct } else { Cue::Incorrect }
    }
}

pub trait AudioCue: Send + Sync {
    fn play(&self, cue: Cue) -> io::Result<()>;
}

/// Rings the terminal bell: once for a correct answer, twice otherwise.
pub struct TerminalBell;

impl AudioCue for TerminalBell {
    fn play(&self, cue: Cue) -> io::Result<()> {
        let bells: &[u8] = match cue {
            Cue::Correct => b"\x07",
            Cue::Incorrect => b"\x07\x07",
        };
        let mut stdout = io::stdout();
        stdout.write_all(bells)?;
        stdout.flush()
    }
}

pub struct Silent;

impl AudioCue for Silent {
    fn play(&self, _cue: Cue) -> io::Result<()> {
        Ok(())
    }
}

pub(crate) fn play_best_effort(audio: &dyn AudioCue, cue: Cue) {
    if let Err(e) = audio.play(cue) {
        debug!(target: "attraction_quiz", ?cue, error = %e, "feedback sound failed");
    }
}
