//! Terminal event loop driving a [`QuizController`].

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use tracing::debug;

use crate::session::{EventReceiver, Phase, QuizController};
use crate::terminal::QuizTerminal;
use crate::ui;

/// Longest wait for session events before checking the keyboard again.
const INPUT_POLL: Duration = Duration::from_millis(50);

pub struct App {
    controller: QuizController,
    events: EventReceiver,
    exit_on_complete: bool,
    quit: bool,
}

impl App {
    pub fn new(controller: QuizController, events: EventReceiver, exit_on_complete: bool) -> Self {
        Self {
            controller,
            events,
            exit_on_complete,
            quit: false,
        }
    }

    pub fn controller(&self) -> &QuizController {
        &self.controller
    }

    pub fn should_exit(&self) -> bool {
        self.quit || (self.exit_on_complete && self.controller.is_completed())
    }

    /// Run until the player quits (or the task completes, when configured).
    pub async fn run(mut self, terminal: &mut QuizTerminal) -> std::io::Result<QuizController> {
        self.controller.start();

        while !self.should_exit() {
            terminal.draw(|frame| ui::render(frame, &self.controller))?;

            tokio::select! {
                Some(event) = self.events.recv() => self.controller.handle_event(event),
                _ = tokio::time::sleep(INPUT_POLL) => {}
            }
            self.drain_events();

            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }

        self.controller.close();
        Ok(self.controller)
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.controller.handle_event(event);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc) {
            self.quit = true;
            return;
        }

        let controller = &mut self.controller;
        match controller.phase() {
            Phase::Answering => match key.code {
                KeyCode::Up | KeyCode::Char('k') => controller.cursor_up(),
                KeyCode::Down | KeyCode::Char('j') => controller.cursor_down(),
                KeyCode::Char(' ') => {
                    controller.select_cursor();
                }
                KeyCode::Char(digit @ '1'..='9') => {
                    let position = digit as usize - '1' as usize;
                    controller.select_position(position);
                }
                KeyCode::Enter => controller.confirm(),
                KeyCode::Char('s') | KeyCode::Char('S') => {
                    if let Err(e) = controller.request_submit() {
                        debug!(target: "attraction_quiz", missing = e.missing, "submit key ignored");
                    }
                }
                _ => {}
            },
            Phase::Unavailable { .. } => {
                if matches!(key.code, KeyCode::Char('r') | KeyCode::Char('R')) {
                    controller.restart();
                }
            }
            Phase::SubmitFailed => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char('R')) {
                    controller.retry_submission();
                }
            }
            Phase::Loading | Phase::Posting | Phase::Results => {}
        }
    }
}
