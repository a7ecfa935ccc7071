mod quiz;
pub mod result;
mod status;

use ratatui::{prelude::*, widgets::Block};

use crate::session::{Phase, QuizController};

pub fn render(frame: &mut Frame, controller: &QuizController) {
    let area = frame.area();
    frame.render_widget(Block::default().bg(Color::Reset), area);

    match controller.phase() {
        Phase::Loading => status::render_loading(frame, area),
        Phase::Unavailable { reason } => status::render_unavailable(frame, area, reason),
        Phase::Answering => quiz::render(frame, area, controller),
        Phase::Posting => status::render_posting(frame, area),
        Phase::SubmitFailed => status::render_submit_failed(frame, area, controller),
        Phase::Results => match controller.result() {
            Some(outcome) => result::render(frame, area, outcome),
            None => status::render_posting(frame, area),
        },
    }
}

#[cfg(test)]
pub(crate) fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    let width = buffer.area.width as usize;
    buffer
        .content
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
