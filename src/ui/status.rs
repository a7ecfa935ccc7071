//! Screens shown around the quiz itself: loading, failures and posting.

use ratatui::{layout::Flex, prelude::*, widgets::Paragraph};

use crate::session::{NoticeLevel, QuizController};

fn centered(frame: &mut Frame, area: Rect, lines: Vec<Line>) {
    let height = lines.len() as u16;
    let [middle] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), middle);
}

fn hint(text: &str) -> Line<'_> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

pub fn render_loading(frame: &mut Frame, area: Rect) {
    centered(
        frame,
        area,
        vec![
            Line::from(Span::styled("Loading quiz...", Style::default().fg(Color::Cyan))),
            Line::from(""),
            hint("q quit"),
        ],
    );
}

pub fn render_unavailable(frame: &mut Frame, area: Rect, reason: &str) {
    centered(
        frame,
        area,
        vec![
            Line::from(Span::styled(
                "This quiz is not available right now.",
                Style::default().fg(Color::Red).bold(),
            )),
            Line::from(Span::styled(reason, Style::default().fg(Color::Gray))),
            Line::from(""),
            hint("r try again  ·  q quit"),
        ],
    );
}

pub fn render_posting(frame: &mut Frame, area: Rect) {
    centered(
        frame,
        area,
        vec![Line::from(Span::styled(
            "Submitting your answers...",
            Style::default().fg(Color::Cyan),
        ))],
    );
}

pub fn render_submit_failed(frame: &mut Frame, area: Rect, controller: &QuizController) {
    let reason = controller
        .notice()
        .map(|notice| notice.text.as_str())
        .unwrap_or("Submission failed.");
    centered(
        frame,
        area,
        vec![
            Line::from(Span::styled(
                "Your answers could not be submitted.",
                Style::default().fg(Color::Red).bold(),
            )),
            Line::from(Span::styled(reason, Style::default().fg(Color::Gray))),
            Line::from(""),
            hint("enter retry  ·  q quit"),
        ],
    );
}

pub fn render_notice(frame: &mut Frame, area: Rect, controller: &QuizController) {
    let Some(notice) = controller.notice() else {
        return;
    };
    let color = match notice.level {
        NoticeLevel::Info => Color::Yellow,
        NoticeLevel::Error => Color::Red,
    };
    let widget = Paragraph::new(notice.text.as_str())
        .alignment(Alignment::Center)
        .fg(color);
    frame.render_widget(widget, area);
}
