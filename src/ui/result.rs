//! The results view.
//!
//! Rendering depends on nothing but the [`SessionResult`] it is given.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::models::{Rewards, SessionResult};

pub fn render(frame: &mut Frame, area: Rect, result: &SessionResult) {
    let grade_color = grade_color(result.score_percent);

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(7),
        Constraint::Fill(1),
        Constraint::Length(2),
    ])
    .margin(1)
    .split(area);

    render_score_summary(frame, chunks[1], result, grade_color);
    if let Some(rewards) = &result.rewards {
        render_rewards(frame, chunks[2], rewards);
    }
    render_controls(frame, chunks[3]);
}

fn grade_color(percent: f64) -> Color {
    if percent >= 90.0 {
        Color::Green
    } else if percent >= 70.0 {
        Color::Cyan
    } else if percent >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn render_score_summary(frame: &mut Frame, area: Rect, result: &SessionResult, color: Color) {
    let banner = if result.is_perfect {
        Line::from(Span::styled(
            "PERFECT SCORE!",
            Style::default().fg(Color::Green).bold(),
        ))
    } else {
        Line::from("")
    };

    let content = vec![
        Line::from(Span::styled("RESULTS", Style::default().fg(Color::Cyan).bold())),
        banner,
        Line::from(""),
        Line::from(Span::styled(
            format!("{:.0}%", result.score_percent),
            Style::default().fg(color).bold(),
        )),
        Line::from(Span::styled(
            format!("{} of {} correct", result.correct_count, result.total_questions),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
    ];

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn render_rewards(frame: &mut Frame, area: Rect, rewards: &Rewards) {
    let lines = vec![
        Line::from(Span::styled("Rewards", Style::default().fg(Color::Cyan).bold())),
        Line::from(vec![
            Span::styled(format!("+{} XP", rewards.xp_earned), Style::default().fg(Color::Yellow)),
            Span::raw("   "),
            Span::styled(format!("+{} EP", rewards.ep_earned), Style::default().fg(Color::Magenta)),
        ]),
    ];

    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().padding(Padding::vertical(1)));
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("q quit")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
