use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};

use crate::models::{OptionId, Question};
use crate::session::{FeedbackState, OptionMark, QuizController};

pub fn render(frame: &mut Frame, area: Rect, controller: &QuizController) {
    let Some(question) = controller.current_question() else {
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .margin(2)
    .split(area);

    render_progress(frame, chunks[0], controller);
    render_question_text(frame, chunks[1], &question.text);
    render_options(frame, chunks[2], question, controller);
    render_feedback_line(frame, chunks[3], controller.feedback());
    super::status::render_notice(frame, chunks[4], controller);
    render_controls(frame, chunks[5], controller.is_locked());
}

fn render_progress(frame: &mut Frame, area: Rect, controller: &QuizController) {
    let Some((number, total)) = controller.progress() else {
        return;
    };
    let widget = Paragraph::new(format!("{number}/{total}"))
        .alignment(Alignment::Right)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}

fn render_question_text(frame: &mut Frame, area: Rect, text: &str) {
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .fg(Color::White)
        .bold();
    frame.render_widget(widget, area);
}

fn option_style(mark: Option<OptionMark>, is_selected: bool, under_cursor: bool) -> Style {
    match mark {
        Some(OptionMark::Correct) | Some(OptionMark::Revealed) => {
            Style::default().fg(Color::Green).bold()
        }
        Some(OptionMark::Incorrect) => Style::default().fg(Color::Red).bold(),
        None if is_selected => Style::default().fg(Color::Cyan).bold(),
        None if under_cursor => Style::default().fg(Color::White),
        None => Style::default().fg(Color::Gray),
    }
}

fn marker(mark: Option<OptionMark>, is_selected: bool, under_cursor: bool) -> &'static str {
    match mark {
        Some(OptionMark::Correct) | Some(OptionMark::Revealed) => "✓",
        Some(OptionMark::Incorrect) => "✗",
        None if is_selected => "●",
        None if under_cursor => ">",
        None => " ",
    }
}

fn render_options(frame: &mut Frame, area: Rect, question: &Question, controller: &QuizController) {
    let selected: Option<OptionId> = controller
        .quiz()
        .and_then(|quiz| quiz.selected_for(question.id));
    let feedback = match controller.feedback() {
        FeedbackState::Showing(feedback) => Some(*feedback),
        _ => None,
    };
    let locked = controller.is_locked();

    let mut lines: Vec<Line> = Vec::with_capacity(question.options.len() * 2);
    for (position, option) in question.options.iter().enumerate() {
        let mark = feedback.and_then(|feedback| feedback.mark(option.id));
        let is_selected = selected == Some(option.id);
        let under_cursor = !locked && position == controller.cursor();
        let style = option_style(mark, is_selected, under_cursor);

        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", marker(mark, is_selected, under_cursor)), style),
            Span::styled(format!("{}. ", position + 1), style),
            Span::styled(option.text.as_str(), style),
        ]));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_feedback_line(frame: &mut Frame, area: Rect, state: &FeedbackState) {
    let line = match state {
        FeedbackState::Idle => return,
        FeedbackState::Checking { .. } => {
            Line::from(Span::styled("Checking your answer...", Style::default().fg(Color::DarkGray)))
        }
        FeedbackState::Showing(feedback) => {
            let (verdict, color) = if feedback.is_correct {
                ("Correct!", Color::Green)
            } else {
                ("Not quite.", Color::Red)
            };
            Line::from(vec![
                Span::styled(verdict, Style::default().fg(color).bold()),
                Span::styled(
                    format!("  Moving on in {}s", feedback.remaining_secs),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
    };
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn render_controls(frame: &mut Frame, area: Rect, locked: bool) {
    let text = if locked {
        "q quit"
    } else {
        "j/k move  ·  1-9/space select  ·  enter confirm  ·  s submit  ·  q quit"
    };
    let widget = Paragraph::new(text)
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}

