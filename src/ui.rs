use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState};
use examr::session::QuestionState;
use examr::util::{format_hms, pluralize};

const PANEL_WIDTH: u16 = 34;
const HORIZONTAL_MARGIN: u16 = 2;
const GRID_COLUMNS: usize = 10;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Summary => render_summary(self, area, buf),
            _ => {
                render_taking(self, area, buf);
                if self.state == AppState::ConfirmEnd {
                    render_confirm(self, area, buf);
                }
            }
        }

        if let Some(message) = &self.warning {
            render_warning(message, area, buf);
        }
    }
}

fn render_taking(app: &App, area: Rect, buf: &mut Buffer) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(app, rows[0], buf);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(PANEL_WIDTH)])
        .split(rows[1]);

    render_question(app, body[0], buf);
    render_panel(app, body[1], buf);
    render_footer(app, rows[2], buf);
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let exam = &app.exam;
    let mut spans = vec![
        Span::styled(
            exam.contest().name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!(
                "Question {} of {} · {}",
                exam.state().current,
                exam.contest().total_questions,
                exam.current_subject()
            ),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ];
    if exam.persistence_degraded() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "progress is not being saved",
            Style::default().fg(Color::Yellow),
        ));
    }
    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::BOTTOM))
        .render(area, buf);
}

fn render_question(app: &App, area: Rect, buf: &mut Buffer) {
    let exam = &app.exam;
    let question = exam.current_question();
    let current = exam.state().current;
    let draft = exam.state().answers.get(&current).copied();
    let locked = exam.state().submitted.get(&current).copied();

    let inner = Rect {
        x: area.x + HORIZONTAL_MARGIN,
        y: area.y + 1,
        width: area.width.saturating_sub(HORIZONTAL_MARGIN * 2),
        height: area.height.saturating_sub(1),
    };

    let prompt_lines = if inner.width == 0 {
        1
    } else {
        (question.prompt.width() as u16 / inner.width) + 1
    };

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(prompt_lines + 1),
            Constraint::Length(question.choices.len() as u16 + 1),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(inner);

    Paragraph::new(question.prompt.clone())
        .wrap(Wrap { trim: true })
        .render(sections[0], buf);

    let mut choice_lines = Vec::new();
    for choice in &question.choices {
        let is_draft = draft == Some(choice.label);
        let is_locked_choice = locked == Some(choice.label);

        let style = if is_locked_choice {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else if locked.is_some() {
            Style::default().add_modifier(Modifier::DIM)
        } else if is_draft {
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let marker = if is_draft || is_locked_choice {
            "●"
        } else {
            "○"
        };
        let mut spans = vec![Span::styled(
            format!("{} {}. {}", marker, choice.label, choice.text),
            style,
        )];
        if is_locked_choice {
            spans.push(Span::styled(
                "  ✓ submitted",
                Style::default().fg(Color::Green),
            ));
        }
        choice_lines.push(Line::from(spans));
    }
    Paragraph::new(choice_lines).render(sections[1], buf);

    let status = if locked.is_some() {
        Span::styled("Answer locked in", Style::default().fg(Color::Green))
    } else if draft.is_some() {
        Span::styled(
            "Enter locks this answer in; it cannot be changed afterwards",
            Style::default().add_modifier(Modifier::ITALIC),
        )
    } else {
        Span::styled(
            "Pick an answer with a-d",
            Style::default().add_modifier(Modifier::DIM),
        )
    };
    Paragraph::new(Line::from(status)).render(sections[2], buf);
}

fn render_panel(app: &App, area: Rect, buf: &mut Buffer) {
    let exam = &app.exam;
    let block = Block::default().borders(Borders::LEFT);
    let inner = block.inner(area);
    block.render(area, buf);

    let remaining = exam.remaining_secs();
    let low = remaining < app.config.low_time_minutes * 60;
    let timer_style = if low {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let mut lines = vec![
        Line::from(Span::styled(
            "Time Remaining",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled(format_hms(remaining), timer_style))
            .alignment(Alignment::Center),
        Line::default(),
    ];

    let current_subject = exam.current_subject().to_string();
    for range in &exam.contest().subject_ranges {
        let counts = exam.state().subject_counts(range);
        lines.push(Line::from(Span::styled(
            range.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(vec![
            Span::styled(
                format!("  answered {}", counts.attempted),
                Style::default().fg(Color::Green),
            ),
            Span::styled(
                format!("  seen {}", counts.visited),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                format!("  left {}", counts.unvisited),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]));

        // Only the subject being worked on shows its full question grid
        if range.name == current_subject {
            for chunk in &(range.start..=range.end).chunks(GRID_COLUMNS) {
                let mut spans = vec![Span::raw("  ")];
                for q in chunk {
                    spans.push(Span::styled(
                        format!("{:>2} ", q),
                        grid_style(exam.question_state(q)),
                    ));
                }
                lines.push(Line::from(spans));
            }
        }
        lines.push(Line::default());
    }

    let overall = exam.overall_counts();
    lines.push(Line::from(Span::styled(
        "Overall",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        format!(
            "  answered {} · seen {} · left {}",
            overall.attempted, overall.visited, overall.unvisited
        ),
        Style::default().add_modifier(Modifier::DIM),
    )));

    Paragraph::new(lines).render(inner, buf);
}

fn grid_style(state: QuestionState) -> Style {
    match state {
        QuestionState::Answered => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        QuestionState::Current => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        QuestionState::Visited => Style::default().fg(Color::Yellow),
        QuestionState::Unvisited => Style::default().add_modifier(Modifier::DIM),
    }
}

fn render_footer(app: &App, area: Rect, buf: &mut Buffer) {
    let line = if let Some(buffer) = &app.jump_input {
        Line::from(Span::styled(
            format!("jump to question: {}_  (Enter to go, Esc to cancel)", buffer),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from(Span::styled(
            "←/→ navigate · a-d select · Enter submit · g jump · e end test · Esc save & quit",
            Style::default().add_modifier(Modifier::DIM),
        ))
    };
    Paragraph::new(line)
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_confirm(app: &App, area: Rect, buf: &mut Buffer) {
    let unanswered = app.exam.unanswered_count();
    let modal = centered_rect(50, 7, area);
    Clear.render(modal, buf);

    let text = vec![
        Line::default(),
        Line::from(format!(
            "End the test with {} unanswered?",
            pluralize(unanswered as u64, "question")
        ))
        .alignment(Alignment::Center),
        Line::default(),
        Line::from(Span::styled(
            "y end test · n keep going",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center),
    ];
    Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" End Test ")
                .border_style(Style::default().fg(Color::Red)),
        )
        .render(modal, buf);
}

fn render_warning(message: &str, area: Rect, buf: &mut Buffer) {
    let modal = centered_rect(44, 7, area);
    Clear.render(modal, buf);

    let text = vec![
        Line::default(),
        Line::from(Span::styled(
            message.to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::default(),
        Line::from(Span::styled(
            "press any key to continue",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center),
    ];
    Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Time Warning ")
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .render(modal, buf);
}

fn render_summary(app: &App, area: Rect, buf: &mut Buffer) {
    let mut lines = vec![Line::default(), Line::default()];

    if let Some(result) = &app.result {
        lines.push(
            Line::from(Span::styled(
                result.contest_name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
        );
        lines.push(Line::default());
        let how = if result.auto_submitted {
            "auto-submitted at expiry"
        } else {
            "submitted"
        };
        lines.push(
            Line::from(format!(
                "{} of {} answered · {} · time taken {}",
                result.attempted(),
                result.total_questions,
                how,
                format_hms(result.elapsed_secs)
            ))
            .alignment(Alignment::Center),
        );
        lines.push(Line::default());
    }

    if !app.past_attempts.is_empty() {
        lines.push(
            Line::from(Span::styled(
                "Past attempts",
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
        );
        for attempt in app.past_attempts.iter().take(5) {
            let ago = (chrono::Local::now() - attempt.taken_at)
                .num_seconds()
                .max(0) as u64;
            let when = HumanTime::from(std::time::Duration::from_secs(ago))
                .to_text_en(Accuracy::Rough, Tense::Past);
            lines.push(
                Line::from(Span::styled(
                    format!(
                        "{}/{} answered in {} · {}",
                        attempt.attempted,
                        attempt.total_questions,
                        format_hms(attempt.elapsed_secs),
                        when
                    ),
                    Style::default().add_modifier(Modifier::DIM),
                ))
                .alignment(Alignment::Center),
            );
        }
        lines.push(Line::default());
    }

    lines.push(
        Line::from(Span::styled(
            "q to quit",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center),
    );

    Paragraph::new(lines).render(area, buf);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
