mod feed_view;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::App;
use crate::feed::END_OF_POSTS;
use crate::paginator::PagerState;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    feed_view::render(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        "imagefeed - {} ({})",
        app.paginator.mode(),
        app.source_name()
    );
    let counts = format!(
        "{} shown, {} seen ",
        app.feed.len(),
        app.paginator.seen().len()
    );
    let pad = (area.width as usize).saturating_sub(title.chars().count() + counts.chars().count());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(pad)),
        Span::styled(counts, Style::default().fg(Color::Gray)),
    ]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(error) = &app.error {
        Line::from(vec![Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )])
    } else {
        match app.pager_state() {
            PagerState::Loading => Line::from(vec![Span::styled(
                "Loading...",
                Style::default().fg(Color::Yellow),
            )]),
            PagerState::Exhausted => Line::from(vec![
                Span::styled(END_OF_POSTS, Style::default().fg(Color::Magenta)),
                Span::styled(
                    " | j/k/g/G: scroll | o: open | y: copy url | q: quit",
                    Style::default().fg(Color::Gray),
                ),
            ]),
            PagerState::Idle => Line::from(vec![Span::styled(
                "j/k/g/G: scroll | Ctrl+d/u: page | o: open | y: copy url | q: quit",
                Style::default().fg(Color::Gray),
            )]),
        }
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}
