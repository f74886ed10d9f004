use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::feed::END_OF_POSTS;
use crate::paginator::PagerState;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Images");

    if app.layout.content_height() == 0 {
        let message = match app.pager_state() {
            PagerState::Loading => "Loading images...",
            _ if app.feed.ended() => END_OF_POSTS,
            _ => "No images yet",
        };
        let empty = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let height = area.height.saturating_sub(2) as usize;
    let selected = app.layout.entry_at(app.scroll_offset);

    let lines: Vec<Line> = app
        .layout
        .lines()
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(height)
        .map(|(row, text)| {
            let style = if text == END_OF_POSTS && row + 1 == app.layout.content_height() {
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::ITALIC)
            } else if selected.is_some() && app.layout.entry_at(row) == selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::styled(text.clone(), style)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
