use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::border;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub(super) fn render_header(
    frame: &mut Frame<'_>,
    area: Rect,
    process_count: usize,
    listen_address: &str,
    snapshots_applied: usize,
) {
    let muted = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::Gray);
    let line = Line::from(vec![
        Span::styled(format!("{process_count}"), value),
        Span::styled(" processes", muted),
        Span::styled("  ·  listening on ", muted),
        Span::styled(listen_address.to_owned(), value),
        Span::styled("  ·  updates ", muted),
        Span::styled(format!("{snapshots_applied}"), value),
        Span::styled("  ·  ctrl-c quit", muted),
    ]);
    frame.render_widget(Paragraph::new(line).block(header_block()), area);
}

fn header_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(Color::DarkGray))
        .title_top(
            Line::from(Span::styled(
                " PROCESSVIEW ",
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ))
            .left_aligned(),
        )
        .title_bottom(
            Line::from(Span::styled(
                format!(" v{} ", env!("CARGO_PKG_VERSION")),
                Style::default().fg(Color::DarkGray),
            ))
            .right_aligned(),
        )
}
