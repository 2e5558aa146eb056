use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

use crate::pipeline::BoxGeometry;

/// Background for each status colour index; `0` keeps the terminal default.
pub fn palette_color(colour: u8) -> Color {
    match colour {
        1 => Color::Blue,
        2 => Color::Yellow,
        3 => Color::Green,
        4 => Color::Red,
        5 => Color::Cyan,
        6 => Color::Magenta,
        _ => Color::Reset,
    }
}

fn palette_style(colour: u8) -> Style {
    match palette_color(colour) {
        Color::Reset => Style::default(),
        background => Style::default().bg(background).fg(Color::Black),
    }
}

/// One bordered status cell. Geometry and label are fixed when the dashboard
/// starts; only colour and text change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBox {
    geometry: BoxGeometry,
    label: String,
    colour: u8,
    text: String,
}

impl StatusBox {
    pub fn new(geometry: BoxGeometry, label: impl Into<String>) -> Self {
        Self {
            geometry,
            label: label.into(),
            colour: 0,
            text: String::new(),
        }
    }

    /// Records new content for the next frame, reporting whether anything changed.
    pub fn redraw(&mut self, colour: u8, text: &str) -> bool {
        if self.colour == colour && self.text == text {
            return false;
        }
        self.colour = colour;
        self.text = text.to_owned();
        true
    }

    pub fn geometry(&self) -> &BoxGeometry {
        &self.geometry
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn colour(&self) -> u8 {
        self.colour
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn area(&self) -> Rect {
        Rect::new(
            self.geometry.x,
            self.geometry.y,
            self.geometry.width,
            self.geometry.height,
        )
    }
}

impl Widget for &StatusBox {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let style = palette_style(self.colour);
        let inner_width = area.width.saturating_sub(2) as usize;
        let label = self.label.chars().take(inner_width).collect::<String>();
        let block = Block::default()
            .borders(Borders::ALL)
            .title_top(Line::from(Span::styled(
                label,
                Style::default().add_modifier(Modifier::BOLD),
            )))
            .style(style);
        Paragraph::new(Line::from(format!(" {}", self.text)))
            .block(block)
            .style(style)
            .render(area, buf);
    }
}
