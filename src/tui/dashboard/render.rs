use ratatui::layout::Rect;
use ratatui::Frame;

mod header;
mod status_box;

pub use status_box::{palette_color, StatusBox};

use header::render_header;

use super::config::HEADER_HEIGHT;
use super::state::DashboardState;

pub(super) fn render_dashboard(frame: &mut Frame<'_>, state: &DashboardState) {
    let screen = frame.area();
    let header_height = HEADER_HEIGHT.min(state.first_row_top()).min(screen.height);
    if header_height == HEADER_HEIGHT {
        render_header(
            frame,
            Rect::new(screen.x, screen.y, screen.width, header_height),
            state.processes().len(),
            state.listen_address(),
            state.snapshots_applied(),
        );
    }

    for status_box in state.boxes() {
        // Boxes past the screen edge are clipped rather than re-laid out.
        let area = status_box.area().intersection(screen);
        if area.is_empty() {
            continue;
        }
        frame.render_widget(status_box, area);
    }
}
