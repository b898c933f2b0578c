use ratatui::prelude::Color;

use crate::session::Phase;

/// Color of the phase label
pub fn phase_color(phase: Phase) -> Color {
  match phase {
    Phase::Inhale => Color::Cyan,
    Phase::Exhale => Color::Yellow,
  }
}

/// Center a `width` x `height` box inside `area`, shrinking to fit.
pub fn centered(area: ratatui::layout::Rect, width: u16, height: u16) -> ratatui::layout::Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  ratatui::layout::Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  }
}
