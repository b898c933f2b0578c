mod renderfns;
mod views;

use crate::app::App;
use ratatui::prelude::*;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Key hints
    ])
    .split(frame.area());

  let snapshot = app.snapshot();

  renderfns::draw_header(frame, chunks[0], &snapshot);

  if snapshot.session_complete {
    views::draw_complete(frame, chunks[1], &snapshot);
  } else if snapshot.is_idle() {
    views::draw_start(frame, chunks[1], &snapshot, app.mode());
  } else {
    let indicator = app.indicator(&snapshot);
    views::draw_session(frame, chunks[1], &snapshot, indicator);
  }

  renderfns::draw_footer(frame, chunks[2], &snapshot, app.mode());
}
