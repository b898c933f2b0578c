use crate::app::Mode;
use crate::session::SessionSnapshot;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar with the keys that apply right now
pub fn draw_footer(frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot, mode: Mode) {
  let mut spans = vec![Span::raw(" ")];

  for (i, (key, label)) in shortcuts(snapshot, mode).iter().enumerate() {
    if i > 0 {
      spans.push(Span::raw("   "));
    }
    spans.push(Span::styled(
      format!("<{}>", key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

fn shortcuts(snapshot: &SessionSnapshot, mode: Mode) -> Vec<(&'static str, &'static str)> {
  if mode == Mode::EditLimit {
    return vec![("0-9", "minutes"), ("⌫", "delete"), ("Enter", "done")];
  }

  if snapshot.session_complete {
    vec![("r", "back to start"), ("q", "quit")]
  } else if snapshot.is_playing {
    vec![("Space", "pause"), ("r", "reset"), ("q", "quit")]
  } else {
    vec![
      ("Space", "start"),
      ("s", "sound"),
      ("t", "time limit"),
      ("q", "quit"),
    ]
  }
}
