use crate::app::{Mode, PRESETS};
use crate::session::SessionSnapshot;
use crate::ui::renderfns::centered;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Idle screen: settings and presets
pub fn draw_start(frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot, mode: Mode) {
  let block = Block::default()
    .title(" Coherent Breathing ")
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let area = centered(area, 48, 14);
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let label = Style::default().fg(Color::DarkGray);

  let sound = if snapshot.sound_enabled {
    Span::styled("On", Style::default().fg(Color::Green))
  } else {
    Span::styled("Off", Style::default().fg(Color::DarkGray))
  };

  let editing = mode == Mode::EditLimit;
  let (limit_text, limit_unit) = limit_field(&snapshot.time_limit_input, editing);
  let limit_style = if editing {
    Style::default().fg(Color::Black).bg(Color::Yellow)
  } else {
    Style::default().fg(Color::White)
  };

  let mut lines = vec![
    Line::from(""),
    Line::from(vec![
      Span::styled("  Sound:       ", label),
      sound,
      Span::styled("   <s>", Style::default().fg(Color::Cyan)),
    ]),
    Line::from(vec![
      Span::styled("  Time limit:  ", label),
      Span::styled(limit_text, limit_style),
      Span::styled(limit_unit, label),
      Span::styled("   <t>", Style::default().fg(Color::Cyan)),
    ]),
    Line::from(""),
    Line::from(Span::styled(
      "Press start to begin",
      Style::default().fg(Color::White).bold(),
    ))
    .alignment(Alignment::Center),
    Line::from(""),
    Line::from(Span::styled("  Quick start:", label)),
  ];

  for (key, minutes) in PRESETS {
    lines.push(Line::from(vec![
      Span::styled(format!("    <{}>", key), Style::default().fg(Color::Cyan)),
      Span::raw(format!(" {} min", minutes)),
    ]));
  }

  frame.render_widget(Paragraph::new(lines), inner);
}

/// Time-limit field text and its unit suffix
fn limit_field(input: &str, editing: bool) -> (String, &'static str) {
  if editing {
    (format!("{}_", input), " min")
  } else if input.is_empty() {
    ("none".to_string(), "")
  } else {
    (input.to_string(), " min")
  }
}
