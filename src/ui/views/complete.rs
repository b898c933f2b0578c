use crate::session::SessionSnapshot;
use crate::ui::renderfns::centered;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Completion banner shown once the time limit ended the session
pub fn draw_complete(frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
  let area = centered(area, 36, 8);
  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Green));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let lines = vec![
    Line::from(""),
    Line::from(Span::styled(
      "Complete!",
      Style::default().fg(Color::Green).bold(),
    )),
    Line::from(vec![
      Span::styled("Total ", Style::default().fg(Color::DarkGray)),
      Span::raw(snapshot.elapsed_display()),
    ]),
    Line::from(""),
    Line::from(vec![
      Span::styled("<r>", Style::default().fg(Color::Cyan)),
      Span::raw(" Back to Start"),
    ]),
  ];

  frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}
