use crate::session::SessionSnapshot;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, title and session settings
pub fn draw_header(frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
  let sound = if snapshot.sound_enabled {
    Span::styled(" Sound On ", Style::default().fg(Color::Green))
  } else {
    Span::styled(" Sound Off ", Style::default().fg(Color::DarkGray))
  };

  let header = Line::from(vec![
    Span::styled(" coherent ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(" Coherent Breathing ", Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    sound,
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", limit_label(snapshot.time_limit_minutes)),
      Style::default().fg(Color::Yellow).bold(),
    ),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

fn limit_label(minutes: Option<u32>) -> String {
  match minutes {
    Some(m) => format!("Limit: {} min", m),
    None => "No limit".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_limit_label() {
    assert_eq!(limit_label(None), "No limit");
    assert_eq!(limit_label(Some(10)), "Limit: 10 min");
  }
}
