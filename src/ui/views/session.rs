use crate::session::{IndicatorFrame, SessionSnapshot};
use crate::ui::renderfns::phase_color;
use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Circle, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, Paragraph};

const TRACK_X: f64 = 50.0;
const TRACK_BOTTOM: f64 = 10.0;
const TRACK_TOP: f64 = 90.0;
const TRACK_COLOR: Color = Color::Rgb(217, 119, 6);

/// Running or paused session: timer panel plus the breathing indicator
pub fn draw_session(
  frame: &mut Frame,
  area: Rect,
  snapshot: &SessionSnapshot,
  indicator: IndicatorFrame,
) {
  let chunks = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
    .split(area);

  draw_indicator(frame, chunks[0], indicator);
  draw_timer_panel(frame, chunks[1], snapshot);
}

fn draw_indicator(frame: &mut Frame, area: Rect, indicator: IndicatorFrame) {
  let y = TRACK_BOTTOM + indicator.position * (TRACK_TOP - TRACK_BOTTOM);

  let canvas = Canvas::default()
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)))
    .marker(Marker::Braille)
    .x_bounds([0.0, 100.0])
    .y_bounds([0.0, 100.0])
    .paint(move |ctx| {
      ctx.draw(&CanvasLine {
        x1: TRACK_X,
        y1: TRACK_BOTTOM,
        x2: TRACK_X,
        y2: TRACK_TOP,
        color: TRACK_COLOR,
      });
      ctx.layer();

      // Concentric rings approximate a filled dot
      let mut radius = indicator.radius;
      while radius > 0.0 {
        ctx.draw(&Circle {
          x: TRACK_X,
          y,
          radius,
          color: Color::Red,
        });
        radius -= 0.5;
      }
    });

  frame.render_widget(canvas, area);
}

fn draw_timer_panel(frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let mut lines = vec![
    Line::from(""),
    Line::from(Span::styled("Total", Style::default().fg(Color::DarkGray))),
    Line::from(Span::styled(
      snapshot.elapsed_display(),
      Style::default().fg(Color::White).bold(),
    )),
    Line::from(""),
    Line::from(Span::styled(
      snapshot.phase.label(),
      Style::default().fg(phase_color(snapshot.phase)).bold(),
    )),
    Line::from(Span::styled(
      snapshot.countdown_display().to_string(),
      Style::default().fg(Color::White).bold(),
    )),
  ];

  if snapshot.time_limit_reached {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
      "Finishing breath",
      Style::default().fg(Color::DarkGray),
    )));
  }

  let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
  frame.render_widget(paragraph, inner);
}
