//! Session state and the read-only snapshot handed to the renderer.

use std::num::NonZeroU32;
use std::time::Instant;

/// Breathing phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Inhale,
  Exhale,
}

impl Phase {
  /// The phase that follows this one
  pub fn next(self) -> Self {
    match self {
      Phase::Inhale => Phase::Exhale,
      Phase::Exhale => Phase::Inhale,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Phase::Inhale => "Inhale",
      Phase::Exhale => "Exhale",
    }
  }
}

/// Mutable session state. Only the controller touches these fields.
#[derive(Debug, Clone)]
pub(super) struct SessionState {
  pub is_playing: bool,
  pub phase: Phase,
  /// Seconds remaining in the current phase, as displayed
  pub countdown: f64,
  /// Whole seconds since the session started
  pub elapsed_total: u64,
  pub sound_enabled: bool,
  /// Digits typed into the time-limit field
  pub time_limit_input: String,
  pub time_limit_minutes: Option<NonZeroU32>,
  pub time_limit_reached: bool,
  pub session_complete: bool,
  pub pulse_started_at: Option<Instant>,
  /// Ticks processed since the session started
  pub session_ticks: u64,
  /// Milliseconds of the current phase covered by processed ticks
  pub phase_elapsed_ms: u64,
}

impl SessionState {
  pub fn new(phase_duration_secs: f64, sound_enabled: bool) -> Self {
    Self {
      is_playing: false,
      phase: Phase::Inhale,
      countdown: phase_duration_secs,
      elapsed_total: 0,
      sound_enabled,
      time_limit_input: String::new(),
      time_limit_minutes: None,
      time_limit_reached: false,
      session_complete: false,
      pulse_started_at: None,
      session_ticks: 0,
      phase_elapsed_ms: 0,
    }
  }
}

/// Point-in-time copy of the session, used for rendering and animation.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
  pub is_playing: bool,
  pub phase: Phase,
  pub countdown: f64,
  /// Phase time already consumed but not yet reflected in `countdown`
  pub pending_secs: f64,
  pub phase_duration_secs: f64,
  pub elapsed_total: u64,
  pub sound_enabled: bool,
  pub time_limit_input: String,
  pub time_limit_minutes: Option<u32>,
  pub time_limit_reached: bool,
  pub session_complete: bool,
  pub pulse_started_at: Option<Instant>,
}

impl SessionSnapshot {
  /// Countdown as shown to the user: the fractional start value is floored.
  pub fn countdown_display(&self) -> u64 {
    self.countdown.floor() as u64
  }

  /// Total elapsed time as `MM:SS`
  pub fn elapsed_display(&self) -> String {
    format_time(self.elapsed_total)
  }

  /// Neither running nor showing the completion banner
  pub fn is_idle(&self) -> bool {
    !self.is_playing && !self.session_complete
  }
}

/// Format whole seconds as `MM:SS`. Minutes are not wrapped at an hour.
pub fn format_time(secs: u64) -> String {
  format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_phase_alternates() {
    assert_eq!(Phase::Inhale.next(), Phase::Exhale);
    assert_eq!(Phase::Exhale.next(), Phase::Inhale);
  }

  #[test]
  fn test_format_time() {
    assert_eq!(format_time(0), "00:00");
    assert_eq!(format_time(59), "00:59");
    assert_eq!(format_time(61), "01:01");
    assert_eq!(format_time(600), "10:00");
    assert_eq!(format_time(6000), "100:00");
  }
}
