//! Indicator projection: where the dot sits on its track and how large it is.
//!
//! Pure functions of a snapshot and the current instant. Nothing here writes
//! back into the session.

use std::f64::consts::PI;
use std::time::{Duration, Instant};

use super::state::{Phase, SessionSnapshot};

/// Dot radius outside of a pulse, in canvas units
pub const BASE_RADIUS: f64 = 3.0;
/// Extra radius at the peak of a pulse
pub const PULSE_AMPLITUDE: f64 = 2.0;
/// How long a pulse lasts after a phase change
pub const PULSE_WINDOW: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorFrame {
  /// Fraction of the current phase already elapsed, 0..=1
  pub progress: f64,
  /// Position along the track, 0 = bottom, 1 = top
  pub position: f64,
  pub radius: f64,
}

/// Fraction of the current phase that has elapsed.
pub fn phase_progress(snapshot: &SessionSnapshot) -> f64 {
  let duration = snapshot.phase_duration_secs;
  if duration <= 0.0 {
    return 0.0;
  }
  let elapsed = duration - snapshot.countdown + snapshot.pending_secs;
  (elapsed / duration).clamp(0.0, 1.0)
}

/// Dot radius at `now`, following a half-sine envelope after a pulse start.
pub fn pulse_radius(pulse_started_at: Option<Instant>, now: Instant) -> f64 {
  let Some(started) = pulse_started_at else {
    return BASE_RADIUS;
  };

  let elapsed = now.saturating_duration_since(started);
  if elapsed >= PULSE_WINDOW {
    return BASE_RADIUS;
  }

  let t = elapsed.as_secs_f64() / PULSE_WINDOW.as_secs_f64();
  BASE_RADIUS + PULSE_AMPLITUDE * (PI * t).sin()
}

pub fn indicator_frame(snapshot: &SessionSnapshot, now: Instant) -> IndicatorFrame {
  let progress = phase_progress(snapshot);
  let position = match snapshot.phase {
    Phase::Inhale => progress,
    Phase::Exhale => 1.0 - progress,
  };

  IndicatorFrame {
    progress,
    position,
    radius: pulse_radius(snapshot.pulse_started_at, now),
  }
}
