//! Breathing session controller.
//!
//! The controller owns the session state and is the only place it changes.
//! Every operation returns the side effects the caller has to perform
//! (timers, audio cue, wake lock); the controller itself does no I/O.

use std::num::NonZeroU32;
use std::time::Instant;

use color_eyre::{eyre::eyre, Result};
use tracing::{debug, info};

use super::state::{Phase, SessionSnapshot, SessionState};
use crate::config::SessionConfig;

/// Side effects requested by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
  /// Start the tick source and the animation loop
  StartTimers,
  /// Cancel the tick source and the animation loop
  StopTimers,
  PlayCue,
  AcquireWakeLock,
  ReleaseWakeLock,
}

/// Phase length and tick cadence, both in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
  phase_ms: u64,
  tick_ms: u64,
}

impl Timing {
  pub fn new(phase_ms: u64, tick_ms: u64) -> Result<Self> {
    if tick_ms == 0 {
      return Err(eyre!("Tick interval must be greater than zero"));
    }
    if phase_ms < tick_ms {
      return Err(eyre!(
        "Phase duration ({}ms) must be at least one tick ({}ms)",
        phase_ms,
        tick_ms
      ));
    }
    Ok(Self { phase_ms, tick_ms })
  }

  pub fn from_config(config: &SessionConfig) -> Result<Self> {
    Self::new(config.phase_duration_ms(), config.tick_interval_ms)
  }

  pub fn phase_secs(&self) -> f64 {
    self.phase_ms as f64 / 1000.0
  }

  pub fn tick_ms(&self) -> u64 {
    self.tick_ms
  }
}

/// Owns a single breathing session
#[derive(Debug)]
pub struct SessionController {
  timing: Timing,
  state: SessionState,
  /// Time limit restored by `reset`
  default_time_limit: Option<u32>,
}

impl SessionController {
  pub fn new(timing: Timing, sound_enabled: bool, default_time_limit: Option<u32>) -> Self {
    let mut controller = Self {
      timing,
      state: SessionState::new(timing.phase_secs(), sound_enabled),
      default_time_limit,
    };
    controller.apply_default_limit();
    controller
  }

  pub fn from_config(config: &SessionConfig) -> Result<Self> {
    Ok(Self::new(
      Timing::from_config(config)?,
      config.sound,
      config.time_limit,
    ))
  }

  /// Start a new run, or pause if one is already running.
  pub fn start(&mut self) -> Vec<Effect> {
    if self.state.is_playing {
      return self.pause();
    }

    let s = &mut self.state;
    s.elapsed_total = 0;
    s.session_ticks = 0;
    s.time_limit_reached = false;
    s.session_complete = false;
    s.phase = Phase::Inhale;
    s.countdown = self.timing.phase_secs();
    s.phase_elapsed_ms = 0;
    s.pulse_started_at = None;
    s.is_playing = true;

    info!(
      limit_minutes = ?s.time_limit_minutes,
      sound = s.sound_enabled,
      "Session started"
    );

    let mut effects = vec![Effect::StartTimers];
    if s.sound_enabled {
      effects.push(Effect::PlayCue);
    }
    effects.push(Effect::AcquireWakeLock);
    effects
  }

  fn pause(&mut self) -> Vec<Effect> {
    self.state.is_playing = false;
    info!(elapsed = self.state.elapsed_total, "Session paused");
    vec![Effect::StopTimers, Effect::ReleaseWakeLock]
  }

  /// Stop everything and restore the initial state. The sound preference is kept.
  pub fn reset(&mut self) -> Vec<Effect> {
    self.state = SessionState::new(self.timing.phase_secs(), self.state.sound_enabled);
    self.apply_default_limit();
    debug!("Session reset");
    vec![Effect::StopTimers, Effect::ReleaseWakeLock]
  }

  pub fn set_sound_enabled(&mut self, enabled: bool) {
    self.state.sound_enabled = enabled;
  }

  pub fn toggle_sound(&mut self) {
    self.set_sound_enabled(!self.state.sound_enabled);
  }

  /// Set the time limit from user input. Anything but ASCII digits is
  /// dropped; an empty or zero value clears the limit.
  pub fn set_time_limit(&mut self, input: &str) {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    self.state.time_limit_minutes = digits.parse::<u32>().ok().and_then(NonZeroU32::new);
    self.state.time_limit_input = digits;
  }

  /// Set the time limit and start immediately.
  pub fn start_with_preset(&mut self, minutes: u32) -> Vec<Effect> {
    self.set_time_limit(&minutes.to_string());
    self.start()
  }

  /// Advance the session by one tick. Does nothing unless playing.
  pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
    if !self.state.is_playing {
      return Vec::new();
    }

    let timing = self.timing;
    let s = &mut self.state;

    s.session_ticks += 1;
    s.elapsed_total = s.session_ticks * timing.tick_ms / 1000;

    s.phase_elapsed_ms = (s.phase_elapsed_ms + timing.tick_ms).min(timing.phase_ms);
    let remaining_ms = timing.phase_ms - s.phase_elapsed_ms;
    s.countdown = (remaining_ms.div_ceil(1000) as f64).min(timing.phase_secs());

    if let Some(limit) = s.time_limit_minutes {
      if !s.time_limit_reached && s.elapsed_total >= u64::from(limit.get()) * 60 {
        s.time_limit_reached = true;
        info!(elapsed = s.elapsed_total, "Time limit reached");
      }
    }

    if remaining_ms > 0 {
      return Vec::new();
    }

    // Sessions only ever end after an exhale
    if s.phase == Phase::Exhale && s.time_limit_reached {
      s.session_complete = true;
      s.is_playing = false;
      info!(elapsed = s.elapsed_total, "Session complete");
      return vec![Effect::StopTimers, Effect::ReleaseWakeLock];
    }

    s.phase = s.phase.next();
    s.countdown = timing.phase_secs();
    s.phase_elapsed_ms = 0;
    s.pulse_started_at = Some(now);
    debug!(phase = s.phase.label(), elapsed = s.elapsed_total, "Phase changed");

    if s.sound_enabled {
      vec![Effect::PlayCue]
    } else {
      Vec::new()
    }
  }

  pub fn is_playing(&self) -> bool {
    self.state.is_playing
  }

  pub fn timing(&self) -> Timing {
    self.timing
  }

  pub fn snapshot(&self) -> SessionSnapshot {
    let s = &self.state;
    let remaining_ms = self.timing.phase_ms - s.phase_elapsed_ms;
    let pending_secs = if s.phase_elapsed_ms == 0 {
      0.0
    } else {
      (s.countdown - remaining_ms as f64 / 1000.0).max(0.0)
    };

    SessionSnapshot {
      is_playing: s.is_playing,
      phase: s.phase,
      countdown: s.countdown,
      pending_secs,
      phase_duration_secs: self.timing.phase_secs(),
      elapsed_total: s.elapsed_total,
      sound_enabled: s.sound_enabled,
      time_limit_input: s.time_limit_input.clone(),
      time_limit_minutes: s.time_limit_minutes.map(NonZeroU32::get),
      time_limit_reached: s.time_limit_reached,
      session_complete: s.session_complete,
      pulse_started_at: s.pulse_started_at,
    }
  }

  fn apply_default_limit(&mut self) {
    if let Some(minutes) = self.default_time_limit {
      self.set_time_limit(&minutes.to_string());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn controller() -> SessionController {
    SessionController::new(Timing::new(5500, 500).unwrap(), false, None)
  }

  fn run_ticks(controller: &mut SessionController, n: usize) -> Vec<Effect> {
    let now = Instant::now();
    let mut effects = Vec::new();
    for _ in 0..n {
      effects.extend(controller.tick(now));
    }
    effects
  }

  #[test]
  fn test_timing_rejects_zero_tick() {
    assert!(Timing::new(5500, 0).is_err());
  }

  #[test]
  fn test_timing_rejects_phase_shorter_than_tick() {
    assert!(Timing::new(400, 500).is_err());
  }

  #[test]
  fn test_start_sets_defaults_and_requests_effects() {
    let mut c = controller();
    let effects = c.start();
    assert_eq!(effects, vec![Effect::StartTimers, Effect::AcquireWakeLock]);

    let snap = c.snapshot();
    assert!(snap.is_playing);
    assert_eq!(snap.phase, Phase::Inhale);
    assert_eq!(snap.countdown, 5.5);
    assert_eq!(snap.elapsed_total, 0);
  }

  #[test]
  fn test_start_plays_cue_when_sound_enabled() {
    let mut c = controller();
    c.set_sound_enabled(true);
    assert_eq!(
      c.start(),
      vec![
        Effect::StartTimers,
        Effect::PlayCue,
        Effect::AcquireWakeLock
      ]
    );
  }

  #[test]
  fn test_start_while_playing_pauses() {
    let mut c = controller();
    c.start();
    run_ticks(&mut c, 3);
    let effects = c.start();
    assert_eq!(effects, vec![Effect::StopTimers, Effect::ReleaseWakeLock]);
    assert!(!c.is_playing());
    assert_eq!(c.snapshot().elapsed_total, 1);
  }

  #[test]
  fn test_first_tick_consumes_fraction_then_flips_at_tick_eleven() {
    let mut c = controller();
    c.start();

    run_ticks(&mut c, 1);
    assert_eq!(c.snapshot().countdown, 5.0);
    assert_eq!(c.snapshot().countdown_display(), 5);

    run_ticks(&mut c, 9);
    let snap = c.snapshot();
    assert_eq!(snap.phase, Phase::Inhale);
    assert_eq!(snap.countdown, 1.0);

    run_ticks(&mut c, 1);
    let snap = c.snapshot();
    assert_eq!(snap.phase, Phase::Exhale);
    assert_eq!(snap.countdown, 5.5);
    assert!(snap.pulse_started_at.is_some());
  }

  #[test]
  fn test_pending_half_tick_tracks_phase_time() {
    let mut c = controller();
    c.start();
    assert_eq!(c.snapshot().pending_secs, 0.0);

    run_ticks(&mut c, 1);
    assert_eq!(c.snapshot().pending_secs, 0.0);

    run_ticks(&mut c, 1);
    let snap = c.snapshot();
    assert_eq!(snap.countdown, 5.0);
    assert_eq!(snap.pending_secs, 0.5);

    run_ticks(&mut c, 1);
    let snap = c.snapshot();
    assert_eq!(snap.countdown, 4.0);
    assert_eq!(snap.pending_secs, 0.0);
  }

  #[test]
  fn test_countdown_stays_in_bounds_and_phase_alternates() {
    let mut c = controller();
    c.start();
    let mut last_phase = Phase::Inhale;
    let mut flips = 0;

    for _ in 0..500 {
      run_ticks(&mut c, 1);
      let snap = c.snapshot();
      assert!(snap.countdown >= 0.0 && snap.countdown <= 5.5);
      if snap.phase != last_phase {
        assert_eq!(snap.phase, last_phase.next());
        last_phase = snap.phase;
        flips += 1;
      }
    }

    // 11 ticks per phase
    assert_eq!(flips, 500 / 11);
  }

  #[test]
  fn test_elapsed_total_counts_two_ticks_per_second() {
    let mut c = controller();
    c.start();
    for i in 1..=40u64 {
      run_ticks(&mut c, 1);
      assert_eq!(c.snapshot().elapsed_total, i / 2);
    }
  }

  #[test]
  fn test_no_ticks_processed_while_paused() {
    let mut c = controller();
    c.start();
    run_ticks(&mut c, 4);
    c.start();
    let before = c.snapshot();
    assert!(run_ticks(&mut c, 10).is_empty());
    assert_eq!(c.snapshot(), before);
  }

  #[test]
  fn test_set_time_limit_strips_non_digits() {
    let mut c = controller();
    c.set_time_limit("12abc");
    let snap = c.snapshot();
    assert_eq!(snap.time_limit_minutes, Some(12));
    assert_eq!(snap.time_limit_input, "12");
  }

  #[test]
  fn test_set_time_limit_empty_or_zero_clears() {
    let mut c = controller();
    c.set_time_limit("abc");
    assert_eq!(c.snapshot().time_limit_minutes, None);
    c.set_time_limit("0");
    assert_eq!(c.snapshot().time_limit_minutes, None);
  }

  #[test]
  fn test_no_limit_never_completes() {
    let mut c = controller();
    c.start();
    // 20 phase completions
    run_ticks(&mut c, 20 * 11);
    let snap = c.snapshot();
    assert!(!snap.session_complete);
    assert!(snap.is_playing);
  }

  #[test]
  fn test_limit_completes_only_after_exhale() {
    let mut c = controller();
    c.set_time_limit("1");
    c.start();

    let now = Instant::now();
    let mut reached_at = None;
    let mut ticks = 0;

    while c.is_playing() {
      let phase_before = c.snapshot().phase;
      c.tick(now);
      ticks += 1;
      let snap = c.snapshot();

      if reached_at.is_none() && snap.time_limit_reached {
        assert_eq!(snap.elapsed_total, 60);
        assert!(!snap.session_complete);
        reached_at = Some(ticks);
      }
      if snap.session_complete {
        assert_eq!(phase_before, Phase::Exhale);
        assert_eq!(snap.phase, Phase::Exhale);
        assert_eq!(snap.countdown, 0.0);
      }
      assert!(ticks < 1000);
    }

    // Limit hits at tick 120, mid-Inhale (phase 11 spans ticks 111..=121).
    // The session runs through that inhale and the following exhale.
    assert_eq!(reached_at, Some(120));
    assert_eq!(ticks, 132);
    assert!(c.snapshot().session_complete);
  }

  #[test]
  fn test_completion_requests_cleanup() {
    let mut c = controller();
    c.set_time_limit("1");
    c.start();
    let effects = run_ticks(&mut c, 132);
    assert_eq!(
      &effects[effects.len() - 2..],
      &[Effect::StopTimers, Effect::ReleaseWakeLock]
    );
  }

  #[test]
  fn test_phase_change_plays_cue_only_with_sound() {
    let mut c = controller();
    c.start();
    assert!(run_ticks(&mut c, 11).is_empty());

    c.toggle_sound();
    assert_eq!(run_ticks(&mut c, 11), vec![Effect::PlayCue]);
  }

  #[test]
  fn test_restart_after_completion_resets_counters() {
    let mut c = controller();
    c.start_with_preset(1);
    run_ticks(&mut c, 132);
    assert!(c.snapshot().session_complete);

    c.start();
    let snap = c.snapshot();
    assert!(snap.is_playing);
    assert!(!snap.session_complete);
    assert!(!snap.time_limit_reached);
    assert_eq!(snap.elapsed_total, 0);
    assert_eq!(snap.time_limit_minutes, Some(1));
  }

  #[test]
  fn test_reset_restores_defaults_but_keeps_sound() {
    let mut c = SessionController::new(Timing::new(5500, 500).unwrap(), false, Some(5));
    c.set_sound_enabled(true);
    c.set_time_limit("12");
    c.start();
    run_ticks(&mut c, 15);

    let effects = c.reset();
    assert_eq!(effects, vec![Effect::StopTimers, Effect::ReleaseWakeLock]);

    let snap = c.snapshot();
    assert!(!snap.is_playing);
    assert_eq!(snap.phase, Phase::Inhale);
    assert_eq!(snap.countdown, 5.5);
    assert_eq!(snap.elapsed_total, 0);
    assert_eq!(snap.time_limit_minutes, Some(5));
    assert!(snap.sound_enabled);
    assert!(snap.pulse_started_at.is_none());
  }

  #[test]
  fn test_start_with_preset_sets_limit_and_starts() {
    let mut c = controller();
    let effects = c.start_with_preset(10);
    assert!(effects.contains(&Effect::StartTimers));
    assert_eq!(c.snapshot().time_limit_minutes, Some(10));
    assert!(c.is_playing());
  }

  #[test]
  fn test_whole_second_phase_duration() {
    let mut c = SessionController::new(Timing::new(4000, 500).unwrap(), false, None);
    c.start();
    run_ticks(&mut c, 1);
    let snap = c.snapshot();
    assert_eq!(snap.countdown, 4.0);
    assert_eq!(snap.pending_secs, 0.5);

    run_ticks(&mut c, 7);
    assert_eq!(c.snapshot().phase, Phase::Exhale);
    assert_eq!(c.snapshot().countdown, 4.0);
  }
}
