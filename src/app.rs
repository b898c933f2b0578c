use crate::config::Config;
use crate::event::{Event, EventHandler, SessionTimers};
use crate::platform::{CuePlayer, WakeLock};
use crate::session::{animation, Effect, IndicatorFrame, SessionController, SessionSnapshot};
use crate::ui;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::{Duration, Instant};
use tracing::debug;

/// Presets offered on the start screen: (key, minutes)
pub const PRESETS: [(char, u32); 3] = [('2', 2), ('5', 5), ('0', 10)];

/// Input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Normal,
  /// Typing into the time-limit field
  EditLimit,
}

/// Main application state
pub struct App {
  controller: SessionController,

  /// Current input mode
  mode: Mode,

  cue: CuePlayer,
  wake_lock: WakeLock,

  /// Tick source and animation loop
  timers: SessionTimers,
  tick_interval: Duration,
  frame_interval: Duration,

  events: EventHandler,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: &Config) -> Result<Self> {
    Self::with_events(config, EventHandler::new(Duration::from_millis(250)))
  }

  fn with_events(config: &Config, events: EventHandler) -> Result<Self> {
    let controller = SessionController::from_config(&config.session)?;

    Ok(Self {
      tick_interval: Duration::from_millis(controller.timing().tick_ms()),
      frame_interval: Duration::from_millis(config.session.frame_interval_ms),
      controller,
      mode: Mode::Normal,
      cue: CuePlayer::new(&config.audio),
      wake_lock: WakeLock::new(&config.wake_lock),
      timers: SessionTimers::default(),
      events,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Nothing may outlive the UI
    self.apply(vec![Effect::StopTimers, Effect::ReleaseWakeLock]);

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match self.events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => {
        let effects = self.handle_key(key);
        self.apply(effects);
      }
      Event::Resize => {}
      Event::SessionTick { generation } => {
        if self.timers.is_current(generation) {
          let effects = self.controller.tick(Instant::now());
          self.apply(effects);
        } else {
          debug!(generation, "Dropped stale tick");
        }
      }
      Event::Frame { generation } => {
        // Redraw happens in the loop; a frame after the session stopped ends the animation
        if self.timers.is_current(generation) && !self.controller.is_playing() {
          self.timers.stop();
        }
      }
    }
  }

  /// Perform controller side effects
  fn apply(&mut self, effects: Vec<Effect>) {
    for effect in effects {
      match effect {
        Effect::StartTimers => {
          let tx = self.events.sender();
          self.timers.start(&tx, self.tick_interval, self.frame_interval);
        }
        Effect::StopTimers => self.timers.stop(),
        Effect::PlayCue => self.cue.play(),
        Effect::AcquireWakeLock => self.wake_lock.acquire(),
        Effect::ReleaseWakeLock => self.wake_lock.release(),
      }
    }
  }

  /// Route a key press. Returns the effects to perform.
  fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return Vec::new();
    }

    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::EditLimit => {
        self.handle_edit_limit_key(key);
        Vec::new()
      }
    }
  }

  fn handle_normal_mode_key(&mut self, key: KeyEvent) -> Vec<Effect> {
    let snapshot = self.controller.snapshot();

    match key.code {
      KeyCode::Char('q') => {
        self.should_quit = true;
        Vec::new()
      }

      // From the completion banner every action leads back to the start
      KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('r') if snapshot.session_complete => {
        self.controller.reset()
      }

      KeyCode::Char(' ') | KeyCode::Enter => self.controller.start(),
      KeyCode::Char('r') => self.controller.reset(),

      KeyCode::Char('s') if snapshot.is_idle() => {
        self.controller.toggle_sound();
        Vec::new()
      }
      KeyCode::Char('t') if snapshot.is_idle() => {
        self.mode = Mode::EditLimit;
        Vec::new()
      }
      KeyCode::Char(c) if snapshot.is_idle() => match preset_for_key(c) {
        Some(minutes) => self.controller.start_with_preset(minutes),
        None => Vec::new(),
      },

      _ => Vec::new(),
    }
  }

  fn handle_edit_limit_key(&mut self, key: KeyEvent) {
    let mut input = self.controller.snapshot().time_limit_input;

    match key.code {
      KeyCode::Esc | KeyCode::Enter => {
        self.mode = Mode::Normal;
        return;
      }
      KeyCode::Backspace => {
        input.pop();
      }
      KeyCode::Char(c) => input.push(c),
      _ => return,
    }

    self.controller.set_time_limit(&input);
  }

  // Accessors for UI rendering
  pub fn snapshot(&self) -> SessionSnapshot {
    self.controller.snapshot()
  }

  pub fn indicator(&self, snapshot: &SessionSnapshot) -> IndicatorFrame {
    animation::indicator_frame(snapshot, Instant::now())
  }

  pub fn mode(&self) -> Mode {
    self.mode
  }
}

fn preset_for_key(c: char) -> Option<u32> {
  PRESETS
    .iter()
    .find(|(key, _)| *key == c)
    .map(|(_, minutes)| *minutes)
}
