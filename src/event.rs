use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Terminal resized; triggers a redraw
  Resize,
  /// Session tick from the timer of the given generation
  SessionTick { generation: u64 },
  /// Animation frame from the timer of the given generation
  Frame { generation: u64 },
}

/// Event handler that produces events from terminal input
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler. `poll_rate` bounds how long the input
  /// reader blocks before checking whether the app is still listening.
  pub fn new(poll_rate: Duration) -> Self {
    let handler = Self::detached();

    let input_tx = handler.tx.clone();
    tokio::task::spawn_blocking(move || loop {
      if input_tx.is_closed() {
        break;
      }
      if !event::poll(poll_rate).unwrap_or(false) {
        continue;
      }
      let event = match event::read() {
        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
        Ok(CrosstermEvent::Resize(..)) => Event::Resize,
        _ => continue,
      };
      if input_tx.send(event).is_err() {
        break;
      }
    });

    handler
  }

  /// A handler with no terminal input attached; only timers feed it.
  pub fn detached() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self { tx, rx }
  }

  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

/// A periodic task feeding events into the loop. Aborted on drop.
struct Timer {
  handle: JoinHandle<()>,
}

impl Timer {
  fn spawn(
    period: Duration,
    tx: mpsc::UnboundedSender<Event>,
    behavior: MissedTickBehavior,
    make_event: impl Fn() -> Event + Send + 'static,
  ) -> Self {
    let handle = tokio::spawn(async move {
      let mut interval = interval_at(Instant::now() + period, period);
      interval.set_missed_tick_behavior(behavior);
      loop {
        interval.tick().await;
        if tx.send(make_event()).is_err() {
          break;
        }
      }
    });
    Self { handle }
  }
}

impl Drop for Timer {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

/// Tick source and animation loop of a running session.
///
/// Every start bumps the generation; events from earlier timers that are
/// still queued carry an older generation and are discarded by the app.
#[derive(Default)]
pub struct SessionTimers {
  generation: u64,
  tick: Option<Timer>,
  frame: Option<Timer>,
}

impl SessionTimers {
  pub fn start(
    &mut self,
    tx: &mpsc::UnboundedSender<Event>,
    tick_interval: Duration,
    frame_interval: Duration,
  ) {
    self.stop();
    self.generation += 1;
    let generation = self.generation;

    // Missed ticks are replayed so counting keeps pace with the wall clock
    self.tick = Some(Timer::spawn(
      tick_interval,
      tx.clone(),
      MissedTickBehavior::Burst,
      move || Event::SessionTick { generation },
    ));
    // Late frames are simply skipped
    self.frame = Some(Timer::spawn(
      frame_interval,
      tx.clone(),
      MissedTickBehavior::Skip,
      move || Event::Frame { generation },
    ));
  }

  pub fn stop(&mut self) {
    self.tick = None;
    self.frame = None;
  }

  pub fn is_current(&self, generation: u64) -> bool {
    generation == self.generation && self.tick.is_some()
  }

  #[cfg(test)]
  pub fn is_running(&self) -> bool {
    self.tick.is_some() || self.frame.is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_timers_emit_current_generation() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut timers = SessionTimers::default();
    timers.start(&tx, Duration::from_millis(5), Duration::from_millis(5));
    assert!(timers.is_running());

    match rx.recv().await {
      Some(Event::SessionTick { generation }) | Some(Event::Frame { generation }) => {
        assert!(timers.is_current(generation));
      }
      other => panic!("unexpected event: {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_restart_invalidates_old_generation() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut timers = SessionTimers::default();
    timers.start(&tx, Duration::from_secs(60), Duration::from_secs(60));
    timers.start(&tx, Duration::from_secs(60), Duration::from_secs(60));
    assert!(!timers.is_current(1));
    assert!(timers.is_current(2));
  }

  #[tokio::test]
  async fn test_stop_cancels_and_invalidates() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut timers = SessionTimers::default();
    timers.start(&tx, Duration::from_millis(5), Duration::from_millis(5));
    timers.stop();
    assert!(!timers.is_running());
    assert!(!timers.is_current(1));

    // Aborted tasks drop their senders; only ours keeps the channel open
    tokio::time::sleep(Duration::from_millis(30)).await;
    while let Ok(event) = rx.try_recv() {
      match event {
        Event::SessionTick { generation } | Event::Frame { generation } => {
          assert!(!timers.is_current(generation))
        }
        other => panic!("unexpected event: {:?}", other),
      }
    }
    drop(tx);
    assert!(rx.recv().await.is_none());
  }
}
