//! Keeps the display awake while a session runs.
//!
//! The lock is an idle-inhibitor child process held for the lock's lifetime.

use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::config::WakeLockConfig;

pub struct WakeLock {
  command: Option<Vec<String>>,
  held: Option<Child>,
}

impl WakeLock {
  pub fn new(config: &WakeLockConfig) -> Self {
    let command = (config.enabled && !config.command.is_empty()).then(|| config.command.clone());
    Self {
      command,
      held: None,
    }
  }

  #[cfg(test)]
  pub fn is_held(&self) -> bool {
    self.held.is_some()
  }

  /// Acquire the lock. Failure leaves the session running without it.
  pub fn acquire(&mut self) {
    if self.held.is_some() {
      return;
    }
    let Some((program, args)) = self.command.as_ref().and_then(|c| c.split_first()) else {
      debug!("Wake lock disabled");
      return;
    };

    match Command::new(program)
      .args(args)
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .kill_on_drop(true)
      .spawn()
    {
      Ok(child) => {
        debug!(%program, pid = ?child.id(), "Wake lock acquired");
        self.held = Some(child);
      }
      Err(e) => debug!(%program, error = %e, "Wake lock unavailable"),
    }
  }

  pub fn release(&mut self) {
    if let Some(mut child) = self.held.take() {
      if let Err(e) = child.start_kill() {
        debug!(error = %e, "Wake lock release failed");
      } else {
        debug!("Wake lock released");
      }
    }
  }
}

impl Drop for WakeLock {
  fn drop(&mut self) {
    self.release();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(enabled: bool, command: &[&str]) -> WakeLockConfig {
    WakeLockConfig {
      enabled,
      command: command.iter().map(|s| s.to_string()).collect(),
    }
  }

  #[tokio::test]
  async fn test_disabled_lock_never_holds() {
    let mut lock = WakeLock::new(&config(false, &["sleep", "30"]));
    lock.acquire();
    assert!(!lock.is_held());
  }

  #[tokio::test]
  async fn test_missing_inhibitor_is_not_fatal() {
    let mut lock = WakeLock::new(&config(true, &["/nonexistent/inhibitor"]));
    lock.acquire();
    assert!(!lock.is_held());
    lock.release();
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn test_acquire_and_release() {
    let mut lock = WakeLock::new(&config(true, &["sleep", "30"]));
    lock.acquire();
    assert!(lock.is_held());

    // Acquiring twice keeps the same holder
    lock.acquire();
    assert!(lock.is_held());

    lock.release();
    assert!(!lock.is_held());
  }
}
