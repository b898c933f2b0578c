//! Audio cue played at session start and on every phase change.

use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::AudioConfig;

/// Best-effort cue player. Failures are logged and otherwise ignored.
pub struct CuePlayer {
  command: Option<Vec<String>>,
}

impl CuePlayer {
  pub fn new(config: &AudioConfig) -> Self {
    Self {
      command: config.command.clone().filter(|cmd| !cmd.is_empty()),
    }
  }

  pub fn play(&self) {
    if let Err(e) = self.try_play() {
      warn!(error = %e, "Cue failed");
    }
  }

  fn try_play(&self) -> Result<()> {
    match &self.command {
      Some(cmd) => spawn_cue(cmd),
      None => ring_bell(),
    }
  }
}

fn spawn_cue(cmd: &[String]) -> Result<()> {
  let (program, args) = cmd
    .split_first()
    .ok_or_else(|| eyre!("Empty cue command"))?;

  let mut child = Command::new(program)
    .args(args)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()
    .map_err(|e| eyre!("Failed to spawn {}: {}", program, e))?;

  let program = program.clone();
  tokio::spawn(async move {
    match child.wait().await {
      Ok(status) if !status.success() => warn!(%program, %status, "Cue command failed"),
      Ok(_) => debug!(%program, "Cue played"),
      Err(e) => warn!(%program, error = %e, "Cue command failed"),
    }
  });

  Ok(())
}

fn ring_bell() -> Result<()> {
  let mut out = std::io::stdout();
  out
    .write_all(b"\x07")
    .and_then(|_| out.flush())
    .map_err(|e| eyre!("Failed to ring terminal bell: {}", e))
}
