use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub session: SessionConfig,
  pub audio: AudioConfig,
  pub wake_lock: WakeLockConfig,
  pub assets: AssetsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
  /// Length of each inhale and exhale, in seconds
  pub phase_duration_secs: f64,
  /// Tick cadence driving the session state
  pub tick_interval_ms: u64,
  /// Animation refresh cadence
  pub frame_interval_ms: u64,
  /// Whether the audio cue starts enabled
  pub sound: bool,
  /// Time limit (minutes) pre-filled at startup and after reset
  pub time_limit: Option<u32>,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      phase_duration_secs: 5.5,
      tick_interval_ms: 500,
      frame_interval_ms: 16,
      sound: false,
      time_limit: None,
    }
  }
}

impl SessionConfig {
  pub fn phase_duration_ms(&self) -> u64 {
    (self.phase_duration_secs * 1000.0).round() as u64
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
  /// Command spawned for each cue (e.g. `["paplay", "chime.oga"]`).
  /// The terminal bell is used when unset.
  pub command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WakeLockConfig {
  pub enabled: bool,
  /// Idle-inhibitor command held for as long as the lock is
  pub command: Vec<String>,
}

impl Default for WakeLockConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      command: [
        "systemd-inhibit",
        "--what=idle",
        "--who=coherent",
        "--why=Breathing session in progress",
        "sleep",
        "infinity",
      ]
      .into_iter()
      .map(String::from)
      .collect(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
  /// Origin the manifest paths are resolved against
  pub origin: Url,
  /// Cache name prefix; the version is appended
  pub cache_name: String,
  /// Cache version, bumped whenever the asset set changes
  pub version: String,
  pub manifest: Vec<String>,
  /// Page served when a navigation fails offline
  pub shell: String,
  /// Activate right after install instead of waiting for a control message
  pub skip_waiting_on_install: bool,
  /// Cache database (default: $XDG_DATA_HOME/coherent/assets.db)
  pub database: Option<PathBuf>,
}

impl Default for AssetsConfig {
  fn default() -> Self {
    Self {
      origin: Url::parse("http://localhost:8080/").expect("static URL is valid"),
      cache_name: "coherent-breathing-cache".to_string(),
      version: concat!("v", env!("CARGO_PKG_VERSION")).to_string(),
      manifest: [
        "./",
        "./index.html",
        "./app.js",
        "./manifest.json",
        "./icons/icon-192x192.png",
        "./icons/icon-512x512.png",
      ]
      .into_iter()
      .map(String::from)
      .collect(),
      shell: "./index.html".to_string(),
      skip_waiting_on_install: true,
      database: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./coherent.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/coherent/config.yaml
  ///
  /// Falls back to built-in defaults when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => {
        info!("No config file found, using defaults");
        Ok(Self::default())
      }
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("coherent.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("coherent").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config = Self::from_yaml(&contents)
      .map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config =
      serde_yaml::from_str(contents).map_err(|e| eyre!("Failed to parse config: {}", e))?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    let session = &self.session;
    if !session.phase_duration_secs.is_finite() || session.phase_duration_secs <= 0.0 {
      return Err(eyre!("session.phase_duration_secs must be positive"));
    }
    if session.tick_interval_ms == 0 {
      return Err(eyre!("session.tick_interval_ms must be positive"));
    }
    if session.frame_interval_ms == 0 {
      return Err(eyre!("session.frame_interval_ms must be positive"));
    }
    if session.phase_duration_ms() < session.tick_interval_ms {
      return Err(eyre!(
        "session.phase_duration_secs must be at least one tick ({}ms)",
        session.tick_interval_ms
      ));
    }
    if self.assets.version.trim().is_empty() {
      return Err(eyre!("assets.version must not be empty"));
    }
    Ok(())
  }
}
