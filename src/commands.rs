//! `coherent cache ...` subcommands.
//!
//! Each invocation opens the store, performs one operation and exits.

use crate::cache::{
  AssetCache, AssetRequest, AssetResponse, CacheResult, CacheSettings, CacheSource, CacheStatus,
  ControlMessage, HttpNetwork, SqliteStorage,
};
use crate::config::Config;
use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum CacheAction {
  /// Fetch the manifest and store it as the current version
  Install,
  /// Evict other versions and take control
  Activate,
  /// Request an asset through the cache
  Fetch {
    /// Path relative to the configured origin
    path: String,

    /// Treat the request as a page navigation
    #[arg(long)]
    navigate: bool,

    /// Write the body to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Deliver a control message, e.g. '{"type":"SKIP_WAITING"}'
  Message { json: String },
  /// Show stored versions and the lifecycle state
  Status,
}

pub async fn run_cache(
  config: &Config,
  version: Option<String>,
  action: CacheAction,
) -> Result<()> {
  let mut settings = CacheSettings::from_config(&config.assets)?;
  if let Some(version) = version {
    settings = settings.with_version(version);
  }

  let storage = SqliteStorage::open(config.assets.database.as_deref())?;
  let cache = AssetCache::new(storage, HttpNetwork::new()?, settings);

  match action {
    CacheAction::Install => {
      let report = cache.install().await?;
      println!("Installed {} assets into {}", report.cached, report.cache_name);
      if !report.activated {
        println!("Waiting for activation (send SKIP_WAITING or run `cache activate`)");
      }
    }
    CacheAction::Activate => {
      let report = cache.activate().await?;
      println!("Activated {}", report.cache_name);
      for name in report.deleted {
        println!("Deleted {}", name);
      }
    }
    CacheAction::Fetch {
      path,
      navigate,
      output,
    } => {
      let url = cache.settings().resolve(&path)?;
      let request = if navigate {
        AssetRequest::navigate(url)
      } else {
        AssetRequest::get(url)
      };

      let result = cache.fetch(&request).await?;
      eprintln!("{}", fetch_summary(&result));

      match output {
        Some(path) => std::fs::write(&path, &result.data.body)
          .map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?,
        None => std::io::stdout()
          .write_all(&result.data.body)
          .map_err(|e| eyre!("Failed to write response body: {}", e))?,
      }
    }
    CacheAction::Message { json } => {
      let message = ControlMessage::parse(&json)?;
      match cache.handle_message(message).await? {
        Some(report) => println!("Activated {}", report.cache_name),
        None => println!("Nothing to do"),
      }
    }
    CacheAction::Status => print_status(&cache.status()?),
  }

  Ok(())
}

fn print_status(status: &CacheStatus) {
  println!("Current: {}", status.current);
  println!("Active:  {}", status.active.as_deref().unwrap_or("-"));
  println!("Waiting: {}", status.waiting.as_deref().unwrap_or("-"));

  if status.caches.is_empty() {
    println!("No caches stored");
    return;
  }
  println!();
  for (name, count) in &status.caches {
    let marker = if *name == status.current { "*" } else { " " };
    println!("{} {:<40} {:>4} entries", marker, name, count);
  }
}

/// One-line description of where a fetched response came from
fn fetch_summary(result: &CacheResult<AssetResponse>) -> String {
  let mut summary = format!(
    "{} {} ({})",
    result.data.status,
    result.data.url,
    source_label(result.source)
  );
  if let Some(cached_at) = result.cached_at {
    summary.push_str(&format!(", cached {}", cached_at.format("%Y-%m-%d %H:%M:%S UTC")));
  }
  summary
}

fn source_label(source: CacheSource) -> &'static str {
  match source {
    CacheSource::Network => "network",
    CacheSource::Cache => "cache",
    CacheSource::Offline => "offline shell",
    CacheSource::Passthrough => "passthrough",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{TimeZone, Utc};
  use url::Url;

  fn response() -> AssetResponse {
    AssetResponse {
      url: Url::parse("http://localhost:8080/app.js").unwrap(),
      status: 200,
      content_type: None,
      body: Vec::new(),
    }
  }

  #[test]
  fn test_fetch_summary_includes_cache_time() {
    let cached_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
    let result = CacheResult::from_cache(response(), cached_at);
    assert_eq!(
      fetch_summary(&result),
      "200 http://localhost:8080/app.js (cache), cached 2024-03-01 08:30:00 UTC"
    );
  }

  #[test]
  fn test_fetch_summary_for_network_response() {
    let result = CacheResult::from_network(response());
    assert_eq!(fetch_summary(&result), "200 http://localhost:8080/app.js (network)");
  }

  #[test]
  fn test_source_labels_are_distinct() {
    let labels = [
      source_label(CacheSource::Network),
      source_label(CacheSource::Cache),
      source_label(CacheSource::Offline),
      source_label(CacheSource::Passthrough),
    ];
    for (i, a) in labels.iter().enumerate() {
      for b in &labels[i + 1..] {
        assert_ne!(a, b);
      }
    }
  }
}
