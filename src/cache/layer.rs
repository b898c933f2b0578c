//! Versioned asset cache: install, activate and fetch interception.

use color_eyre::{eyre::eyre, Result};
use futures::future::try_join_all;
use reqwest::Method;
use tracing::{debug, info, warn};
use url::Url;

use super::message::ControlMessage;
use super::network::Network;
use super::storage::{CacheStorage, LifecycleSlot};
use super::traits::{cache_key, AssetRequest, AssetResponse, CacheResult};
use crate::config::AssetsConfig;

/// Resolved cache settings.
#[derive(Debug, Clone)]
pub struct CacheSettings {
  origin: Url,
  name: String,
  version: String,
  manifest: Vec<Url>,
  shell: Url,
  skip_waiting_on_install: bool,
}

impl CacheSettings {
  pub fn from_config(config: &AssetsConfig) -> Result<Self> {
    let resolve = |path: &str| {
      config
        .origin
        .join(path)
        .map_err(|e| eyre!("Invalid asset path '{}': {}", path, e))
    };

    Ok(Self {
      origin: config.origin.clone(),
      name: config.cache_name.clone(),
      version: config.version.clone(),
      manifest: config
        .manifest
        .iter()
        .map(|p| resolve(p))
        .collect::<Result<_>>()?,
      shell: resolve(&config.shell)?,
      skip_waiting_on_install: config.skip_waiting_on_install,
    })
  }

  /// Override the version, e.g. from the command line.
  pub fn with_version(mut self, version: impl Into<String>) -> Self {
    self.version = version.into();
    self
  }

  /// Full cache name: `<name>-<version>`
  pub fn cache_name(&self) -> String {
    format!("{}-{}", self.name, self.version)
  }

  pub fn version(&self) -> &str {
    &self.version
  }

  /// Resolve a path against the origin.
  pub fn resolve(&self, path: &str) -> Result<Url> {
    self
      .origin
      .join(path)
      .map_err(|e| eyre!("Invalid path '{}': {}", path, e))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
  pub cache_name: String,
  pub cached: usize,
  /// Whether the new version took control right away
  pub activated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
  pub cache_name: String,
  /// Stale caches that were removed
  pub deleted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatus {
  pub current: String,
  /// Every stored cache with its entry count
  pub caches: Vec<(String, usize)>,
  pub active: Option<String>,
  pub waiting: Option<String>,
}

/// Cache that sits between a client and the network.
///
/// Serves cache-first, stores successful same-origin responses, and falls
/// back to the shell page when a navigation fails offline.
pub struct AssetCache<S: CacheStorage, N: Network> {
  storage: S,
  network: N,
  settings: CacheSettings,
}

impl<S: CacheStorage, N: Network> AssetCache<S, N> {
  pub fn new(storage: S, network: N, settings: CacheSettings) -> Self {
    Self {
      storage,
      network,
      settings,
    }
  }

  pub fn settings(&self) -> &CacheSettings {
    &self.settings
  }

  /// Populate the current version from the manifest.
  ///
  /// All entries are fetched first and stored in one transaction, so a
  /// single failure leaves the store untouched.
  pub async fn install(&self) -> Result<InstallReport> {
    let cache_name = self.settings.cache_name();
    info!(%cache_name, assets = self.settings.manifest.len(), "Installing");

    let fetches = self.settings.manifest.iter().map(|url| async move {
      let request = AssetRequest::get(url.clone());
      let response = self.network.fetch(&request).await?;
      if !response.is_ok() {
        return Err(eyre!(
          "Failed to cache {}: HTTP {}",
          url,
          response.status
        ));
      }
      Ok::<_, color_eyre::Report>((request.cache_key(), response))
    });
    let entries = try_join_all(fetches).await?;

    self.storage.put_all(&cache_name, &entries)?;

    let active = self.storage.lifecycle(LifecycleSlot::Active)?;
    if active.as_deref() == Some(self.settings.version()) {
      info!(%cache_name, "Refreshed the active version");
      return Ok(InstallReport {
        cache_name,
        cached: entries.len(),
        activated: true,
      });
    }

    self
      .storage
      .set_lifecycle(LifecycleSlot::Waiting, Some(self.settings.version()))?;

    // Nothing to hand over from when no version is active yet
    let activated = if self.settings.skip_waiting_on_install || active.is_none() {
      self.activate().await?;
      true
    } else {
      info!(%cache_name, "Installed, waiting for activation");
      false
    };

    Ok(InstallReport {
      cache_name,
      cached: entries.len(),
      activated,
    })
  }

  /// Delete every other cache version and take control.
  pub async fn activate(&self) -> Result<ActivateReport> {
    let cache_name = self.settings.cache_name();
    if !self.storage.has_cache(&cache_name)? {
      return Err(eyre!("Cache {} is not installed", cache_name));
    }

    let mut deleted = Vec::new();
    for name in self.storage.cache_names()? {
      if name != cache_name && self.storage.delete_cache(&name)? {
        info!(cache = %name, "Deleted stale cache");
        deleted.push(name);
      }
    }

    let version = self.settings.version();
    self
      .storage
      .set_lifecycle(LifecycleSlot::Active, Some(version))?;
    if self.storage.lifecycle(LifecycleSlot::Waiting)?.as_deref() == Some(version) {
      self.storage.set_lifecycle(LifecycleSlot::Waiting, None)?;
    }

    info!(%cache_name, "Activated and controlling clients");
    Ok(ActivateReport {
      cache_name,
      deleted,
    })
  }

  /// Handle an external control message.
  pub async fn handle_message(&self, message: ControlMessage) -> Result<Option<ActivateReport>> {
    match message {
      ControlMessage::SkipWaiting => {
        let waiting = self.storage.lifecycle(LifecycleSlot::Waiting)?;
        if waiting.as_deref() == Some(self.settings.version()) {
          Ok(Some(self.activate().await?))
        } else {
          info!(?waiting, "Skip waiting requested with no matching waiting version");
          Ok(None)
        }
      }
      ControlMessage::Unknown => {
        debug!("Ignoring unknown control message");
        Ok(None)
      }
    }
  }

  /// Whether this version is the active controller.
  pub fn is_controlling(&self) -> Result<bool> {
    Ok(self.storage.lifecycle(LifecycleSlot::Active)?.as_deref() == Some(self.settings.version()))
  }

  /// Serve a request cache-first.
  ///
  /// 1. Not in control - straight to the network
  /// 2. Cache hit - return it, no network
  /// 3. Miss - fetch, store a copy if cacheable
  /// 4. Network failure - navigations get the cached shell page, other
  ///    requests get the error
  pub async fn fetch(&self, request: &AssetRequest) -> Result<CacheResult<AssetResponse>> {
    if !self.is_controlling()? {
      debug!(url = %request.url, "Not controlling, passing through");
      let response = self.network.fetch(request).await?;
      return Ok(CacheResult::passthrough(response));
    }

    let cache_name = self.settings.cache_name();
    let key = request.cache_key();

    // Only GET responses are ever stored
    if request.method == Method::GET {
      if let Some(hit) = self.storage.match_key(&cache_name, &key)? {
        debug!(%key, "Cache hit");
        return Ok(CacheResult::from_cache(hit.response, hit.cached_at));
      }
    }

    match self.network.fetch(request).await {
      Ok(response) => {
        if self.is_cacheable(request, &response) {
          // A failed write only costs us this copy
          if let Err(e) = self.storage.put(&cache_name, &key, &response) {
            warn!(%key, error = %e, "Failed to store response");
          } else {
            debug!(%key, "Stored network response");
          }
        }
        Ok(CacheResult::from_network(response))
      }
      Err(e) if request.is_navigation() => {
        let shell_key = cache_key(&self.settings.shell);
        match self.storage.match_key(&cache_name, &shell_key)? {
          Some(shell) => {
            warn!(url = %request.url, error = %e, "Offline, serving cached shell");
            Ok(CacheResult::offline(shell.response, shell.cached_at))
          }
          None => Err(e),
        }
      }
      Err(e) => Err(e),
    }
  }

  /// Successful, same-origin GET responses are stored.
  fn is_cacheable(&self, request: &AssetRequest, response: &AssetResponse) -> bool {
    request.method == Method::GET
      && response.status == 200
      && response.url.origin() == self.settings.origin.origin()
  }

  pub fn status(&self) -> Result<CacheStatus> {
    let caches = self
      .storage
      .cache_names()?
      .into_iter()
      .map(|name| {
        let count = self.storage.entry_count(&name)?;
        Ok((name, count))
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(CacheStatus {
      current: self.settings.cache_name(),
      caches,
      active: self.storage.lifecycle(LifecycleSlot::Active)?,
      waiting: self.storage.lifecycle(LifecycleSlot::Waiting)?,
    })
  }
}
