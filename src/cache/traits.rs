//! Core types for the asset cache: requests, responses and result metadata.

use chrono::{DateTime, Utc};
use reqwest::Method;
use url::Url;

/// How a request was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
  /// Top-level page load; falls back to the shell page when offline
  Navigate,
  /// Scripts, icons, manifests and everything else
  Subresource,
}

/// An intercepted resource request.
#[derive(Debug, Clone)]
pub struct AssetRequest {
  pub url: Url,
  pub method: Method,
  pub mode: RequestMode,
}

impl AssetRequest {
  pub fn get(url: Url) -> Self {
    Self {
      url,
      method: Method::GET,
      mode: RequestMode::Subresource,
    }
  }

  pub fn navigate(url: Url) -> Self {
    Self {
      mode: RequestMode::Navigate,
      ..Self::get(url)
    }
  }

  pub fn is_navigation(&self) -> bool {
    self.mode == RequestMode::Navigate
  }

  /// Storage key: the absolute URL without its fragment.
  pub fn cache_key(&self) -> String {
    cache_key(&self.url)
  }
}

pub fn cache_key(url: &Url) -> String {
  let mut url = url.clone();
  url.set_fragment(None);
  url.into()
}

/// A response as returned by the network or stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
  /// Final URL after redirects
  pub url: Url,
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl AssetResponse {
  /// 2xx status
  pub fn is_ok(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at: Some(cached_at),
    }
  }

  /// Shell page served in place of a failed navigation.
  pub fn offline(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at: Some(cached_at),
    }
  }

  /// Request went straight to the network because this version is not in control.
  pub fn passthrough(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Passthrough,
      cached_at: None,
    }
  }
}

/// Indicates where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched from the network (and stored when cacheable)
  Network,
  /// Served from the cache
  Cache,
  /// Network unavailable, serving the cached shell page
  Offline,
  /// Not yet controlling; network only
  Passthrough,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cache_key_drops_fragment_keeps_query() {
    let url = Url::parse("http://localhost:8080/app.js?v=2#top").unwrap();
    assert_eq!(cache_key(&url), "http://localhost:8080/app.js?v=2");
  }

  #[test]
  fn test_navigate_request() {
    let url = Url::parse("http://localhost:8080/").unwrap();
    let request = AssetRequest::navigate(url);
    assert!(request.is_navigation());
    assert_eq!(request.method, Method::GET);
  }
}
