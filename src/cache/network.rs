//! Network access behind the cache.

use color_eyre::{eyre::eyre, Result};
use reqwest::header::CONTENT_TYPE;
use std::future::Future;
use tracing::debug;

use super::traits::{AssetRequest, AssetResponse};

/// Something that can perform a request against the network.
pub trait Network: Send + Sync {
  /// Perform the request. Any HTTP status is a successful fetch;
  /// only transport failures are errors.
  fn fetch(&self, request: &AssetRequest) -> impl Future<Output = Result<AssetResponse>> + Send;
}

/// `reqwest`-backed network client.
#[derive(Clone)]
pub struct HttpNetwork {
  client: reqwest::Client,
}

impl HttpNetwork {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("coherent/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

impl Network for HttpNetwork {
  async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse> {
    debug!(method = %request.method, url = %request.url, "Network fetch");

    let response = self
      .client
      .request(request.method.clone(), request.url.clone())
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch {}: {}", request.url, e))?;

    let url = response.url().clone();
    let status = response.status().as_u16();
    let content_type = response
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(String::from);

    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read body of {}: {}", request.url, e))?
      .to_vec();

    Ok(AssetResponse {
      url,
      status,
      content_type,
      body,
    })
  }
}
