//! Offline asset cache.
//!
//! This module provides a versioned, cache-first store for the app's static
//! assets:
//! - Installs a fixed manifest atomically under `<name>-<version>`
//! - Activation evicts every other version and takes control
//! - Fetches are served from cache, then network (storing successful
//!   same-origin responses), then the cached shell page for navigations
//! - A `SKIP_WAITING` control message activates a waiting update

mod layer;
mod message;
mod network;
mod storage;
mod traits;

pub use layer::{AssetCache, CacheSettings, CacheStatus};
pub use message::ControlMessage;
pub use network::HttpNetwork;
pub use storage::SqliteStorage;
pub use traits::{AssetRequest, AssetResponse, CacheResult, CacheSource};
