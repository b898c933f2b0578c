//! Control messages accepted by the asset cache.

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;

/// A JSON control message, e.g. `{"type":"SKIP_WAITING"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
  /// Activate a waiting version now
  SkipWaiting,
  /// Anything else; ignored
  #[serde(other)]
  Unknown,
}

impl ControlMessage {
  pub fn parse(json: &str) -> Result<Self> {
    serde_json::from_str(json).map_err(|e| eyre!("Invalid control message: {}", e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_skip_waiting() {
    assert_eq!(
      ControlMessage::parse(r#"{"type":"SKIP_WAITING"}"#).unwrap(),
      ControlMessage::SkipWaiting
    );
  }

  #[test]
  fn test_unknown_type_is_tolerated() {
    assert_eq!(
      ControlMessage::parse(r#"{"type":"REFRESH"}"#).unwrap(),
      ControlMessage::Unknown
    );
  }

  #[test]
  fn test_malformed_message_is_error() {
    assert!(ControlMessage::parse("SKIP_WAITING").is_err());
    assert!(ControlMessage::parse(r#"{"kind":"SKIP_WAITING"}"#).is_err());
  }
}
