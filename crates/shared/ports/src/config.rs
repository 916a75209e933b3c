use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Time zone the connector reports times in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimeZone {
    #[default]
    Central,
    Eastern,
    Pacific,
    London,
    Gmt,
    Local,
}

/// Quote streams subscribed for a resolved instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InstrumentSubscriptionLevel {
    None,
    Snapshot,
    #[default]
    BbaTrades,
    Dom,
}

/// Position streams subscribed for accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PositionSubscriptionLevel {
    None,
    Snapshot,
    #[default]
    SnapshotAndUpdates,
}

/// Behavior settings applied to the connector before it starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Wait for the connector to report ready before accepting calls
    pub ready_status_check: bool,
    /// Collections raise on out-of-range access instead of returning nothing
    pub collections_throw: bool,
    pub time_zone: TimeZone,
    /// Orders carry an explicit side instead of a signed quantity
    pub use_order_side: bool,
    pub instrument_subscription_level: InstrumentSubscriptionLevel,
    pub position_subscription_level: PositionSubscriptionLevel,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            ready_status_check: false,
            collections_throw: false,
            time_zone: TimeZone::Central,
            use_order_side: true,
            instrument_subscription_level: InstrumentSubscriptionLevel::BbaTrades,
            position_subscription_level: PositionSubscriptionLevel::SnapshotAndUpdates,
        }
    }
}

impl ConnectorConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn with_time_zone(mut self, time_zone: TimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }

    pub fn with_instrument_subscription_level(mut self, level: InstrumentSubscriptionLevel) -> Self {
        self.instrument_subscription_level = level;
        self
    }

    pub fn with_position_subscription_level(mut self, level: PositionSubscriptionLevel) -> Self {
        self.position_subscription_level = level;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_bring_up() {
        let config = ConnectorConfig::default();
        assert!(!config.ready_status_check);
        assert!(!config.collections_throw);
        assert!(config.use_order_side);
        assert_eq!(config.time_zone, TimeZone::Central);
        assert_eq!(config.instrument_subscription_level, InstrumentSubscriptionLevel::BbaTrades);
        assert_eq!(
            config.position_subscription_level,
            PositionSubscriptionLevel::SnapshotAndUpdates
        );
    }

    #[test]
    fn test_from_json_partial() {
        let config = ConnectorConfig::from_json(r#"{ "time_zone": "London" }"#).unwrap();
        assert_eq!(config.time_zone, TimeZone::London);
        assert!(config.use_order_side);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = ConnectorConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let err = ConnectorConfig::from_file("/nonexistent/connector.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
