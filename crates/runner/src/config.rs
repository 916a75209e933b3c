//! Runner configuration

use std::path::Path;

use cqg_gateway_sim::SimConfig;
use cqg_ports::{ConfigError, ConnectorConfig};
use serde::{Deserialize, Serialize};

/// What the demo connects to and what it trades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Connector behavior settings
    pub connector: ConnectorConfig,
    /// Book served by the simulated connector
    pub sim: SimConfig,
    pub user: String,
    pub password: String,
    /// Symbol the demo orders are placed on
    pub trade_symbol: String,
    /// Symbols to load bars for once market data is up
    pub bar_symbols: Vec<String>,
    pub bar_count: i32,
    /// Intraday bar period, 0 for daily bars
    pub bar_period_minutes: i32,
    /// How often queued gateway notifications are delivered
    pub pump_interval_ms: u64,
    /// Give up after this long
    pub run_duration_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            connector: ConnectorConfig::default(),
            sim: SimConfig::default(),
            user: "demo".to_string(),
            password: "demo".to_string(),
            trade_symbol: "CLE".to_string(),
            bar_symbols: vec!["EP".to_string(), "CLE".to_string()],
            bar_count: 10,
            bar_period_minutes: 1,
            pump_interval_ms: 20,
            run_duration_ms: 30_000,
        }
    }
}

impl RunnerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.display().to_string(),
            error: error.to_string(),
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RunnerConfig::from_json(
            r#"{ "trade_symbol": "EP", "bar_count": 25, "connector": { "time_zone": "Eastern" } }"#,
        )
        .unwrap();

        assert_eq!(config.trade_symbol, "EP");
        assert_eq!(config.bar_count, 25);
        assert_eq!(config.connector.time_zone, cqg_ports::TimeZone::Eastern);
        assert_eq!(config.bar_symbols, vec!["EP".to_string(), "CLE".to_string()]);
        assert_eq!(config.sim, SimConfig::default());
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(
            RunnerConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
