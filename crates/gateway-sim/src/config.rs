use std::path::Path;

use cqg_core::{Id, MoneyAmount, Price, Timestamp, Volume};
use cqg_ports::ConfigError;
use serde::{Deserialize, Serialize};

/// Simulated instrument: `symbol` is what hosts request, `full_name` what it
/// resolves to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimInstrumentConfig {
    pub symbol: String,
    pub full_name: String,
    pub bid: Price,
    pub ask: Price,
    pub trade: Price,
    pub volume: Volume,
    pub yesterday_settlement: Option<Price>,
}

impl SimInstrumentConfig {
    pub fn new(symbol: impl Into<String>, full_name: impl Into<String>, trade: Price) -> Self {
        Self {
            symbol: symbol.into(),
            full_name: full_name.into(),
            bid: trade - 0.25,
            ask: trade + 0.25,
            trade,
            volume: 1,
            yesterday_settlement: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimPositionConfig {
    pub symbol: String,
    pub long: bool,
    pub quantity: i64,
    pub average_price: Option<Price>,
    pub ote: MoneyAmount,
    pub profit_loss: MoneyAmount,
}

impl SimPositionConfig {
    pub fn new(symbol: impl Into<String>, long: bool, quantity: i64, average_price: Price) -> Self {
        Self {
            symbol: symbol.into(),
            long,
            quantity,
            average_price: Some(average_price),
            ote: 0.0,
            profit_loss: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimAccountConfig {
    pub gw_account_id: Id,
    pub fcm_id: Id,
    pub fcm_account_id: String,
    pub name: String,
    pub currency: String,
    pub balance: MoneyAmount,
    pub ote: MoneyAmount,
    pub profit_loss: MoneyAmount,
    #[serde(default)]
    pub positions: Vec<SimPositionConfig>,
}

impl SimAccountConfig {
    pub fn new(gw_account_id: Id, name: impl Into<String>, balance: MoneyAmount) -> Self {
        Self {
            gw_account_id,
            fcm_id: 1,
            fcm_account_id: format!("FCM-{gw_account_id}"),
            name: name.into(),
            currency: "USD".to_string(),
            balance,
            ote: 0.0,
            profit_loss: 0.0,
            positions: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: SimPositionConfig) -> Self {
        self.positions.push(position);
        self
    }
}

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub accounts: Vec<SimAccountConfig>,
    pub instruments: Vec<SimInstrumentConfig>,
    /// Market data comes up on startup; trading waits for a logon
    pub auto_connect: bool,
    /// Placed market orders fill at once at the last trade price
    pub fill_market_orders: bool,
    /// Bars requests resolve at once with synthetic bars
    pub resolve_bars: bool,
    /// Most bars a request can return
    pub bar_history: usize,
    pub line_time: Option<Timestamp>,
    /// Deliver the startup notifications from inside `startup`, like a
    /// connector with its own callback thread
    pub deliver_on_startup: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            accounts: vec![SimAccountConfig::new(100_001, "Demo", 100_000.0)],
            instruments: vec![
                SimInstrumentConfig::new("EP", "F.US.EPH5", 2050.50),
                SimInstrumentConfig::new("CLE", "F.US.CLEJ5", 60.52),
            ],
            auto_connect: true,
            fill_market_orders: true,
            resolve_bars: true,
            bar_history: 60,
            line_time: None,
            deliver_on_startup: false,
        }
    }
}

impl SimConfig {
    /// No accounts, no instruments, nothing automatic
    pub fn empty() -> Self {
        Self {
            accounts: Vec::new(),
            instruments: Vec::new(),
            auto_connect: false,
            fill_market_orders: false,
            resolve_bars: false,
            bar_history: 0,
            line_time: None,
            deliver_on_startup: false,
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn with_account(mut self, account: SimAccountConfig) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn with_instrument(mut self, instrument: SimInstrumentConfig) -> Self {
        self.instruments.push(instrument);
        self
    }

    pub fn with_line_time(mut self, line_time: Timestamp) -> Self {
        self.line_time = Some(line_time);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_ep() {
        let config = SimConfig::default();
        let ep = config.instruments.iter().find(|i| i.symbol == "EP").unwrap();
        assert_eq!(ep.full_name, "F.US.EPH5");
        assert_eq!(config.accounts.len(), 1);
    }

    #[test]
    fn test_from_json_overrides() {
        let config = SimConfig::from_json(
            r#"{
                "accounts": [{
                    "gw_account_id": 7, "fcm_id": 2, "fcm_account_id": "X7",
                    "name": "Seven", "currency": "EUR",
                    "balance": 10.0, "ote": 1.0, "profit_loss": 2.0
                }],
                "fill_market_orders": false
            }"#,
        )
        .unwrap();

        assert_eq!(config.accounts[0].gw_account_id, 7);
        assert!(config.accounts[0].positions.is_empty());
        assert!(!config.fill_market_orders);
        assert!(config.auto_connect);
    }
}
