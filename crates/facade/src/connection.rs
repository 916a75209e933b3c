//! Connection Manager
//!
//! Tracks the market data and trading channels from pushed status changes.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use cqg_ports::{AccountSubscriptionLevel, ConnectionStatus, Gateway, GwResult};
use log::info;

/// State of one connection channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChannelState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl ChannelState {
    pub fn from_status(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Up => ChannelState::Connected,
            ConnectionStatus::Delayed | ConnectionStatus::NotLoggedOn => ChannelState::Connecting,
            ConnectionStatus::Down | ConnectionStatus::Trouble => ChannelState::Disconnected,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            2 => ChannelState::Connected,
            1 => ChannelState::Connecting,
            _ => ChannelState::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        *self == ChannelState::Connected
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelState::Disconnected => "disconnected",
            ChannelState::Connecting => "connecting",
            ChannelState::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// Shared between the facade (reads) and the dispatcher (writes)
#[derive(Debug)]
pub struct ConnectionManager {
    market_data: AtomicU8,
    trading: AtomicU8,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            market_data: AtomicU8::new(ChannelState::Disconnected as u8),
            trading: AtomicU8::new(ChannelState::Disconnected as u8),
        }
    }

    pub fn market_data(&self) -> ChannelState {
        ChannelState::from_u8(self.market_data.load(Ordering::Acquire))
    }

    pub fn trading(&self) -> ChannelState {
        ChannelState::from_u8(self.trading.load(Ordering::Acquire))
    }

    /// Both channels are connecting while the connector starts
    pub fn mark_connecting(&self) {
        self.market_data
            .store(ChannelState::Connecting as u8, Ordering::Release);
        self.trading
            .store(ChannelState::Connecting as u8, Ordering::Release);
    }

    pub fn reset(&self) {
        self.market_data
            .store(ChannelState::Disconnected as u8, Ordering::Release);
        self.trading
            .store(ChannelState::Disconnected as u8, Ordering::Release);
    }

    /// Record a market data status change, returns the host `connected` flag
    pub fn on_market_data_status(&self, status: ConnectionStatus) -> bool {
        let state = ChannelState::from_status(status);
        let previous = self.market_data.swap(state as u8, Ordering::AcqRel);
        if previous != state as u8 {
            info!("Market data connection {} ({:?})", state, status);
        }
        status == ConnectionStatus::Up
    }

    /// Record a trading status change, returns the host `connected` flag
    ///
    /// When the channel comes up the connection is subscribed to account,
    /// position and order updates.
    pub fn on_trading_status(&self, gateway: &dyn Gateway, status: ConnectionStatus) -> GwResult<bool> {
        let state = ChannelState::from_status(status);
        let previous = self.trading.swap(state as u8, Ordering::AcqRel);
        if previous != state as u8 {
            info!("Trading connection {} ({:?})", state, status);
        }

        let connected = status == ConnectionStatus::Up;
        if connected {
            gateway.set_account_subscription_level(AccountSubscriptionLevel::AccountUpdatesAndOrders)?;
        }
        Ok(connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ChannelState::from_status(ConnectionStatus::Up), ChannelState::Connected);
        assert_eq!(
            ChannelState::from_status(ConnectionStatus::Delayed),
            ChannelState::Connecting
        );
        assert_eq!(
            ChannelState::from_status(ConnectionStatus::NotLoggedOn),
            ChannelState::Connecting
        );
        assert_eq!(
            ChannelState::from_status(ConnectionStatus::Trouble),
            ChannelState::Disconnected
        );
        assert_eq!(
            ChannelState::from_status(ConnectionStatus::Down),
            ChannelState::Disconnected
        );
    }

    #[test]
    fn test_market_data_transitions() {
        let manager = ConnectionManager::new();
        assert_eq!(manager.market_data(), ChannelState::Disconnected);

        manager.mark_connecting();
        assert_eq!(manager.market_data(), ChannelState::Connecting);
        assert_eq!(manager.trading(), ChannelState::Connecting);

        assert!(manager.on_market_data_status(ConnectionStatus::Up));
        assert_eq!(manager.market_data(), ChannelState::Connected);
        assert_eq!(manager.trading(), ChannelState::Connecting);

        assert!(!manager.on_market_data_status(ConnectionStatus::Delayed));
        assert_eq!(manager.market_data(), ChannelState::Connecting);

        manager.reset();
        assert_eq!(manager.market_data(), ChannelState::Disconnected);
    }
}
