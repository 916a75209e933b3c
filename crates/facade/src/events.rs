//! Host callbacks
//!
//! [`ApiEvents`] is the sink the host hands to `Facade::initialize`. Every
//! callback runs on the gateway's callback thread, one at a time, and
//! receives snapshots the host may copy and keep.

use cqg_core::{AccountInfo, Bars, OrderInfo, PositionInfo, SymbolInfo};

pub trait ApiEvents: Send + Sync {
    /// A gateway data error or a failure while handling a notification
    fn on_error(&self, error: &str);

    fn on_market_data_connection(&self, connected: bool);

    fn on_trading_connection(&self, connected: bool);

    /// `requested_symbol` is the name passed to `request_symbol`, which may
    /// differ from `symbol.full_name`
    fn on_symbol_subscribed(&self, requested_symbol: &str, symbol: &SymbolInfo);

    fn on_symbol_error(&self, symbol: &str);

    fn on_symbol_quote(&self, symbol: &SymbolInfo);

    /// Accounts must be re-queried
    fn on_accounts_reloaded(&self);

    /// Positions must be re-queried
    fn on_positions_reloaded(&self);

    fn on_account_changed(&self, account: &AccountInfo);

    fn on_position_changed(&self, account: &AccountInfo, position: &PositionInfo, is_new: bool);

    fn on_order_changed(&self, order: &OrderInfo);

    fn on_bars_received(&self, bars: &Bars);
}

/// Owned form of every host callback
#[derive(Debug, Clone, PartialEq)]
pub enum FacadeEvent {
    Error(String),
    MarketDataConnection(bool),
    TradingConnection(bool),
    SymbolSubscribed {
        requested: String,
        symbol: SymbolInfo,
    },
    SymbolError(String),
    SymbolQuote(SymbolInfo),
    AccountsReloaded,
    PositionsReloaded,
    AccountChanged(AccountInfo),
    PositionChanged {
        account: AccountInfo,
        position: PositionInfo,
        is_new: bool,
    },
    OrderChanged(OrderInfo),
    BarsReceived(Bars),
}

/// [`ApiEvents`] that hands each callback to a closure as a [`FacadeEvent`]
///
/// Typically the closure pushes into a channel drained by a host actor.
pub struct EventForwarder<F> {
    forward: F,
}

impl<F> EventForwarder<F>
where
    F: Fn(FacadeEvent) + Send + Sync,
{
    pub fn new(forward: F) -> Self {
        Self { forward }
    }
}

impl<F> ApiEvents for EventForwarder<F>
where
    F: Fn(FacadeEvent) + Send + Sync,
{
    fn on_error(&self, error: &str) {
        (self.forward)(FacadeEvent::Error(error.to_string()));
    }

    fn on_market_data_connection(&self, connected: bool) {
        (self.forward)(FacadeEvent::MarketDataConnection(connected));
    }

    fn on_trading_connection(&self, connected: bool) {
        (self.forward)(FacadeEvent::TradingConnection(connected));
    }

    fn on_symbol_subscribed(&self, requested_symbol: &str, symbol: &SymbolInfo) {
        (self.forward)(FacadeEvent::SymbolSubscribed {
            requested: requested_symbol.to_string(),
            symbol: symbol.clone(),
        });
    }

    fn on_symbol_error(&self, symbol: &str) {
        (self.forward)(FacadeEvent::SymbolError(symbol.to_string()));
    }

    fn on_symbol_quote(&self, symbol: &SymbolInfo) {
        (self.forward)(FacadeEvent::SymbolQuote(symbol.clone()));
    }

    fn on_accounts_reloaded(&self) {
        (self.forward)(FacadeEvent::AccountsReloaded);
    }

    fn on_positions_reloaded(&self) {
        (self.forward)(FacadeEvent::PositionsReloaded);
    }

    fn on_account_changed(&self, account: &AccountInfo) {
        (self.forward)(FacadeEvent::AccountChanged(account.clone()));
    }

    fn on_position_changed(&self, account: &AccountInfo, position: &PositionInfo, is_new: bool) {
        (self.forward)(FacadeEvent::PositionChanged {
            account: account.clone(),
            position: position.clone(),
            is_new,
        });
    }

    fn on_order_changed(&self, order: &OrderInfo) {
        (self.forward)(FacadeEvent::OrderChanged(order.clone()));
    }

    fn on_bars_received(&self, bars: &Bars) {
        (self.forward)(FacadeEvent::BarsReceived(bars.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_forwarder_owns_snapshots() {
        let (tx, rx) = mpsc::channel();
        let forwarder = EventForwarder::new(move |event| {
            let _ = tx.send(event);
        });

        let symbol = SymbolInfo::new("F.US.EPH5");
        forwarder.on_symbol_subscribed("EP", &symbol);
        forwarder.on_trading_connection(true);

        assert_eq!(
            rx.recv().unwrap(),
            FacadeEvent::SymbolSubscribed {
                requested: "EP".to_string(),
                symbol,
            }
        );
        assert_eq!(rx.recv().unwrap(), FacadeEvent::TradingConnection(true));
    }
}
