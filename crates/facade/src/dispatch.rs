//! Notification dispatch
//!
//! One typed handler per gateway notification. A handler that fails to read
//! its payload reports the translated error through `on_error` and emits no
//! domain event for that notification.

use std::sync::Arc;

use cqg_ports::{
    AccountChangeType, AccountRef, Gateway, Notification, NotificationSink, OrderChangeType,
    PositionRef,
};
use log::{debug, error, info};

use crate::accounts::{account_info, position_info};
use crate::bars::{self, PendingBarsMap};
use crate::connection::ConnectionManager;
use crate::error::{GwResultExt, Result};
use crate::events::ApiEvents;
use crate::orders::OrderTracker;
use crate::symbols::symbol_info;

pub(crate) struct Dispatcher {
    events: Arc<dyn ApiEvents>,
    connection: Arc<ConnectionManager>,
    pending_bars: PendingBarsMap,
    orders: OrderTracker,
}

impl Dispatcher {
    pub(crate) fn new(
        events: Arc<dyn ApiEvents>,
        connection: Arc<ConnectionManager>,
        pending_bars: PendingBarsMap,
    ) -> Self {
        Self {
            events,
            connection,
            pending_bars,
            orders: OrderTracker::new(),
        }
    }

    fn handle(&mut self, gateway: &dyn Gateway, notification: Notification) -> Result<()> {
        match notification {
            Notification::DataError { description } => {
                error!("Gateway data error: {}", description);
                self.events.on_error(&description);
            }

            Notification::GatewayConnectionChanged(status) => {
                let connected = self
                    .connection
                    .on_trading_status(gateway, status)
                    .describe_with(gateway)?;
                self.events.on_trading_connection(connected);
            }

            Notification::DataConnectionChanged(status) => {
                let connected = self.connection.on_market_data_status(status);
                self.events.on_market_data_connection(connected);
            }

            Notification::AccountChanged {
                change,
                account,
                position,
            } => self.account_changed(change, account, position)?,

            Notification::InstrumentSubscribed { symbol, instrument } => {
                let info = symbol_info(&*instrument, None)?;
                info!("Symbol {} resolved to {}", symbol, info.full_name);
                self.events.on_symbol_subscribed(&symbol, &info);
            }

            Notification::InstrumentChanged { instrument, quotes } => {
                let info = symbol_info(&*instrument, quotes.as_ref())?;
                self.events.on_symbol_quote(&info);
            }

            Notification::IncorrectSymbol { symbol } => {
                info!("Symbol {} could not be resolved", symbol);
                self.events.on_symbol_error(&symbol);
            }

            Notification::OrderChanged {
                change,
                order,
                fill,
                error,
            } => {
                let info = self
                    .orders
                    .order_changed(&*order, fill.as_ref(), error.as_ref())?;
                debug!(
                    "Order {} {:?}: final={} filled={}/{}",
                    info.order_guid, change, info.is_final, info.filled_qty, info.quantity
                );
                if change == OrderChangeType::Removed {
                    self.orders.forget(&info.order_guid);
                }
                self.events.on_order_changed(&info);
            }

            Notification::TimedBarsResolved { bars, error } => {
                let result = bars::resolve(&*bars, error.as_ref(), &self.pending_bars)?;
                info!(
                    "Bars {} resolved: {} bars{}",
                    result.request_guid,
                    result.bars.len(),
                    if result.is_ok() { "" } else { " (error)" }
                );
                self.events.on_bars_received(&result);
            }

            other @ (Notification::TimedBarsAdded { .. }
            | Notification::TimedBarsUpdated { .. }
            | Notification::TimedBarsInserted { .. }
            | Notification::TimedBarsRemoved { .. }) => {
                debug!("Ignoring {}", other.kind());
            }
        }
        Ok(())
    }

    fn account_changed(
        &mut self,
        change: AccountChangeType,
        account: Option<AccountRef>,
        position: Option<PositionRef>,
    ) -> Result<()> {
        match change {
            AccountChangeType::AccountsReloaded => self.events.on_accounts_reloaded(),
            AccountChangeType::PositionsReloaded => self.events.on_positions_reloaded(),
            AccountChangeType::AccountChanged => {
                let Some(account) = account else {
                    debug!("{:?} without account payload", change);
                    return Ok(());
                };
                self.events.on_account_changed(&account_info(&*account)?);
            }
            AccountChangeType::PositionAdded | AccountChangeType::PositionChanged => {
                let (Some(account), Some(position)) = (account, position) else {
                    debug!("{:?} without account or position payload", change);
                    return Ok(());
                };
                let account = account_info(&*account)?;
                let position = position_info(&*position)?;
                self.events.on_position_changed(
                    &account,
                    &position,
                    change == AccountChangeType::PositionAdded,
                );
            }
        }
        Ok(())
    }
}

impl NotificationSink for Dispatcher {
    fn on_notification(&mut self, gateway: &dyn Gateway, notification: Notification) {
        debug!("Notification {:?}", notification);
        let kind = notification.kind();

        if let Err(e) = self.handle(gateway, notification) {
            error!("Failed to handle {}: {}", kind, e);
            self.events.on_error(&e.to_string());
        }
    }
}
