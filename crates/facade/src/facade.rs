//! The facade
//!
//! Synchronous calls from the host go straight to the gateway and return at
//! the "accepted" boundary; everything asynchronous comes back through the
//! host's [`ApiEvents`] sink.
//!
//! The facade does no internal locking. Calls must be serialized by the host
//! (one owner, or an actor in front of it), and must not be issued from
//! inside an [`ApiEvents`] callback.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use cqg_core::{AccountInfo, BarsRequest, Id, PositionInfo};
use cqg_ports::{ConnectorConfig, Gateway, GatewayFactory};
use log::{info, warn};

use crate::accounts;
use crate::bars::{self, PendingBarsMap};
use crate::connection::{ChannelState, ConnectionManager};
use crate::connector::Connector;
use crate::dispatch::Dispatcher;
use crate::error::{FacadeError, GwResultExt, Result};
use crate::events::ApiEvents;
use crate::orders::{self, OrderScope, OrderTicket};

/// Version of the facade contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FacadeVersion {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for FacadeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

enum Lifecycle {
    Fresh,
    Running(Connector),
    /// Initialization failed; the instance stays unusable
    Failed,
    Finalized,
}

pub struct Facade {
    factory: Box<dyn GatewayFactory>,
    config: ConnectorConfig,
    lifecycle: Lifecycle,
    connection: Arc<ConnectionManager>,
    pending_bars: PendingBarsMap,
    last_error: String,
}

impl Facade {
    pub fn new(factory: impl GatewayFactory + 'static) -> Self {
        Self::with_config(factory, ConnectorConfig::default())
    }

    pub fn with_config(factory: impl GatewayFactory + 'static, config: ConnectorConfig) -> Self {
        Self {
            factory: Box::new(factory),
            config,
            lifecycle: Lifecycle::Fresh,
            connection: Arc::new(ConnectionManager::new()),
            pending_bars: PendingBarsMap::default(),
            last_error: String::new(),
        }
    }

    pub fn version() -> FacadeVersion {
        FacadeVersion {
            major: 0,
            minor: 13,
        }
    }

    /// Whether the connector is up and owned by this instance
    pub fn is_valid(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Running(_))
    }

    /// Description of the last failed operation, empty after a success
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    pub fn market_data_state(&self) -> ChannelState {
        self.connection.market_data()
    }

    pub fn trading_state(&self) -> ChannelState {
        self.connection.trading()
    }

    /// Bring up the connector and route its notifications to `events`
    ///
    /// Only the first call on an instance can succeed. A failed instance
    /// stays failed.
    pub fn initialize(&mut self, events: Arc<dyn ApiEvents>) -> Result<()> {
        self.last_error.clear();

        if !matches!(self.lifecycle, Lifecycle::Fresh) {
            return self.fail(FacadeError::AlreadyInitialized);
        }

        let sink = Dispatcher::new(
            events,
            Arc::clone(&self.connection),
            Arc::clone(&self.pending_bars),
        );

        // Statuses delivered during startup take precedence
        self.connection.mark_connecting();
        match Connector::start(self.factory.as_ref(), &self.config, Box::new(sink)) {
            Ok(connector) => {
                self.lifecycle = Lifecycle::Running(connector);
                info!("Facade {} initialized", Self::version());
                Ok(())
            }
            Err(e) => {
                self.connection.reset();
                self.lifecycle = Lifecycle::Failed;
                self.fail(e)
            }
        }
    }

    /// Unadvise and release the connector; also done on drop
    pub fn finalize(&mut self) {
        if !self.is_valid() {
            return;
        }

        // Dropping the connector unadvises before shutting down
        self.lifecycle = Lifecycle::Finalized;
        self.connection.reset();
        self.pending_bars.clear();
        info!("Facade finalized");
    }

    /// Start resolving `symbol`; the outcome arrives as `on_symbol_subscribed`
    /// or `on_symbol_error`
    pub fn request_symbol(&mut self, symbol: &str) -> Result<()> {
        self.guarded(|gateway| gateway.new_instrument(symbol).describe_with(gateway))
    }

    /// Submit a bars request; returns the id `on_bars_received` will carry
    pub fn request_bars(&mut self, request: &BarsRequest) -> Result<String> {
        let pending = Arc::clone(&self.pending_bars);
        self.guarded(|gateway| bars::request_bars(gateway, request, &pending))
    }

    pub fn logon_to_gateway(&mut self, user: &str, password: &str) -> Result<()> {
        self.guarded(|gateway| gateway.gw_logon(user, password).describe_with(gateway))
    }

    /// Current Line Time, `None` when unknown or unavailable
    pub fn line_time(&mut self) -> Option<NaiveDateTime> {
        self.guarded(|gateway| {
            let environment = gateway.environment().describe_with(gateway)?;
            let line_time = environment.line_time().describe_with(&*environment)?;
            Ok(line_time.to_datetime())
        })
        .ok()
        .flatten()
    }

    pub fn accounts(&mut self) -> Result<Vec<AccountInfo>> {
        self.guarded(accounts::list_accounts)
    }

    /// Positions of one account; unknown accounts fail
    pub fn positions(&mut self, gw_account_id: Id) -> Result<Vec<PositionInfo>> {
        self.guarded(|gateway| accounts::list_positions(gateway, gw_account_id))
    }

    /// Non-final orders visible for the account, or for all accounts
    ///
    /// On an enumeration failure the partial count is returned and
    /// `last_error` is set.
    pub fn all_working_orders_count(&mut self, gw_account_id: Option<Id>) -> usize {
        self.working_orders_count(gw_account_id, OrderScope::All)
    }

    /// Like [`Facade::all_working_orders_count`], restricted to orders
    /// placed through this connection
    pub fn internal_working_orders_count(&mut self, gw_account_id: Option<Id>) -> usize {
        self.working_orders_count(gw_account_id, OrderScope::Internal)
    }

    fn working_orders_count(&mut self, gw_account_id: Option<Id>, scope: OrderScope) -> usize {
        let counted = self.guarded(|gateway| {
            let orders = orders::order_collection(gateway, gw_account_id, scope)?;
            Ok(orders::count_working(orders.as_ref()))
        });

        match counted {
            Ok(working) => {
                if let Some(e) = working.error {
                    self.last_error = e.to_string();
                }
                working.count
            }
            Err(_) => 0,
        }
    }

    /// Place an order; returns its GUID
    pub fn place_order(&mut self, ticket: &OrderTicket) -> Result<String> {
        self.guarded(|gateway| orders::place_order(gateway, ticket))
    }

    /// Submit a cancel; completion arrives as a final `on_order_changed`
    pub fn cancel_order(&mut self, order_guid: &str) -> Result<()> {
        self.guarded(|gateway| orders::cancel_order(gateway, order_guid))
    }

    /// Bulk cancel; `None` filters select every account / every symbol
    pub fn cancel_all_orders(&mut self, gw_account_id: Option<Id>, symbol: Option<&str>) -> Result<()> {
        self.guarded(|gateway| orders::cancel_all_orders(gateway, gw_account_id, symbol))
    }

    /// Run `op` against a running connector, recording its failure
    fn guarded<T>(&mut self, op: impl FnOnce(&dyn Gateway) -> Result<T>) -> Result<T> {
        self.last_error.clear();

        let result = match &self.lifecycle {
            Lifecycle::Running(connector) => op(connector.gateway()),
            _ => Err(FacadeError::NotInitialized),
        };

        match result {
            Ok(value) => Ok(value),
            Err(e) => self.fail(e),
        }
    }

    fn fail<T>(&mut self, e: FacadeError) -> Result<T> {
        warn!("{}", e);
        self.last_error = e.to_string();
        Err(e)
    }
}

impl Drop for Facade {
    fn drop(&mut self) {
        self.finalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqg_ports::{GwResult, ResultCode};

    fn failing_factory() -> GwResult<Arc<dyn Gateway>> {
        Err(ResultCode::ACCESS_DENIED)
    }

    #[test]
    fn test_version() {
        assert_eq!(Facade::version().to_string(), "0.13");
    }

    #[test]
    fn test_uninitialized_calls_fail() {
        let mut facade = Facade::new(failing_factory);
        assert!(!facade.is_valid());

        assert_eq!(facade.accounts(), Err(FacadeError::NotInitialized));
        assert!(!facade.last_error().is_empty());

        assert_eq!(facade.positions(1), Err(FacadeError::NotInitialized));
        assert_eq!(facade.all_working_orders_count(None), 0);
        assert_eq!(facade.line_time(), None);
        assert_eq!(facade.market_data_state(), ChannelState::Disconnected);
    }
}
