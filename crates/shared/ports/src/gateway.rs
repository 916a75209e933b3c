use std::sync::Arc;

use cqg_core::{Id, Price, Quantity, Volume};
use serde::{Deserialize, Serialize};

use crate::collection::ForeignCollection;
use crate::config::ConnectorConfig;
use crate::error::GwResult;
use crate::notification::NotificationSink;
use crate::object::GwObject;
use crate::ole::OleDate;

pub type AccountRef = Arc<dyn GwAccount>;
pub type PositionRef = Arc<dyn GwPosition>;
pub type PositionsRef = Arc<dyn ForeignCollection<PositionRef>>;
pub type InstrumentRef = Arc<dyn GwInstrument>;
pub type QuoteRef = Arc<dyn GwQuote>;
pub type QuotesRef = Arc<dyn ForeignCollection<QuoteRef>>;
pub type OrderRef = Arc<dyn GwOrder>;
pub type FillRef = Arc<dyn GwFill>;
pub type ErrorRef = Arc<dyn GwError>;
pub type TimedBarsRef = Arc<dyn GwTimedBars>;
pub type TimedBarRef = Arc<dyn GwTimedBar>;

/// Connection status pushed for the market data and trading channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Up,
    Down,
    Delayed,
    NotLoggedOn,
    Trouble,
}

/// Change tag carried by account notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountChangeType {
    AccountsReloaded,
    PositionsReloaded,
    AccountChanged,
    PositionAdded,
    PositionChanged,
}

/// Which account streams the connector pushes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountSubscriptionLevel {
    None,
    Accounts,
    AccountUpdates,
    AccountUpdatesAndOrders,
}

/// Change tag carried by order notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderChangeType {
    Added,
    Changed,
    Removed,
}

/// Status of a fill batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FillStatus {
    Normal,
    Canceled,
    Busted,
    Corrected,
}

impl FillStatus {
    /// Legs of a canceled or busted batch no longer count
    pub fn voids_legs(&self) -> bool {
        matches!(self, Self::Canceled | Self::Busted)
    }
}

/// Status of an asynchronous request (timed bars)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    InProgress,
    Success,
    Failed,
    Cancelled,
    Busted,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in progress",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Busted => "busted",
        }
    }
}

/// Quote type as the connector reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawQuoteType {
    Ask,
    Bid,
    Trade,
    YesterdaySettlement,
    DayHigh,
    DayLow,
    DayOpen,
    Settlement,
    ImpliedAsk,
    ImpliedBid,
    Other(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GwOrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GwOrderSide {
    Undefined,
    Buy,
    Sell,
}

/// One end of a timed bars range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RangeBound {
    Date(OleDate),
    Index(i32),
}

pub trait GwAccountSummary: GwObject {
    fn balance(&self, currency_index: usize) -> GwResult<f64>;
    fn ote(&self, currency_index: usize) -> GwResult<f64>;
    fn profit_loss(&self, currency_index: usize) -> GwResult<f64>;
}

pub trait GwAccount: GwObject {
    fn fcm_id(&self) -> GwResult<Id>;
    fn fcm_account_id(&self) -> GwResult<String>;
    fn gw_account_id(&self) -> GwResult<Id>;
    fn gw_account_name(&self) -> GwResult<String>;
    fn reporting_currency(&self) -> GwResult<String>;
    fn summary(&self) -> GwResult<Arc<dyn GwAccountSummary>>;
    fn positions(&self) -> GwResult<PositionsRef>;
    /// Every order visible for the account
    fn orders(&self) -> GwResult<Arc<dyn GwOrders>>;
    /// Orders placed through this connection
    fn internal_orders(&self) -> GwResult<Arc<dyn GwOrders>>;
}

pub trait GwAccounts: ForeignCollection<AccountRef> {
    /// `Ok(None)` when no account has the id
    fn item(&self, gw_account_id: Id) -> GwResult<Option<AccountRef>>;
}

pub trait GwPosition: GwObject {
    fn instrument_name(&self) -> GwResult<String>;
    fn side(&self) -> GwResult<GwOrderSide>;
    fn quantity(&self) -> GwResult<i64>;
    fn average_price(&self) -> GwResult<Price>;
    fn ote(&self) -> GwResult<f64>;
    fn profit_loss(&self) -> GwResult<f64>;
}

pub trait GwQuote: GwObject {
    fn quote_type(&self) -> GwResult<RawQuoteType>;
    fn price(&self) -> GwResult<Price>;
    fn volume(&self) -> GwResult<Volume>;
}

pub trait GwInstrument: GwObject {
    fn full_name(&self) -> GwResult<String>;
    fn quotes(&self) -> GwResult<QuotesRef>;
}

pub trait GwInstruments: ForeignCollection<InstrumentRef> {
    /// Subscribed instrument by full name, `Ok(None)` when unknown
    fn item(&self, full_name: &str) -> GwResult<Option<InstrumentRef>>;
}

pub trait GwOrder: GwObject {
    /// Client correlation id
    fn guid(&self) -> GwResult<String>;
    /// Broker-assigned id
    fn original_order_id(&self) -> GwResult<String>;
    fn instrument_name(&self) -> GwResult<String>;
    fn account(&self) -> GwResult<AccountRef>;
    fn side(&self) -> GwResult<GwOrderSide>;
    fn is_final(&self) -> GwResult<bool>;
    fn quantity(&self) -> GwResult<i64>;
    fn filled_quantity(&self) -> GwResult<i64>;
    fn description(&self) -> GwResult<String>;
    fn set_description(&self, description: &str) -> GwResult<()>;
    fn can_be_cancelled(&self) -> GwResult<bool>;
    fn place(&self) -> GwResult<()>;
    fn cancel(&self) -> GwResult<()>;
}

pub trait GwOrders: ForeignCollection<OrderRef> {
    /// `Ok(None)` when no order carries the guid
    fn item_by_guid(&self, guid: &str) -> GwResult<Option<OrderRef>>;
}

pub trait GwFill: GwObject {
    fn status(&self) -> GwResult<FillStatus>;
    fn leg_count(&self) -> GwResult<usize>;
    fn instrument_name(&self, leg: usize) -> GwResult<String>;
    fn price(&self, leg: usize) -> GwResult<Price>;
    fn quantity(&self, leg: usize) -> GwResult<Volume>;
}

pub trait GwError: GwObject {
    fn description(&self) -> GwResult<String>;
}

/// Builder object for a timed bars series request
pub trait GwTimedBarsRequest: GwObject {
    fn set_symbol(&mut self, symbol: &str) -> GwResult<()>;
    fn set_range_start(&mut self, bound: RangeBound) -> GwResult<()>;
    fn set_range_end(&mut self, bound: RangeBound) -> GwResult<()>;
    fn set_intraday_period(&mut self, minutes: i32) -> GwResult<()>;
    fn set_sessions_filter(&mut self, filter: i32) -> GwResult<()>;

    fn symbol(&self) -> &str;
    fn range_start(&self) -> Option<RangeBound>;
    fn range_end(&self) -> Option<RangeBound>;
    fn intraday_period(&self) -> i32;
    fn sessions_filter(&self) -> i32;
}

pub trait GwTimedBars: GwObject {
    /// Request id, stable from submission to resolution
    fn id(&self) -> GwResult<String>;
    fn status(&self) -> GwResult<RequestStatus>;
    fn count(&self) -> GwResult<usize>;
    fn item(&self, index: usize) -> GwResult<TimedBarRef>;
}

pub trait GwTimedBar: GwObject {
    fn timestamp(&self) -> GwResult<OleDate>;
    fn open(&self) -> GwResult<Price>;
    fn high(&self) -> GwResult<Price>;
    fn low(&self) -> GwResult<Price>;
    fn close(&self) -> GwResult<Price>;
}

pub trait GwEnvironment: GwObject {
    /// Current Line Time, zero when unknown
    fn line_time(&self) -> GwResult<OleDate>;
}

/// Arguments of [`Gateway::create_order`]
pub struct NewOrder<'a> {
    pub order_type: GwOrderType,
    pub instrument: &'a InstrumentRef,
    pub account: &'a AccountRef,
    pub quantity: Quantity,
    pub side: GwOrderSide,
    /// 0.0 when the order type takes no limit price
    pub limit_price: Price,
    /// 0.0 when the order type takes no stop price
    pub stop_price: Price,
    pub user_data: &'a str,
}

/// Port for the external gateway connector
///
/// All calls are synchronous and return at the "accepted" boundary; their
/// outcomes arrive later as [`Notification`](crate::Notification)s on the
/// connector's callback thread.
pub trait Gateway: GwObject {
    /// Apply behavior settings, before [`Gateway::startup`]
    fn configure(&self, config: &ConnectorConfig) -> GwResult<()>;

    /// Register the notification sink
    fn advise(&self, sink: Box<dyn NotificationSink>) -> GwResult<()>;

    /// Drop the notification sink; no notification is delivered afterwards
    fn unadvise(&self) -> GwResult<()>;

    fn startup(&self) -> GwResult<()>;
    fn shutdown(&self) -> GwResult<()>;

    fn set_account_subscription_level(&self, level: AccountSubscriptionLevel) -> GwResult<()>;

    /// Start resolving a symbol; the outcome is notified
    fn new_instrument(&self, symbol: &str) -> GwResult<()>;
    fn instruments(&self) -> GwResult<Arc<dyn GwInstruments>>;

    fn accounts(&self) -> GwResult<Arc<dyn GwAccounts>>;
    fn orders(&self) -> GwResult<Arc<dyn GwOrders>>;
    fn internal_orders(&self) -> GwResult<Arc<dyn GwOrders>>;

    fn create_order(&self, order: &NewOrder<'_>) -> GwResult<OrderRef>;

    /// `None` filters select every account / every instrument
    fn cancel_all_orders(
        &self,
        account: Option<&AccountRef>,
        instrument: Option<&InstrumentRef>,
    ) -> GwResult<()>;

    fn create_timed_bars_request(&self) -> GwResult<Box<dyn GwTimedBarsRequest>>;
    fn request_timed_bars(&self, request: &dyn GwTimedBarsRequest) -> GwResult<TimedBarsRef>;

    fn environment(&self) -> GwResult<Arc<dyn GwEnvironment>>;

    fn gw_logon(&self, user: &str, password: &str) -> GwResult<()>;
}

/// Constructs a gateway connector
pub trait GatewayFactory: Send {
    fn create(&self) -> GwResult<Arc<dyn Gateway>>;
}

impl<F> GatewayFactory for F
where
    F: Fn() -> GwResult<Arc<dyn Gateway>> + Send,
{
    fn create(&self) -> GwResult<Arc<dyn Gateway>> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Ensure ports are object-safe
    fn _assert_gateway_object_safe(_: &dyn Gateway) {}
    fn _assert_orders_object_safe(_: &dyn GwOrders) {}
    fn _assert_request_object_safe(_: &mut dyn GwTimedBarsRequest) {}

    #[test]
    fn test_fill_status_voids_legs() {
        assert!(FillStatus::Canceled.voids_legs());
        assert!(FillStatus::Busted.voids_legs());
        assert!(!FillStatus::Normal.voids_legs());
        assert!(!FillStatus::Corrected.voids_legs());
    }
}
