//! CQG Ports
//!
//! Port definitions (traits) for the gateway connector the facade drives.
//! The connector is opaque: every object it hands out is reached through
//! fallible getters returning a [`ResultCode`] on failure, collections are
//! foreign enumerables, and notifications arrive as one tagged [`Notification`]
//! per gateway event on the connector's callback thread.

mod collection;
mod config;
mod error;
mod gateway;
mod notification;
mod object;
mod ole;

pub use collection::{ForeignCollection, ForeignEnumerator};
pub use config::{ConnectorConfig, InstrumentSubscriptionLevel, PositionSubscriptionLevel, TimeZone};
pub use error::{ConfigError, GwResult, ResultCode};
pub use gateway::{
    AccountChangeType, AccountRef, AccountSubscriptionLevel, ConnectionStatus, ErrorRef, FillRef,
    FillStatus, Gateway, GatewayFactory, GwAccount, GwAccountSummary, GwAccounts, GwEnvironment,
    GwError, GwFill, GwInstrument, GwInstruments, GwOrder, GwOrderSide, GwOrderType, GwOrders,
    GwPosition, GwQuote, GwTimedBar, GwTimedBars, GwTimedBarsRequest, InstrumentRef, NewOrder,
    OrderChangeType, OrderRef, PositionRef, PositionsRef, QuoteRef, QuotesRef, RangeBound,
    RawQuoteType, RequestStatus, TimedBarRef, TimedBarsRef,
};
pub use notification::{Notification, NotificationSink};
pub use object::GwObject;
pub use ole::OleDate;
