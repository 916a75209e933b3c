use std::fmt;

use crate::gateway::{
    AccountChangeType, AccountRef, ConnectionStatus, ErrorRef, FillRef, Gateway, InstrumentRef,
    OrderChangeType, OrderRef, PositionRef, QuotesRef, TimedBarsRef,
};

/// One gateway event, tagged by kind with its typed payload
pub enum Notification {
    /// Discrepancy between expected and received data; also raised when
    /// the connector fails to start
    DataError { description: String },

    /// Trading server connection status changed
    GatewayConnectionChanged(ConnectionStatus),

    /// Market data connection status changed
    DataConnectionChanged(ConnectionStatus),

    AccountChanged {
        change: AccountChangeType,
        account: Option<AccountRef>,
        position: Option<PositionRef>,
    },

    /// Requested symbol resolved and subscribed
    InstrumentSubscribed {
        symbol: String,
        instrument: InstrumentRef,
    },

    /// Quotes or dynamic properties of an instrument changed
    InstrumentChanged {
        instrument: InstrumentRef,
        quotes: Option<QuotesRef>,
    },

    /// Requested symbol is not tradable
    IncorrectSymbol { symbol: String },

    OrderChanged {
        change: OrderChangeType,
        order: OrderRef,
        fill: Option<FillRef>,
        error: Option<ErrorRef>,
    },

    TimedBarsResolved {
        bars: TimedBarsRef,
        error: Option<ErrorRef>,
    },
    TimedBarsAdded {
        bars: TimedBarsRef,
    },
    TimedBarsUpdated {
        bars: TimedBarsRef,
        index: usize,
    },
    TimedBarsInserted {
        bars: TimedBarsRef,
        index: usize,
    },
    TimedBarsRemoved {
        bars: TimedBarsRef,
        index: usize,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DataError { .. } => "data_error",
            Self::GatewayConnectionChanged(_) => "gw_connection_changed",
            Self::DataConnectionChanged(_) => "data_connection_changed",
            Self::AccountChanged { .. } => "account_changed",
            Self::InstrumentSubscribed { .. } => "instrument_subscribed",
            Self::InstrumentChanged { .. } => "instrument_changed",
            Self::IncorrectSymbol { .. } => "incorrect_symbol",
            Self::OrderChanged { .. } => "order_changed",
            Self::TimedBarsResolved { .. } => "timed_bars_resolved",
            Self::TimedBarsAdded { .. } => "timed_bars_added",
            Self::TimedBarsUpdated { .. } => "timed_bars_updated",
            Self::TimedBarsInserted { .. } => "timed_bars_inserted",
            Self::TimedBarsRemoved { .. } => "timed_bars_removed",
        }
    }
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataError { description } => {
                write!(f, "DataError({description})")
            }
            Self::GatewayConnectionChanged(status) | Self::DataConnectionChanged(status) => {
                write!(f, "{}({status:?})", self.kind())
            }
            Self::AccountChanged { change, .. } => write!(f, "AccountChanged({change:?})"),
            Self::InstrumentSubscribed { symbol, .. } | Self::IncorrectSymbol { symbol } => {
                write!(f, "{}({symbol})", self.kind())
            }
            Self::OrderChanged { change, .. } => write!(f, "OrderChanged({change:?})"),
            _ => f.write_str(self.kind()),
        }
    }
}

/// Receiver of gateway notifications.
///
/// The connector invokes it from its single callback thread, one
/// notification at a time, passing itself so handlers can call back in.
pub trait NotificationSink: Send {
    fn on_notification(&mut self, gateway: &dyn Gateway, notification: Notification);
}
