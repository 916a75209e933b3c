//! CQG Facade
//!
//! Turns the stateful, notification-driven gateway connector into a small
//! contract for a host application: synchronous calls that return at the
//! "accepted" boundary, plus typed callbacks on an [`ApiEvents`] sink.
//!
//! ## Architecture
//!
//! ```text
//!   Host ──calls──► Facade ──────────────► Gateway connector
//!    ▲                │ (accounts, orders,       │
//!    │                │  bars, line time)        │ notifications
//!    │                ▼                          ▼
//!    └──ApiEvents── Dispatcher ◄──────── NotificationSink
//!                   ├─ ConnectionManager
//!                   ├─ symbols / accounts
//!                   ├─ OrderTracker
//!                   └─ bars (pending requests)
//! ```
//!
//! Notifications are handled one at a time on the connector's callback
//! thread. The facade itself does no locking; see [`Facade`].

pub mod accounts;
pub mod bars;
pub mod collection;
pub mod connection;
mod connector;
mod dispatch;
pub mod error;
pub mod events;
pub mod facade;
pub mod orders;
pub mod symbols;
pub mod translate;

// Re-export commonly used types
pub use bars::{BARS_NOT_SUCCESSFUL, BarsSlot, PendingBars};
pub use collection::{CollectionIter, iterate};
pub use connection::{ChannelState, ConnectionManager};
pub use error::{FacadeError, Result};
pub use events::{ApiEvents, EventForwarder, FacadeEvent};
pub use facade::{Facade, FacadeVersion};
pub use orders::{OrderScope, OrderTicket, OrderTracker, WorkingCount};
pub use translate::{describe, describe_code};
