//! CQG Facade Core Domain
//!
//! Value snapshots handed to the host application by the facade.
//! This crate contains no I/O and holds no reference to the gateway:
//! every type here is a plain copy the host owns once delivered.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Accounts
    AccountInfo,
    PositionInfo,
    // Market data
    Quote,
    QuoteType,
    SymbolInfo,
    // Orders
    FillInfo,
    OrderInfo,
    OrderType,
    PriceRoles,
    // Timed bars
    ALL_SESSIONS,
    BarInfo,
    Bars,
    BarsRange,
    BarsRequest,
    PRIMARY_SESSION,
};
pub use values::{
    INVALID_MONEY_AMOUNT, INVALID_PRICE, INVALID_VOLUME, Id, MoneyAmount, OrderPrice, Price,
    Quantity, Timestamp, Volume,
};
