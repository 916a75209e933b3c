mod account;
mod bars;
mod order;
mod order_type;
mod position;
mod quote;
mod symbol;

pub use account::AccountInfo;
pub use bars::{ALL_SESSIONS, BarInfo, Bars, BarsRange, BarsRequest, PRIMARY_SESSION};
pub use order::{FillInfo, OrderInfo};
pub use order_type::{OrderType, PriceRoles};
pub use position::PositionInfo;
pub use quote::{Quote, QuoteType};
pub use symbol::SymbolInfo;
