//! CQG Gateway Simulator
//!
//! An in-process stand-in for the gateway connector. It implements the
//! `cqg-ports` traits over a configurable book of accounts, instruments and
//! orders, queues notifications until the host pumps them, and lets tests
//! script connection changes, fills, rejections and injected failures.

mod config;
mod faults;
mod gateway;
mod objects;
mod order;

pub use config::{SimAccountConfig, SimConfig, SimInstrumentConfig, SimPositionConfig};
pub use faults::SimOp;
pub use gateway::{CancelAllRecord, RecordedBarsRequest, SimGateway};
pub use objects::SimFillLeg;
pub use order::CreatedOrder;
