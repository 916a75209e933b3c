//! CQG Runner - console demo host
//!
//! Wires the facade to the simulated gateway connector and walks through a
//! typical session:
//!
//! ```text
//!   timer ──pump──► SimGateway ──notifications──► Facade
//!                                                   │ ApiEvents
//!                                                   ▼
//!   DemoSession ◄──── mpsc ◄──── EventForwarder ◄───┘
//!        │
//!        └── facade calls (logon, symbols, orders, bars)
//! ```

pub mod config;
pub mod error;
pub mod run;
pub mod session;

// Re-export main types
pub use config::RunnerConfig;
pub use error::RunnerError;
pub use run::run;
pub use session::{DemoSession, Flow, SessionReport};
