use cqg_facade::FacadeError;
use cqg_ports::ConfigError;
use thiserror::Error;

/// Errors that stop the demo
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Facade error: {0}")]
    Facade(#[from] FacadeError),

    #[error("Report serialization failed: {0}")]
    Report(#[from] serde_json::Error),
}
