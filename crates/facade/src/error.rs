//! Error types for the facade crate

use cqg_core::Id;
use cqg_ports::{GwObject, GwResult, ResultCode};
use thiserror::Error;

use crate::translate;

/// Facade-level errors
///
/// The `Display` text of each variant is what the last-error accessor reports.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FacadeError {
    #[error("Gateway connector not initialized")]
    NotInitialized,

    #[error("Gateway connector already initialized")]
    AlreadyInitialized,

    #[error("Unable to initialize gateway connector: {0}")]
    Initialization(String),

    /// A gateway call failed; `message` is the translated description
    #[error("{message}")]
    Gateway { code: ResultCode, message: String },

    #[error("Account {0} not found")]
    AccountNotFound(Id),

    #[error("Instrument {0} not found")]
    InstrumentNotFound(String),

    #[error("Order with given guid not found.")]
    OrderNotFound,

    #[error("Order cannot be cancelled.")]
    OrderNotCancellable,
}

impl FacadeError {
    /// Translate a failed gateway call raised by `source`
    pub fn gateway<O: GwObject + ?Sized>(code: ResultCode, source: &O) -> Self {
        FacadeError::Gateway {
            code,
            message: translate::describe(code, Some(source)),
        }
    }

    /// Result code of a gateway failure
    pub fn code(&self) -> Option<ResultCode> {
        match self {
            FacadeError::Gateway { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result type for facade operations
pub type Result<T> = std::result::Result<T, FacadeError>;

/// Attach the failing object to a gateway result
pub(crate) trait GwResultExt<T> {
    fn describe_with<O: GwObject + ?Sized>(self, source: &O) -> Result<T>;
}

impl<T> GwResultExt<T> for GwResult<T> {
    fn describe_with<O: GwObject + ?Sized>(self, source: &O) -> Result<T> {
        self.map_err(|code| FacadeError::gateway(code, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rich;

    impl GwObject for Rich {
        fn supports_error_info(&self) -> bool {
            true
        }

        fn error_description(&self) -> Option<String> {
            Some("Account is blocked".to_string())
        }
    }

    #[test]
    fn test_describe_with_uses_source() {
        let result: GwResult<()> = Err(ResultCode::FAIL);
        let err = result.describe_with(&Rich).unwrap_err();
        assert_eq!(err.code(), Some(ResultCode::FAIL));
        assert_eq!(
            err.to_string(),
            "Gateway error occurred. Description: Account is blocked"
        );
    }

    #[test]
    fn test_validation_messages_are_distinct() {
        assert_ne!(
            FacadeError::OrderNotFound.to_string(),
            FacadeError::OrderNotCancellable.to_string()
        );
        assert_eq!(FacadeError::OrderNotFound.code(), None);
    }
}
