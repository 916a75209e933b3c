/// Base of every object handed out by the gateway connector
pub trait GwObject: Send + Sync {
    /// Whether the connector still considers the object alive and populated
    fn is_valid(&self) -> bool {
        true
    }

    /// Whether the object can describe its last failure in detail
    fn supports_error_info(&self) -> bool {
        false
    }

    /// Detailed description of the last failure raised by this object
    fn error_description(&self) -> Option<String> {
        None
    }
}
