use crate::error::GwResult;
use crate::object::GwObject;

/// Enumerable collection exposed by the gateway
pub trait ForeignCollection<T>: GwObject {
    /// Number of items currently held
    fn count(&self) -> GwResult<usize>;

    /// Start a new forward-only enumeration
    fn new_enum(&self) -> GwResult<Box<dyn ForeignEnumerator<T>>>;
}

/// Cursor over a [`ForeignCollection`]
pub trait ForeignEnumerator<T>: Send {
    /// Rewind to the first item
    fn reset(&mut self) -> GwResult<()>;

    /// Next item, `Ok(None)` once exhausted
    fn next(&mut self) -> GwResult<Option<T>>;
}
