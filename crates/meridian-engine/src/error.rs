//! Engine lifecycle errors

use thiserror::Error;

/// Errors from the engine facade itself
///
/// Store operations surface their own `TopologyError` through the
/// delegating methods; this enum covers only the lifecycle.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `start()` was called on a running engine
    #[error("Engine already started")]
    AlreadyStarted,
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
