//! Engine error taxonomy.
//!
//! Per-object server rejections are not errors at this level — they become
//! `Skipped` outcomes and report lines. Only failures that invalidate the
//! whole run (transport, authentication) or an exhausted rename sequence
//! surface here.

use polimport_api::ApiError;
use thiserror::Error;

/// Errors raised by the reconciliation engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A non-recoverable API failure (transport, auth, parse).
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Every rename candidate up to the attempt bound collided.
    #[error("rename attempts exhausted for '{name}' after {attempts} candidates")]
    RenameExhausted { name: String, attempts: u32 },
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
