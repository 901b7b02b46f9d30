//! Error types for the Conduit framework.

use thiserror::Error;

/// Errors reported by the parameter core.
///
/// None of these are fatal. Schema errors indicate a programming mistake in
/// a statically known ID space; the rest are handled locally by the caller.
#[derive(Debug, Error)]
pub enum ParameterError {
    /// A parameter definition violates its range/default invariants.
    #[error("invalid definition for '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },

    /// `ParameterSet::get` was asked for an ID that was never added.
    #[error("parameter {0} not found")]
    NotFound(String),

    /// `ParameterSet::try_add` was given an ID that is already present.
    #[error("parameter {0} already defined")]
    DuplicateId(String),

    /// A manager read/write path was given an ID unknown to its store.
    #[error("unknown parameter {0}")]
    UnknownParameter(String),

    /// A parameter group produced an ordinal that does not name an ID.
    #[error("group offset produced unmapped ordinal {0}")]
    InvalidGroupOffset(u32),

    /// Persisted state could not be produced or consumed.
    #[error("state error: {0}")]
    State(String),
}

impl From<serde_json::Error> for ParameterError {
    fn from(err: serde_json::Error) -> Self {
        Self::State(err.to_string())
    }
}

/// Result type for Conduit operations.
pub type ParameterResult<T> = Result<T, ParameterError>;
