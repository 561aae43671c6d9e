//! Crate-wide error type shared by the data model.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("unknown slot name: {0}")]
    UnknownSlot(String),

    #[error("unknown intent: {0}")]
    UnknownIntent(String),

    #[error("schema version {found} is not supported (expected {expected})")]
    SchemaMismatch { expected: u32, found: u32 },
}
