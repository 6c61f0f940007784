//! Error definitions for the mapping module

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    /// Two events registered under the same name
    #[error("Duplicate event name: {0}")]
    DuplicateEvent(String),

    /// Hat bind built from a value without any direction bit
    #[error("Invalid hat position: {0:#x}")]
    InvalidHatDirection(u8),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Unknown bind")]
    UnknownBind,

    /// Bind text that no bind group understands
    #[error("Invalid bind spec: {0}")]
    InvalidBindSpec(String),

    /// Physical input beyond what the bind group exposes
    #[error("Bind target out of range: {0}")]
    OutOfRange(String),

    /// Handler events may only be bound to keys
    #[error("Event {0} only accepts keyboard binds")]
    KeyboardOnly(String),
}
