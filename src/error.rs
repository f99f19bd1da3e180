//! Error types for instrumentation, the catalog and settings.
//!
//! `HookError` never leaves the crate's public hook operations: the guard
//! turns it into a `HookOutcome`. Catalog and settings errors are ordinary
//! load-time errors for the embedding process.

use fphook_host::HostError;
use thiserror::Error;

/// Faults raised while installing a hook or emitting a report.
#[derive(Debug, Error)]
pub enum HookError {
    /// The page threw, or refused an operation.
    #[error("host fault: {0}")]
    Host(#[from] HostError),

    /// An event could not be serialized.
    #[error("event serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A panic unwound out of instrumentation code.
    #[error("panic in instrumentation: {0}")]
    Panic(String),
}

/// Errors from loading and normalizing a catalog document.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The document is not valid catalog JSON.
    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    /// An entry names neither `name` nor `names`.
    #[error("entry in group '{group}' names no members")]
    MissingName { group: String },

    /// No target could be resolved for an entry.
    #[error("entry '{name}' in group '{group}' has no target")]
    NoTarget { group: String, name: String },

    /// Failed to read a catalog file.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from loading injection settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings object is not valid JSON.
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to read a settings file.
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    /// The sink binding name is empty.
    #[error("sink binding name must not be empty")]
    EmptyBinding,
}
