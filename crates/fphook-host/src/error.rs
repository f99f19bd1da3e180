//! Host faults
//!
//! Everything a page-level operation can throw is a `HostError`. The realm
//! never panics on malformed input; it reports a fault the caller decides
//! what to do with.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("TypeError: {0}")]
    TypeError(String),

    #[error("Uncaught {0}")]
    Thrown(String),

    #[error("TypeError: {0} is not a function")]
    NotCallable(String),

    #[error("TypeError: {0} is not a constructor")]
    NotConstructor(String),
}

impl HostError {
    /// Convenience for native functions that want to throw a plain error.
    pub fn thrown(message: impl Into<String>) -> Self {
        HostError::Thrown(message.into())
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        HostError::TypeError(message.into())
    }
}

pub type HostResult<T> = Result<T, HostError>;
