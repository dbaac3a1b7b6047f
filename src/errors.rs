//! Keybeat error types.

use thiserror::Error;

/// Errors that can occur while licensing a process.
#[derive(Debug, Error)]
pub enum KeybeatError {
    /// Configuration is invalid or incomplete.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP transport error communicating with the licensing service.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The licensing service returned a response we could not interpret.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The licensing service rejected an operation with an `errors` array.
    ///
    /// `detail` is the joined `title: detail` diagnostic string; it is
    /// logged verbatim and never parsed for branching.
    #[error("{operation} rejected by licensing service: {detail}")]
    Rejected {
        /// The remote operation that was rejected.
        operation: &'static str,
        /// Joined error detail from the response envelope.
        detail: String,
    },

    /// The license key does not exist for this account.
    #[error("License key not found")]
    LicenseNotFound,
}
