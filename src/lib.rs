//! # Keybeat
//!
//! **Machine activation and heartbeat maintenance for [Keygen.sh](https://keygen.sh).**
//!
//! Keybeat licenses a running process against Keygen: it derives a stable
//! machine fingerprint, validates a license key scoped to that fingerprint,
//! activates the machine when the license requires it, then keeps the
//! activation alive with periodic heartbeat pings until the process is
//! interrupted, at which point it deactivates the machine.
//!
//! ## Flow
//!
//! 1. **Fingerprint** — SHA-256 of a stable hardware identifier
//! 2. **Validate** — `validate-key`, scoped to the fingerprint
//! 3. **Activate** — only for `NO_MACHINE`, `NO_MACHINES`, or
//!    `FINGERPRINT_SCOPE_MISMATCH`; `NOT_FOUND` fails fast
//! 4. **Heartbeat** — one ping per minute; a failed ping is fatal
//! 5. **Deactivate** — once, on SIGINT/SIGTERM, before exit
//!
//! ## Quickstart
//!
//! ```no_run
//! use keybeat::{Config, Fingerprint, KeygenClient, LicensingApi};
//!
//! # async fn demo() -> Result<(), keybeat::KeybeatError> {
//! let config = Config::from_env()?;
//! let fingerprint = Fingerprint::derive();
//! let client = KeygenClient::new(&config)?;
//!
//! let outcome = client.validate_key("LICENSE-KEY-HERE", &fingerprint).await?;
//! let machine_id = keybeat::activation::ensure_activated(&client, &outcome, &fingerprint).await?;
//! # let _ = machine_id;
//! # Ok(())
//! # }
//! ```
//!
//! There is no retry, offline fallback, or caching: the process is either
//! fully licensed and heartbeating, or it is not running.

#![deny(warnings)]
#![deny(missing_docs)]

// Core modules
pub mod config;
pub mod errors;
pub mod fingerprint;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Licensing lifecycle
pub mod activation;
pub mod heartbeat;
pub mod lifecycle;

// Re-exports for public API
pub use client::{KeygenClient, LicensingApi};
pub use config::Config;
pub use errors::KeybeatError;
pub use fingerprint::Fingerprint;
pub use protocol::models::{
    LicenseId, MachineId, ValidationCode, ValidationOutcome,
};
