//! Activation controller.
//!
//! A flat decision table executed once at startup: given the outcome of key
//! validation, decide whether the machine must be activated, and perform the
//! activation when it is.

use tracing::info;

use crate::client::LicensingApi;
use crate::fingerprint::Fingerprint;
use crate::protocol::models::{MachineId, ValidationCode, ValidationOutcome};
use crate::KeybeatError;

/// Next action after key validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The key does not exist; fail fast without an activation attempt.
    Deny,
    /// The machine is not activated for this license; activate it.
    Activate,
    /// Already activated; proceed straight to heartbeat maintenance.
    Proceed,
}

/// Decide the next action for a validation code.
pub fn required_action(code: &ValidationCode) -> Action {
    match code {
        ValidationCode::NotFound => Action::Deny,
        ValidationCode::NoMachine
        | ValidationCode::NoMachines
        | ValidationCode::FingerprintScopeMismatch => Action::Activate,
        ValidationCode::Valid | ValidationCode::Other(_) => Action::Proceed,
    }
}

/// Resolve a validation outcome into the machine identifier that scopes all
/// subsequent heartbeat and deactivation calls.
///
/// Activation is attempted at most once, and only for codes that require it.
/// When the license is already activated the fingerprint itself is the
/// identifier.
///
/// # Errors
/// - `LicenseNotFound` when the key does not exist.
/// - `Protocol` when activation is required but validation returned no
///   license id.
/// - Any error from the activation call itself.
pub async fn ensure_activated<A: LicensingApi>(
    api: &A,
    outcome: &ValidationOutcome,
    fingerprint: &Fingerprint,
) -> Result<MachineId, KeybeatError> {
    match required_action(&outcome.code) {
        Action::Deny => Err(KeybeatError::LicenseNotFound),
        Action::Proceed => {
            info!(
                validation_code = %outcome.code,
                fingerprint = %fingerprint,
                "machine already activated"
            );
            Ok(MachineId::from_fingerprint(fingerprint))
        }
        Action::Activate => {
            let license_id = outcome.license_id.as_ref().ok_or_else(|| {
                KeybeatError::Protocol(
                    "activation required but validation returned no license id".to_string(),
                )
            })?;
            api.activate_machine(license_id, fingerprint).await
        }
    }
}
