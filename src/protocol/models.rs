//! Keygen response structs, validation codes, and typed identifiers.

use std::fmt;

use serde::Deserialize;

use crate::fingerprint::Fingerprint;

/// Opaque license identifier returned by the validate-key operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseId(String);

impl LicenseId {
    /// Wrap a raw license id from the service.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LicenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identifier that scopes heartbeat and deactivation calls.
///
/// There is exactly one such value per run: the machine id returned by
/// activation when activation was required, otherwise the fingerprint the
/// license is already activated for. Keeping this a single type removes the
/// fingerprint-vs-machine-id ambiguity at the call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineId(String);

impl MachineId {
    /// Wrap a machine id returned by the activation operation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Use the machine fingerprint as the scoping identifier.
    ///
    /// Keygen accepts a fingerprint wherever a machine id is expected, so
    /// this is the identifier for licenses that were already activated.
    pub fn from_fingerprint(fingerprint: &Fingerprint) -> Self {
        Self(fingerprint.as_str().to_string())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Enumerated outcome of a license-key check against a fingerprint scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationCode {
    /// The key is valid and the machine is activated.
    Valid,
    /// The key does not exist for this account.
    NotFound,
    /// The fingerprint has no machine activated for this license.
    NoMachine,
    /// The license has no machines activated at all.
    NoMachines,
    /// A machine exists but not for this fingerprint scope.
    FingerprintScopeMismatch,
    /// Any code this client does not recognize.
    Other(String),
}

impl ValidationCode {
    /// Map a raw code string from the service.
    pub fn parse(code: &str) -> Self {
        match code {
            "VALID" => Self::Valid,
            "NOT_FOUND" => Self::NotFound,
            "NO_MACHINE" => Self::NoMachine,
            "NO_MACHINES" => Self::NoMachines,
            "FINGERPRINT_SCOPE_MISMATCH" => Self::FingerprintScopeMismatch,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str("VALID"),
            Self::NotFound => f.write_str("NOT_FOUND"),
            Self::NoMachine => f.write_str("NO_MACHINE"),
            Self::NoMachines => f.write_str("NO_MACHINES"),
            Self::FingerprintScopeMismatch => f.write_str("FINGERPRINT_SCOPE_MISMATCH"),
            Self::Other(code) => f.write_str(code),
        }
    }
}

/// Outcome of the validate-key operation.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// The validation code from the response meta.
    pub code: ValidationCode,
    /// The license id, when the response carried one.
    pub license_id: Option<LicenseId>,
}

/// One entry of a Keygen `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    /// Short error title.
    pub title: String,
    /// Longer error detail.
    #[serde(default)]
    pub detail: Option<String>,
}

/// Join an `errors` array into one diagnostic string for logging.
pub fn to_error_message(errors: &[ApiError]) -> String {
    errors
        .iter()
        .map(|e| match &e.detail {
            Some(detail) => format!("{}: {}", e.title, detail),
            None => e.title.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// A `data` resource: only the id is consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    /// Opaque resource id.
    pub id: String,
}

/// Raw validate-key response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateKeyResponse {
    /// License resource, when the key resolved to one.
    #[serde(default)]
    pub data: Option<Resource>,
    /// Validation metadata, absent on some error responses.
    #[serde(default)]
    pub meta: Option<ValidateKeyMeta>,
    /// Error entries, present on rejection.
    #[serde(default)]
    pub errors: Option<Vec<ApiError>>,
}

/// Metadata from a validate-key response.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateKeyMeta {
    /// The validation code string.
    pub code: String,
}

/// Raw machine activation response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineResponse {
    /// The activated machine resource.
    #[serde(default)]
    pub data: Option<Resource>,
    /// Error entries, present on rejection.
    #[serde(default)]
    pub errors: Option<Vec<ApiError>>,
}

/// Raw heartbeat-ping response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatResponse {
    /// Error entries, present on rejection.
    #[serde(default)]
    pub errors: Option<Vec<ApiError>>,
}

/// Error-only envelope, used when a no-content operation fails.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Error entries.
    #[serde(default)]
    pub errors: Option<Vec<ApiError>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_RESPONSE: &str = r#"{
        "meta": { "code": "VALID" },
        "data": { "id": "lic_1", "type": "licenses" }
    }"#;

    const NOT_FOUND_RESPONSE: &str = r#"{
        "meta": { "code": "NOT_FOUND" },
        "data": null,
        "errors": [{ "title": "not found", "detail": "license key does not exist" }]
    }"#;

    const NO_MACHINE_RESPONSE: &str = r#"{
        "meta": { "code": "NO_MACHINE" },
        "data": { "id": "lic_1" }
    }"#;

    #[test]
    fn parse_valid_response() {
        let response: ValidateKeyResponse = serde_json::from_str(VALID_RESPONSE).unwrap();
        assert_eq!(response.meta.unwrap().code, "VALID");
        assert_eq!(response.data.unwrap().id, "lic_1");
        assert!(response.errors.is_none());
    }

    #[test]
    fn parse_not_found_response() {
        let response: ValidateKeyResponse = serde_json::from_str(NOT_FOUND_RESPONSE).unwrap();
        assert!(response.data.is_none());
        let errors = response.errors.unwrap();
        assert_eq!(
            to_error_message(&errors),
            "not found: license key does not exist"
        );
    }

    #[test]
    fn parse_no_machine_keeps_license_id() {
        let response: ValidateKeyResponse = serde_json::from_str(NO_MACHINE_RESPONSE).unwrap();
        assert_eq!(response.meta.unwrap().code, "NO_MACHINE");
        assert_eq!(response.data.unwrap().id, "lic_1");
    }

    #[test]
    fn error_message_joins_multiple_entries() {
        let errors = vec![
            ApiError {
                title: "first".to_string(),
                detail: Some("a".to_string()),
            },
            ApiError {
                title: "second".to_string(),
                detail: None,
            },
        ];
        assert_eq!(to_error_message(&errors), "first: a, second");
    }

    #[test]
    fn validation_code_round_trips_known_codes() {
        for code in [
            "VALID",
            "NOT_FOUND",
            "NO_MACHINE",
            "NO_MACHINES",
            "FINGERPRINT_SCOPE_MISMATCH",
        ] {
            assert_eq!(ValidationCode::parse(code).to_string(), code);
        }
    }

    #[test]
    fn unknown_code_is_preserved() {
        let code = ValidationCode::parse("SUSPENDED");
        assert_eq!(code, ValidationCode::Other("SUSPENDED".to_string()));
        assert_eq!(code.to_string(), "SUSPENDED");
    }

    #[test]
    fn machine_id_from_fingerprint_matches() {
        let fp = Fingerprint::from_raw_id("machine-a");
        let machine = MachineId::from_fingerprint(&fp);
        assert_eq!(machine.as_str(), fp.as_str());
    }
}
