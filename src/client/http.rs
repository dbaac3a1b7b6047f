//! Reqwest-based HTTP client for the Keygen API.
//!
//! Four stateless request/response operations against one remote authority:
//! validate a license key, activate a machine, deactivate a machine, and
//! ping a heartbeat. Every operation logs one structured outcome line with
//! the operation name and correlating identifiers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use tracing::{error, info};

use crate::config::Config;
use crate::fingerprint::Fingerprint;
use crate::protocol::models::{
    to_error_message, ErrorResponse, HeartbeatResponse, LicenseId, MachineId, MachineResponse,
    ValidateKeyResponse, ValidationCode, ValidationOutcome,
};
use crate::KeybeatError;

const CONTENT_TYPE_JSON_API: &str = "application/vnd.api+json";

/// Bounds a hung remote service instead of blocking forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The four remote licensing operations.
///
/// The controller, heartbeat loop, and lifecycle handler depend on this
/// trait rather than on [`KeygenClient`] so they can be exercised against a
/// scripted implementation in tests.
#[async_trait]
pub trait LicensingApi: Send + Sync {
    /// Validate a license key scoped to a machine fingerprint.
    async fn validate_key(
        &self,
        license_key: &str,
        fingerprint: &Fingerprint,
    ) -> Result<ValidationOutcome, KeybeatError>;

    /// Activate a machine for a license. Creates a new remote machine
    /// resource on every call.
    async fn activate_machine(
        &self,
        license_id: &LicenseId,
        fingerprint: &Fingerprint,
    ) -> Result<MachineId, KeybeatError>;

    /// Deactivate a machine. Success is a no-content response.
    async fn deactivate_machine(&self, machine_id: &MachineId) -> Result<(), KeybeatError>;

    /// Ping the heartbeat for a machine.
    async fn ping_heartbeat(&self, machine_id: &MachineId) -> Result<(), KeybeatError>;
}

/// Keygen HTTP client.
pub struct KeygenClient {
    client: Client,
    account_id: String,
    activation_token: String,
    api_url: String,
}

impl KeygenClient {
    /// Create a new client from config.
    ///
    /// # Errors
    /// Returns a `Config` error if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &Config) -> Result<Self, KeybeatError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("keybeat/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| KeybeatError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            account_id: config.account_id.clone(),
            activation_token: config.activation_token.clone(),
            api_url: config.api_url.clone(),
        })
    }

    fn account_url(&self, rest: &str) -> String {
        format!("{}/v1/accounts/{}/{}", self.api_url, self.account_id, rest)
    }

    fn json_api_headers(&self, authenticated: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON_API));
        headers.insert(ACCEPT, HeaderValue::from_static(CONTENT_TYPE_JSON_API));
        if authenticated {
            let bearer = format!("Bearer {}", self.activation_token);
            if let Ok(value) = HeaderValue::from_str(&bearer) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: Response,
    operation: &'static str,
) -> Result<T, KeybeatError> {
    response
        .json::<T>()
        .await
        .map_err(|e| KeybeatError::Protocol(format!("{operation}: failed to decode response: {e}")))
}

fn transport(operation: &'static str, e: reqwest::Error) -> KeybeatError {
    KeybeatError::Transport(format!("{operation}: {e}"))
}

#[async_trait]
impl LicensingApi for KeygenClient {
    async fn validate_key(
        &self,
        license_key: &str,
        fingerprint: &Fingerprint,
    ) -> Result<ValidationOutcome, KeybeatError> {
        let url = self.account_url("licenses/actions/validate-key");
        let body = serde_json::json!({
            "meta": {
                "scope": { "fingerprint": fingerprint.as_str() },
                "key": license_key,
            }
        });

        // Key validation is unauthenticated.
        let response = self
            .client
            .post(&url)
            .headers(self.json_api_headers(false))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport("validate_key", e))?;

        let validation: ValidateKeyResponse = decode(response, "validate_key").await?;
        let license_id = validation.data.map(|data| LicenseId::new(data.id));

        if let Some(errors) = validation.errors.as_deref() {
            error!(
                operation = "validate_key",
                license_id = license_id.as_ref().map(LicenseId::as_str),
                fingerprint = %fingerprint,
                errors = %to_error_message(errors),
                "license validation rejected"
            );
        }

        let Some(meta) = validation.meta else {
            return Err(KeybeatError::Rejected {
                operation: "validate_key",
                detail: validation
                    .errors
                    .as_deref()
                    .map(to_error_message)
                    .unwrap_or_else(|| "response carried no validation code".to_string()),
            });
        };

        let code = ValidationCode::parse(&meta.code);
        info!(
            operation = "validate_key",
            validation_code = %code,
            license_id = license_id.as_ref().map(LicenseId::as_str),
            fingerprint = %fingerprint,
            "license key validated"
        );

        Ok(ValidationOutcome { code, license_id })
    }

    async fn activate_machine(
        &self,
        license_id: &LicenseId,
        fingerprint: &Fingerprint,
    ) -> Result<MachineId, KeybeatError> {
        let url = self.account_url("machines");
        let body = serde_json::json!({
            "data": {
                "type": "machines",
                "attributes": {
                    "fingerprint": fingerprint.as_str(),
                },
                "relationships": {
                    "license": {
                        "data": { "type": "licenses", "id": license_id.as_str() }
                    }
                }
            }
        });

        let response = self
            .client
            .post(&url)
            .headers(self.json_api_headers(true))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport("activate_machine", e))?;

        let activation: MachineResponse = decode(response, "activate_machine").await?;

        if let Some(errors) = activation.errors.as_deref() {
            let detail = to_error_message(errors);
            error!(
                operation = "activate_machine",
                license_id = %license_id,
                fingerprint = %fingerprint,
                errors = %detail,
                "machine activation rejected"
            );
            return Err(KeybeatError::Rejected {
                operation: "activate_machine",
                detail,
            });
        }

        let machine_id = activation
            .data
            .map(|data| MachineId::new(data.id))
            .ok_or_else(|| {
                KeybeatError::Protocol("activate_machine: response carried no machine id".to_string())
            })?;

        info!(
            operation = "activate_machine",
            license_id = %license_id,
            machine_id = %machine_id,
            fingerprint = %fingerprint,
            "machine activated"
        );

        Ok(machine_id)
    }

    async fn deactivate_machine(&self, machine_id: &MachineId) -> Result<(), KeybeatError> {
        let url = self.account_url(&format!("machines/{machine_id}"));

        let response = self
            .client
            .delete(&url)
            .headers(self.json_api_headers(true))
            .send()
            .await
            .map_err(|e| transport("deactivate_machine", e))?;

        if response.status() != StatusCode::NO_CONTENT {
            let deactivation: ErrorResponse = decode(response, "deactivate_machine").await?;
            let detail = deactivation
                .errors
                .as_deref()
                .map(to_error_message)
                .unwrap_or_else(|| "unexpected response status".to_string());
            error!(
                operation = "deactivate_machine",
                machine_id = %machine_id,
                errors = %detail,
                "machine deactivation rejected"
            );
            return Err(KeybeatError::Rejected {
                operation: "deactivate_machine",
                detail,
            });
        }

        info!(operation = "deactivate_machine", machine_id = %machine_id, "machine deactivated");
        Ok(())
    }

    async fn ping_heartbeat(&self, machine_id: &MachineId) -> Result<(), KeybeatError> {
        let url = self.account_url(&format!("machines/{machine_id}/actions/ping-heartbeat"));

        let response = self
            .client
            .post(&url)
            .headers(self.json_api_headers(true))
            .send()
            .await
            .map_err(|e| transport("ping_heartbeat", e))?;

        let ping: HeartbeatResponse = decode(response, "ping_heartbeat").await?;

        if let Some(errors) = ping.errors.as_deref() {
            let detail = to_error_message(errors);
            error!(
                operation = "ping_heartbeat",
                machine_id = %machine_id,
                errors = %detail,
                "heartbeat ping rejected"
            );
            return Err(KeybeatError::Rejected {
                operation: "ping_heartbeat",
                detail,
            });
        }

        info!(operation = "ping_heartbeat", machine_id = %machine_id, "heartbeat ping accepted");
        Ok(())
    }
}
