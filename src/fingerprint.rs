//! Machine fingerprint derivation.
//!
//! The fingerprint scopes a license to one device. It is the hex-encoded
//! SHA-256 of a stable hardware identifier, so it survives restarts and is
//! identical on every run on the same machine.

use std::fmt;

use sha2::{Digest, Sha256};

/// A stable, deterministic identifier for the host machine.
///
/// Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derive the fingerprint for the current device.
    pub fn derive() -> Self {
        Self::from_raw_id(&hardware_id())
    }

    /// Hash an already-collected hardware identifier.
    pub fn from_raw_id(raw: &str) -> Self {
        let hash = Sha256::digest(raw.as_bytes());
        Self(hex::encode(hash))
    }

    /// The fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collect the most stable hardware identifier available.
///
/// Prefers the OS machine id; falls back to the hostname so derivation
/// never fails outright.
fn hardware_id() -> String {
    if let Some(id) = machine_id() {
        return id;
    }

    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown-host".to_string())
}

#[cfg(target_os = "linux")]
fn machine_id() -> Option<String> {
    ["/etc/machine-id", "/var/lib/dbus/machine-id"]
        .iter()
        .find_map(|path| std::fs::read_to_string(path).ok())
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

#[cfg(target_os = "macos")]
fn machine_id() -> Option<String> {
    let output = std::process::Command::new("ioreg")
        .args(["-rd1", "-c", "IOPlatformExpertDevice"])
        .output()
        .ok()?;
    let stdout = String::from_utf8(output.stdout).ok()?;
    stdout
        .lines()
        .find(|line| line.contains("IOPlatformUUID"))
        .and_then(|line| line.split('"').nth(3))
        .map(|uuid| uuid.to_string())
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn machine_id() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_raw_id_same_fingerprint() {
        let a = Fingerprint::from_raw_id("00:11:22:33:44:55");
        let b = Fingerprint::from_raw_id("00:11:22:33:44:55");
        assert_eq!(a, b);
    }

    #[test]
    fn different_raw_ids_differ() {
        let a = Fingerprint::from_raw_id("machine-a");
        let b = Fingerprint::from_raw_id("machine-b");
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_is_sha256_hex() {
        let fp = Fingerprint::from_raw_id("machine-a");
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn known_digest() {
        // sha256("abc")
        let fp = Fingerprint::from_raw_id("abc");
        assert_eq!(
            fp.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn derive_is_stable_within_a_run() {
        assert_eq!(Fingerprint::derive(), Fingerprint::derive());
    }
}
