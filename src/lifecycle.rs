//! Lifecycle handler.
//!
//! Intercepts termination signals and attempts one best-effort machine
//! deactivation before the process exits.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::LicensingApi;
use crate::protocol::models::MachineId;
use crate::KeybeatError;

/// Spawn a task that cancels `shutdown` when a termination signal arrives.
///
/// Listens for SIGINT (ctrl-c) and, on Unix, SIGTERM.
pub fn spawn_signal_watcher(shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_termination().await;
        shutdown.cancel();
    })
}

#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm =
        signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Received interrupt, shutting down");
}

/// Deactivate the machine once as part of shutdown.
///
/// # Errors
/// Propagates the deactivation failure; the caller maps it to a non-zero
/// exit status.
pub async fn deactivate_on_shutdown<A: LicensingApi>(
    api: &A,
    machine_id: &MachineId,
) -> Result<(), KeybeatError> {
    info!(machine_id = %machine_id, "deactivating machine before exit");
    api.deactivate_machine(machine_id).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::client::testing::MockApi;

    fn machine() -> MachineId {
        MachineId::new("mach_9")
    }

    #[tokio::test]
    async fn successful_deactivation_is_ok() {
        let api = MockApi::default();

        let result = deactivate_on_shutdown(&api, &machine()).await;

        assert!(result.is_ok());
        assert_eq!(api.deactivation_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_deactivation_propagates() {
        let api = MockApi {
            deactivation_succeeds: false,
            ..MockApi::default()
        };

        let result = deactivate_on_shutdown(&api, &machine()).await;

        assert!(matches!(result, Err(KeybeatError::Rejected { .. })));
        assert_eq!(api.deactivation_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn signal_watcher_task_is_cancellable() {
        // The watcher parks on signal futures; aborting it must not wedge
        // the runtime.
        let token = CancellationToken::new();
        let handle = spawn_signal_watcher(token.clone());
        handle.abort();
        assert!(!token.is_cancelled());
    }
}
