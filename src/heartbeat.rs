//! Heartbeat loop.
//!
//! Keeps the activation alive for as long as the process runs: one ping per
//! period, each success scheduling exactly one subsequent tick, a failed
//! ping fatal with no retry. The loop is raced against a cancellation token
//! so shutdown can abort even an in-flight ping.

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::LicensingApi;
use crate::protocol::models::MachineId;
use crate::KeybeatError;

/// Ping the heartbeat for `machine_id` every `period` until failure or
/// cancellation.
///
/// The first ping is sent immediately. Returns `Ok(())` only when the
/// shutdown token was cancelled; a failed ping returns its error and
/// schedules no further ticks.
///
/// # Errors
/// Propagates the first heartbeat failure.
pub async fn maintain<A: LicensingApi>(
    api: &A,
    machine_id: &MachineId,
    period: Duration,
    shutdown: CancellationToken,
) -> Result<(), KeybeatError> {
    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            result = api.ping_heartbeat(machine_id) => result?,
        }

        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            () = sleep(period) => {}
        }
    }

    info!(machine_id = %machine_id, "heartbeat loop interrupted by shutdown");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use tokio::time::Instant;

    use super::*;
    use crate::client::testing::MockApi;

    const PERIOD: Duration = Duration::from_secs(60);

    fn machine() -> MachineId {
        MachineId::new("mach_9")
    }

    #[tokio::test(start_paused = true)]
    async fn first_ping_failure_is_fatal_with_no_reschedule() {
        let api = MockApi {
            heartbeat_fails_on: Some(1),
            ..MockApi::default()
        };
        let started = Instant::now();

        let result = maintain(&api, &machine(), PERIOD, CancellationToken::new()).await;

        assert!(matches!(result, Err(KeybeatError::Rejected { .. })));
        assert_eq!(api.heartbeat_calls.load(Ordering::SeqCst), 1);
        // No tick was scheduled after the failure.
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn success_schedules_exactly_one_tick_per_period() {
        let api = MockApi {
            heartbeat_fails_on: Some(3),
            ..MockApi::default()
        };
        let started = Instant::now();

        let result = maintain(&api, &machine(), PERIOD, CancellationToken::new()).await;

        assert!(result.is_err());
        assert_eq!(api.heartbeat_calls.load(Ordering::SeqCst), 3);
        // Two successful pings, each scheduling one tick a full period later.
        assert_eq!(started.elapsed(), 2 * PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_before_start_sends_no_ping() {
        let api = MockApi::default();
        let token = CancellationToken::new();
        token.cancel();

        let result = maintain(&api, &machine(), PERIOD, token).await;

        assert!(result.is_ok());
        assert_eq!(api.heartbeat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_between_ticks_returns_cleanly() {
        let api = MockApi::default();
        let token = CancellationToken::new();

        let canceller = {
            let token = token.clone();
            async move {
                sleep(Duration::from_secs(30)).await;
                token.cancel();
            }
        };

        let machine = machine();
        let (result, ()) = tokio::join!(maintain(&api, &machine, PERIOD, token.clone()), canceller);

        assert!(result.is_ok());
        assert_eq!(api.heartbeat_calls.load(Ordering::SeqCst), 1);
    }
}
