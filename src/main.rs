//! Keybeat binary: license the current process against Keygen.sh and keep
//! the activation alive until interrupted.

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::error;

use keybeat::{activation, heartbeat, lifecycle};
use keybeat::{Config, Fingerprint, KeybeatError, KeygenClient, LicensingApi};

#[derive(Debug, Parser)]
#[command(version, about = "Keygen.sh machine activation and heartbeat client")]
struct Cli {
    /// License key to validate and maintain for this machine
    license_key: String,
}

fn setup_logging() {
    use tracing_subscriber::filter::{EnvFilter, LevelFilter};
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    // Failure lines to stderr, routine operation lines to stdout.
    let writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .or_else(std::io::stdout);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), KeybeatError> {
    let config = Config::from_env()?;
    let fingerprint = Fingerprint::derive();
    let client = KeygenClient::new(&config)?;

    let outcome = client.validate_key(&cli.license_key, &fingerprint).await?;
    let machine_id = activation::ensure_activated(&client, &outcome, &fingerprint).await?;

    let shutdown = CancellationToken::new();
    let watcher = lifecycle::spawn_signal_watcher(shutdown.clone());

    // Returns Ok only once the shutdown token has fired; a heartbeat
    // failure propagates here and exits non-zero.
    heartbeat::maintain(&client, &machine_id, config.heartbeat_interval, shutdown).await?;
    watcher.abort();

    lifecycle::deactivate_on_shutdown(&client, &machine_id).await
}
