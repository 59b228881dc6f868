//! Charge-point side of the sampling-drift pair: boots, then reports on
//! the manipulated schedule with an erratic register.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sampling_drift::{drifted_schedule, DriftingSource, CALL_TIMEOUT};
use sv_link::{run_reporter, ws, Endpoint, HandlerRegistry};
use sv_types::{action, BootNotificationRequest, BootNotificationResponse, RegistrationStatus};

#[derive(Debug, Parser)]
#[command(about = "Charge point manipulating its sampling schedule")]
struct Args {
    /// Central system host.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Central system port.
    #[arg(long, default_value_t = 9000)]
    port: u16,

    /// Station id used as the connection path segment.
    #[arg(long, default_value = "CHARGER-001")]
    station: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let url = format!("ws://{}:{}/{}", args.host, args.port, args.station);
    let transport = ws::connect(&url)
        .await
        .context("connecting to central system")?;
    info!(%url, "connected to central system");

    // This station receives no remote commands; it only reports.
    let endpoint = Endpoint::new(HandlerRegistry::new());
    let session = {
        let endpoint = endpoint.clone();
        tokio::spawn(async move { endpoint.run(transport).await })
    };

    let boot = BootNotificationRequest {
        charge_point_model: "SecVolt-Sim".into(),
        charge_point_vendor: "GroupProject".into(),
    };
    let reply = endpoint
        .call(
            action::BOOT_NOTIFICATION,
            serde_json::to_value(&boot)?,
            CALL_TIMEOUT,
        )
        .await
        .context("boot notification")?;
    let response: BootNotificationResponse =
        serde_json::from_value(reply).context("boot response shape")?;
    if response.status != RegistrationStatus::Accepted {
        warn!(status = ?response.status, "boot not accepted, continuing anyway");
    }

    let schedule = drifted_schedule();
    warn!(
        base_secs = schedule.interval.as_secs(),
        jitter_secs = schedule.jitter.as_secs(),
        drop_probability = schedule.drop_probability,
        "starting manipulated sampling schedule"
    );
    tokio::spawn(run_reporter(
        endpoint.clone(),
        schedule,
        DriftingSource::new(),
    ));

    session.await.context("read loop task")??;
    Ok(())
}
