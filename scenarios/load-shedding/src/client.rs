//! Charge-point side of the load-shedding pair: boots, then reports a
//! falsified constant draw on a fixed cadence.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use load_shedding::{
    charge_point_registry, FalseLoadSource, ACTUAL_DRAW_W, CALL_TIMEOUT, REPORTED_DRAW_W,
};
use sv_hardware::{sink_or_noop, TraceSink};
use sv_link::{run_reporter, ws, Endpoint, ReporterConfig};
use sv_types::{action, BootNotificationRequest, BootNotificationResponse, RegistrationStatus};

#[derive(Debug, Parser)]
#[command(about = "Compromised charge point understating its draw")]
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
    info!(%url, "connected; station firmware is compromised");

    let endpoint = Endpoint::new(charge_point_registry(sink_or_noop(Some(Arc::new(
        TraceSink,
    )))));
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

    warn!(
        actual_w = ACTUAL_DRAW_W,
        reported_w = REPORTED_DRAW_W,
        "starting falsified reporting: understate draw, let others overload the site"
    );
    tokio::spawn(run_reporter(
        endpoint.clone(),
        ReporterConfig {
            call_timeout: CALL_TIMEOUT,
            ..ReporterConfig::default()
        },
        FalseLoadSource,
    ));

    session.await.context("read loop task")??;
    Ok(())
}
