//! Charge-point side of the bus-flood pair.
//!
//! Boots and reports normally, floods the control bus with lowest-id
//! frames, and watches the same bus for the rogue firmware trigger; when it
//! appears, the session trips into Faulted and the ransom note goes up.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bus_flood::{charge_point_registry, trigger_ransom, SteadySource, CALL_TIMEOUT};
use sv_anomaly::SessionState;
use sv_hardware::flood::{run_flood, FloodConfig};
use sv_hardware::watch::WatchSink;
use sv_hardware::{command, sink_or_noop};
use sv_link::{run_reporter, ws, Endpoint, ReporterConfig};
use sv_types::{
    action, BootNotificationRequest, BootNotificationResponse, ChargePointErrorCode,
    ChargePointStatus, RegistrationStatus, StatusNotificationRequest,
};

#[derive(Debug, Parser)]
#[command(about = "Compromised charge point flooding its control bus")]
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

    /// Flood frames per second.
    #[arg(long, default_value_t = 500)]
    flood_rate: u32,

    /// Seconds before the rogue firmware trigger appears on the bus.
    #[arg(long, default_value_t = 10)]
    attack_delay: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    // No physical bus in the demo; every command still flows through the
    // watch wrapper, which is how the trigger is noticed.
    let (sink, trigger_seen) = WatchSink::wrap(sink_or_noop(None), command::ROGUE_FIRMWARE);

    let url = format!("ws://{}:{}/{}", args.host, args.port, args.station);
    let transport = ws::connect(&url)
        .await
        .context("connecting to central system")?;
    info!(%url, "connected to central system");

    let endpoint = Endpoint::new(charge_point_registry(Arc::clone(&sink)));
    let session = {
        let endpoint = endpoint.clone();
        tokio::spawn(async move { endpoint.run(transport).await })
    };

    // Boot, then announce the connector as available.
    let boot = BootNotificationRequest {
        charge_point_model: "EVSE-X1".into(),
        charge_point_vendor: "SecVolt".into(),
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
    endpoint
        .call(
            action::STATUS_NOTIFICATION,
            serde_json::to_value(&StatusNotificationRequest {
                connector_id: 1,
                error_code: ChargePointErrorCode::NoError,
                status: ChargePointStatus::Available,
                info: None,
            })?,
            CALL_TIMEOUT,
        )
        .await
        .context("status notification")?;

    // Ordinary telemetry keeps flowing underneath the attack.
    tokio::spawn(run_reporter(
        endpoint.clone(),
        ReporterConfig {
            call_timeout: CALL_TIMEOUT,
            ..ReporterConfig::default()
        },
        SteadySource::new(),
    ));

    // The flood: lowest-id frames at full rate, starving everything else
    // on the bus.
    tokio::spawn(run_flood(
        Arc::clone(&sink),
        FloodConfig {
            rate_per_sec: args.flood_rate,
            ..FloodConfig::default()
        },
    ));

    // The rogue firmware trigger appears on the bus after a delay.
    {
        let sink = Arc::clone(&sink);
        let delay = Duration::from_secs(args.attack_delay);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            warn!("injecting rogue firmware trigger onto the bus");
            sink.send_command(command::ROGUE_FIRMWARE, &[0x01]);
        });
    }

    // Compromise monitor: one trip, then the ransom escalation.
    {
        let endpoint = endpoint.clone();
        let state = Arc::new(Mutex::new(SessionState::default()));
        tokio::spawn(async move {
            trigger_seen.notified().await;
            trigger_ransom(&endpoint, &state).await;
        });
    }

    session.await.context("read loop task")??;
    Ok(())
}
