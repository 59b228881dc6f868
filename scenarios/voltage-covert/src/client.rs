//! Charge-point side of the voltage-covert pair: boots, then leaks the
//! secret one bit per meter report.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sv_anomaly::covert::VoltageChannel;
use sv_link::{run_reporter, ws, Endpoint, HandlerRegistry, ReporterConfig};
use sv_types::{action, BootNotificationRequest, BootNotificationResponse, RegistrationStatus};
use voltage_covert::{CovertSource, CALL_TIMEOUT, SECRET};

#[derive(Debug, Parser)]
#[command(about = "Charge point leaking data through voltage micro-fluctuations")]
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

    /// Text to smuggle through the voltage field.
    #[arg(long, default_value = SECRET)]
    secret: String,
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

    let endpoint = Endpoint::new(HandlerRegistry::new());
    let session = {
        let endpoint = endpoint.clone();
        tokio::spawn(async move { endpoint.run(transport).await })
    };

    let boot = BootNotificationRequest {
        charge_point_model: "SecVolt-Simulator".into(),
        charge_point_vendor: "CyberSecLink".into(),
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

    warn!(secret = %args.secret, "starting covert exfiltration over the voltage field");
    tokio::spawn(run_reporter(
        endpoint.clone(),
        ReporterConfig {
            call_timeout: CALL_TIMEOUT,
            ..ReporterConfig::default()
        },
        CovertSource::new(&args.secret, VoltageChannel::default()),
    ));

    session.await.context("read loop task")??;
    Ok(())
}
