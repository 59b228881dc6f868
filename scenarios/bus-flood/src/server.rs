//! Central-system side of the bus-flood pair.
//!
//! Accepts the station, probes it with a remote start after a few seconds,
//! and logs status escalations — including the ransom note a locked
//! station sends.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bus_flood::{central_registry, CALL_TIMEOUT};
use sv_link::{ws, Endpoint};
use sv_types::{action, RemoteStartStopStatus, RemoteStartTransactionRequest,
    RemoteStartTransactionResponse};

/// How long to let the connection settle before the remote-start probe.
const PROBE_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(about = "Central system probing a possibly compromised station")]
struct Args {
    /// Bind address.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Bind port.
    #[arg(long, default_value_t = 9000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let listener = TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("binding {}:{}", args.host, args.port))?;
    info!(host = %args.host, port = args.port, "central system listening");

    loop {
        let (stream, peer) = listener.accept().await.context("accepting connection")?;
        tokio::spawn(async move {
            let (transport, station) = match ws::accept(stream).await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(%peer, error = %e, "websocket handshake failed");
                    return;
                }
            };
            info!(%station, %peer, "charge point connected");

            let endpoint = Endpoint::new(central_registry());
            let probe = {
                let endpoint = endpoint.clone();
                let station = station.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(PROBE_DELAY).await;
                    remote_start_probe(&endpoint, &station).await;
                })
            };

            if let Err(e) = endpoint.run(transport).await {
                warn!(%station, error = %e, "session ended with transport failure");
            }
            probe.abort();
            info!(%station, "charge point disconnected");
        });
    }
}

/// Command the station to start charging and report what it claims. An
/// `Accepted` answer proves nothing about the relay: a tampered station
/// says yes and does the opposite.
async fn remote_start_probe(endpoint: &Endpoint, station: &str) {
    info!(%station, "sending remote start probe");
    let request = RemoteStartTransactionRequest {
        id_tag: "USER-A123".into(),
    };
    let payload = match serde_json::to_value(&request) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "unencodable remote start request");
            return;
        }
    };

    match endpoint
        .call(action::REMOTE_START_TRANSACTION, payload, CALL_TIMEOUT)
        .await
    {
        Ok(reply) => match serde_json::from_value::<RemoteStartTransactionResponse>(reply) {
            Ok(response) if response.status == RemoteStartStopStatus::Accepted => {
                info!(%station, "station claims charging started");
                info!("verify the physical side: the claim may be tampered");
            }
            Ok(response) => warn!(%station, status = ?response.status, "remote start refused"),
            Err(e) => warn!(error = %e, "remote start response shape"),
        },
        Err(e) => warn!(%station, error = %e, "remote start probe failed"),
    }
}
