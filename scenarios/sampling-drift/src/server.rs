//! Central-system side of the sampling-drift pair: reconstructs report
//! cadence and register progression, flagging gaps, flatlines, and jumps.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sampling_drift::central_registry;
use sv_link::{ws, Endpoint};

#[derive(Debug, Parser)]
#[command(about = "Central system watching sampling cadence")]
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
            if let Err(e) = endpoint.run(transport).await {
                warn!(%station, error = %e, "session ended with transport failure");
            }
            info!(%station, "charge point disconnected");
        });
    }
}
