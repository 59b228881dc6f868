//! Central-system side of the load-shedding pair: runs the capacity
//! balancer over each reported draw and logs the grant decision.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use load_shedding::central_registry;
use sv_anomaly::CapacityBalancer;
use sv_link::{ws, Endpoint};

#[derive(Debug, Parser)]
#[command(about = "Central system balancing site load from reported draws")]
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

    let balancer = CapacityBalancer::default();
    let listener = TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("binding {}:{}", args.host, args.port))?;
    info!(
        host = %args.host,
        port = args.port,
        site_capacity_w = balancer.site_capacity_w,
        "smart-charging central system listening"
    );

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

            let endpoint = Endpoint::new(central_registry(CapacityBalancer::default()));
            if let Err(e) = endpoint.run(transport).await {
                warn!(%station, error = %e, "session ended with transport failure");
            }
            info!(%station, "charge point disconnected");
        });
    }
}
