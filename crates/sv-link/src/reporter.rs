//! # Periodic Reporters
//!
//! Independent repeating producers that emit meter reports through an
//! [`Endpoint`] on their own schedule, decoupled from inbound traffic.
//!
//! Each tick advances the source's private running state and issues at most
//! one `MeterValues` call. A failed call is logged and swallowed — the next
//! attempt is the next scheduled tick, never an immediate retry. A
//! probabilistically dropped tick issues no call at all while the state
//! still advances, so the gap is silent on the wire.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use sv_types::{action, MeterValuesRequest};

use crate::endpoint::Endpoint;

/// Schedule knobs for one reporter.
#[derive(Debug, Clone, Copy)]
pub struct ReporterConfig {
    /// Base delay between ticks.
    pub interval: Duration,
    /// Extra uniform-random delay added to each tick; zero for a fixed
    /// cadence.
    pub jitter: Duration,
    /// Probability in `[0, 1]` that a tick is silently skipped.
    pub drop_probability: f64,
    /// Deadline for each `MeterValues` call.
    pub call_timeout: Duration,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            jitter: Duration::ZERO,
            drop_probability: 0.0,
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// The private running state behind a reporter: each tick yields the next
/// report. Implementations are plain state machines; all I/O stays in
/// [`run_reporter`].
pub trait ReportSource: Send {
    fn next_report(&mut self) -> MeterValuesRequest;
}

/// Drive a reporter forever (or until the owning task is cancelled).
pub async fn run_reporter<S: ReportSource>(
    endpoint: Endpoint,
    config: ReporterConfig,
    mut source: S,
) {
    loop {
        let delay = config.interval + draw_jitter(config.jitter);
        tokio::time::sleep(delay).await;

        // State advances whether or not this tick reports.
        let report = source.next_report();

        if dropped(config.drop_probability) {
            debug!("tick dropped, no report issued");
            continue;
        }

        let payload = match serde_json::to_value(&report) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "unencodable meter report, skipping tick");
                continue;
            }
        };

        match endpoint
            .call(action::METER_VALUES, payload, config.call_timeout)
            .await
        {
            Ok(_) => debug!(connector = report.connector_id, "meter report delivered"),
            Err(e) => warn!(error = %e, "meter report failed, continuing at next tick"),
        }
    }
}

fn draw_jitter(jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return Duration::ZERO;
    }
    let micros = rand::thread_rng().gen_range(0..=jitter.as_micros() as u64);
    Duration::from_micros(micros)
}

fn dropped(probability: f64) -> bool {
    if probability <= 0.0 {
        return false;
    }
    rand::thread_rng().gen_bool(probability.min(1.0))
}
