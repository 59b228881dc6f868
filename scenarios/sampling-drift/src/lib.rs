//! # Sampling-Drift Demo Pair
//!
//! Timing manipulation: the charge point stretches its reporting interval
//! from the nominal 5 s to 8–25 s, silently skips 30 % of ticks, and feeds
//! the register erratically (flat 40 % of the time, otherwise jumping by
//! 1–40 Wh). Gaps are silent by design — a skipped tick issues nothing, and
//! the running state still advances, so the receiver sees a plausible but
//! thinned stream.
//!
//! The central system reconstructs the cadence and register progression and
//! flags late samples, flatlines, jumps, and rollbacks.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};

use sv_link::{handler_fn, HandlerRegistry, ReportSource, ReporterConfig};
use sv_types::{
    action, BootNotificationRequest, BootNotificationResponse, HeartbeatRequest,
    HeartbeatResponse, MeterValue, MeterValuesRequest, MeterValuesResponse, RegistrationStatus,
    SampledValue,
};

/// Deadline for every call in this pair.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// The cadence an honest station keeps.
pub const NOMINAL_INTERVAL: Duration = Duration::from_secs(5);

/// Gap past which the receiver calls a sample late.
pub const MAX_EXPECTED_GAP: Duration = Duration::from_secs(10);

/// Largest register step an honest 5-second tick produces.
pub const MAX_EXPECTED_STEP_WH: f64 = 50.0;

/// The manipulated schedule: base 8 s, up to 17 s of jitter on top, and a
/// 30 % chance of skipping a tick outright.
pub fn drifted_schedule() -> ReporterConfig {
    ReporterConfig {
        interval: Duration::from_secs(8),
        jitter: Duration::from_secs(17),
        drop_probability: 0.30,
        call_timeout: CALL_TIMEOUT,
    }
}

/// Register source that flattens or jumps instead of advancing steadily.
pub struct DriftingSource {
    register_wh: i64,
}

impl DriftingSource {
    pub fn new() -> Self {
        Self { register_wh: 0 }
    }
}

impl Default for DriftingSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSource for DriftingSource {
    fn next_report(&mut self) -> MeterValuesRequest {
        let step = {
            let mut rng = rand::thread_rng();
            if rng.gen_bool(0.40) {
                0
            } else {
                rng.gen_range(1..=40)
            }
        };
        self.register_wh += step;

        if step == 0 {
            warn!(register_wh = self.register_wh, "register flattened this tick");
        } else {
            info!(register_wh = self.register_wh, step, "register advanced");
        }

        MeterValuesRequest {
            connector_id: 1,
            meter_value: vec![MeterValue::now(vec![SampledValue::energy_wh(
                self.register_wh,
            )])],
            transaction_id: None,
        }
    }
}

/// Per-session cadence and register tracking on the receiving side.
#[derive(Debug, Default)]
struct DriftMonitor {
    last_arrival: Option<Instant>,
    last_register_wh: Option<f64>,
}

impl DriftMonitor {
    /// Examine one report; log every irregularity it exposes.
    fn observe(&mut self, register_wh: f64) {
        let now = Instant::now();

        if let Some(previous) = self.last_arrival {
            let gap = now.duration_since(previous);
            if gap > MAX_EXPECTED_GAP {
                warn!(
                    gap_secs = gap.as_secs_f64(),
                    expected_secs = NOMINAL_INTERVAL.as_secs_f64(),
                    "sampling gap: reports arriving late or missing"
                );
            }
        }

        if let Some(previous) = self.last_register_wh {
            let step = register_wh - previous;
            if step < 0.0 {
                warn!(previous, register_wh, "register rolled backwards");
            } else if step == 0.0 {
                warn!(register_wh, "register flatlined between reports");
            } else if step > MAX_EXPECTED_STEP_WH {
                warn!(step, "register jumped beyond an honest tick");
            } else {
                info!(register_wh, step, "register progressing normally");
            }
        }

        self.last_arrival = Some(now);
        self.last_register_wh = Some(register_wh);
    }
}

/// Handlers for the central-system side of the pair.
pub fn central_registry() -> HandlerRegistry {
    let monitor = Arc::new(Mutex::new(DriftMonitor::default()));
    let mut registry = HandlerRegistry::new();

    registry.register(
        action::BOOT_NOTIFICATION,
        handler_fn(|req: BootNotificationRequest| async move {
            info!(model = %req.charge_point_model, "charge point registered");
            Ok(BootNotificationResponse {
                current_time: Utc::now(),
                interval: NOMINAL_INTERVAL.as_secs() as u32,
                status: RegistrationStatus::Accepted,
            })
        }),
    );

    registry.register(
        action::HEARTBEAT,
        handler_fn(|_req: HeartbeatRequest| async move {
            Ok(HeartbeatResponse {
                current_time: Utc::now(),
            })
        }),
    );

    registry.register(action::METER_VALUES, {
        let monitor = Arc::clone(&monitor);
        handler_fn(move |req: MeterValuesRequest| {
            let monitor = Arc::clone(&monitor);
            async move {
                let register = req
                    .meter_value
                    .iter()
                    .flat_map(|group| group.sampled_value.iter())
                    .find(|sample| sample.is_energy())
                    .and_then(SampledValue::numeric);

                match register {
                    Some(register_wh) => monitor.lock().unwrap().observe(register_wh),
                    None => warn!("meter report carried no readable energy sample"),
                }
                Ok(MeterValuesResponse::default())
            }
        })
    });

    registry
}
