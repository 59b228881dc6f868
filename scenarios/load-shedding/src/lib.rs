//! # Load-Shedding Manipulation Demo Pair
//!
//! The site transformer carries 50 kW; other vehicles already draw 30 kW.
//! The compromised charge point physically pulls 22 kW but reports 100 W,
//! so the balancer computes 19.9 kW of headroom and grants the rest of the
//! site extra power — pushing the true load past the transformer limit.
//! The balancer is deliberately a pure function of the reported figure;
//! the wrong grant traces entirely to the falsified input.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use sv_anomaly::CapacityBalancer;
use sv_hardware::{command, SharedSink};
use sv_link::{handler_fn, HandlerRegistry, ReportSource};
use sv_types::{
    action, BootNotificationRequest, BootNotificationResponse, HeartbeatRequest,
    HeartbeatResponse, MeterValue, MeterValuesRequest, MeterValuesResponse, RegistrationStatus,
    RemoteStartStopStatus, RemoteStartTransactionRequest, RemoteStartTransactionResponse,
    RemoteStopTransactionRequest, RemoteStopTransactionResponse, SampledValue,
};

/// Deadline for every call in this pair.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// What the station physically pulls, in watts.
pub const ACTUAL_DRAW_W: i64 = 22_000;

/// What the station tells the central system, in watts.
pub const REPORTED_DRAW_W: i64 = 100;

/// Extra power handed to the rest of the site on a grant, in watts.
pub const GRANT_STEP_W: i64 = 10_000;

/// Reports a constant falsified draw while the real load never appears on
/// the wire.
pub struct FalseLoadSource;

impl ReportSource for FalseLoadSource {
    fn next_report(&mut self) -> MeterValuesRequest {
        warn!(
            actual_w = ACTUAL_DRAW_W,
            reported_w = REPORTED_DRAW_W,
            "manipulated report: understating draw to free up capacity"
        );
        MeterValuesRequest {
            connector_id: 1,
            meter_value: vec![MeterValue::now(vec![SampledValue::energy_wh(
                REPORTED_DRAW_W,
            )])],
            transaction_id: None,
        }
    }
}

/// Handlers for the central-system side of the pair.
pub fn central_registry(balancer: CapacityBalancer) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register(
        action::BOOT_NOTIFICATION,
        handler_fn(|req: BootNotificationRequest| async move {
            info!(model = %req.charge_point_model, "charge point registered");
            Ok(BootNotificationResponse {
                current_time: Utc::now(),
                interval: 10,
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

    registry.register(
        action::METER_VALUES,
        handler_fn(move |req: MeterValuesRequest| async move {
            let reported = req
                .meter_value
                .iter()
                .flat_map(|group| group.sampled_value.iter())
                .find(|sample| sample.is_energy())
                .and_then(SampledValue::numeric);

            let Some(reported_w) = reported else {
                warn!("meter report carried no readable energy sample");
                return Ok(MeterValuesResponse::default());
            };
            let reported_w = reported_w as i64;
            info!(reported_w, "station reports its draw");

            let available = balancer.available_capacity(reported_w);
            info!(
                site_capacity_w = balancer.site_capacity_w,
                other_load_w = balancer.other_load_w,
                available_w = available,
                "balancing decision inputs"
            );

            if balancer.grant_more_power(reported_w) {
                info!(
                    grant_w = GRANT_STEP_W,
                    "headroom looks comfortable, granting extra power to the site"
                );
                // The decision trusted the report. If the station is lying
                // about its draw, the true site load now exceeds what the
                // transformer carries.
                error!(
                    "if the reported draw is falsified, the grid is now overcommitted"
                );
            } else {
                warn!("site is near capacity, grant refused");
            }

            Ok(MeterValuesResponse::default())
        }),
    );

    registry
}

/// Handlers for the charge-point side: remote commands drive the relay.
pub fn charge_point_registry(sink: SharedSink) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register(action::REMOTE_START_TRANSACTION, {
        let sink = Arc::clone(&sink);
        handler_fn(move |req: RemoteStartTransactionRequest| {
            let sink = Arc::clone(&sink);
            async move {
                info!(id_tag = %req.id_tag, "remote command: start drawing at full power");
                sink.send_command(command::RELAY_OPEN, &command::RELAY_OPEN_DATA);
                Ok(RemoteStartTransactionResponse {
                    status: RemoteStartStopStatus::Accepted,
                })
            }
        })
    });

    registry.register(action::REMOTE_STOP_TRANSACTION, {
        let sink = Arc::clone(&sink);
        handler_fn(move |req: RemoteStopTransactionRequest| {
            let sink = Arc::clone(&sink);
            async move {
                info!(transaction_id = req.transaction_id, "remote command: stop charging");
                sink.send_command(command::RELAY_CLOSE, &command::RELAY_CLOSE_DATA);
                Ok(RemoteStopTransactionResponse {
                    status: RemoteStartStopStatus::Accepted,
                })
            }
        })
    });

    registry
}
