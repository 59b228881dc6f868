//! # Bus-Flood Demo Pair
//!
//! Three compromises share one station:
//!
//! - **Arbitration flooding**: a tight loop of lowest-id frames dominates
//!   the control bus, starving legitimate relay commands.
//! - **Command tampering**: the remote-start handler answers `Accepted`
//!   while driving the relay closed, so the central system believes
//!   charging began.
//! - **Ransom trip**: when the rogue firmware trigger id is observed on the
//!   bus, the session trips `Normal → Faulted` (one-way) and escalates a
//!   `StatusNotification(Faulted)` carrying the ransom note.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use sv_anomaly::SessionState;
use sv_hardware::{command, SharedSink};
use sv_link::{handler_fn, Endpoint, HandlerRegistry, ReportSource};
use sv_types::{
    action, BootNotificationRequest, BootNotificationResponse, ChargePointErrorCode,
    ChargePointStatus, HeartbeatRequest, HeartbeatResponse, MeterValue, MeterValuesRequest,
    MeterValuesResponse, RegistrationStatus, RemoteStartStopStatus,
    RemoteStartTransactionRequest, RemoteStartTransactionResponse, RemoteStopTransactionRequest,
    RemoteStopTransactionResponse, SampledValue, StatusNotificationRequest,
    StatusNotificationResponse,
};

/// Deadline for every call in this pair.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// What the locked station demands.
pub const RANSOM_NOTE: &str = "SYSTEM HACKED. PAY 1 BTC TO UNLOCK.";

/// Ordinary register progression: +10 Wh per tick.
pub struct SteadySource {
    register_wh: i64,
}

impl SteadySource {
    pub fn new() -> Self {
        Self { register_wh: 0 }
    }
}

impl Default for SteadySource {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSource for SteadySource {
    fn next_report(&mut self) -> MeterValuesRequest {
        self.register_wh += 10;
        MeterValuesRequest {
            connector_id: 1,
            meter_value: vec![MeterValue::now(vec![SampledValue::energy_wh(
                self.register_wh,
            )])],
            transaction_id: None,
        }
    }
}

/// Handlers for the compromised charge point. Remote starts are tampered
/// with: the relay is driven closed while the reply still says `Accepted`.
pub fn charge_point_registry(sink: SharedSink) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register(action::REMOTE_START_TRANSACTION, {
        let sink = Arc::clone(&sink);
        handler_fn(move |req: RemoteStartTransactionRequest| {
            let sink = Arc::clone(&sink);
            async move {
                info!(id_tag = %req.id_tag, "remote command received: start charging");
                warn!("tampered handler: driving the relay CLOSED instead of open");
                sink.send_command(command::RELAY_CLOSE, &command::RELAY_CLOSE_DATA);
                // Still claim success so the central system believes
                // charging began.
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

/// Trip the session into `Faulted` and escalate the ransom note. The trip
/// is one-way; a second trigger changes nothing and sends nothing.
pub async fn trigger_ransom(endpoint: &Endpoint, state: &Mutex<SessionState>) {
    let first_trip = state.lock().unwrap().trip();
    if !first_trip {
        return;
    }

    error!("rogue firmware trigger observed on the bus, locking the station");
    let notification = StatusNotificationRequest {
        connector_id: 1,
        error_code: ChargePointErrorCode::OtherError,
        status: ChargePointStatus::Faulted,
        info: Some(RANSOM_NOTE.into()),
    };
    let payload = match serde_json::to_value(&notification) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "unencodable status notification");
            return;
        }
    };
    match endpoint
        .call(action::STATUS_NOTIFICATION, payload, CALL_TIMEOUT)
        .await
    {
        Ok(_) => error!(note = RANSOM_NOTE, "ransom notification delivered"),
        Err(e) => warn!(error = %e, "ransom notification failed"),
    }
}

/// Handlers for the central-system side of the pair.
pub fn central_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register(
        action::BOOT_NOTIFICATION,
        handler_fn(|req: BootNotificationRequest| async move {
            info!(
                model = %req.charge_point_model,
                vendor = %req.charge_point_vendor,
                "charge point registered"
            );
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
        handler_fn(|req: MeterValuesRequest| async move {
            if let Some(value) = req
                .meter_value
                .iter()
                .flat_map(|group| group.sampled_value.iter())
                .find(|sample| sample.is_energy())
                .and_then(SampledValue::numeric)
            {
                info!(connector = req.connector_id, value_wh = value, "energy report");
            }
            Ok(MeterValuesResponse::default())
        }),
    );

    registry.register(
        action::STATUS_NOTIFICATION,
        handler_fn(|req: StatusNotificationRequest| async move {
            match req.status {
                ChargePointStatus::Faulted => error!(
                    connector = req.connector_id,
                    info = req.info.as_deref().unwrap_or("-"),
                    "station reports compromise"
                ),
                status => info!(connector = req.connector_id, status = ?status, "status update"),
            }
            Ok(StatusNotificationResponse::default())
        }),
    );

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_source_advances_by_ten() {
        let mut source = SteadySource::new();
        assert_eq!(
            source.next_report().meter_value[0].sampled_value[0].value,
            "10"
        );
        assert_eq!(
            source.next_report().meter_value[0].sampled_value[0].value,
            "20"
        );
    }
}
