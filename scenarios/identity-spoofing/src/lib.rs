//! # Identity Spoofing Demo Pair
//!
//! The charge point tries to get authorized with a crafted always-true
//! identity string, then runs a transaction under a foreign id tag and
//! injects a forged register value. The central system decides every
//! identity question through one exact-membership gate and screens register
//! readings against the meter threshold, so both probes are answered with
//! `Invalid`/critical logs instead of a bypass.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use sv_anomaly::threshold::{classify, MeterClass, DEFAULT_REGISTER_CEILING_WH};
use sv_anomaly::IdentityGate;
use sv_hardware::{command, SharedSink};
use sv_link::{handler_fn, HandlerRegistry};
use sv_types::{
    action, AuthorizationStatus, AuthorizeRequest, AuthorizeResponse, BootNotificationRequest,
    BootNotificationResponse, HeartbeatRequest, HeartbeatResponse, IdTagInfo, MeterValuesRequest,
    MeterValuesResponse, RegistrationStatus, RemoteStartStopStatus, RemoteStartTransactionRequest,
    RemoteStartTransactionResponse, RemoteStopTransactionRequest, RemoteStopTransactionResponse,
    StartTransactionRequest, StartTransactionResponse, StopTransactionRequest,
    StopTransactionResponse,
};

/// Deadline for every call in this pair.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// The always-true payload a string-built query would fall for.
pub const INJECTION_TAG: &str = "' OR '1'='1' --";

/// A legitimate tag on the demo allow-list.
pub const KNOWN_TAG: &str = "USER-A123";

/// A tag belonging to somebody else entirely.
pub const FOREIGN_TAG: &str = "USER-B777";

/// Register value injected during the unauthorized run.
pub const FORGED_REGISTER_WH: i64 = 9_999_999;

/// Handlers for the central-system side of the pair.
pub fn central_registry(gate: IdentityGate) -> HandlerRegistry {
    let gate = Arc::new(gate);
    let next_transaction = Arc::new(AtomicI32::new(1));
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

    registry.register(action::AUTHORIZE, {
        let gate = Arc::clone(&gate);
        handler_fn(move |req: AuthorizeRequest| {
            let gate = Arc::clone(&gate);
            async move {
                let status = gate.authorize(&req.id_tag);
                match status {
                    AuthorizationStatus::Accepted => {
                        info!(id_tag = %req.id_tag, "authorization accepted")
                    }
                    AuthorizationStatus::Invalid => {
                        warn!(id_tag = %req.id_tag, "authorization rejected: tag not on allow-list")
                    }
                }
                Ok(AuthorizeResponse {
                    id_tag_info: IdTagInfo { status },
                })
            }
        })
    });

    registry.register(action::START_TRANSACTION, {
        let gate = Arc::clone(&gate);
        let next_transaction = Arc::clone(&next_transaction);
        handler_fn(move |req: StartTransactionRequest| {
            let gate = Arc::clone(&gate);
            let next_transaction = Arc::clone(&next_transaction);
            async move {
                match gate.authorize(&req.id_tag) {
                    AuthorizationStatus::Accepted => {
                        let transaction_id = next_transaction.fetch_add(1, Ordering::Relaxed);
                        info!(
                            id_tag = %req.id_tag,
                            transaction_id,
                            meter_start = req.meter_start,
                            "transaction started"
                        );
                        Ok(StartTransactionResponse {
                            id_tag_info: IdTagInfo::accepted(),
                            transaction_id,
                        })
                    }
                    AuthorizationStatus::Invalid => {
                        warn!(
                            id_tag = %req.id_tag,
                            "identity spoofing attempt: transaction refused"
                        );
                        Ok(StartTransactionResponse {
                            id_tag_info: IdTagInfo::invalid(),
                            transaction_id: 0,
                        })
                    }
                }
            }
        })
    });

    registry.register(
        action::METER_VALUES,
        handler_fn(|req: MeterValuesRequest| async move {
            for group in &req.meter_value {
                for sample in group.sampled_value.iter().filter(|s| s.is_energy()) {
                    let Some(value) = sample.numeric() else {
                        warn!(raw = %sample.value, "unreadable register sample");
                        continue;
                    };
                    match classify(value, DEFAULT_REGISTER_CEILING_WH) {
                        MeterClass::Normal => {
                            info!(connector = req.connector_id, value_wh = value, "energy report")
                        }
                        MeterClass::CriticalAnomaly => warn!(
                            connector = req.connector_id,
                            value_wh = value,
                            ceiling_wh = DEFAULT_REGISTER_CEILING_WH,
                            "critical anomaly: register value beyond any plausible reading"
                        ),
                    }
                }
            }
            Ok(MeterValuesResponse::default())
        }),
    );

    registry.register(
        action::STOP_TRANSACTION,
        handler_fn(|req: StopTransactionRequest| async move {
            info!(
                transaction_id = req.transaction_id,
                meter_stop = req.meter_stop,
                "transaction stopped"
            );
            Ok(StopTransactionResponse::default())
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
                info!(id_tag = %req.id_tag, "remote command: start charging");
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
