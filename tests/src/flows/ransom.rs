//! # Compromise Escalation Flow
//!
//! The bus-flood station's trip path: the rogue firmware id observed on
//! the bus flips the session to Faulted exactly once and escalates one
//! `StatusNotification` carrying the ransom note.

#[cfg(test)]
use std::sync::{Arc, Mutex};
#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use bus_flood::{trigger_ransom, RANSOM_NOTE};
#[cfg(test)]
use sv_anomaly::SessionState;
#[cfg(test)]
use sv_hardware::watch::WatchSink;
#[cfg(test)]
use sv_hardware::{command, sink_or_noop};
#[cfg(test)]
use sv_link::{handler_fn, memory_pair, Endpoint, HandlerRegistry};
#[cfg(test)]
use sv_types::{action, ChargePointStatus, StatusNotificationRequest, StatusNotificationResponse};

#[cfg(test)]
mod tests {
    use super::*;

    /// Central system that records every status notification it receives.
    fn recording_registry(seen: Arc<Mutex<Vec<StatusNotificationRequest>>>) -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register(action::STATUS_NOTIFICATION, {
            handler_fn(move |req: StatusNotificationRequest| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().unwrap().push(req);
                    Ok(StatusNotificationResponse::default())
                }
            })
        });
        registry
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn rogue_trigger_escalates_the_ransom_note_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (left, right) = memory_pair(64);
        let charge_point = Endpoint::new(HandlerRegistry::new());
        let central = Endpoint::new(recording_registry(Arc::clone(&seen)));

        {
            let charge_point = charge_point.clone();
            tokio::spawn(async move { charge_point.run(left).await });
        }
        tokio::spawn(async move { central.run(right).await });

        let state = Arc::new(Mutex::new(SessionState::default()));
        let (sink, trigger_seen) = WatchSink::wrap(sink_or_noop(None), command::ROGUE_FIRMWARE);

        let monitor = {
            let charge_point = charge_point.clone();
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                trigger_seen.notified().await;
                trigger_ransom(&charge_point, &state).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Ordinary traffic does not trip anything.
        sink.send_command(command::RELAY_OPEN, &command::RELAY_OPEN_DATA);
        assert!(!state.lock().unwrap().is_faulted());

        // The rogue trigger does.
        sink.send_command(command::ROGUE_FIRMWARE, &[0x01]);
        tokio::time::timeout(Duration::from_secs(5), monitor)
            .await
            .expect("monitor must observe the trigger")
            .unwrap();

        assert!(state.lock().unwrap().is_faulted());
        let notifications = seen.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].status, ChargePointStatus::Faulted);
        assert_eq!(notifications[0].info.as_deref(), Some(RANSOM_NOTE));
    }

    #[tokio::test]
    async fn second_trigger_sends_nothing_more() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (left, right) = memory_pair(64);
        let charge_point = Endpoint::new(HandlerRegistry::new());
        let central = Endpoint::new(recording_registry(Arc::clone(&seen)));

        {
            let charge_point = charge_point.clone();
            tokio::spawn(async move { charge_point.run(left).await });
        }
        tokio::spawn(async move { central.run(right).await });

        let state = Mutex::new(SessionState::default());
        trigger_ransom(&charge_point, &state).await;
        trigger_ransom(&charge_point, &state).await;

        assert_eq!(seen.lock().unwrap().len(), 1, "the trip is one-way");
    }
}
