//! # Correlation Properties
//!
//! The invariants the engine must hold under concurrency:
//!
//! 1. Replies resolve exactly the call that issued their id, regardless of
//!    arrival order relative to other outstanding calls.
//! 2. A timed-out call is removed from the table; its late reply is
//!    dropped, never delivered twice.
//! 3. Transport close fails every suspended caller.
//! 4. A handler may call back through the same engine without deadlocking
//!    the read loop.

#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use serde_json::{json, Value};

#[cfg(test)]
use sv_link::{handler_fn, memory_pair, Endpoint, HandlerRegistry};

#[cfg(test)]
use sv_types::{CallError, HandlerError};

/// Spawn both read loops of a wired pair, returning the endpoints.
#[cfg(test)]
fn wire(
    caller_registry: HandlerRegistry,
    responder_registry: HandlerRegistry,
) -> (Endpoint, Endpoint) {
    let (left, right) = memory_pair(64);
    let caller = Endpoint::new(caller_registry);
    let responder = Endpoint::new(responder_registry);

    {
        let caller = caller.clone();
        tokio::spawn(async move { caller.run(left).await });
    }
    {
        let responder = responder.clone();
        tokio::spawn(async move { responder.run(right).await });
    }
    (caller, responder)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes the payload back after a payload-controlled delay, so replies
    /// arrive in an order unrelated to the calls.
    fn delayed_echo_registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register(
            "Echo",
            handler_fn(|payload: Value| async move {
                let delay = payload["delayMs"].as_u64().unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok::<_, HandlerError>(payload)
            }),
        );
        registry
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_calls_each_get_their_own_reply() {
        let (caller, _responder) = wire(HandlerRegistry::new(), delayed_echo_registry());

        let mut handles = Vec::new();
        for n in 0..50u64 {
            let caller = caller.clone();
            handles.push(tokio::spawn(async move {
                let reply = caller
                    .call("Echo", json!({"n": n, "delayMs": 0}), Duration::from_secs(5))
                    .await
                    .unwrap();
                (n, reply["n"].as_u64().unwrap())
            }));
        }

        for handle in handles {
            let (sent, received) = handle.await.unwrap();
            assert_eq!(sent, received, "reply crossed to the wrong caller");
        }
        assert_eq!(caller.open_calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn out_of_order_replies_still_match() {
        let (caller, _responder) = wire(HandlerRegistry::new(), delayed_echo_registry());

        // The first call answers last; the last answers first.
        let slow = {
            let caller = caller.clone();
            tokio::spawn(async move {
                caller
                    .call(
                        "Echo",
                        json!({"n": 1, "delayMs": 200}),
                        Duration::from_secs(5),
                    )
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let fast = caller
            .call("Echo", json!({"n": 2, "delayMs": 0}), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(fast["n"], 2);
        let slow = slow.await.unwrap().unwrap();
        assert_eq!(slow["n"], 1);
    }

    #[tokio::test]
    async fn timeout_fires_and_late_reply_is_dropped() {
        let (caller, _responder) = wire(HandlerRegistry::new(), delayed_echo_registry());

        let err = caller
            .call(
                "Echo",
                json!({"n": 9, "delayMs": 300}),
                Duration::from_millis(50),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Timeout { .. }));
        assert_eq!(caller.open_calls(), 0, "timed-out call must leave the table");

        // Let the delayed reply land; it must be discarded quietly and the
        // engine must keep working.
        tokio::time::sleep(Duration::from_millis(400)).await;
        let reply = caller
            .call("Echo", json!({"n": 10, "delayMs": 0}), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(reply["n"], 10);
    }

    #[tokio::test]
    async fn transport_close_fails_all_pending_calls() {
        let (left, right) = memory_pair(64);
        let caller = Endpoint::new(HandlerRegistry::new());
        {
            let caller = caller.clone();
            tokio::spawn(async move { caller.run(left).await });
        }

        // Nobody answers; the peer connection drops while calls wait.
        let pending = {
            let caller = caller.clone();
            tokio::spawn(async move {
                caller
                    .call("Echo", json!({"n": 1}), Duration::from_secs(30))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(right);

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, CallError::ChannelClosed));
        assert_eq!(caller.open_calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn handler_may_call_back_without_deadlock() {
        // The responder's `Identify` handler issues its own call back
        // through the very endpoint that is dispatching it. If handler
        // dispatch shared the read loop, this would deadlock: the loop
        // would be stuck in the handler while the handler waits for the
        // loop to deliver its reply.
        use std::sync::{Arc, OnceLock};

        let mut caller_registry = HandlerRegistry::new();
        caller_registry.register(
            "WhoAreYou",
            handler_fn(|_: Value| async move {
                Ok::<_, HandlerError>(json!({"identity": "CHARGER-001"}))
            }),
        );

        let slot: Arc<OnceLock<Endpoint>> = Arc::new(OnceLock::new());
        let mut responder_registry = HandlerRegistry::new();
        responder_registry.register("Identify", {
            let slot = Arc::clone(&slot);
            handler_fn(move |_: Value| {
                let slot = Arc::clone(&slot);
                async move {
                    let endpoint = slot
                        .get()
                        .cloned()
                        .ok_or_else(|| HandlerError::internal("endpoint not wired yet"))?;
                    let who = endpoint
                        .call("WhoAreYou", json!({}), Duration::from_secs(5))
                        .await
                        .map_err(|e| HandlerError::internal(e.to_string()))?;
                    Ok(json!({"peer": who["identity"]}))
                }
            })
        });

        let (caller, responder) = wire(caller_registry, responder_registry);
        slot.set(responder).ok();

        let reply = caller
            .call("Identify", json!({}), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(reply["peer"], "CHARGER-001");
    }
}
