//! # Correlation Engine
//!
//! An [`Endpoint`] is one side of a demo pair: it assigns correlation ids
//! to outbound calls, matches inbound replies to their callers, and hands
//! unsolicited inbound calls to the handler registry.
//!
//! ## Concurrency contract
//!
//! Any number of tasks may `call` concurrently against one endpoint. Every
//! outbound frame funnels through a single writer task, so frames hit the
//! transport whole and in queue order. `run` is the single read loop — the
//! only code that resolves pending calls or invokes handlers — and each
//! inbound call is dispatched on its own task, so a handler that issues
//! calls of its own never blocks the loop that must deliver its reply.
//!
//! When the transport closes, every suspended caller fails with
//! `ChannelClosed` and `run` returns.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use sv_types::{CallError, CallId, Frame, LinkError};

use crate::codec;
use crate::pending::{CallOutcome, PendingCallStore};
use crate::router::HandlerRegistry;
use crate::transport::{MessageSink, MessageStream, Transport};

/// Depth of the outbound write queue.
const OUTBOUND_QUEUE: usize = 256;

/// One side of a call/response session. Cheap to clone; clones share the
/// same pending table, registry, and write queue.
#[derive(Clone)]
pub struct Endpoint {
    outbound: mpsc::Sender<String>,
    outbound_rx: Arc<Mutex<Option<mpsc::Receiver<String>>>>,
    pending: Arc<PendingCallStore>,
    handlers: Arc<HandlerRegistry>,
}

impl Endpoint {
    /// Build an endpoint over a finished handler registry. The registry is
    /// immutable from here on.
    pub fn new(handlers: HandlerRegistry) -> Self {
        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE);
        Self {
            outbound,
            outbound_rx: Arc::new(Mutex::new(Some(outbound_rx))),
            pending: Arc::new(PendingCallStore::new()),
            handlers: Arc::new(handlers),
        }
    }

    /// Issue one request and suspend until its reply, a timeout, or the
    /// channel closing. Exactly one frame is queued for the transport.
    pub async fn call(
        &self,
        action: &str,
        payload: Value,
        timeout: Duration,
    ) -> Result<Value, CallError> {
        let uid = CallId::fresh();
        let reply = self.pending.register(uid.clone());

        let frame = Frame::Call {
            uid: uid.clone(),
            action: action.to_string(),
            payload,
        };
        if self.outbound.send(codec::encode(&frame)).await.is_err() {
            self.pending.cancel(&uid);
            return Err(CallError::ChannelClosed);
        }
        debug!(uid = %uid, action, "call issued");

        match tokio::time::timeout(timeout, reply).await {
            Ok(Ok(CallOutcome::Result(payload))) => Ok(payload),
            Ok(Ok(CallOutcome::Error {
                code,
                description,
                details,
            })) => Err(CallError::Remote {
                code,
                description,
                details,
            }),
            // Sender dropped: the read loop ended while we waited.
            Ok(Err(_)) => Err(CallError::ChannelClosed),
            Err(_) => {
                // Remove the entry so a late reply is dropped, not
                // delivered twice.
                self.pending.cancel(&uid);
                Err(CallError::Timeout { timeout })
            }
        }
    }

    /// Number of calls currently awaiting a reply.
    pub fn open_calls(&self) -> usize {
        self.pending.open_count()
    }

    /// The single read loop. Consumes the transport and runs until it
    /// closes, then fails all still-pending calls and returns. May be
    /// invoked once per endpoint.
    pub async fn run<T: Transport>(&self, transport: T) -> Result<(), LinkError> {
        let mut outbound_rx = self
            .outbound_rx
            .lock()
            .unwrap()
            .take()
            .ok_or(LinkError::AlreadyDriven)?;

        let (mut sink, mut stream) = transport.split();

        let writer = tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = sink.send(text).await {
                    warn!(error = %e, "outbound write failed, stopping writer");
                    break;
                }
            }
        });

        let result = loop {
            match stream.recv().await {
                None => break Ok(()),
                Some(Err(e)) => break Err(LinkError::Transport(e)),
                Some(Ok(text)) => self.handle_inbound(text),
            }
        };

        // Tear down the writer first so new calls fail to queue, then
        // resolve everyone already waiting.
        writer.abort();
        let _ = writer.await;
        self.pending.fail_all();
        result
    }

    fn handle_inbound(&self, text: String) {
        let frame = match codec::decode(&text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "dropping undecodable message");
                return;
            }
        };

        match frame {
            Frame::Call {
                uid,
                action,
                payload,
            } => self.dispatch_call(uid, action, payload),
            Frame::CallResult { uid, payload } => {
                self.pending.complete(&uid, CallOutcome::Result(payload));
            }
            Frame::CallError {
                uid,
                code,
                description,
                details,
            } => {
                self.pending.complete(
                    &uid,
                    CallOutcome::Error {
                        code,
                        description,
                        details,
                    },
                );
            }
        }
    }

    /// Run the handler on its own task and queue the reply frame. The read
    /// loop never waits on application logic.
    fn dispatch_call(&self, uid: CallId, action: String, payload: Value) {
        let handlers = Arc::clone(&self.handlers);
        let outbound = self.outbound.clone();

        tokio::spawn(async move {
            debug!(uid = %uid, action = %action, "dispatching inbound call");
            let reply = match handlers.dispatch(&action, payload).await {
                Ok(payload) => Frame::CallResult { uid, payload },
                Err(failure) => {
                    warn!(action = %action, error = %failure, "handler failed");
                    Frame::CallError {
                        uid,
                        code: failure.code,
                        description: failure.description,
                        details: json!({}),
                    }
                }
            };
            if outbound.send(codec::encode(&reply)).await.is_err() {
                warn!(action = %action, "reply dropped: channel closed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::handler_fn;
    use crate::transport::memory::memory_pair;
    use serde_json::json;
    use sv_types::HandlerError;

    fn echo_endpoint() -> Endpoint {
        let mut registry = HandlerRegistry::new();
        registry.register(
            "Echo",
            handler_fn(|payload: Value| async move { Ok::<_, HandlerError>(payload) }),
        );
        Endpoint::new(registry)
    }

    #[tokio::test]
    async fn call_resolves_with_peer_response() {
        let (left, right) = memory_pair(16);
        let caller = Endpoint::new(HandlerRegistry::new());
        let responder = echo_endpoint();

        let caller_loop = {
            let caller = caller.clone();
            tokio::spawn(async move { caller.run(left).await })
        };
        let responder_loop = {
            let responder = responder.clone();
            tokio::spawn(async move { responder.run(right).await })
        };

        let reply = caller
            .call("Echo", json!({"n": 7}), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(reply["n"], 7);
        assert_eq!(caller.open_calls(), 0);

        caller_loop.abort();
        responder_loop.abort();
    }

    #[tokio::test]
    async fn unknown_action_surfaces_remote_error() {
        let (left, right) = memory_pair(16);
        let caller = Endpoint::new(HandlerRegistry::new());
        let responder = Endpoint::new(HandlerRegistry::new());

        let caller_loop = {
            let caller = caller.clone();
            tokio::spawn(async move { caller.run(left).await })
        };
        let responder_loop = {
            let responder = responder.clone();
            tokio::spawn(async move { responder.run(right).await })
        };

        let err = caller
            .call("Nothing", json!({}), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Remote { .. }));

        caller_loop.abort();
        responder_loop.abort();
    }

    #[tokio::test]
    async fn call_times_out_and_clears_the_table() {
        let (left, _right) = memory_pair(16);
        let caller = Endpoint::new(HandlerRegistry::new());

        let caller_loop = {
            let caller = caller.clone();
            tokio::spawn(async move { caller.run(left).await })
        };

        let err = caller
            .call("Echo", json!({}), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Timeout { .. }));
        assert_eq!(caller.open_calls(), 0);

        caller_loop.abort();
    }

    #[tokio::test]
    async fn second_run_is_rejected() {
        let (left, right) = memory_pair(16);
        let endpoint = Endpoint::new(HandlerRegistry::new());

        let first = {
            let endpoint = endpoint.clone();
            tokio::spawn(async move { endpoint.run(left).await })
        };
        tokio::task::yield_now().await;

        let err = endpoint.run(right).await.unwrap_err();
        assert!(matches!(err, LinkError::AlreadyDriven));
        first.abort();
    }
}
