//! # Pending-Call Store
//!
//! Maps correlation ids to callers suspended on a reply.
//!
//! Flow:
//! 1. `call` mints a [`CallId`] and registers it to get a oneshot receiver.
//! 2. `call` queues the CALL frame for the writer.
//! 3. The read loop receives the matching CALLRESULT/CALLERROR and calls
//!    [`PendingCallStore::complete`].
//! 4. `call` awaits the receiver or times out; a timeout cancels the entry
//!    so a late reply is dropped, never delivered twice.
//!
//! Exactly one entry exists per open id; registration and resolution are
//! single map operations, so no suspension point can observe a half-updated
//! table.

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use sv_types::{CallId, ErrorCode};

/// The reply that resolves a pending call.
#[derive(Debug)]
pub enum CallOutcome {
    /// CALLRESULT payload.
    Result(Value),
    /// CALLERROR contents.
    Error {
        code: ErrorCode,
        description: String,
        details: Value,
    },
}

/// Concurrent table of calls awaiting replies.
#[derive(Debug, Default)]
pub struct PendingCallStore {
    pending: DashMap<CallId, oneshot::Sender<CallOutcome>>,
}

impl PendingCallStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an outstanding call and get the receiver its reply will
    /// arrive on.
    pub fn register(&self, uid: CallId) -> oneshot::Receiver<CallOutcome> {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(uid, tx);
        rx
    }

    /// Resolve the call with the given id. Returns false when no such call
    /// is outstanding (late duplicate or unknown id) — the reply is dropped
    /// with a warning.
    pub fn complete(&self, uid: &CallId, outcome: CallOutcome) -> bool {
        match self.pending.remove(uid) {
            Some((_, tx)) => {
                if tx.send(outcome).is_err() {
                    // Caller gave up between timeout and this reply.
                    debug!(uid = %uid, "reply arrived for an abandoned call");
                    return false;
                }
                true
            }
            None => {
                warn!(uid = %uid, "reply does not match any outstanding call, dropping");
                false
            }
        }
    }

    /// Remove an entry without resolving it (caller timed out or failed to
    /// send). A reply arriving later falls into the unknown-id path.
    pub fn cancel(&self, uid: &CallId) -> bool {
        self.pending.remove(uid).is_some()
    }

    /// Drop every entry. Each suspended caller observes its sender dropping
    /// and resolves with a closed-channel failure.
    pub fn fail_all(&self) {
        let open = self.pending.len();
        if open > 0 {
            warn!(open, "failing all outstanding calls: channel closed");
        }
        self.pending.clear();
    }

    /// Number of currently outstanding calls.
    pub fn open_count(&self) -> usize {
        self.pending.len()
    }
}
