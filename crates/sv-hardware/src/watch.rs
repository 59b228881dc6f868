//! Bus traffic watch.
//!
//! Wraps a sink so every command still reaches the bus while a watcher is
//! notified whenever a particular id goes by — the in-process stand-in for
//! listening on the physical bus, used by the compromise-detection demos.

use std::sync::Arc;

use tokio::sync::Notify;

use crate::{HardwareSink, SharedSink};

/// A sink that forwards everything and flags one watched id.
pub struct WatchSink {
    inner: SharedSink,
    watched_id: u32,
    seen: Arc<Notify>,
}

impl WatchSink {
    /// Wrap `inner`, watching for `watched_id`. Returns the wrapped sink
    /// and the notifier that fires when the id is observed.
    pub fn wrap(inner: SharedSink, watched_id: u32) -> (SharedSink, Arc<Notify>) {
        let seen = Arc::new(Notify::new());
        let sink = Arc::new(Self {
            inner,
            watched_id,
            seen: Arc::clone(&seen),
        });
        (sink, seen)
    }
}

impl HardwareSink for WatchSink {
    fn send_command(&self, id: u32, data: &[u8]) {
        if id == self.watched_id {
            self.seen.notify_waiters();
        }
        self.inner.send_command(id, data);
    }
}
