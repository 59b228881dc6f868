//! # Hardware Boundary
//!
//! The charge point's bus/relay signalling layer as a capability trait.
//! A command is a short binary frame addressed by a numeric id, sent
//! best-effort with no acknowledgement. Handlers and reporters receive the
//! sink as an injected `Option`-like capability at construction; when no
//! bus is attached, [`NoopSink`] substitutes and callers never learn the
//! difference — a missing bus must not raise.

use std::sync::Arc;

use tracing::info;

pub mod flood;
pub mod watch;

/// Well-known command ids on the demo bus.
pub mod command {
    /// Close the charging relay (begin delivering power).
    pub const RELAY_OPEN: u32 = 0x200;
    /// Open the charging relay (cut power).
    pub const RELAY_CLOSE: u32 = 0x201;
    /// The rogue firmware-update trigger the bus-flood scenario watches for.
    pub const ROGUE_FIRMWARE: u32 = 0x1A0;
    /// Lowest-priority-wins arbitration id used by the flood driver.
    pub const FLOOD_ID: u32 = 0x001;

    /// Payload for [`RELAY_OPEN`].
    pub const RELAY_OPEN_DATA: [u8; 2] = [0x01, 0x01];
    /// Payload for [`RELAY_CLOSE`].
    pub const RELAY_CLOSE_DATA: [u8; 2] = [0x00, 0x00];
    /// Filler payload for flood frames.
    pub const FLOOD_DATA: [u8; 8] = [0xAA; 8];
}

/// A best-effort command sink toward the physical bus.
///
/// Implementations must never panic and never block for long; a frame that
/// cannot be delivered is silently gone, exactly like a frame losing
/// arbitration on a real bus.
pub trait HardwareSink: Send + Sync {
    /// Send one command frame. No acknowledgement, no error.
    fn send_command(&self, id: u32, data: &[u8]);
}

/// A shared sink handle as injected into handlers and reporters.
pub type SharedSink = Arc<dyn HardwareSink>;

/// The substitute when no bus is configured: swallows everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl HardwareSink for NoopSink {
    fn send_command(&self, _id: u32, _data: &[u8]) {}
}

/// A sink that logs each frame, standing in for a live bus in demos.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceSink;

impl HardwareSink for TraceSink {
    fn send_command(&self, id: u32, data: &[u8]) {
        info!(id = format_args!("{id:#05x}"), data = ?data, "bus command");
    }
}

/// The sink to use given an optional configured bus.
pub fn sink_or_noop(configured: Option<SharedSink>) -> SharedSink {
    configured.unwrap_or_else(|| Arc::new(NoopSink))
}
