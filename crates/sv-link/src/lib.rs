//! # Call/Response Engine
//!
//! One duplex, message-framed channel; many concurrent callers. This crate
//! owns the machinery every demo pair shares:
//!
//! - [`codec`] — OCPP-J 1.6 array encoding between [`sv_types::Frame`] and
//!   transport text messages.
//! - [`transport`] — the duplex channel boundary: a WebSocket adapter for
//!   live pairs and an in-memory adapter for tests.
//! - [`pending`] — the table pairing outbound calls with their replies.
//! - [`router`] — named-action handler registration and dispatch.
//! - [`endpoint`] — the correlation engine: `call` for outbound requests,
//!   `run` for the single read loop.
//! - [`reporter`] — periodic meter-report producers, decoupled from
//!   inbound traffic.
//!
//! ## Concurrency shape
//!
//! Exactly one read loop per endpoint resolves pending calls and dispatches
//! inbound requests; outbound frames from any number of tasks funnel
//! through one writer so the transport sees whole frames only. Handlers run
//! on their own tasks and may issue calls back through the same endpoint
//! without deadlocking the loop.

pub mod codec;
pub mod endpoint;
pub mod pending;
pub mod reporter;
pub mod router;
pub mod transport;

pub use endpoint::Endpoint;
pub use reporter::{run_reporter, ReportSource, ReporterConfig};
pub use router::{handler_fn, ActionHandler, HandlerRegistry};
pub use transport::{memory::memory_pair, ws, MessageSink, MessageStream, Transport};
