//! # Transport Boundary
//!
//! The engine requires only a duplex, message-framed, ordered channel:
//! send a text message, receive the next one, observe the close. The
//! WebSocket adapter carries live demo pairs; the in-memory adapter wires
//! two endpoints directly together for tests and offline runs.
//!
//! A transport splits into independent halves so the single read loop and
//! the single writer task can own their side outright.

use async_trait::async_trait;

use sv_types::TransportError;

pub mod memory;
pub mod ws;

/// The write half: appends one whole message per call.
#[async_trait]
pub trait MessageSink: Send {
    async fn send(&mut self, text: String) -> Result<(), TransportError>;
}

/// The read half: yields messages in arrival order.
///
/// `None` means the peer closed cleanly; `Some(Err(_))` means the channel
/// broke. Either way no further messages will arrive.
#[async_trait]
pub trait MessageStream: Send {
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;
}

/// A duplex channel that splits into its two halves.
pub trait Transport: Send {
    type Sink: MessageSink + 'static;
    type Stream: MessageStream + 'static;

    fn split(self) -> (Self::Sink, Self::Stream);
}
