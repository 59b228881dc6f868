//! # Error Types
//!
//! The failure taxonomy for the call/response engine. Classification-style
//! decision units (identity gate, threshold detector) never appear here:
//! they return a status value instead of failing, pushing the "what to do
//! about it" decision to the calling handler.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::frame::ErrorCode;

/// Why an outbound call did not produce a response payload.
#[derive(Debug, Error)]
pub enum CallError {
    /// No CALLRESULT/CALLERROR arrived within the deadline. The engine does
    /// not retry; the next scheduled attempt is the caller's business.
    #[error("no reply within {timeout:?}")]
    Timeout { timeout: Duration },

    /// The peer answered with a CALLERROR frame.
    #[error("peer signalled {code}: {description}")]
    Remote {
        code: ErrorCode,
        description: String,
        details: Value,
    },

    /// The transport closed while the call was outstanding.
    #[error("channel closed while awaiting reply")]
    ChannelClosed,
}

/// Failure raised by an action handler; the dispatcher turns it into a
/// CALLERROR frame carrying the original correlation id.
#[derive(Debug, Error)]
#[error("{code}: {description}")]
pub struct HandlerError {
    pub code: ErrorCode,
    pub description: String,
}

impl HandlerError {
    /// An internal failure with the given description.
    pub fn internal(description: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InternalError,
            description: description.into(),
        }
    }

    /// The payload did not have the shape the handler requires.
    pub fn malformed(description: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::FormationViolation,
            description: description.into(),
        }
    }
}

/// Failure of the underlying duplex channel.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer closed the connection.
    #[error("connection closed by peer")]
    Closed,

    /// The transport broke mid-session.
    #[error("transport failure: {0}")]
    Failed(String),
}

/// Why an inbound message could not be decoded into a [`crate::Frame`].
///
/// Decode failures are logged and the message dropped; the connection
/// stays open unless the transport itself signalled corruption.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame is not a JSON array")]
    NotAnArray,

    #[error("unsupported message type tag {0}")]
    UnknownMessageType(i64),

    #[error("frame field missing or mistyped: {0}")]
    Field(&'static str),
}

/// Failure terminating the engine's read loop.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// `run` was invoked a second time on the same endpoint; one read loop
    /// per engine instance is the whole design.
    #[error("endpoint read loop already started")]
    AlreadyDriven,
}
