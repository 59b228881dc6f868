//! # Frame Model
//!
//! The decoded unit of communication between a charge point and the central
//! system. On the wire a frame is an OCPP-J 1.6 JSON array; the numeric
//! message-type tag selects the variant:
//!
//! - `[2, "<uid>", "<Action>", {payload}]` — CALL (a request)
//! - `[3, "<uid>", {payload}]` — CALLRESULT (the matching response)
//! - `[4, "<uid>", "<code>", "<description>", {details}]` — CALLERROR
//!
//! ## Correlation
//!
//! Every CALLRESULT/CALLERROR `uid` must match exactly one outstanding CALL
//! issued by the peer that receives it. Locally generated uids are UUID v4,
//! so simultaneously-open calls never collide; uids received from the peer
//! are treated as opaque strings and echoed back verbatim.

use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Message-type tag for a CALL frame.
pub const MESSAGE_TYPE_CALL: u8 = 2;
/// Message-type tag for a CALLRESULT frame.
pub const MESSAGE_TYPE_CALL_RESULT: u8 = 3;
/// Message-type tag for a CALLERROR frame.
pub const MESSAGE_TYPE_CALL_ERROR: u8 = 4;

/// Token linking a request to its eventual response.
///
/// Outbound calls mint a fresh UUID v4; inbound calls carry whatever string
/// the peer chose, which is preserved so the reply can echo it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallId(String);

impl CallId {
    /// Mint a fresh, collision-free id for an outbound call.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an id received from the peer.
    pub fn from_wire(raw: &str) -> Self {
        Self(raw.to_string())
    }

    /// The wire representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Machine-readable error code carried by a CALLERROR frame.
///
/// A subset of the OCPP 1.6 error code vocabulary; codes received from the
/// peer that fall outside it map to [`ErrorCode::GenericError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The requested action is not registered on the receiving side.
    NotImplemented,
    /// The handler for the action failed.
    InternalError,
    /// The payload was syntactically unusable.
    FormationViolation,
    /// Any other failure.
    GenericError,
}

impl ErrorCode {
    /// Wire spelling of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotImplemented => "NotImplemented",
            ErrorCode::InternalError => "InternalError",
            ErrorCode::FormationViolation => "FormationViolation",
            ErrorCode::GenericError => "GenericError",
        }
    }

    /// Parse a wire code, collapsing unknown spellings to `GenericError`.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "NotImplemented" => ErrorCode::NotImplemented,
            "InternalError" => ErrorCode::InternalError,
            "FormationViolation" => ErrorCode::FormationViolation,
            _ => ErrorCode::GenericError,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded frame: request, response, or error reply.
#[derive(Debug, Clone)]
pub enum Frame {
    /// A request naming an action, expecting a reply with the same uid.
    Call {
        uid: CallId,
        action: String,
        payload: Value,
    },
    /// The successful reply to an earlier CALL.
    CallResult { uid: CallId, payload: Value },
    /// The failure reply to an earlier CALL.
    CallError {
        uid: CallId,
        code: ErrorCode,
        description: String,
        details: Value,
    },
}

impl Frame {
    /// The correlation id of this frame, regardless of variant.
    pub fn uid(&self) -> &CallId {
        match self {
            Frame::Call { uid, .. }
            | Frame::CallResult { uid, .. }
            | Frame::CallError { uid, .. } => uid,
        }
    }
}
