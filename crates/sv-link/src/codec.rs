//! # OCPP-J Codec
//!
//! Encodes [`Frame`]s as OCPP-J 1.6 JSON arrays and decodes inbound text
//! messages back. The numeric first element selects the frame kind; the
//! remaining elements are positional.
//!
//! Malformed inbound messages yield a [`DecodeError`]; the caller logs and
//! drops them without closing the connection.

use serde_json::{json, Value};

use sv_types::frame::{MESSAGE_TYPE_CALL, MESSAGE_TYPE_CALL_ERROR, MESSAGE_TYPE_CALL_RESULT};
use sv_types::{CallId, DecodeError, ErrorCode, Frame};

/// Serialize a frame to its wire text.
pub fn encode(frame: &Frame) -> String {
    let array = match frame {
        Frame::Call {
            uid,
            action,
            payload,
        } => json!([MESSAGE_TYPE_CALL, uid.as_str(), action, payload]),
        Frame::CallResult { uid, payload } => {
            json!([MESSAGE_TYPE_CALL_RESULT, uid.as_str(), payload])
        }
        Frame::CallError {
            uid,
            code,
            description,
            details,
        } => json!([
            MESSAGE_TYPE_CALL_ERROR,
            uid.as_str(),
            code.as_str(),
            description,
            details
        ]),
    };
    array.to_string()
}

/// Parse one wire text message into a frame.
pub fn decode(text: &str) -> Result<Frame, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    let items = value.as_array().ok_or(DecodeError::NotAnArray)?;

    let tag = items
        .first()
        .and_then(Value::as_i64)
        .ok_or(DecodeError::Field("message type tag"))?;
    let uid = items
        .get(1)
        .and_then(Value::as_str)
        .map(CallId::from_wire)
        .ok_or(DecodeError::Field("uid"))?;

    match tag {
        t if t == i64::from(MESSAGE_TYPE_CALL) => {
            let action = items
                .get(2)
                .and_then(Value::as_str)
                .ok_or(DecodeError::Field("action"))?
                .to_string();
            let payload = items.get(3).cloned().unwrap_or(Value::Null);
            Ok(Frame::Call {
                uid,
                action,
                payload,
            })
        }
        t if t == i64::from(MESSAGE_TYPE_CALL_RESULT) => {
            let payload = items.get(2).cloned().unwrap_or(Value::Null);
            Ok(Frame::CallResult { uid, payload })
        }
        t if t == i64::from(MESSAGE_TYPE_CALL_ERROR) => {
            let code = items
                .get(2)
                .and_then(Value::as_str)
                .map(ErrorCode::from_wire)
                .ok_or(DecodeError::Field("error code"))?;
            let description = items
                .get(3)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let details = items.get(4).cloned().unwrap_or_else(|| json!({}));
            Ok(Frame::CallError {
                uid,
                code,
                description,
                details,
            })
        }
        other => Err(DecodeError::UnknownMessageType(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_frame_round_trips() {
        let frame = Frame::Call {
            uid: CallId::from_wire("uid-1"),
            action: "BootNotification".into(),
            payload: json!({"chargePointModel": "EVSE-X1"}),
        };
        let text = encode(&frame);
        assert!(text.starts_with("[2,\"uid-1\",\"BootNotification\""));

        match decode(&text).unwrap() {
            Frame::Call {
                uid,
                action,
                payload,
            } => {
                assert_eq!(uid.as_str(), "uid-1");
                assert_eq!(action, "BootNotification");
                assert_eq!(payload["chargePointModel"], "EVSE-X1");
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn call_result_round_trips() {
        let frame = Frame::CallResult {
            uid: CallId::from_wire("uid-2"),
            payload: json!({"status": "Accepted", "interval": 10}),
        };
        match decode(&encode(&frame)).unwrap() {
            Frame::CallResult { uid, payload } => {
                assert_eq!(uid.as_str(), "uid-2");
                assert_eq!(payload["interval"], 10);
            }
            other => panic!("expected CallResult, got {other:?}"),
        }
    }

    #[test]
    fn call_error_round_trips() {
        let frame = Frame::CallError {
            uid: CallId::from_wire("uid-3"),
            code: ErrorCode::NotImplemented,
            description: "no handler".into(),
            details: json!({}),
        };
        match decode(&encode(&frame)).unwrap() {
            Frame::CallError {
                code, description, ..
            } => {
                assert_eq!(code, ErrorCode::NotImplemented);
                assert_eq!(description, "no handler");
            }
            other => panic!("expected CallError, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(decode("not json"), Err(DecodeError::Json(_))));
    }

    #[test]
    fn rejects_non_array() {
        assert!(matches!(
            decode(r#"{"messageType": 2}"#),
            Err(DecodeError::NotAnArray)
        ));
    }

    #[test]
    fn rejects_unknown_tag() {
        assert!(matches!(
            decode(r#"[9, "uid", "Action", {}]"#),
            Err(DecodeError::UnknownMessageType(9))
        ));
    }

    #[test]
    fn rejects_missing_uid() {
        assert!(matches!(
            decode("[2]"),
            Err(DecodeError::Field("uid"))
        ));
        assert!(matches!(
            decode(r#"[2, 42, "Action", {}]"#),
            Err(DecodeError::Field("uid"))
        ));
    }

    #[test]
    fn rejects_call_without_action() {
        assert!(matches!(
            decode(r#"[2, "uid"]"#),
            Err(DecodeError::Field("action"))
        ));
    }

    #[test]
    fn missing_payload_decodes_as_null() {
        match decode(r#"[3, "uid"]"#).unwrap() {
            Frame::CallResult { payload, .. } => assert!(payload.is_null()),
            other => panic!("expected CallResult, got {other:?}"),
        }
    }
}
