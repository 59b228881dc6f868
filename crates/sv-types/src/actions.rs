//! # Action Payload Catalog
//!
//! Request/response payload types for the OCPP 1.6 actions this suite
//! exchanges, plus the action-name constants that form the cross-scenario
//! contract. All payloads serialize with camelCase keys per the OCPP-J
//! schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::meter::MeterValue;

/// Action names understood by at least one side of every pair.
pub mod action {
    pub const BOOT_NOTIFICATION: &str = "BootNotification";
    pub const HEARTBEAT: &str = "Heartbeat";
    pub const AUTHORIZE: &str = "Authorize";
    pub const METER_VALUES: &str = "MeterValues";
    pub const START_TRANSACTION: &str = "StartTransaction";
    pub const STOP_TRANSACTION: &str = "StopTransaction";
    pub const REMOTE_START_TRANSACTION: &str = "RemoteStartTransaction";
    pub const REMOTE_STOP_TRANSACTION: &str = "RemoteStopTransaction";
    pub const STATUS_NOTIFICATION: &str = "StatusNotification";
}

/// Outcome of a charge point's registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    Accepted,
    Pending,
    Rejected,
}

/// Outcome of an identity check, as carried in `idTagInfo.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    Accepted,
    Invalid,
}

/// Outcome of a remote start/stop command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteStartStopStatus {
    Accepted,
    Rejected,
}

/// Operational state reported in a `StatusNotification`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargePointStatus {
    Available,
    Charging,
    Faulted,
}

/// Error class reported in a `StatusNotification`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargePointErrorCode {
    NoError,
    OtherError,
}

/// The `idTagInfo` object shared by authorization-bearing responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdTagInfo {
    pub status: AuthorizationStatus,
}

impl IdTagInfo {
    pub fn accepted() -> Self {
        Self {
            status: AuthorizationStatus::Accepted,
        }
    }

    pub fn invalid() -> Self {
        Self {
            status: AuthorizationStatus::Invalid,
        }
    }
}

// =============================================================================
// Charge point → central system
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationRequest {
    pub charge_point_model: String,
    pub charge_point_vendor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationResponse {
    pub current_time: DateTime<Utc>,
    /// Suggested heartbeat/report interval in seconds.
    pub interval: u32,
    pub status: RegistrationStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartbeatRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub current_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeRequest {
    pub id_tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeResponse {
    pub id_tag_info: IdTagInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterValuesRequest {
    pub connector_id: u32,
    pub meter_value: Vec<MeterValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeterValuesResponse {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTransactionRequest {
    pub connector_id: u32,
    pub id_tag: String,
    pub meter_start: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTransactionResponse {
    pub id_tag_info: IdTagInfo,
    pub transaction_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTransactionRequest {
    pub transaction_id: i32,
    pub meter_stop: i64,
    pub timestamp: DateTime<Utc>,
    pub id_tag: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopTransactionResponse {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusNotificationRequest {
    pub connector_id: u32,
    pub error_code: ChargePointErrorCode,
    pub status: ChargePointStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusNotificationResponse {}

// =============================================================================
// Central system → charge point
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStartTransactionRequest {
    pub id_tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStartTransactionResponse {
    pub status: RemoteStartStopStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStopTransactionRequest {
    pub transaction_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStopTransactionResponse {
    pub status: RemoteStartStopStatus,
}
