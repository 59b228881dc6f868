//! # Boot & Authorization Flow
//!
//! The baseline end-to-end exchange every pair begins with, plus the
//! identity-spoofing probes against the exact-membership gate.

#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use serde_json::json;

#[cfg(test)]
use identity_spoofing::central_registry;
#[cfg(test)]
use sv_anomaly::IdentityGate;
#[cfg(test)]
use sv_link::{memory_pair, Endpoint, HandlerRegistry};
#[cfg(test)]
use sv_types::{
    action, AuthorizationStatus, AuthorizeRequest, AuthorizeResponse, BootNotificationRequest,
    BootNotificationResponse, RegistrationStatus, StartTransactionRequest,
    StartTransactionResponse,
};

#[cfg(test)]
const TIMEOUT: Duration = Duration::from_secs(5);

/// A charge-point endpoint wired to the identity-spoofing central system.
#[cfg(test)]
fn wired_pair(allowed: &[&str]) -> Endpoint {
    let (left, right) = memory_pair(64);
    let charge_point = Endpoint::new(HandlerRegistry::new());
    let central = Endpoint::new(central_registry(IdentityGate::new(
        allowed.iter().copied(),
    )));

    {
        let charge_point = charge_point.clone();
        tokio::spawn(async move { charge_point.run(left).await });
    }
    tokio::spawn(async move { central.run(right).await });
    charge_point
}

#[cfg(test)]
async fn authorize_status(endpoint: &Endpoint, id_tag: &str) -> AuthorizationStatus {
    let reply = endpoint
        .call(
            action::AUTHORIZE,
            serde_json::to_value(AuthorizeRequest {
                id_tag: id_tag.into(),
            })
            .unwrap(),
            TIMEOUT,
        )
        .await
        .unwrap();
    let response: AuthorizeResponse = serde_json::from_value(reply).unwrap();
    response.id_tag_info.status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn boot_is_accepted_with_the_advertised_interval() {
        let charge_point = wired_pair(&["USER-A123"]);

        let reply = charge_point
            .call(
                action::BOOT_NOTIFICATION,
                serde_json::to_value(BootNotificationRequest {
                    charge_point_model: "SecVolt-Sim".into(),
                    charge_point_vendor: "GroupProject".into(),
                })
                .unwrap(),
                TIMEOUT,
            )
            .await
            .unwrap();
        let response: BootNotificationResponse = serde_json::from_value(reply).unwrap();

        assert_eq!(response.status, RegistrationStatus::Accepted);
        assert_eq!(response.interval, 10);
    }

    #[tokio::test]
    async fn known_tag_is_accepted_and_crafted_tag_is_not() {
        let charge_point = wired_pair(&["USER-A123"]);

        assert_eq!(
            authorize_status(&charge_point, "USER-A123").await,
            AuthorizationStatus::Accepted
        );
        assert_eq!(
            authorize_status(&charge_point, "USER-A123' OR '1'='1").await,
            AuthorizationStatus::Invalid
        );
        assert_eq!(
            authorize_status(&charge_point, "' OR '1'='1' --").await,
            AuthorizationStatus::Invalid
        );
    }

    #[tokio::test]
    async fn foreign_tag_cannot_start_a_transaction() {
        let charge_point = wired_pair(&["USER-A123"]);

        let reply = charge_point
            .call(
                action::START_TRANSACTION,
                serde_json::to_value(StartTransactionRequest {
                    connector_id: 1,
                    id_tag: "USER-B777".into(),
                    meter_start: 150_000,
                    timestamp: chrono::Utc::now(),
                })
                .unwrap(),
                TIMEOUT,
            )
            .await
            .unwrap();
        let response: StartTransactionResponse = serde_json::from_value(reply).unwrap();

        assert_eq!(response.id_tag_info.status, AuthorizationStatus::Invalid);
        assert_eq!(response.transaction_id, 0);
    }

    #[tokio::test]
    async fn known_tag_gets_a_transaction_id() {
        let charge_point = wired_pair(&["USER-A123"]);

        let reply = charge_point
            .call(
                action::START_TRANSACTION,
                serde_json::to_value(StartTransactionRequest {
                    connector_id: 1,
                    id_tag: "USER-A123".into(),
                    meter_start: 100,
                    timestamp: chrono::Utc::now(),
                })
                .unwrap(),
                TIMEOUT,
            )
            .await
            .unwrap();
        let response: StartTransactionResponse = serde_json::from_value(reply).unwrap();

        assert_eq!(response.id_tag_info.status, AuthorizationStatus::Accepted);
        assert!(response.transaction_id > 0);
    }

    #[tokio::test]
    async fn unregistered_action_answers_with_an_error_frame() {
        let charge_point = wired_pair(&["USER-A123"]);

        let err = charge_point
            .call("DataTransfer", json!({}), TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, sv_types::CallError::Remote { .. }));

        // The connection stays usable afterwards.
        assert_eq!(
            authorize_status(&charge_point, "USER-A123").await,
            AuthorizationStatus::Accepted
        );
    }
}
