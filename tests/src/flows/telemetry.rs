//! # Telemetry Flows
//!
//! Meter reports travelling the full path — source, engine, central-system
//! handler — for the falsified-load and sampling-drift pairs. The grant and
//! drift verdicts themselves are unit-tested in their crates; these tests
//! pin the wire path: every report a source produces is accepted and
//! acknowledged by the receiving registry.

#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use load_shedding::FalseLoadSource;
#[cfg(test)]
use sampling_drift::DriftingSource;
#[cfg(test)]
use sv_anomaly::CapacityBalancer;
#[cfg(test)]
use sv_link::{memory_pair, Endpoint, HandlerRegistry, ReportSource};
#[cfg(test)]
use sv_types::action;

#[cfg(test)]
fn wired_charge_point(central_registry: HandlerRegistry) -> Endpoint {
    let (left, right) = memory_pair(64);
    let charge_point = Endpoint::new(HandlerRegistry::new());
    let central = Endpoint::new(central_registry);

    {
        let charge_point = charge_point.clone();
        tokio::spawn(async move { charge_point.run(left).await });
    }
    tokio::spawn(async move { central.run(right).await });
    charge_point
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falsified_reports_are_accepted_at_face_value() {
        let charge_point =
            wired_charge_point(load_shedding::central_registry(CapacityBalancer::default()));

        let mut source = FalseLoadSource;
        for _ in 0..3 {
            let report = source.next_report();
            charge_point
                .call(
                    action::METER_VALUES,
                    serde_json::to_value(&report).unwrap(),
                    Duration::from_secs(5),
                )
                .await
                .expect("the balancer trusts the report and acknowledges it");
        }
    }

    #[tokio::test]
    async fn drifting_reports_keep_flowing() {
        let charge_point = wired_charge_point(sampling_drift::central_registry());

        let mut source = DriftingSource::new();
        for _ in 0..10 {
            let report = source.next_report();
            charge_point
                .call(
                    action::METER_VALUES,
                    serde_json::to_value(&report).unwrap(),
                    Duration::from_secs(5),
                )
                .await
                .expect("drift is flagged in logs, never rejected on the wire");
        }
    }
}
