//! # Covert Channel Flow
//!
//! The sender's report stream and the receiver's bit recovery, end to end:
//! every voltage the covert source emits classifies back to the bit that
//! produced it, and the wire path through the engine accepts the reports.

#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use sv_anomaly::covert::{BitDecoder, VoltageChannel};
#[cfg(test)]
use sv_link::{memory_pair, Endpoint, HandlerRegistry, ReportSource};
#[cfg(test)]
use sv_types::{action, SampledValue};

#[cfg(test)]
use voltage_covert::{central_registry, CovertSource, SECRET};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_stream_converges_to_the_secret() {
        let channel = VoltageChannel::default();
        let mut source = CovertSource::new(SECRET, channel);
        let mut decoder = BitDecoder::new();

        // One report per bit; after 8 * len reports the full text is out.
        for _ in 0..SECRET.len() * 8 {
            let report = source.next_report();
            let volts = report.meter_value[0]
                .sampled_value
                .iter()
                .find(|s| s.is_voltage())
                .and_then(SampledValue::numeric)
                .expect("every covert report carries a voltage sample");
            decoder.push_voltage(volts, &channel);

            // Partial decodes only ever contain completed characters.
            assert!(SECRET.starts_with(&decoder.decoded_text()));
        }

        assert_eq!(decoder.decoded_text(), SECRET);
    }

    #[test]
    fn energy_register_stays_ordinary_while_leaking() {
        let channel = VoltageChannel::default();
        let mut source = CovertSource::new(SECRET, channel);

        let mut previous: Option<f64> = None;
        for _ in 0..32 {
            let report = source.next_report();
            let energy = report.meter_value[0]
                .sampled_value
                .iter()
                .find(|s| s.is_energy())
                .and_then(SampledValue::numeric)
                .unwrap();
            if let Some(previous) = previous {
                let step = energy - previous;
                assert!((step - 10.0).abs() < 1e-9, "register must look normal");
            }
            previous = Some(energy);
        }
    }

    #[tokio::test]
    async fn reports_flow_through_the_engine_to_the_detector() {
        let (left, right) = memory_pair(64);
        let charge_point = Endpoint::new(HandlerRegistry::new());
        let central = Endpoint::new(central_registry(VoltageChannel::default()));

        {
            let charge_point = charge_point.clone();
            tokio::spawn(async move { charge_point.run(left).await });
        }
        tokio::spawn(async move { central.run(right).await });

        let channel = VoltageChannel::default();
        let mut source = CovertSource::new("Hi", channel);
        for _ in 0..16 {
            let report = source.next_report();
            charge_point
                .call(
                    action::METER_VALUES,
                    serde_json::to_value(&report).unwrap(),
                    Duration::from_secs(5),
                )
                .await
                .expect("detector side must keep acknowledging reports");
        }
    }
}
