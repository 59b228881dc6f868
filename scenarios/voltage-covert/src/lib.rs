//! # Voltage Covert-Channel Demo Pair
//!
//! The meter report's voltage field does double duty: a `1` bit of the
//! secret nudges the reported voltage up half a volt, a `0` leaves it at
//! the 220 V base. Energy readings stay perfectly ordinary, so an operator
//! watching consumption sees nothing. The receiving side classifies every
//! voltage against the 220.25 V midpoint, accumulates the bit stream, and
//! prints each newly completed character of the smuggled text.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use sv_anomaly::covert::{encode_bits, voltage_for_bit, BitDecoder, VoltageChannel};
use sv_link::{handler_fn, HandlerRegistry, ReportSource};
use sv_types::{
    action, BootNotificationRequest, BootNotificationResponse, HeartbeatRequest,
    HeartbeatResponse, MeterValue, MeterValuesRequest, MeterValuesResponse, RegistrationStatus,
    SampledValue,
};

/// Deadline for every call in this pair.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// The secret the compromised firmware leaks.
pub const SECRET: &str = "SECVOLT_PASS";

/// One meter report per bit: energy advances normally while the voltage
/// sample carries the next bit of the secret, cycling when it runs out.
pub struct CovertSource {
    channel: VoltageChannel,
    bits: Vec<bool>,
    bit_index: usize,
    register_wh: i64,
}

impl CovertSource {
    pub fn new(secret: &str, channel: VoltageChannel) -> Self {
        Self {
            channel,
            bits: encode_bits(secret),
            bit_index: 0,
            register_wh: 1_000,
        }
    }
}

impl ReportSource for CovertSource {
    fn next_report(&mut self) -> MeterValuesRequest {
        self.register_wh += 10;

        let bit = self.bits[self.bit_index % self.bits.len()];
        self.bit_index += 1;
        let volts = voltage_for_bit(bit, &self.channel);

        info!(
            register_wh = self.register_wh,
            volts,
            bit = u8::from(bit),
            "report carries the next secret bit"
        );

        MeterValuesRequest {
            connector_id: 1,
            meter_value: vec![MeterValue::now(vec![
                SampledValue::energy_wh(self.register_wh),
                SampledValue::voltage(volts),
            ])],
            transaction_id: None,
        }
    }
}

/// Receiver state: the growing bit pool and the text recovered so far.
#[derive(Default)]
struct CovertMonitor {
    decoder: BitDecoder,
    decoded: String,
}

impl CovertMonitor {
    fn observe(&mut self, volts: f64, channel: &VoltageChannel) {
        let bit = self.decoder.push_voltage(volts, channel);
        warn!(
            volts,
            bit = u8::from(bit),
            threshold = channel.threshold(),
            "voltage analysis recovered a bit"
        );

        let text = self.decoder.decoded_text();
        if text != self.decoded {
            self.decoded = text;
            error!(message = %self.decoded, "covert message decoded so far");
        }
    }
}

/// Handlers for the central-system side of the pair.
pub fn central_registry(channel: VoltageChannel) -> HandlerRegistry {
    let monitor = Arc::new(Mutex::new(CovertMonitor::default()));
    let mut registry = HandlerRegistry::new();

    registry.register(
        action::BOOT_NOTIFICATION,
        handler_fn(|req: BootNotificationRequest| async move {
            info!(
                model = %req.charge_point_model,
                vendor = %req.charge_point_vendor,
                "charge point registered"
            );
            Ok(BootNotificationResponse {
                current_time: Utc::now(),
                interval: 10,
                status: RegistrationStatus::Accepted,
            })
        }),
    );

    registry.register(
        action::HEARTBEAT,
        handler_fn(|_req: HeartbeatRequest| async move {
            Ok(HeartbeatResponse {
                current_time: Utc::now(),
            })
        }),
    );

    registry.register(action::METER_VALUES, {
        let monitor = Arc::clone(&monitor);
        handler_fn(move |req: MeterValuesRequest| {
            let monitor = Arc::clone(&monitor);
            async move {
                for group in &req.meter_value {
                    // The operator view: energy only.
                    if let Some(energy) = group
                        .sampled_value
                        .iter()
                        .find(|s| s.is_energy())
                        .and_then(SampledValue::numeric)
                    {
                        info!(energy_wh = energy, "energy report");
                    }

                    // The detector view: every voltage sample is a symbol.
                    for volts in group
                        .sampled_value
                        .iter()
                        .filter(|s| s.is_voltage())
                        .filter_map(SampledValue::numeric)
                    {
                        monitor.lock().unwrap().observe(volts, &channel);
                    }
                }
                Ok(MeterValuesResponse::default())
            }
        })
    });

    registry
}
