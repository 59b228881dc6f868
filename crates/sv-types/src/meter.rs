//! # Meter Sample Types
//!
//! The `MeterValues` payload building blocks. Field names and enum spellings
//! follow the OCPP 1.6 JSON schema (camelCase keys, dotted measurand names).
//! Samples are transient: produced by a reporter tick, consumed by the
//! receiving handler, never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maps an enum to its OCPP wire spelling, collapsing every spelling this
/// suite does not interpret into the catch-all variant on the way in.
macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            /// Wire spelling of the value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Other => "Other",
                }
            }

            /// Parse a wire spelling; unknown ones become `Other`.
            pub fn from_wire(raw: &str) -> Self {
                match raw {
                    $($wire => $name::$variant,)+
                    _ => $name::Other,
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(Self::from_wire(&raw))
            }
        }
    };
}

/// What a sampled value measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measurand {
    /// The cumulative energy register, in watt-hours.
    EnergyActiveImportRegister,
    /// Instantaneous line voltage.
    Voltage,
    /// Any measurand this suite does not interpret.
    Other,
}

wire_enum!(Measurand {
    EnergyActiveImportRegister => "Energy.Active.Import.Register",
    Voltage => "Voltage",
});

/// Unit of a sampled value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOfMeasure {
    Wh,
    V,
    Other,
}

wire_enum!(UnitOfMeasure {
    Wh => "Wh",
    V => "V",
});

/// The circumstance under which a sample was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingContext {
    SamplePeriodic,
    Other,
}

wire_enum!(ReadingContext {
    SamplePeriodic => "Sample.Periodic",
});

/// A single measured value inside a meter report.
///
/// OCPP transmits the value as a string; [`SampledValue::numeric`] recovers
/// the number for threshold and covert-channel analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampledValue {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ReadingContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurand: Option<Measurand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitOfMeasure>,
}

impl SampledValue {
    /// A periodic energy-register sample in watt-hours.
    pub fn energy_wh(register: i64) -> Self {
        Self {
            value: register.to_string(),
            context: Some(ReadingContext::SamplePeriodic),
            measurand: Some(Measurand::EnergyActiveImportRegister),
            unit: Some(UnitOfMeasure::Wh),
        }
    }

    /// A periodic line-voltage sample in volts.
    pub fn voltage(volts: f64) -> Self {
        Self {
            value: format!("{volts:.1}"),
            context: Some(ReadingContext::SamplePeriodic),
            measurand: Some(Measurand::Voltage),
            unit: Some(UnitOfMeasure::V),
        }
    }

    /// The value as a number, if it parses.
    pub fn numeric(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }

    /// True when this sample carries the energy register.
    pub fn is_energy(&self) -> bool {
        self.measurand == Some(Measurand::EnergyActiveImportRegister)
            || self.unit == Some(UnitOfMeasure::Wh)
    }

    /// True when this sample carries line voltage.
    pub fn is_voltage(&self) -> bool {
        self.measurand == Some(Measurand::Voltage) || self.unit == Some(UnitOfMeasure::V)
    }
}

/// One timestamped group of sampled values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterValue {
    pub timestamp: DateTime<Utc>,
    pub sampled_value: Vec<SampledValue>,
}

impl MeterValue {
    /// A group stamped with the current time.
    pub fn now(sampled_value: Vec<SampledValue>) -> Self {
        Self {
            timestamp: Utc::now(),
            sampled_value,
        }
    }
}
