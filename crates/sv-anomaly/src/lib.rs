//! # Anomaly Decision Units
//!
//! The reusable decision units the scenario pairs are built from. Each unit
//! is a pure function over its declared inputs — no hidden state beyond what
//! its struct itemizes — so an anomaly demonstration stays reproducible:
//! a wrong decision is traceable to a falsified input, never to buried
//! validation.
//!
//! None of these units fail. They return classification values and leave
//! the response decision to the calling handler.

pub mod capacity;
pub mod covert;
pub mod fault;
pub mod identity;
pub mod threshold;

pub use capacity::CapacityBalancer;
pub use covert::{encode_bits, voltage_for_bit, BitDecoder, VoltageChannel};
pub use fault::SessionState;
pub use identity::IdentityGate;
pub use threshold::{classify, MeterClass};
