//! End-to-end pair flows: a charge-point endpoint wired to a scenario's
//! central-system registry over the in-memory transport.

pub mod authorize;
pub mod covert;
pub mod ransom;
pub mod telemetry;
