//! # SecVolt Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── engine/       # Correlation engine properties over the in-memory
//! │   │             # transport: id uniqueness, reply matching, timeout,
//! │   │             # close propagation, handler re-entrancy
//! │   └── correlation.rs
//! │
//! └── flows/        # End-to-end pair flows: a client endpoint against a
//!     │             # scenario's central-system registry
//!     ├── authorize.rs
//!     ├── covert.rs
//!     ├── ransom.rs
//!     └── telemetry.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p sv-tests
//!
//! # By category
//! cargo test -p sv-tests engine::
//! cargo test -p sv-tests flows::
//! ```

#![allow(dead_code)]

pub mod engine;
pub mod flows;
