//! # Shared Types Crate
//!
//! This crate contains the decoded frame model, the OCPP 1.6 action payload
//! catalog, meter sample types, and the error taxonomy shared by the
//! call/response engine and every scenario pair.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate wire types are defined here.
//! - **Opaque correlation**: A [`CallId`] links a call to its reply and
//!   carries no other meaning; peers' ids are echoed back verbatim.
//! - **No I/O**: This crate never touches a socket; encoding and transport
//!   live in `sv-link`.

pub mod actions;
pub mod errors;
pub mod frame;
pub mod meter;

pub use actions::*;
pub use errors::*;
pub use frame::{CallId, ErrorCode, Frame};
pub use meter::*;
