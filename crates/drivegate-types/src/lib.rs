// ─────────────────────────────────────────────────────────────────────
// Drivegate — Longitudinal Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! Drivegate kernel — the real-time acceleration-command arbiter for
//! the vehicle longitudinal actuation channel.

pub mod bound;
pub mod command;
pub mod config;
pub mod error;

pub use bound::clip;
pub use command::{ArbitratedLimits, ControlRequest, LongitudinalCommand, StockEnvelope};
pub use config::ArbiterConfig;
pub use error::{DrivegateError, DrivegateResult};
