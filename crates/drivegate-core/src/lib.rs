// ─────────────────────────────────────────────────────────────────────
// Drivegate — Longitudinal Control Core
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Acceleration-command arbiter and message encoder for the vehicle
//! longitudinal actuation channel.
//!
//! One call per control-loop tick: the arbiter blends the computed
//! setpoint against the vehicle's stock acceleration envelope, the
//! builder assembles the signal map, the packer serializes it, and the
//! checksum engine seals the frame.
//!
//! # Safety Invariants
//!
//! 1. **Bounds are ordered and boxed**: every emitted command satisfies
//!    `accel_min <= accel_max` with both values inside the platform
//!    acceleration range. The post-clip ceiling/floor discipline makes
//!    this hold by construction for the blending policies.
//!
//! 2. **Non-finite inputs are lethal to the cycle**: a NaN or Inf
//!    setpoint, speed, or envelope field fails the cycle with a typed
//!    error. It is never clamped into a plausible-looking command,
//!    because the output directly drives vehicle actuation.
//!
//! 3. **No invented envelopes**: a missing or inverted stock envelope
//!    fails the cycle. Substituting a default could mask a real
//!    vehicle-state desynchronization.
//!
//! 4. **Checksums come from bytes, not values**: every frame is packed
//!    with a placeholder checksum, summed over its encoded byte prefix,
//!    and packed again. The packer's layout is the authority.

pub mod arbiter;
pub mod builder;
pub mod checksum;
pub mod clock;
pub mod packer;

pub use arbiter::{Arbiter, ArbiterState, Policy, SpeedBandVariant};
pub use builder::MessageBuilder;
pub use checksum::message_checksum;
pub use clock::{FakeClock, MonotonicClock, StdClock};
pub use packer::{CanFrame, ExternalPacker, FixedLayoutPacker, MessagePacker, SignalMap};
