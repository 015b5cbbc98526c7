// ─────────────────────────────────────────────────────────────────────
// Drivegate — Packer Interface
// ─────────────────────────────────────────────────────────────────────
//! Byte-encoding seam between the kernel and the signal-database-driven
//! encoder that owns the wire layout.
//!
//! In production the real DBC packer runs behind this trait — in the
//! host process, reached through the FFI layer. The fixed-layout packer
//! provides a deterministic reference layout for tests and benches.
//!
//! A conforming packer must accept a placeholder checksum value and,
//! when handed the same value map with only the checksum substituted,
//! produce byte-identical output except for the checksum byte(s).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use drivegate_types::{DrivegateError, DrivegateResult};

use crate::builder::{
    LONG_CONTROL_ID, LONG_CONTROL_MSG, SIG_ACCEL_MAX, SIG_ACCEL_MIN, SIG_ACC_STATE,
    SIG_AEB_EVENT, SIG_ANGLE_REQUEST, SIG_CHECKSUM, SIG_CONTROL_TYPE, SIG_COUNTER,
    SIG_HAPTIC_REQUEST, SIG_JERK_MAX, SIG_JERK_MIN, SIG_SET_SPEED, STEER_CONTROL_ID,
    STEER_CONTROL_MSG,
};

/// Named-signal value mapping handed to the packer.
pub type SignalMap = HashMap<String, f64>;

/// One encoded bus frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanFrame {
    pub bus: u8,
    pub id: u32,
    pub data: Vec<u8>,
}

/// Trait for message packers.
pub trait MessagePacker: Send + Sync {
    fn pack(&self, message: &str, bus: u8, values: &SignalMap) -> DrivegateResult<CanFrame>;
}

fn signal(values: &SignalMap, message: &str, name: &str) -> DrivegateResult<f64> {
    values.get(name).copied().ok_or_else(|| {
        DrivegateError::Encode(format!("{message}: missing signal {name}"))
    })
}

fn raw_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn scaled_u8(value: f64, offset: f64, factor: f64) -> u8 {
    raw_u8((value + offset) * factor)
}

/// Deterministic reference packer with a fixed byte layout.
///
/// Checksum bytes sit past the checksum prefix of each message, so the
/// placeholder/re-encode round trip is byte-identical by construction.
pub struct FixedLayoutPacker;

impl MessagePacker for FixedLayoutPacker {
    fn pack(&self, message: &str, bus: u8, values: &SignalMap) -> DrivegateResult<CanFrame> {
        match message {
            STEER_CONTROL_MSG => {
                let angle = signal(values, message, SIG_ANGLE_REQUEST)?;
                let haptic = signal(values, message, SIG_HAPTIC_REQUEST)?;
                let control_type = signal(values, message, SIG_CONTROL_TYPE)?;
                let counter = signal(values, message, SIG_COUNTER)?;
                let checksum = signal(values, message, SIG_CHECKSUM)?;

                let raw_angle = (angle * 10.0).round().clamp(-32768.0, 32767.0) as i16;
                let [lo, hi] = raw_angle.to_le_bytes();
                let data = vec![
                    lo,
                    hi,
                    ((raw_u8(control_type) & 0x03) << 6)
                        | ((raw_u8(haptic) & 0x03) << 4)
                        | (raw_u8(counter) & 0x0f),
                    raw_u8(checksum),
                ];
                Ok(CanFrame {
                    bus,
                    id: u32::from(STEER_CONTROL_ID),
                    data,
                })
            }
            LONG_CONTROL_MSG => {
                let set_speed = signal(values, message, SIG_SET_SPEED)?;
                let acc_state = signal(values, message, SIG_ACC_STATE)?;
                let aeb_event = signal(values, message, SIG_AEB_EVENT)?;
                let jerk_min = signal(values, message, SIG_JERK_MIN)?;
                let jerk_max = signal(values, message, SIG_JERK_MAX)?;
                let accel_min = signal(values, message, SIG_ACCEL_MIN)?;
                let accel_max = signal(values, message, SIG_ACCEL_MAX)?;
                let counter = signal(values, message, SIG_COUNTER)?;
                let checksum = signal(values, message, SIG_CHECKSUM)?;

                let data = vec![
                    raw_u8(set_speed),
                    ((raw_u8(acc_state) & 0x0f) << 4) | (raw_u8(aeb_event) & 0x0f),
                    scaled_u8(jerk_min, 12.8, 10.0),
                    scaled_u8(jerk_max, 12.8, 10.0),
                    scaled_u8(accel_min, 6.35, 20.0),
                    scaled_u8(accel_max, 6.35, 20.0),
                    raw_u8(counter),
                    raw_u8(checksum),
                ];
                Ok(CanFrame {
                    bus,
                    id: u32::from(LONG_CONTROL_ID),
                    data,
                })
            }
            other => Err(DrivegateError::Encode(format!(
                "unknown message {other}"
            ))),
        }
    }
}

/// External packer that calls a packing function pointer.
///
/// Used by the FFI layer to delegate byte encoding to the host's DBC
/// packer while keeping the rest of the hot path in Rust.
type PackFn = Box<dyn Fn(&str, u8, &SignalMap) -> DrivegateResult<CanFrame> + Send + Sync>;

pub struct ExternalPacker {
    pack_fn: PackFn,
}

impl ExternalPacker {
    pub fn new(
        pack_fn: impl Fn(&str, u8, &SignalMap) -> DrivegateResult<CanFrame> + Send + Sync + 'static,
    ) -> Self {
        Self {
            pack_fn: Box::new(pack_fn),
        }
    }
}

impl MessagePacker for ExternalPacker {
    fn pack(&self, message: &str, bus: u8, values: &SignalMap) -> DrivegateResult<CanFrame> {
        (self.pack_fn)(message, bus, values)
    }
}
