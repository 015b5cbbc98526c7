// ─────────────────────────────────────────────────────────────────────
// Drivegate — Message Value Builder
// ─────────────────────────────────────────────────────────────────────
//! Assembles the named-signal value mapping for the longitudinal and
//! steering command messages and seals each with its integrity byte.
//!
//! The checksum depends on the very bytes it is embedded near, so every
//! build is a double encode: pack with a placeholder checksum, compute
//! the real checksum from the encoded byte prefix, pack again. The
//! packer's byte layout is the authority on payload bytes — the
//! checksum is never computed from the value map directly.

use std::sync::Arc;

use drivegate_types::{DrivegateError, DrivegateResult, LongitudinalCommand};

use crate::checksum::message_checksum;
use crate::packer::{CanFrame, MessagePacker, SignalMap};

/// Wire constants for the longitudinal command message.
pub const LONG_CONTROL_MSG: &str = "LongControl";
pub const LONG_CONTROL_ID: u16 = 0x2b9;
/// Leading payload bytes covered by the longitudinal checksum.
pub const LONG_CHECKSUM_PREFIX: usize = 7;

/// Wire constants for the steering command message.
pub const STEER_CONTROL_MSG: &str = "SteerControl";
pub const STEER_CONTROL_ID: u16 = 0x488;
/// Leading payload bytes covered by the steering checksum.
pub const STEER_CHECKSUM_PREFIX: usize = 3;

pub const SIG_SET_SPEED: &str = "SET_SPEED";
pub const SIG_ACC_STATE: &str = "ACC_STATE";
pub const SIG_AEB_EVENT: &str = "AEB_EVENT";
pub const SIG_JERK_MIN: &str = "JERK_MIN";
pub const SIG_JERK_MAX: &str = "JERK_MAX";
pub const SIG_ACCEL_MIN: &str = "ACCEL_MIN";
pub const SIG_ACCEL_MAX: &str = "ACCEL_MAX";
pub const SIG_ANGLE_REQUEST: &str = "ANGLE_REQUEST";
pub const SIG_HAPTIC_REQUEST: &str = "HAPTIC_REQUEST";
pub const SIG_CONTROL_TYPE: &str = "CONTROL_TYPE";
pub const SIG_COUNTER: &str = "COUNTER";
pub const SIG_CHECKSUM: &str = "CHECKSUM";

/// Builds sealed command frames through an injected packer.
pub struct MessageBuilder {
    packer: Arc<dyn MessagePacker>,
    bus: u8,
}

impl MessageBuilder {
    pub fn new(packer: Arc<dyn MessagePacker>, bus: u8) -> Self {
        Self { packer, bus }
    }

    /// Build the steering command frame.
    ///
    /// The wire convention negates the requested angle; haptic requests
    /// are never raised here.
    pub fn create_steering_control(
        &self,
        angle: f64,
        enabled: bool,
        counter: u8,
    ) -> DrivegateResult<CanFrame> {
        let mut values = SignalMap::new();
        values.insert(SIG_ANGLE_REQUEST.into(), -angle);
        values.insert(SIG_HAPTIC_REQUEST.into(), 0.0);
        values.insert(SIG_CONTROL_TYPE.into(), if enabled { 1.0 } else { 0.0 });
        values.insert(SIG_COUNTER.into(), f64::from(counter));
        self.seal(
            STEER_CONTROL_MSG,
            STEER_CONTROL_ID,
            STEER_CHECKSUM_PREFIX,
            values,
        )
    }

    /// Build the longitudinal command frame from an arbitrated command.
    pub fn create_longitudinal_command(
        &self,
        command: &LongitudinalCommand,
    ) -> DrivegateResult<CanFrame> {
        let mut values = SignalMap::new();
        values.insert(SIG_SET_SPEED.into(), command.set_speed);
        values.insert(SIG_ACC_STATE.into(), f64::from(command.acc_state));
        values.insert(SIG_AEB_EVENT.into(), f64::from(command.aeb_event));
        values.insert(SIG_JERK_MIN.into(), command.jerk_min);
        values.insert(SIG_JERK_MAX.into(), command.jerk_max);
        values.insert(SIG_ACCEL_MIN.into(), command.accel_min);
        values.insert(SIG_ACCEL_MAX.into(), command.accel_max);
        values.insert(SIG_COUNTER.into(), f64::from(command.counter));
        self.seal(
            LONG_CONTROL_MSG,
            LONG_CONTROL_ID,
            LONG_CHECKSUM_PREFIX,
            values,
        )
    }

    /// Encode with a placeholder checksum, compute the real checksum
    /// over the byte prefix, encode again.
    fn seal(
        &self,
        message: &str,
        message_id: u16,
        prefix_len: usize,
        mut values: SignalMap,
    ) -> DrivegateResult<CanFrame> {
        values.insert(SIG_CHECKSUM.into(), 0.0);
        let draft = self.packer.pack(message, self.bus, &values)?;
        if draft.data.len() < prefix_len {
            return Err(DrivegateError::Encode(format!(
                "{message}: payload is {} bytes, checksum prefix needs {prefix_len}",
                draft.data.len()
            )));
        }
        let crc = message_checksum(message_id, &draft.data[..prefix_len]);
        values.insert(SIG_CHECKSUM.into(), f64::from(crc));
        self.packer.pack(message, self.bus, &values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::{ExternalPacker, FixedLayoutPacker};

    fn builder() -> MessageBuilder {
        MessageBuilder::new(Arc::new(FixedLayoutPacker), 0)
    }

    fn long_command() -> LongitudinalCommand {
        LongitudinalCommand {
            set_speed: 0.0,
            acc_state: 3,
            aeb_event: 0,
            jerk_min: -0.9,
            jerk_max: 0.9,
            accel_min: -0.2,
            accel_max: 0.0,
            counter: 5,
        }
    }

    #[test]
    fn test_longitudinal_checksum_matches_prefix() {
        let frame = builder().create_longitudinal_command(&long_command()).unwrap();
        let expected = message_checksum(LONG_CONTROL_ID, &frame.data[..LONG_CHECKSUM_PREFIX]);
        assert_eq!(frame.data[7], expected);
    }

    #[test]
    fn test_steering_checksum_matches_prefix() {
        let frame = builder().create_steering_control(8.5, true, 2).unwrap();
        let expected = message_checksum(STEER_CONTROL_ID, &frame.data[..STEER_CHECKSUM_PREFIX]);
        assert_eq!(frame.data[3], expected);
    }

    #[test]
    fn test_steering_angle_negated_on_wire() {
        let frame = builder().create_steering_control(12.3, true, 0).unwrap();
        let raw = i16::from_le_bytes([frame.data[0], frame.data[1]]);
        assert_eq!(raw, -123);
    }

    #[test]
    fn test_steering_disabled_control_type_zero() {
        let frame = builder().create_steering_control(0.0, false, 0).unwrap();
        assert_eq!(frame.data[2] >> 6, 0);
        let enabled = builder().create_steering_control(0.0, true, 0).unwrap();
        assert_eq!(enabled.data[2] >> 6, 1);
    }

    #[test]
    fn test_double_encode_only_changes_checksum_byte() {
        // Re-pack the sealed value map with the placeholder restored:
        // everything but the checksum byte must be byte-identical.
        let sealed = builder().create_longitudinal_command(&long_command()).unwrap();
        let mut values = SignalMap::new();
        values.insert(SIG_SET_SPEED.into(), 0.0);
        values.insert(SIG_ACC_STATE.into(), 3.0);
        values.insert(SIG_AEB_EVENT.into(), 0.0);
        values.insert(SIG_JERK_MIN.into(), -0.9);
        values.insert(SIG_JERK_MAX.into(), 0.9);
        values.insert(SIG_ACCEL_MIN.into(), -0.2);
        values.insert(SIG_ACCEL_MAX.into(), 0.0);
        values.insert(SIG_COUNTER.into(), 5.0);
        values.insert(SIG_CHECKSUM.into(), 0.0);
        let draft = FixedLayoutPacker.pack(LONG_CONTROL_MSG, 0, &values).unwrap();
        assert_eq!(sealed.data[..7], draft.data[..7]);
    }

    #[test]
    fn test_short_payload_is_encode_error() {
        let stub = ExternalPacker::new(|_, bus, _| {
            Ok(CanFrame {
                bus,
                id: 0x2b9,
                data: vec![0, 1],
            })
        });
        let builder = MessageBuilder::new(Arc::new(stub), 0);
        let err = builder.create_longitudinal_command(&long_command()).unwrap_err();
        assert!(err.to_string().contains("checksum prefix"));
    }

    #[test]
    fn test_packer_failure_propagates() {
        let stub = ExternalPacker::new(|message, _, _| {
            Err(DrivegateError::Encode(format!("{message}: packer down")))
        });
        let builder = MessageBuilder::new(Arc::new(stub), 0);
        assert!(builder.create_steering_control(1.0, true, 0).is_err());
    }
}
