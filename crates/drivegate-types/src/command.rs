// ─────────────────────────────────────────────────────────────────────
// Drivegate — Command & Envelope Types
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

/// Setpoint produced by the upstream control stack, once per control
/// cycle. Read-only to the kernel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ControlRequest {
    /// Desired longitudinal acceleration (m/s²).
    pub desired_accel: f64,
    /// Whether computed longitudinal control is engaged.
    pub active: bool,
    /// Cruise-control state field, carried through to the bus verbatim.
    pub acc_state: u8,
    /// Rolling message counter. Owned upstream, not validated here.
    pub counter: u8,
    /// Accelerator pedal pressed by the driver (override condition).
    pub gas_pressed: bool,
}

/// Snapshot of the vehicle's own acceleration-control intent for the
/// current cycle, as reported on the bus. One snapshot per cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StockEnvelope {
    /// Stock lower acceleration bound (m/s²).
    pub accel_min: f64,
    /// Stock upper acceleration bound (m/s²).
    pub accel_max: f64,
    pub jerk_min: f64,
    pub jerk_max: f64,
    /// Stock cruise set speed (kph).
    pub set_speed: f64,
}

/// Per-cycle arbiter output before command assembly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArbitratedLimits {
    pub accel_min: f64,
    pub accel_max: f64,
    /// Target cruise speed (kph); 0 releases the cruise target.
    pub set_speed: f64,
}

/// Finalized field set for one longitudinal command message. Transient:
/// produced fresh each cycle, handed to the message builder, discarded.
///
/// Invariant: `accel_min <= accel_max`, both within the platform
/// acceleration range from [`crate::ArbiterConfig`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LongitudinalCommand {
    pub set_speed: f64,
    pub acc_state: u8,
    /// Always 0; the kernel never raises AEB events.
    pub aeb_event: u8,
    pub jerk_min: f64,
    pub jerk_max: f64,
    pub accel_min: f64,
    pub accel_max: f64,
    pub counter: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_request_roundtrip() {
        let req = ControlRequest {
            desired_accel: -0.2,
            active: true,
            acc_state: 3,
            counter: 5,
            gas_pressed: false,
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: ControlRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.counter, 5);
        assert!((back.desired_accel + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_envelope_roundtrip() {
        let stock = StockEnvelope {
            accel_min: -3.0,
            accel_max: 1.5,
            jerk_min: -0.9,
            jerk_max: 0.9,
            set_speed: 110.0,
        };
        let json = serde_json::to_string(&stock).unwrap();
        let back: StockEnvelope = serde_json::from_str(&json).unwrap();
        assert!((back.set_speed - 110.0).abs() < 1e-12);
    }
}
