// ─────────────────────────────────────────────────────────────────────
// Drivegate — Full Control-Cycle Integration
// ─────────────────────────────────────────────────────────────────────
//! Drives the whole chain — arbiter, command assembly, builder, packer,
//! checksum — the way the host control loop does, one tick at a time.

use std::sync::Arc;
use std::time::Duration;

use drivegate_core::builder::{LONG_CHECKSUM_PREFIX, LONG_CONTROL_ID};
use drivegate_core::{
    message_checksum, Arbiter, FakeClock, FixedLayoutPacker, MessageBuilder, Policy,
};
use drivegate_types::{ArbiterConfig, ControlRequest, StockEnvelope};

fn request(desired_accel: f64, counter: u8) -> ControlRequest {
    ControlRequest {
        desired_accel,
        active: true,
        acc_state: 3,
        counter,
        gas_pressed: false,
    }
}

fn stock() -> StockEnvelope {
    StockEnvelope {
        accel_min: -2.0,
        accel_max: 1.5,
        jerk_min: -0.9,
        jerk_max: 0.9,
        set_speed: 110.0,
    }
}

#[test]
fn test_direct_braking_command_end_to_end() {
    let clock = Arc::new(FakeClock::new());
    let mut cfg = ArbiterConfig::default();
    cfg.max_cruise_kph = 150.0;
    let mut arb = Arbiter::new(Policy::Direct, cfg, clock);
    let builder = MessageBuilder::new(Arc::new(FixedLayoutPacker), 0);

    let cmd = arb.command(&request(-0.2, 5), None, 50.0).unwrap();
    assert_eq!(cmd.set_speed, 0.0);
    assert!((cmd.accel_min + 0.2).abs() < 1e-12);
    assert_eq!(cmd.accel_max, 0.0);
    assert_eq!(cmd.counter, 5);

    let frame = builder.create_longitudinal_command(&cmd).unwrap();
    assert_eq!(frame.id, u32::from(LONG_CONTROL_ID));
    assert_eq!(frame.data.len(), 8);
    let expected = message_checksum(LONG_CONTROL_ID, &frame.data[..LONG_CHECKSUM_PREFIX]);
    assert_eq!(frame.data[7], expected);
}

#[test]
fn test_simulated_drive_holds_invariants_every_tick() {
    let clock = Arc::new(FakeClock::new());
    let cfg = ArbiterConfig::default();
    let mut arb = Arbiter::new(Policy::TimeFaded, cfg.clone(), clock.clone());
    let builder = MessageBuilder::new(Arc::new(FixedLayoutPacker), 0);
    let env = stock();

    // Pull away from a stop, cruise, brake hard, release: 30 s at 50 Hz.
    for tick in 0u32..1500 {
        clock.advance(Duration::from_millis(20));
        let t = f64::from(tick) * 0.02;
        let speed = (t * 4.0).min(60.0);
        let desired = if t < 20.0 { 0.8 } else if t < 25.0 { -1.2 } else { -0.3 };

        let cmd = arb
            .command(&request(desired, (tick % 16) as u8), Some(&env), speed)
            .unwrap();
        assert!(
            cmd.accel_min <= cmd.accel_max,
            "tick {tick}: min {} > max {}",
            cmd.accel_min,
            cmd.accel_max
        );
        assert!(cmd.accel_min >= cfg.accel_min - 1e-12);
        assert!(cmd.accel_max <= cfg.accel_max + 1e-12);

        let frame = builder.create_longitudinal_command(&cmd).unwrap();
        let expected = message_checksum(LONG_CONTROL_ID, &frame.data[..LONG_CHECKSUM_PREFIX]);
        assert_eq!(frame.data[7], expected, "tick {tick}: checksum mismatch");
        assert_eq!(frame.data[6], (tick % 16) as u8);
    }
}

#[test]
fn test_failed_cycle_produces_no_frame() {
    let clock = Arc::new(FakeClock::new());
    let mut arb = Arbiter::new(Policy::TimeFaded, ArbiterConfig::default(), clock);
    // Envelope missing this cycle: the arbiter refuses to invent one,
    // so there is nothing to hand to the builder.
    assert!(arb.command(&request(0.5, 0), None, 30.0).is_err());
}
