// ─────────────────────────────────────────────────────────────────────
// Drivegate — Arbiter Benchmarks
// ─────────────────────────────────────────────────────────────────────
//! Criterion benchmarks proving the per-cycle hot path stays far below
//! a control-loop period of tens of milliseconds.

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use drivegate_core::{
    Arbiter, FakeClock, FixedLayoutPacker, MessageBuilder, Policy, SpeedBandVariant,
    message_checksum,
};
use drivegate_types::{ArbiterConfig, ControlRequest, StockEnvelope};

fn request() -> ControlRequest {
    ControlRequest {
        desired_accel: 0.6,
        active: true,
        acc_state: 3,
        counter: 5,
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

// ── message_checksum() ──────────────────────────────────────────────

fn bench_checksum(c: &mut Criterion) {
    let data = [0x12u8, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde];
    c.bench_function("checksum_7_bytes", |b| {
        b.iter(|| message_checksum(black_box(0x2b9), black_box(&data)))
    });
}

// ── Arbiter.arbitrate() per policy ──────────────────────────────────

fn bench_arbitrate_direct(c: &mut Criterion) {
    let clock = Arc::new(FakeClock::new());
    let mut arb = Arbiter::new(Policy::Direct, ArbiterConfig::default(), clock);
    c.bench_function("arbitrate_direct", |b| {
        b.iter(|| arb.arbitrate(black_box(&request()), None, black_box(50.0)))
    });
}

fn bench_arbitrate_speed_banded(c: &mut Criterion) {
    let clock = Arc::new(FakeClock::new());
    let mut arb = Arbiter::new(
        Policy::SpeedBanded(SpeedBandVariant::Engage),
        ArbiterConfig::default(),
        clock,
    );
    let env = stock();
    c.bench_function("arbitrate_speed_banded", |b| {
        b.iter(|| arb.arbitrate(black_box(&request()), Some(&env), black_box(30.0)))
    });
}

fn bench_arbitrate_time_faded(c: &mut Criterion) {
    let clock = Arc::new(FakeClock::new());
    let mut arb = Arbiter::new(Policy::TimeFaded, ArbiterConfig::default(), clock.clone());
    let env = stock();
    c.bench_function("arbitrate_time_faded", |b| {
        b.iter(|| {
            clock.advance(Duration::from_millis(20));
            arb.arbitrate(black_box(&request()), Some(&env), black_box(30.0))
        })
    });
}

// ── Full cycle: arbitrate + build + seal ────────────────────────────

fn bench_full_cycle(c: &mut Criterion) {
    let clock = Arc::new(FakeClock::new());
    let mut arb = Arbiter::new(Policy::TimeFaded, ArbiterConfig::default(), clock);
    let builder = MessageBuilder::new(Arc::new(FixedLayoutPacker), 0);
    let env = stock();
    c.bench_function("full_cycle", |b| {
        b.iter(|| {
            let cmd = arb
                .command(black_box(&request()), Some(&env), black_box(30.0))
                .unwrap();
            builder.create_longitudinal_command(&cmd).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_checksum,
    bench_arbitrate_direct,
    bench_arbitrate_speed_banded,
    bench_arbitrate_time_faded,
    bench_full_cycle,
);
criterion_main!(benches);
