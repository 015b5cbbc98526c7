// ─────────────────────────────────────────────────────────────────────
// Drivegate — Acceleration Arbiter
// ─────────────────────────────────────────────────────────────────────
//! State-carrying blending law for the longitudinal actuation channel.
//!
//! Converts (requested accel, stock envelope, vehicle speed, override
//! flags, elapsed time) into bounded `(accel_min, accel_max)` limits
//! and a target speed, once per control cycle. Four policies, selected
//! at construction:
//!
//! - `Direct` — computed control fully owns the channel.
//! - `SpeedBanded` — linear handover from the stock envelope to the
//!   computed value across a speed band, two sub-variants.
//! - `TimeFaded` — override transitions fade over elapsed time instead
//!   of snapping at a speed threshold, so a handover that begins or
//!   ends at any speed stays continuous in time.
//! - `StockRateLimited` — follows the stock envelope with per-cycle
//!   slew limits on both bounds.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use drivegate_types::{
    clip, ArbiterConfig, ArbitratedLimits, ControlRequest, DrivegateError, DrivegateResult,
    LongitudinalCommand, StockEnvelope,
};

use crate::clock::MonotonicClock;

/// Sub-variants of the speed-banded policy observed across vehicle
/// variants; they differ in how literally the stock max is carried and
/// whether the engage floor applies above the blend band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedBandVariant {
    /// Positive requests are floored at `engage_floor` above the band.
    Engage,
    /// Stock max is pre-clipped to platform bounds; the computed value
    /// passes through unfloored above the band.
    Passthrough,
}

/// Arbitration policy, fixed for the lifetime of the arbiter. Not
/// user-switchable mid-drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Direct,
    SpeedBanded(SpeedBandVariant),
    TimeFaded,
    StockRateLimited,
}

/// Per-cycle carry-over state. Owned exclusively by the arbiter and
/// mutated once per cycle; never shared between control loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbiterState {
    /// Last emitted bounds (slew reference for the rate-limited policy).
    pub last_accel_min: f64,
    pub last_accel_max: f64,
    /// Last instant the max-side override condition held.
    pub max_hold: Duration,
    /// Last instant the min-side override condition held.
    pub min_hold: Duration,
    /// Last instant the min-side override condition did not hold.
    pub min_free: Duration,
}

/// Normalized fade progress in [0, 1] since `anchor`.
fn fade_factor(now: Duration, anchor: Duration, duration_s: f64) -> f64 {
    let elapsed = now.saturating_sub(anchor).as_secs_f64();
    (elapsed / duration_s).min(1.0)
}

fn check_finite(name: &str, value: f64) -> DrivegateResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        log::error!("arbiter rejected non-finite {name}: {value}");
        Err(DrivegateError::Numerical(format!(
            "non-finite {name}: {value}"
        )))
    }
}

/// The acceleration arbiter. One instance per control loop.
pub struct Arbiter {
    policy: Policy,
    cfg: ArbiterConfig,
    clock: Arc<dyn MonotonicClock>,
    state: ArbiterState,
}

impl Arbiter {
    /// `config` must have passed [`ArbiterConfig::validate`]; the fade
    /// anchors initialize to the current clock reading, so a time-faded
    /// arbiter fades in from the stock envelope on startup.
    pub fn new(policy: Policy, config: ArbiterConfig, clock: Arc<dyn MonotonicClock>) -> Self {
        let origin = clock.now();
        Self {
            policy,
            cfg: config,
            clock,
            state: ArbiterState {
                last_accel_min: 0.0,
                last_accel_max: 0.0,
                max_hold: origin,
                min_hold: origin,
                min_free: origin,
            },
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn config(&self) -> &ArbiterConfig {
        &self.cfg
    }

    pub fn state(&self) -> &ArbiterState {
        &self.state
    }

    /// Clear carry-over state and re-anchor the fade timestamps.
    pub fn reset(&mut self) {
        let origin = self.clock.now();
        self.state.last_accel_min = 0.0;
        self.state.last_accel_max = 0.0;
        self.state.max_hold = origin;
        self.state.min_hold = origin;
        self.state.min_free = origin;
    }

    /// Run one arbitration cycle.
    ///
    /// `speed_kph` is the current vehicle speed; `stock` is this
    /// cycle's envelope snapshot, required by every policy except
    /// `Direct`. Non-finite inputs and missing or inconsistent
    /// envelopes fail the cycle; no command is produced from them.
    pub fn arbitrate(
        &mut self,
        request: &ControlRequest,
        stock: Option<&StockEnvelope>,
        speed_kph: f64,
    ) -> DrivegateResult<ArbitratedLimits> {
        check_finite("desired_accel", request.desired_accel)?;
        check_finite("speed_kph", speed_kph)?;

        let limits = match self.policy {
            Policy::Direct => self.direct(request),
            Policy::SpeedBanded(variant) => {
                let stock = Self::require_stock(stock)?;
                self.speed_banded(request, stock, speed_kph, variant)
            }
            Policy::TimeFaded => {
                let stock = Self::require_stock(stock)?;
                self.time_faded(request, *stock, speed_kph)
            }
            Policy::StockRateLimited => {
                let stock = Self::require_stock(stock)?;
                self.stock_rate_limited(request, *stock, speed_kph)
            }
        };

        self.state.last_accel_min = limits.accel_min;
        self.state.last_accel_max = limits.accel_max;
        Ok(limits)
    }

    /// Run one cycle and assemble the outgoing command. Jerk limits
    /// come from the configuration under direct control and from the
    /// stock envelope otherwise.
    pub fn command(
        &mut self,
        request: &ControlRequest,
        stock: Option<&StockEnvelope>,
        speed_kph: f64,
    ) -> DrivegateResult<LongitudinalCommand> {
        let limits = self.arbitrate(request, stock, speed_kph)?;
        let (jerk_min, jerk_max) = if self.policy == Policy::Direct {
            (self.cfg.jerk_limit_min, self.cfg.jerk_limit_max)
        } else {
            let stock = Self::require_stock(stock)?;
            (stock.jerk_min, stock.jerk_max)
        };
        Ok(LongitudinalCommand {
            set_speed: limits.set_speed,
            acc_state: request.acc_state,
            aeb_event: 0,
            jerk_min,
            jerk_max,
            accel_min: limits.accel_min,
            accel_max: limits.accel_max,
            counter: request.counter,
        })
    }

    fn require_stock(stock: Option<&StockEnvelope>) -> DrivegateResult<&StockEnvelope> {
        let stock = stock.ok_or_else(|| {
            DrivegateError::Envelope("no stock envelope supplied this cycle".to_string())
        })?;
        check_finite("stock.accel_min", stock.accel_min)?;
        check_finite("stock.accel_max", stock.accel_max)?;
        check_finite("stock.jerk_min", stock.jerk_min)?;
        check_finite("stock.jerk_max", stock.jerk_max)?;
        check_finite("stock.set_speed", stock.set_speed)?;
        if stock.accel_min > stock.accel_max {
            log::warn!(
                "inverted stock envelope: accel_min {} > accel_max {}",
                stock.accel_min,
                stock.accel_max
            );
            return Err(DrivegateError::Envelope(format!(
                "inverted stock envelope: {} > {}",
                stock.accel_min, stock.accel_max
            )));
        }
        Ok(stock)
    }

    fn direct(&self, request: &ControlRequest) -> ArbitratedLimits {
        let cfg = &self.cfg;
        let accel_max = clip(request.desired_accel.max(0.0), cfg.accel_min, cfg.accel_max);
        let accel_min = clip(request.desired_accel, cfg.accel_min, cfg.accel_max);
        let set_speed = if request.desired_accel < 0.0 || !request.active {
            0.0
        } else {
            cfg.max_cruise_kph
        };
        ArbitratedLimits {
            accel_min,
            accel_max,
            set_speed,
        }
    }

    fn speed_banded(
        &self,
        request: &ControlRequest,
        stock: &StockEnvelope,
        speed_kph: f64,
        variant: SpeedBandVariant,
    ) -> ArbitratedLimits {
        let cfg = &self.cfg;
        let engaged = request.desired_accel.max(cfg.engage_floor);

        let accel_max = if speed_kph <= cfg.stock_band_kph {
            match variant {
                SpeedBandVariant::Engage => stock.accel_max,
                SpeedBandVariant::Passthrough => {
                    clip(stock.accel_max, cfg.accel_min, cfg.accel_max)
                }
            }
        } else if speed_kph < cfg.blend_band_kph {
            let f = (speed_kph - cfg.stock_band_kph) / (cfg.blend_band_kph - cfg.stock_band_kph);
            (1.0 - f) * stock.accel_max + f * engaged
        } else {
            match variant {
                SpeedBandVariant::Engage => engaged,
                SpeedBandVariant::Passthrough => request.desired_accel,
            }
        };

        let accel_min = if request.desired_accel < cfg.brake_override_accel
            && request.desired_accel > stock.accel_min
        {
            stock.accel_min
        } else {
            request.desired_accel
        };

        self.finish(accel_min, accel_max, stock, request)
    }

    fn time_faded(
        &mut self,
        request: &ControlRequest,
        stock: StockEnvelope,
        speed_kph: f64,
    ) -> ArbitratedLimits {
        let now = self.clock.now();
        let engaged = request.desired_accel.max(self.cfg.engage_floor);

        // Max side: snap to stock inside the override condition, fade
        // toward the computed value after leaving it.
        let accel_max = if speed_kph <= self.cfg.stock_band_kph || request.gas_pressed {
            self.state.max_hold = now;
            stock.accel_max
        } else {
            let t = fade_factor(now, self.state.max_hold, self.cfg.max_fade_s);
            (1.0 - t) * stock.accel_max + t * engaged
        };

        // Min side: fade in both directions, each leg anchored on its
        // own timestamp (the last instant spent on the opposite side).
        let override_on = (request.desired_accel < self.cfg.brake_override_accel
            && request.desired_accel > stock.accel_min)
            || request.gas_pressed;
        let accel_min = if override_on {
            self.state.min_hold = now;
            let t = fade_factor(now, self.state.min_free, self.cfg.min_fade_enter_s);
            (1.0 - t) * request.desired_accel + t * stock.accel_min
        } else {
            self.state.min_free = now;
            let t = fade_factor(now, self.state.min_hold, self.cfg.min_fade_exit_s);
            (1.0 - t) * stock.accel_min + t * request.desired_accel
        };

        self.finish(accel_min, accel_max, &stock, request)
    }

    fn stock_rate_limited(
        &mut self,
        request: &ControlRequest,
        stock: StockEnvelope,
        speed_kph: f64,
    ) -> ArbitratedLimits {
        let cfg = &self.cfg;
        let state = &self.state;

        let fast_band = speed_kph > cfg.rate_limit_band_kph;
        let tracks_desired = fast_band
            && request.desired_accel <= stock.accel_max
            && request.desired_accel >= stock.accel_min;
        let target_max = if tracks_desired {
            request.desired_accel
        } else {
            stock.accel_max
        };
        let max_tr = if fast_band {
            cfg.max_slew_high
        } else {
            cfg.max_slew_low
        };
        let slewed_max = clip(
            target_max,
            state.last_accel_max - max_tr,
            state.last_accel_max + max_tr,
        );
        let accel_max = clip(slewed_max.max(0.0), cfg.accel_min, cfg.accel_max);

        let target_min = clip(stock.accel_min, cfg.accel_min, cfg.accel_max);
        let min_tr = if target_min < 0.0 && request.desired_accel >= 0.0 {
            cfg.min_slew_release
        } else if target_min < -1.0 && request.desired_accel < -1.0 {
            cfg.min_slew_deep_brake
        } else {
            cfg.min_slew_default
        };
        let slewed_min = clip(
            target_min,
            state.last_accel_min - min_tr,
            state.last_accel_min + min_tr,
        );
        // Ordering enforced after both sides settle.
        let accel_min = clip(slewed_min, cfg.accel_min, cfg.accel_max).min(accel_max);

        let set_speed = if request.active { stock.set_speed } else { 0.0 };
        ArbitratedLimits {
            accel_min,
            accel_max,
            set_speed,
        }
    }

    /// Platform clip plus the post-clip floor discipline shared by the
    /// stock-aware blending policies.
    fn finish(
        &self,
        accel_min: f64,
        accel_max: f64,
        stock: &StockEnvelope,
        request: &ControlRequest,
    ) -> ArbitratedLimits {
        let cfg = &self.cfg;
        let accel_min = clip(accel_min, cfg.accel_min, cfg.accel_max).min(cfg.accel_min_ceiling);
        let accel_max = clip(accel_max, cfg.accel_min, cfg.accel_max).max(cfg.accel_max_floor);
        let set_speed = if request.active { stock.set_speed } else { 0.0 };
        ArbitratedLimits {
            accel_min,
            accel_max,
            set_speed,
        }
    }
}
