// ─────────────────────────────────────────────────────────────────────
// Drivegate — PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied — PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the Rust Drivegate kernel.
//!
//! Exposes `ArbiterConfig`, `RustArbiter`, `RustMessageBuilder`, and
//! `checksum` to the Python control-loop process via PyO3, keeping the
//! arbitration hot path in Rust while the DBC packer stays with the
//! host.
//!
//! # FFI Safety
//!
//! - GIL acquired via `Python::with_gil` before every packer callback.
//! - Python exceptions inside the packer map to encode faults on the
//!   command path, never to silent defaults.
//! - Config validated before storage (`ArbiterConfig::validate()`).
//!
//! Install: `pip install -e crates/drivegate-ffi` (requires maturin).
//!
//! Usage from Python:
//! ```python
//! from drivegate_kernel import ArbiterConfig, RustArbiter
//!
//! arbiter = RustArbiter("time-faded", ArbiterConfig())
//! lo, hi, set_speed = arbiter.arbitrate(
//!     desired_accel=0.6, active=True, gas_pressed=False,
//!     speed_kph=32.0, stock=(-2.0, 1.5, -0.9, 0.9, 110.0))
//! ```

use std::sync::Arc;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict};

use drivegate_core::{
    message_checksum, Arbiter, CanFrame, ExternalPacker, MessageBuilder, Policy, SignalMap,
    SpeedBandVariant, StdClock,
};
use drivegate_types::{ArbiterConfig, ControlRequest, DrivegateError, StockEnvelope};

fn to_py_err(e: DrivegateError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn parse_policy(name: &str) -> PyResult<Policy> {
    match name {
        "direct" => Ok(Policy::Direct),
        "speed-banded" => Ok(Policy::SpeedBanded(SpeedBandVariant::Engage)),
        "speed-banded-passthrough" => Ok(Policy::SpeedBanded(SpeedBandVariant::Passthrough)),
        "time-faded" => Ok(Policy::TimeFaded),
        "stock-rate-limited" => Ok(Policy::StockRateLimited),
        other => Err(PyValueError::new_err(format!("unknown policy: {other}"))),
    }
}

fn policy_name(policy: Policy) -> &'static str {
    match policy {
        Policy::Direct => "direct",
        Policy::SpeedBanded(SpeedBandVariant::Engage) => "speed-banded",
        Policy::SpeedBanded(SpeedBandVariant::Passthrough) => "speed-banded-passthrough",
        Policy::TimeFaded => "time-faded",
        Policy::StockRateLimited => "stock-rate-limited",
    }
}

fn envelope_from_tuple(stock: Option<(f64, f64, f64, f64, f64)>) -> Option<StockEnvelope> {
    stock.map(|(accel_min, accel_max, jerk_min, jerk_max, set_speed)| StockEnvelope {
        accel_min,
        accel_max,
        jerk_min,
        jerk_max,
        set_speed,
    })
}

// ─── ArbiterConfig ──────────────────────────────────────────────────

/// Python-visible configuration for the acceleration arbiter.
#[pyclass(name = "ArbiterConfig")]
#[derive(Clone)]
struct PyArbiterConfig {
    inner: ArbiterConfig,
}

#[pymethods]
impl PyArbiterConfig {
    #[new]
    #[pyo3(signature = (
        accel_min = -3.48,
        accel_max = 2.0,
        jerk_limit_min = -0.9,
        jerk_limit_max = 0.9,
        max_cruise_kph = 145.0,
        stock_band_kph = 25.0,
        blend_band_kph = 35.0,
        engage_floor = 0.4,
        brake_override_accel = -0.5,
        accel_min_ceiling = -0.4,
        accel_max_floor = 0.0,
        max_fade_s = 2.0,
        min_fade_enter_s = 1.0,
        min_fade_exit_s = 1.0,
        rate_limit_band_kph = 40.0,
        max_slew_low = 0.03,
        max_slew_high = 0.005,
        min_slew_release = 0.001,
        min_slew_deep_brake = 0.04,
        min_slew_default = 0.01,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        accel_min: f64,
        accel_max: f64,
        jerk_limit_min: f64,
        jerk_limit_max: f64,
        max_cruise_kph: f64,
        stock_band_kph: f64,
        blend_band_kph: f64,
        engage_floor: f64,
        brake_override_accel: f64,
        accel_min_ceiling: f64,
        accel_max_floor: f64,
        max_fade_s: f64,
        min_fade_enter_s: f64,
        min_fade_exit_s: f64,
        rate_limit_band_kph: f64,
        max_slew_low: f64,
        max_slew_high: f64,
        min_slew_release: f64,
        min_slew_deep_brake: f64,
        min_slew_default: f64,
    ) -> PyResult<Self> {
        let config = ArbiterConfig {
            accel_min,
            accel_max,
            jerk_limit_min,
            jerk_limit_max,
            max_cruise_kph,
            stock_band_kph,
            blend_band_kph,
            engage_floor,
            brake_override_accel,
            accel_min_ceiling,
            accel_max_floor,
            max_fade_s,
            min_fade_enter_s,
            min_fade_exit_s,
            rate_limit_band_kph,
            max_slew_low,
            max_slew_high,
            min_slew_release,
            min_slew_deep_brake,
            min_slew_default,
        };
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    /// Construct from JSON string.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config = ArbiterConfig::from_json(json).map_err(to_py_err)?;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    fn __repr__(&self) -> String {
        format!(
            "ArbiterConfig(accel=[{}, {}], ceiling={}, floor={}, fades=[{}s, {}s, {}s])",
            self.inner.accel_min,
            self.inner.accel_max,
            self.inner.accel_min_ceiling,
            self.inner.accel_max_floor,
            self.inner.max_fade_s,
            self.inner.min_fade_enter_s,
            self.inner.min_fade_exit_s,
        )
    }
}

// ─── RustArbiter ────────────────────────────────────────────────────

/// Acceleration arbiter exposed to Python. One instance per control
/// loop; the policy is fixed at construction.
#[pyclass(name = "RustArbiter")]
struct PyArbiter {
    inner: Arbiter,
}

#[pymethods]
impl PyArbiter {
    #[new]
    #[pyo3(signature = (policy, config = None))]
    fn new(policy: &str, config: Option<PyArbiterConfig>) -> PyResult<Self> {
        let config = config.map(|c| c.inner).unwrap_or_default();
        config.validate().map_err(to_py_err)?;
        Ok(Self {
            inner: Arbiter::new(parse_policy(policy)?, config, Arc::new(StdClock::new())),
        })
    }

    /// Run one arbitration cycle.
    ///
    /// Args:
    ///     stock: Optional (accel_min, accel_max, jerk_min, jerk_max,
    ///            set_speed) envelope tuple for this cycle.
    ///
    /// Returns:
    ///     (accel_min, accel_max, set_speed).
    #[pyo3(signature = (desired_accel, active, gas_pressed, speed_kph, stock = None))]
    fn arbitrate(
        &mut self,
        desired_accel: f64,
        active: bool,
        gas_pressed: bool,
        speed_kph: f64,
        stock: Option<(f64, f64, f64, f64, f64)>,
    ) -> PyResult<(f64, f64, f64)> {
        let request = ControlRequest {
            desired_accel,
            active,
            acc_state: 0,
            counter: 0,
            gas_pressed,
        };
        let env = envelope_from_tuple(stock);
        let limits = self
            .inner
            .arbitrate(&request, env.as_ref(), speed_kph)
            .map_err(to_py_err)?;
        Ok((limits.accel_min, limits.accel_max, limits.set_speed))
    }

    /// Run one cycle and assemble the outgoing command field set.
    #[pyo3(signature = (desired_accel, active, acc_state, counter, gas_pressed, speed_kph, stock = None))]
    #[allow(clippy::too_many_arguments)]
    fn command<'py>(
        &mut self,
        py: Python<'py>,
        desired_accel: f64,
        active: bool,
        acc_state: u8,
        counter: u8,
        gas_pressed: bool,
        speed_kph: f64,
        stock: Option<(f64, f64, f64, f64, f64)>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let request = ControlRequest {
            desired_accel,
            active,
            acc_state,
            counter,
            gas_pressed,
        };
        let env = envelope_from_tuple(stock);
        let command = self
            .inner
            .command(&request, env.as_ref(), speed_kph)
            .map_err(to_py_err)?;
        let dict = PyDict::new(py);
        dict.set_item("set_speed", command.set_speed)?;
        dict.set_item("acc_state", command.acc_state)?;
        dict.set_item("aeb_event", command.aeb_event)?;
        dict.set_item("jerk_min", command.jerk_min)?;
        dict.set_item("jerk_max", command.jerk_max)?;
        dict.set_item("accel_min", command.accel_min)?;
        dict.set_item("accel_max", command.accel_max)?;
        dict.set_item("counter", command.counter)?;
        Ok(dict)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    #[getter]
    fn policy(&self) -> &'static str {
        policy_name(self.inner.policy())
    }
}

// ─── checksum ───────────────────────────────────────────────────────

/// Additive message integrity byte over an identifier and byte prefix.
#[pyfunction]
fn checksum(message_id: u16, data: Vec<u8>) -> u8 {
    message_checksum(message_id, &data)
}

// ─── RustMessageBuilder ─────────────────────────────────────────────

/// Message value builder backed by a Python packer callable.
///
/// The callable receives `(message: str, bus: int, values: dict)` and
/// must return `(bus, msg_id, data: bytes)` — the host DBC packer's
/// `make_can_msg` contract.
#[pyclass(name = "RustMessageBuilder")]
struct PyMessageBuilder {
    inner: MessageBuilder,
}

#[pymethods]
impl PyMessageBuilder {
    #[new]
    fn new(packer: PyObject, bus: u8) -> Self {
        let adapter = ExternalPacker::new(move |message: &str, bus: u8, values: &SignalMap| {
            Python::with_gil(|py| {
                let dict = PyDict::new(py);
                for (name, value) in values {
                    dict.set_item(name.as_str(), *value).map_err(|e| {
                        DrivegateError::Encode(format!("{message}: value map: {e}"))
                    })?;
                }
                let result = packer.call1(py, (message, bus, dict)).map_err(|e| {
                    DrivegateError::Encode(format!("{message}: packer raised: {e}"))
                })?;
                let (bus, id, data): (u8, u32, Vec<u8>) = result.extract(py).map_err(|e| {
                    DrivegateError::Encode(format!("{message}: bad packer result: {e}"))
                })?;
                Ok(CanFrame { bus, id, data })
            })
        });
        Self {
            inner: MessageBuilder::new(Arc::new(adapter), bus),
        }
    }

    /// Build the sealed steering command frame.
    fn create_steering_control<'py>(
        &self,
        py: Python<'py>,
        angle: f64,
        enabled: bool,
        counter: u8,
    ) -> PyResult<(u8, u32, Bound<'py, PyBytes>)> {
        let frame = self
            .inner
            .create_steering_control(angle, enabled, counter)
            .map_err(to_py_err)?;
        Ok((frame.bus, frame.id, PyBytes::new(py, &frame.data)))
    }

    /// Build the sealed longitudinal command frame.
    #[allow(clippy::too_many_arguments)]
    fn create_longitudinal_command<'py>(
        &self,
        py: Python<'py>,
        set_speed: f64,
        acc_state: u8,
        jerk_min: f64,
        jerk_max: f64,
        accel_min: f64,
        accel_max: f64,
        counter: u8,
    ) -> PyResult<(u8, u32, Bound<'py, PyBytes>)> {
        let command = drivegate_types::LongitudinalCommand {
            set_speed,
            acc_state,
            aeb_event: 0,
            jerk_min,
            jerk_max,
            accel_min,
            accel_max,
            counter,
        };
        let frame = self
            .inner
            .create_longitudinal_command(&command)
            .map_err(to_py_err)?;
        Ok((frame.bus, frame.id, PyBytes::new(py, &frame.data)))
    }
}

// ─── Module ─────────────────────────────────────────────────────────

#[pymodule]
fn drivegate_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyArbiterConfig>()?;
    m.add_class::<PyArbiter>()?;
    m.add_class::<PyMessageBuilder>()?;
    m.add_function(wrap_pyfunction!(checksum, m)?)?;
    Ok(())
}
