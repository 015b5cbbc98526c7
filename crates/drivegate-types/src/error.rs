// ─────────────────────────────────────────────────────────────────────
// Drivegate — Longitudinal Kernel Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all Drivegate kernel failures.
///
/// Every variant is fatal to the current control cycle: the host loop
/// falls back to its own degraded-mode policy rather than retrying.
#[derive(Error, Debug)]
pub enum DrivegateError {
    /// Numerical precondition violation (NaN/Inf in a control input).
    /// Never clamped into a plausible-looking command.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Stock acceleration envelope missing or internally inconsistent
    /// for this cycle. No default envelope is ever substituted.
    #[error("stock envelope error: {0}")]
    Envelope(String),

    /// Message packer failed or produced an unusable payload.
    #[error("encode error: {0}")]
    Encode(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

pub type DrivegateResult<T> = Result<T, DrivegateError>;
