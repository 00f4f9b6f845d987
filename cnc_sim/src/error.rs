//! Error types for the simulator core.
//!
//! Only the settings contract and configuration produce errors. G-code
//! execution never fails: bad lines are skipped, busy requests dropped,
//! missing files ignored.

use cnc_common::config::ConfigError;
use cnc_common::types::{AxisId, HeaterId};
use thiserror::Error;

/// Errors surfaced to the layer driving the simulator.
#[derive(Debug, Error)]
pub enum SimError {
    /// JSON settings document is malformed or has the wrong shape.
    #[error("Invalid settings document: {0}")]
    InvalidSettings(#[from] serde_json::Error),

    /// Binary settings blob has the wrong size.
    #[error("Binary settings must be {expected} bytes, got {actual}")]
    SettingsLength {
        /// Required length.
        expected: usize,
        /// Received length.
        actual: usize,
    },

    /// An axis limit is zero, negative or not finite.
    #[error("Axis {axis}: {field} must be a positive number (got {value})")]
    InvalidAxisLimit {
        /// Offending axis.
        axis: AxisId,
        /// `max_speed` or `max_acc`.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// A heater tuning value is negative or not finite.
    #[error("Heater {heater}: {field} must be a non-negative number (got {value})")]
    InvalidHeaterTuning {
        /// Offending heater.
        heater: HeaterId,
        /// Name of the rejected field.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// Feedrate override is zero, negative or not finite.
    #[error("Feedrate override must be a positive number (got {0})")]
    InvalidFeedrateOverride(f64),

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias for simulator operations.
pub type SimResult<T> = Result<T, SimError>;
