//! System-wide constants for the simulator workspace.
//!
//! Single source of truth for unit conversions, wait intervals and the
//! settings blob layout.

/// Default service name reported in logs.
pub const DEFAULT_SERVICE_NAME: &str = "cnc_sim";

/// Number of motion axes (X, Y, Z, E).
pub const AXIS_COUNT: usize = 4;

/// Number of heated bodies (nozzle, plate).
pub const HEATER_COUNT: usize = 2;

/// Millimetres per metre. G-code lengths are mm, the machine works in m.
pub const MM_PER_M: f64 = 1000.0;

/// Seconds per minute. G-code feed rates are mm/min.
pub const SECS_PER_MIN: f64 = 60.0;

/// Poll interval of every blocking wait except pause, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Upper bound on how long a paused file waits between checks, in milliseconds.
pub const DEFAULT_PAUSE_POLL_MS: u64 = 500;

/// Default simulation step per tick [s].
pub const DEFAULT_TIME_STEP: f64 = 0.05;

/// Ambient temperature for both heated bodies [°C].
pub const DEFAULT_ENV_TEMP: f64 = 25.0;

/// Default feed when a move carries no F word [m/s].
pub const DEFAULT_SPEED: f64 = 0.01;

/// Homing: approach speed towards physical zero [m/s].
pub const HOMING_SPEED: f64 = 0.01;

/// Homing: slow re-approach speed after backing off [m/s].
pub const HOMING_SETTLE_SPEED: f64 = 0.001;

/// Homing: back-off distance after reaching zero [m].
pub const HOMING_BACKOFF: f64 = 0.002;

/// Length of the binary settings blob: eight f32 values.
pub const SETTINGS_BIN_LEN: usize = 8 * std::mem::size_of::<f32>();

/// Stefan-Boltzmann constant [W/(m² K⁴)].
pub const STEFAN_BOLTZMANN: f64 = 5.670367e-8;

/// Offset between °C and K.
pub const KELVIN_OFFSET: f64 = 273.15;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert_eq!(SETTINGS_BIN_LEN, 32);
        assert_eq!(AXIS_COUNT * 2 * 4, SETTINGS_BIN_LEN);
        assert!(HOMING_SETTLE_SPEED < HOMING_SPEED);
        assert!(DEFAULT_POLL_INTERVAL_MS < DEFAULT_PAUSE_POLL_MS);
    }
}
