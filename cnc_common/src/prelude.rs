//! Prelude module for common re-exports.
//!
//! ```rust
//! use cnc_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::machine::{AxisConfig, EngineConfig, HeaterConfig, MachineConfig, SimConfig};

// ─── Identifiers & Snapshots ────────────────────────────────────────
pub use crate::types::{
    AxisId, AxisSnapshot, HeaterId, HeaterSnapshot, MachineSnapshot, MachineStatus,
};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{AXIS_COUNT, MM_PER_M, SECS_PER_MIN, SETTINGS_BIN_LEN};
