//! Identifiers, status codes and read-only snapshots.
//!
//! Snapshots are what an outer layer (protocol server, HTTP endpoint,
//! terminal) sees of the machine: a copy taken under the machine lock,
//! never a live reference.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four motion axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisId {
    /// X axis.
    X,
    /// Y axis.
    Y,
    /// Z axis.
    Z,
    /// Extruder.
    E,
}

impl AxisId {
    /// All axes in storage order.
    pub const ALL: [AxisId; 4] = [AxisId::X, AxisId::Y, AxisId::Z, AxisId::E];

    /// Axes moved by homing, in homing order.
    pub const CARTESIAN: [AxisId; 3] = [AxisId::X, AxisId::Y, AxisId::Z];

    /// Storage index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// G-code word letter.
    pub const fn letter(self) -> char {
        match self {
            AxisId::X => 'X',
            AxisId::Y => 'Y',
            AxisId::Z => 'Z',
            AxisId::E => 'E',
        }
    }

    /// Key used by the JSON settings document.
    pub const fn settings_key(self) -> &'static str {
        match self {
            AxisId::X => "x-axis",
            AxisId::Y => "y-axis",
            AxisId::Z => "z-axis",
            AxisId::E => "e-axis",
        }
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One of the two heated bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaterId {
    /// Hot end.
    Nozzle,
    /// Build plate.
    Plate,
}

impl fmt::Display for HeaterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaterId::Nozzle => f.write_str("nozzle"),
            HeaterId::Plate => f.write_str("plate"),
        }
    }
}

/// G-code execution status.
///
/// Transitions are driven only by file execution:
/// Idle → Working → (Paused ↔ Working) → Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum MachineStatus {
    /// No file in progress.
    #[default]
    Idle = 0,
    /// A file is being executed.
    Working = 1,
    /// A file is suspended between lines.
    Paused = 2,
}

impl MachineStatus {
    /// Numeric code exposed to collaborators.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MachineStatus::Idle => "IDLE",
            MachineStatus::Working => "WORKING",
            MachineStatus::Paused => "PAUSED",
        };
        f.write_str(s)
    }
}

/// Copy of one axis' observable state. Lengths in m, speeds in m/s.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisSnapshot {
    /// Virtual position.
    pub position: f64,
    /// Virtual target.
    pub target: f64,
    /// Signed speed.
    pub speed: f64,
    /// Signed acceleration [m/s²].
    pub acc: f64,
    /// Cruise speed of the current profile.
    pub target_speed: f64,
    /// Mechanical power [W]; negative while braking.
    pub power: f64,
    /// Speed limit.
    pub max_speed: f64,
    /// Acceleration limit [m/s²].
    pub max_acc: f64,
}

/// Copy of one heated body's observable state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeaterSnapshot {
    /// Current temperature [°C].
    pub temperature: f64,
    /// Set point [°C]; 0 means heater off.
    pub target: f64,
    /// Net power into the body [W].
    pub power: f64,
    /// Electrical heater power [W].
    pub power_in: f64,
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Integral clamp.
    pub wind_up: Option<f64>,
    /// Settle band half-width [°C].
    pub settle_window: f64,
    /// Required residency inside the band [s].
    pub settle_time: f64,
    /// Set point reached and held.
    pub temp_reached: bool,
}

/// Copy of the whole machine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MachineSnapshot {
    /// Simulation time of the last tick [s].
    pub time: f64,
    /// X, Y, Z, E in storage order.
    pub axes: [AxisSnapshot; 4],
    /// Hot end.
    pub nozzle: HeaterSnapshot,
    /// Build plate.
    pub plate: HeaterSnapshot,
    /// Execution status.
    pub status: MachineStatus,
    /// Progress of the current file, 0-100.
    pub progress: u8,
    /// Stem of the file being executed.
    pub current_file: Option<String>,
    /// Line being executed.
    pub current_line: Option<String>,
    /// Global feed multiplier.
    pub feedrate_override: f64,
    /// A full homing cycle has completed.
    pub homed: bool,
    /// Sum of all axis and heater net powers [W].
    pub total_power: f64,
}

impl MachineSnapshot {
    /// Snapshot of one axis.
    #[inline]
    pub fn axis(&self, id: AxisId) -> &AxisSnapshot {
        &self.axes[id.index()]
    }

    /// Snapshot of one heater.
    pub fn heater(&self, id: HeaterId) -> &HeaterSnapshot {
        match id {
            HeaterId::Nozzle => &self.nozzle,
            HeaterId::Plate => &self.plate,
        }
    }

    /// Status code: 0 idle, 1 working, 2 paused.
    #[inline]
    pub fn status_code(&self) -> u8 {
        self.status.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_wire_values() {
        assert_eq!(MachineStatus::Idle.code(), 0);
        assert_eq!(MachineStatus::Working.code(), 1);
        assert_eq!(MachineStatus::Paused.code(), 2);
        assert_eq!(MachineStatus::default(), MachineStatus::Idle);
    }

    #[test]
    fn axis_indices_follow_storage_order() {
        for (i, id) in AxisId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
        assert_eq!(AxisId::Z.settings_key(), "z-axis");
        assert_eq!(AxisId::E.to_string(), "E");
    }

    #[test]
    fn snapshot_accessors() {
        let mut snap = MachineSnapshot::default();
        snap.axes[AxisId::Y.index()].position = 0.02;
        snap.plate.target = 60.0;
        snap.status = MachineStatus::Paused;

        assert_eq!(snap.axis(AxisId::Y).position, 0.02);
        assert_eq!(snap.heater(HeaterId::Plate).target, 60.0);
        assert_eq!(snap.status_code(), 2);
    }
}
