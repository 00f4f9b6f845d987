//! Axis limit settings in the two exchange formats.
//!
//! - JSON: `{"x-axis": {"max_speed": f, "max_acc": f}, "y-axis": ..., "z-axis": ..., "e-axis": ...}`.
//!   Sections and fields may be omitted on input; output always has all four.
//! - Binary: 8 little-endian `f32`, `[x_speed, y_speed, z_speed, e_speed, x_acc, y_acc, z_acc, e_acc]`.
//!
//! Input is parsed and validated completely before any axis is touched, so a
//! rejected document leaves the machine unchanged. Every applied axis is
//! re-planned through `recompute_target`.

use crate::error::{SimError, SimResult};
use crate::machine::{CncMachine, check_axis_limit};
use cnc_common::consts::{AXIS_COUNT, SETTINGS_BIN_LEN};
use cnc_common::types::AxisId;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Limits of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisSettings {
    /// Speed limit [m/s].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
    /// Acceleration limit [m/s²].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_acc: Option<f64>,
}

/// JSON settings document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SettingsDocument {
    /// X axis section.
    #[serde(rename = "x-axis", default, skip_serializing_if = "Option::is_none")]
    pub x: Option<AxisSettings>,
    /// Y axis section.
    #[serde(rename = "y-axis", default, skip_serializing_if = "Option::is_none")]
    pub y: Option<AxisSettings>,
    /// Z axis section.
    #[serde(rename = "z-axis", default, skip_serializing_if = "Option::is_none")]
    pub z: Option<AxisSettings>,
    /// Extruder axis section.
    #[serde(rename = "e-axis", default, skip_serializing_if = "Option::is_none")]
    pub e: Option<AxisSettings>,
}

impl SettingsDocument {
    /// Section for `axis`, if present.
    pub fn axis(&self, axis: AxisId) -> Option<&AxisSettings> {
        match axis {
            AxisId::X => self.x.as_ref(),
            AxisId::Y => self.y.as_ref(),
            AxisId::Z => self.z.as_ref(),
            AxisId::E => self.e.as_ref(),
        }
    }
}

/// Validated `(axis, max_speed, max_acc)` updates.
type LimitUpdate = (AxisId, f64, f64);

impl CncMachine {
    /// Current limits of all four axes.
    pub fn settings(&self) -> SettingsDocument {
        let section = |id: AxisId| {
            let axis = self.axis(id);
            Some(AxisSettings {
                max_speed: Some(axis.max_speed),
                max_acc: Some(axis.max_acc),
            })
        };
        SettingsDocument {
            x: section(AxisId::X),
            y: section(AxisId::Y),
            z: section(AxisId::Z),
            e: section(AxisId::E),
        }
    }

    /// Current limits as a JSON document.
    pub fn settings_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(&self.settings())?)
    }

    /// Current limits as the 32-byte binary blob.
    pub fn settings_bin(&self) -> [u8; SETTINGS_BIN_LEN] {
        let mut out = [0u8; SETTINGS_BIN_LEN];
        for id in AxisId::ALL {
            let axis = self.axis(id);
            let i = id.index();
            out[i * 4..i * 4 + 4].copy_from_slice(&(axis.max_speed as f32).to_le_bytes());
            let j = AXIS_COUNT + i;
            out[j * 4..j * 4 + 4].copy_from_slice(&(axis.max_acc as f32).to_le_bytes());
        }
        out
    }

    /// Apply a settings document. Missing fields keep their current value.
    pub fn apply_settings(&mut self, doc: &SettingsDocument) -> SimResult<()> {
        let mut updates: Vec<LimitUpdate> = Vec::with_capacity(AXIS_COUNT);
        for id in AxisId::ALL {
            let Some(section) = doc.axis(id) else {
                continue;
            };
            let axis = self.axis(id);
            let max_speed = section.max_speed.unwrap_or(axis.max_speed);
            let max_acc = section.max_acc.unwrap_or(axis.max_acc);
            updates.push((id, max_speed, max_acc));
        }
        self.apply_limit_updates(&updates)
    }

    /// Parse and apply a JSON settings document.
    pub fn apply_settings_json(&mut self, json: &str) -> SimResult<()> {
        let doc: SettingsDocument = serde_json::from_str(json)?;
        self.apply_settings(&doc)
    }

    /// Decode and apply the 32-byte binary blob.
    pub fn apply_settings_bin(&mut self, bytes: &[u8]) -> SimResult<()> {
        if bytes.len() != SETTINGS_BIN_LEN {
            return Err(SimError::SettingsLength {
                expected: SETTINGS_BIN_LEN,
                actual: bytes.len(),
            });
        }

        let mut values = [0.0f64; 2 * AXIS_COUNT];
        for (value, chunk) in values.iter_mut().zip(bytes.chunks_exact(4)) {
            *value = f64::from(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }

        let updates: Vec<LimitUpdate> = AxisId::ALL
            .iter()
            .map(|&id| (id, values[id.index()], values[AXIS_COUNT + id.index()]))
            .collect();
        self.apply_limit_updates(&updates)
    }

    fn apply_limit_updates(&mut self, updates: &[LimitUpdate]) -> SimResult<()> {
        for &(id, max_speed, max_acc) in updates {
            check_axis_limit(id, "max_speed", max_speed)?;
            check_axis_limit(id, "max_acc", max_acc)?;
        }
        for &(id, max_speed, max_acc) in updates {
            self.set_axis_limits(id, max_speed, max_acc)?;
        }
        if !updates.is_empty() {
            info!("Applied axis settings for {} axes", updates.len());
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use cnc_common::machine::MachineConfig;

    fn machine() -> CncMachine {
        CncMachine::new(&MachineConfig::default())
    }

    fn blob(values: [f32; 8]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn json_reports_every_axis() {
        let m = machine();
        let value: serde_json::Value =
            serde_json::from_str(&m.settings_json().expect("serializes")).expect("valid json");

        assert_eq!(value["x-axis"]["max_speed"], 0.1);
        assert_eq!(value["y-axis"]["max_acc"], 1.0);
        assert_eq!(value["z-axis"]["max_speed"], 0.01);
        assert_eq!(value["z-axis"]["max_acc"], 0.05);
        assert_eq!(value["e-axis"]["max_acc"], 0.05);
    }

    #[test]
    fn partial_json_updates_only_given_fields() {
        let mut m = machine();
        m.apply_settings_json(r#"{"z-axis": {"max_speed": 0.02}, "comment": "ignored"}"#)
            .expect("valid document");

        assert_eq!(m.axis(AxisId::Z).max_speed, 0.02);
        assert_eq!(m.axis(AxisId::Z).max_acc, 0.05);
        assert_eq!(m.axis(AxisId::X).max_speed, 0.1);
    }

    #[test]
    fn json_applied_by_another_machine_reproduces_limits() {
        let mut source = machine();
        source
            .apply_settings_json(r#"{"x-axis": {"max_speed": 0.3, "max_acc": 2.0}}"#)
            .expect("valid document");
        let json = source.settings_json().expect("serializes");

        let mut m = machine();
        m.apply_settings_json(&json).expect("valid document");
        assert_eq!(m.settings(), source.settings());
    }

    #[test]
    fn rejected_json_leaves_state_unchanged() {
        let mut m = machine();
        let before = m.settings();

        assert!(matches!(
            m.apply_settings_json("{not json"),
            Err(SimError::InvalidSettings(_))
        ));
        assert!(matches!(
            m.apply_settings_json(r#"{"x-axis": {"max_speed": "fast"}}"#),
            Err(SimError::InvalidSettings(_))
        ));
        // First axis valid, second invalid: nothing is applied.
        assert!(matches!(
            m.apply_settings_json(
                r#"{"x-axis": {"max_speed": 0.5}, "y-axis": {"max_acc": -1.0}}"#
            ),
            Err(SimError::InvalidAxisLimit {
                axis: AxisId::Y,
                field: "max_acc",
                ..
            })
        ));
        assert_eq!(m.settings(), before);
    }

    #[test]
    fn binary_layout_is_speeds_then_accelerations() {
        let m = machine();
        let bin = m.settings_bin();
        assert_eq!(bin.len(), 32);
        assert_eq!(&bin[0..4], &0.1f32.to_le_bytes());
        assert_eq!(&bin[8..12], &0.01f32.to_le_bytes());
        assert_eq!(&bin[16..20], &1.0f32.to_le_bytes());
        assert_eq!(&bin[28..32], &0.05f32.to_le_bytes());
    }

    #[test]
    fn binary_apply() {
        let mut m = machine();
        m.apply_settings_bin(&blob([0.2, 0.3, 0.04, 0.05, 2.0, 3.0, 0.5, 0.25]))
            .expect("valid blob");

        assert_eq!(m.axis(AxisId::X).max_speed, f64::from(0.2f32));
        assert_eq!(m.axis(AxisId::E).max_speed, f64::from(0.05f32));
        assert_eq!(m.axis(AxisId::Y).max_acc, 3.0);
        assert_eq!(m.axis(AxisId::E).max_acc, 0.25);
        assert_eq!(m.settings_bin().to_vec(), blob([0.2, 0.3, 0.04, 0.05, 2.0, 3.0, 0.5, 0.25]));
    }

    #[test]
    fn binary_rejects_bad_length_and_values() {
        let mut m = machine();
        let before = m.settings();

        assert!(matches!(
            m.apply_settings_bin(&[0u8; 31]),
            Err(SimError::SettingsLength {
                expected: 32,
                actual: 31
            })
        ));
        assert!(m
            .apply_settings_bin(&blob([0.2, 0.3, 0.04, 0.0, 2.0, 3.0, 0.5, 0.25]))
            .is_err());
        assert_eq!(m.settings(), before);
    }
}
