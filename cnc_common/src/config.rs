//! Configuration loading.
//!
//! Every simulator configuration file is TOML. Any type that implements
//! `serde::de::DeserializeOwned` can be loaded through [`ConfigLoader`],
//! which maps I/O and syntax failures onto [`ConfigError`].
//!
//! ```rust,no_run
//! use cnc_common::config::{ConfigError, ConfigLoader};
//! use cnc_common::machine::SimConfig;
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = SimConfig::load(Path::new("cnc_sim.toml"))?;
//!     config.validate()?;
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Configuration file not found at the given path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// The file could not be read or is not valid TOML for the target type.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A value parsed correctly but is outside its allowed range.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log verbosity, lowercase in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-tick kinematics and every dispatched word.
    Trace,
    /// Command dispatch, rejected requests, skipped lines.
    Debug,
    /// Lifecycle events only.
    #[default]
    Info,
    /// Ignored requests that point at a caller mistake.
    Warn,
    /// Startup failures.
    Error,
}

impl LogLevel {
    /// Equivalent `tracing` level.
    pub fn as_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn default_service_name() -> String {
    crate::consts::DEFAULT_SERVICE_NAME.to_string()
}

/// Fields common to every simulator process.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "cnc-sim-bench-01"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Default logging verbosity.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Instance identifier, used in log output.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Rejects an empty `service_name`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads a configuration value from a TOML file.
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` for unreadable files or invalid TOML
///
/// Semantic validation is left to the loaded type.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Read and deserialize `path`.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound,
            _ => ConfigError::ParseError(e.to_string()),
        })?;

        Self::from_toml(&content)
    }

    /// Deserialize from an in-memory TOML document.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        #[serde(default)]
        shared: SharedConfig,
        #[serde(default)]
        level: LogLevel,
    }

    #[test]
    fn log_level_maps_to_tracing() {
        assert_eq!(LogLevel::Trace.as_level(), tracing::Level::TRACE);
        assert_eq!(LogLevel::default().as_level(), tracing::Level::INFO);
        assert_eq!(LogLevel::Error.as_level(), tracing::Level::ERROR);
    }

    #[test]
    fn log_level_is_lowercase_in_toml() {
        let w: Wrapper = Wrapper::from_toml("level = \"warn\"").unwrap();
        assert_eq!(w.level, LogLevel::Warn);
        assert!(Wrapper::from_toml("level = \"Warn\"").is_err());
    }

    #[test]
    fn shared_config_defaults_when_section_missing() {
        let w: Wrapper = Wrapper::from_toml("").unwrap();
        assert_eq!(w.shared, SharedConfig::default());
        assert!(w.shared.validate().is_ok());
    }

    #[test]
    fn blank_service_name_is_rejected() {
        let config = SharedConfig {
            log_level: LogLevel::Debug,
            service_name: "   ".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let result = Wrapper::load(Path::new("/nonexistent/cnc_sim/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn load_reads_file_contents() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[shared]
log_level = "trace"
service_name = "bench-rig"
"#
        )
        .unwrap();
        file.flush().unwrap();

        let w = Wrapper::load(file.path()).unwrap();
        assert_eq!(w.shared.log_level, LogLevel::Trace);
        assert_eq!(w.shared.service_name, "bench-rig");
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[shared").unwrap();
        assert!(matches!(
            Wrapper::load(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }
}
