//! Errors raised while loading coil settings.
//!
//! Generation and output errors live in [`crate::coil::CoilError`]; a
//! settings file whose default coil cannot be built wraps one.

use std::path::PathBuf;

use thiserror::Error;

use crate::coil::CoilError;

/// Errors that can occur while loading or checking a settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings file could not be read.
    #[error("cannot read coil settings {path}")]
    ReadError {
        /// Path to the settings file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid JSON or has unknown keys.
    #[error("coil settings {path} are malformed")]
    ParseError {
        /// Path to the settings file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An explicitly requested settings file does not exist.
    #[error("coil settings file {path} does not exist")]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// The default coil section describes a coil that cannot be generated.
    #[error("default coil parameters are unusable")]
    InvalidCoil {
        /// Why the coil was rejected.
        #[source]
        source: CoilError,
    },

    /// An output or logging setting is out of range.
    #[error("setting '{field}' is invalid: {message}")]
    InvalidSetting {
        /// Dotted key of the offending setting.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },
}

impl ConfigError {
    /// Creates an invalid setting error.
    pub fn invalid_setting(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            field,
            message: message.into(),
        }
    }
}

impl From<CoilError> for ConfigError {
    fn from(source: CoilError) -> Self {
        Self::InvalidCoil { source }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn not_found_names_the_file() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("does not exist"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn invalid_setting_display() {
        let error = ConfigError::invalid_setting("logging.level", "unknown level 'loud'");
        assert_eq!(
            error.to_string(),
            "setting 'logging.level' is invalid: unknown level 'loud'"
        );
    }

    #[test]
    fn coil_errors_keep_their_source() {
        let error: ConfigError = CoilError::configuration("track_gap", "must be positive").into();
        assert!(matches!(error, ConfigError::InvalidCoil { .. }));
        let source = error.source().expect("coil error is the source");
        assert!(source.to_string().contains("track_gap"));
    }
}
