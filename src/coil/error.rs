//! Error types for coil generation and output.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for coil operations.
pub type CoilResult<T> = Result<T, CoilError>;

/// Errors that can occur while generating or writing a coil.
#[derive(Debug, Error)]
pub enum CoilError {
    /// The requested turns do not fit inside the outer diameter.
    #[error("Fatal geometry after {turns_emitted} turn(s): {message}")]
    FatalGeometry {
        /// Number of complete turns emitted before the failure.
        turns_emitted: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// Circular coils only support quarter-turn fractions.
    #[error("Unsupported fractional turn {fraction} for circular coils (use .25, .5 or .75)")]
    UnsupportedFractionalTurn {
        /// The fractional part of the requested turn count.
        fraction: f64,
    },

    /// Invalid input parameter.
    #[error("Invalid parameter '{name}': {message}")]
    Configuration {
        /// Parameter name.
        name: String,
        /// Description of what's wrong.
        message: String,
    },

    /// Failed to write to an output sink.
    #[error("Failed to write coil output")]
    Write {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to create or write an output file.
    #[error("Failed to write file: {path}")]
    FileWrite {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to read or parse a placement file.
    #[error("Invalid placement file {path}: {message}")]
    Placement {
        /// Path to the placement file.
        path: PathBuf,
        /// Description of what's wrong.
        message: String,
    },

    /// An existing output file is not a closed KiCad board.
    #[error("Cannot add a coil to {path}: {message}")]
    ExistingBoard {
        /// Path to the board file.
        path: PathBuf,
        /// Description of what's wrong.
        message: String,
    },
}

impl CoilError {
    /// Creates a fatal geometry error.
    pub fn fatal_geometry(turns_emitted: usize, message: impl Into<String>) -> Self {
        Self::FatalGeometry {
            turns_emitted,
            message: message.into(),
        }
    }

    /// Creates an unsupported fractional turn error.
    #[must_use]
    pub const fn unsupported_fraction(fraction: f64) -> Self {
        Self::UnsupportedFractionalTurn { fraction }
    }

    /// Creates a configuration error.
    pub fn configuration(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a file write error.
    pub fn file_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a placement file error.
    pub fn placement(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Placement {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an existing board error.
    pub fn existing_board(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ExistingBoard {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<io::Error> for CoilError {
    fn from(source: io::Error) -> Self {
        Self::Write { source }
    }
}
