//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::path::PathBuf;

use serde::Deserialize;

use crate::coil::{CoilSpec, Layer, LayerPair, Point, Shape};
use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Default coil parameters.
    #[serde(default)]
    pub coil: CoilConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.coil.to_spec().validate()?;

        if !(self.output.field_segment_length.is_finite() && self.output.field_segment_length > 0.0)
        {
            return Err(ConfigError::invalid_setting(
                "output.field_segment_length",
                format!("must be positive, got {}", self.output.field_segment_length),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_setting(
                "logging.level",
                format!(
                    "unknown level '{}', must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }
        Ok(())
    }
}

/// Shape selector as written in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Two arcs per turn.
    Circular,
    /// Segmented Archimedean spiral.
    Helical,
    /// Axis-aligned square, outside in.
    Orthogonal,
    /// Regular polygon with `vertices` corners.
    #[default]
    Polygon,
}

impl ShapeKind {
    /// Parses a shape name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "circular" | "circle" => Some(Self::Circular),
            "helical" | "spiral" => Some(Self::Helical),
            "orthogonal" => Some(Self::Orthogonal),
            "polygon" | "ngon" => Some(Self::Polygon),
            _ => None,
        }
    }

    /// Builds the coil shape.
    #[must_use]
    pub const fn to_shape(self, vertices: u32, segment_length: f64) -> Shape {
        match self {
            Self::Circular => Shape::Circular,
            Self::Helical => Shape::Helical { segment_length },
            Self::Orthogonal => Shape::Orthogonal,
            Self::Polygon => Shape::Polygon { vertices },
        }
    }
}

/// Default coil parameters. All lengths in mm.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoilConfig {
    /// Outer diameter.
    #[serde(default = "default_outer_diameter")]
    pub outer_diameter: f64,

    /// Number of turns.
    #[serde(default = "default_turns")]
    pub turns: f64,

    /// Track width.
    #[serde(default = "default_track")]
    pub track_width: f64,

    /// Gap between turns.
    #[serde(default = "default_track")]
    pub track_gap: f64,

    /// Turn shape.
    #[serde(default)]
    pub shape: ShapeKind,

    /// Polygon vertex count.
    #[serde(default = "default_vertices")]
    pub vertices: u32,

    /// Helical segment length.
    #[serde(default = "default_segment_length")]
    pub segment_length: f64,

    /// Via drill diameter.
    #[serde(default = "default_via_drill")]
    pub via_drill: f64,

    /// Via pad diameter. Defaults to the track width.
    #[serde(default)]
    pub via_size: Option<f64>,

    /// Route the return path as an L.
    #[serde(default = "default_true")]
    pub straight: bool,

    /// Circular winding direction.
    #[serde(default = "default_true")]
    pub clockwise: bool,

    /// Coil origin.
    #[serde(default = "default_origin")]
    pub origin: Point,

    /// Trace layer.
    #[serde(default = "default_trace_layer")]
    pub trace_layer: Layer,

    /// Return-path layer.
    #[serde(default = "default_return_layer")]
    pub return_layer: Layer,

    /// Connector footprint layer.
    #[serde(default = "default_trace_layer")]
    pub connector_layer: Layer,
}

impl Default for CoilConfig {
    fn default() -> Self {
        Self {
            outer_diameter: default_outer_diameter(),
            turns: default_turns(),
            track_width: default_track(),
            track_gap: default_track(),
            shape: ShapeKind::default(),
            vertices: default_vertices(),
            segment_length: default_segment_length(),
            via_drill: default_via_drill(),
            via_size: None,
            straight: true,
            clockwise: true,
            origin: default_origin(),
            trace_layer: default_trace_layer(),
            return_layer: default_return_layer(),
            connector_layer: default_trace_layer(),
        }
    }
}

impl CoilConfig {
    /// Converts the configured defaults into a coil spec.
    #[must_use]
    pub fn to_spec(&self) -> CoilSpec {
        CoilSpec {
            origin: self.origin,
            outer_diameter: self.outer_diameter,
            track_width: self.track_width,
            track_gap: self.track_gap,
            turns: self.turns,
            shape: self.shape.to_shape(self.vertices, self.segment_length),
            layers: LayerPair::new(self.trace_layer, self.return_layer),
            via_drill: self.via_drill,
            via_size: self.via_size.unwrap_or(self.track_width),
            straight: self.straight,
            clockwise: self.clockwise,
            connector_layer: self.connector_layer,
        }
    }
}

const fn default_outer_diameter() -> f64 {
    50.0
}

const fn default_turns() -> f64 {
    5.0
}

const fn default_track() -> f64 {
    1.27
}

const fn default_vertices() -> u32 {
    4
}

const fn default_segment_length() -> f64 {
    0.1
}

const fn default_via_drill() -> f64 {
    0.5
}

const fn default_true() -> bool {
    true
}

const fn default_origin() -> Point {
    Point::new(100.0, 100.0)
}

const fn default_trace_layer() -> Layer {
    Layer::FCu
}

const fn default_return_layer() -> Layer {
    Layer::BCu
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory board files are written to.
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    /// Maximum piece length when flattening arcs for the field export.
    #[serde(default = "default_segment_length")]
    pub field_segment_length: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            field_segment_length: default_segment_length(),
        }
    }
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("results")
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coil::CoilError;

    #[test]
    fn parse_minimal_config() {
        let json = r"{}";
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.output.directory, PathBuf::from("results"));
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "_comment": "Test config",
            "coil": {
                "outer_diameter": 47.24,
                "turns": 91,
                "track_width": 0.127,
                "track_gap": 0.127,
                "shape": "polygon",
                "vertices": 8,
                "segment_length": 0.1,
                "via_drill": 0.15,
                "via_size": 0.25,
                "straight": true,
                "clockwise": false,
                "origin": { "x": 0.0, "y": 0.0 },
                "trace_layer": "In2.Cu",
                "return_layer": "B.Cu",
                "connector_layer": "F.Cu"
            },
            "output": {
                "directory": "boards",
                "field_segment_length": 0.5
            },
            "logging": {
                "level": "debug"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        let spec = config.coil.to_spec();
        assert_eq!(spec.shape, Shape::Polygon { vertices: 8 });
        assert_eq!(spec.layers.trace, Layer::In2Cu);
        assert!((spec.via_size - 0.25).abs() < f64::EPSILON);
        assert!(!spec.clockwise);
        assert_eq!(config.output.directory, PathBuf::from("boards"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn example_config_is_valid() {
        let json = include_str!("../../config/example-config.json");
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn coil_config_defaults() {
        let spec = CoilConfig::default().to_spec();
        assert!((spec.outer_diameter - 50.0).abs() < f64::EPSILON);
        assert!((spec.via_size - spec.track_width).abs() < f64::EPSILON);
        assert_eq!(spec.layers, LayerPair::new(Layer::FCu, Layer::BCu));
        assert!(spec.straight);
    }

    #[test]
    fn logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn reject_zero_gap() {
        let json = r#"{ "coil": { "track_gap": 0 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCoil { .. })
        ));
    }

    #[test]
    fn reject_two_vertex_polygon() {
        let json = r#"{ "coil": { "shape": "polygon", "vertices": 2 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let err = config.validate().unwrap_err();
        let ConfigError::InvalidCoil { source } = err else {
            panic!("expected a coil error, got {err:?}");
        };
        assert!(matches!(source, CoilError::Configuration { ref name, .. } if name == "vertices"));
    }

    #[test]
    fn vertices_ignored_for_other_shapes() {
        let json = r#"{ "coil": { "shape": "circular", "vertices": 2 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reject_invalid_log_level() {
        let json = r#"{ "logging": { "level": "loud" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting {
                field: "logging.level",
                ..
            }
        ));
    }

    #[test]
    fn reject_unknown_fields() {
        let json = r#"{
            "unknown_field": "value"
        }"#;

        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn shape_kind_parse() {
        assert_eq!(ShapeKind::parse("Helical"), Some(ShapeKind::Helical));
        assert_eq!(ShapeKind::parse("ngon"), Some(ShapeKind::Polygon));
        assert_eq!(ShapeKind::parse("blob"), None);
    }
}
