//! Planar coil generation.
//!
//! A [`CoilSpec`] describes what to build: outer diameter, track width and
//! gap, number of turns (fractional turns allowed) and the [`Shape`] of each
//! turn. [`Coil::build`] runs the turn generator, normalises the result into
//! one connected chain from the inner via to the outer terminal and places
//! the connector. The finished [`Coil`] is immutable and can be written to
//! any [`crate::kicad::BoardSink`] or summarised with
//! [`crate::electrical::ElectricalReport`].
//!
//! # Example
//!
//! ```
//! use pcb_coil::coil::{Coil, CoilSpec, Shape};
//!
//! let spec = CoilSpec {
//!     turns: 4.0,
//!     shape: Shape::Orthogonal,
//!     ..CoilSpec::default()
//! };
//! let coil = Coil::build(&spec).unwrap();
//! assert_eq!(coil.geometry.elements.len(), 16);
//! ```

pub mod connector;
mod error;
pub mod generator;
pub mod naming;
pub mod primitives;

pub use connector::Connector;
pub use error::{CoilError, CoilResult};
pub use generator::{GeneratorState, ShapeStrategy};
pub use primitives::{
    Arc, BoundingBox, ConnectorPad, Layer, PadAngle, Point, Segment, TraceElement, Via,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::kicad::BoardSink;

/// Tolerance for deciding that a fractional turn is zero.
pub(crate) const FRACTION_EPSILON: f64 = 1e-9;

/// Length of the stub used to classify an arc terminal.
const ARC_TERMINAL_STUB: f64 = 2.54;

/// Shape of each coil turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    /// Two 180° arcs per turn.
    Circular,
    /// Archimedean spiral approximated by straight segments.
    Helical {
        /// Length of each straight segment in mm.
        segment_length: f64,
    },
    /// Four axis-aligned sides per turn, wound from the outer corner inwards.
    Orthogonal,
    /// Regular n-gon turns wound from the centre outwards.
    Polygon {
        /// Number of vertices (at least 3).
        vertices: u32,
    },
}

impl Shape {
    /// Vertex count used to select Greenhouse coefficients.
    ///
    /// Circular and helical coils use 0.
    #[must_use]
    pub const fn greenhouse_vertices(&self) -> u32 {
        match self {
            Self::Circular | Self::Helical { .. } => 0,
            Self::Orthogonal => 4,
            Self::Polygon { vertices } => *vertices,
        }
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::Polygon { vertices: 4 }
    }
}

/// The copper layers a coil occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerPair {
    /// Layer carrying the spiral itself.
    pub trace: Layer,
    /// Layer carrying the return path from the via to the connector.
    #[serde(rename = "return")]
    pub return_layer: Layer,
}

impl LayerPair {
    /// Creates a new layer pair.
    #[must_use]
    pub const fn new(trace: Layer, return_layer: Layer) -> Self {
        Self {
            trace,
            return_layer,
        }
    }
}

impl Default for LayerPair {
    fn default() -> Self {
        Self::new(Layer::FCu, Layer::BCu)
    }
}

/// Everything needed to generate one coil.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoilSpec {
    /// Placement origin. The outer top-left corner for orthogonal coils,
    /// the centre for every other shape.
    pub origin: Point,
    /// Outer diameter in mm. Held fixed; the inner diameter is derived.
    pub outer_diameter: f64,
    /// Track width in mm.
    pub track_width: f64,
    /// Gap between adjacent turns in mm.
    pub track_gap: f64,
    /// Number of turns, fractional turns allowed.
    pub turns: f64,
    /// Shape of each turn.
    pub shape: Shape,
    /// Trace and return layers.
    pub layers: LayerPair,
    /// Via drill diameter in mm.
    pub via_drill: f64,
    /// Via pad diameter in mm.
    pub via_size: f64,
    /// Route the return path as an L instead of a diagonal.
    pub straight: bool,
    /// Winding direction for circular coils.
    pub clockwise: bool,
    /// Layer the connector footprint is placed on.
    pub connector_layer: Layer,
}

impl Default for CoilSpec {
    fn default() -> Self {
        Self {
            origin: Point::new(100.0, 100.0),
            outer_diameter: 50.0,
            track_width: 1.27,
            track_gap: 1.27,
            turns: 5.0,
            shape: Shape::default(),
            layers: LayerPair::default(),
            via_drill: 0.5,
            via_size: 1.27,
            straight: true,
            clockwise: true,
            connector_layer: Layer::FCu,
        }
    }
}

impl CoilSpec {
    /// Radial step between adjacent turns: track width plus gap.
    #[must_use]
    pub fn increment(&self) -> f64 {
        self.track_width + self.track_gap
    }

    /// Number of complete turns.
    #[must_use]
    pub fn full_turns(&self) -> usize {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let full = self.turns.floor() as usize;
        full
    }

    /// Fractional part of the turn count, snapped to zero when negligible.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        let f = self.turns - self.turns.floor();
        if f < FRACTION_EPSILON {
            0.0
        } else {
            f
        }
    }

    /// Inner diameter implied by the outer diameter and the turn count.
    ///
    /// Fractional turns count one extra track width.
    #[must_use]
    pub fn inner_diameter(&self) -> f64 {
        let width_turns = if self.fraction() > 0.0 {
            self.turns.floor() + 1.0
        } else {
            self.turns
        };
        self.outer_diameter
            - 2.0 * width_turns.mul_add(self.track_width, (self.turns - 1.0) * self.track_gap)
    }

    /// Checks every input before generation starts.
    ///
    /// # Errors
    ///
    /// Returns [`CoilError::Configuration`] for non-finite or non-positive
    /// dimensions, a zero gap, a polygon with fewer than three vertices, a
    /// helical segment too long to form a turn, or a trace layer equal to
    /// the return layer.
    pub fn validate(&self) -> CoilResult<()> {
        let positive = [
            ("outer_diameter", self.outer_diameter),
            ("track_width", self.track_width),
            ("track_gap", self.track_gap),
            ("turns", self.turns),
            ("via_drill", self.via_drill),
            ("via_size", self.via_size),
        ];
        for (name, value) in positive {
            if !value.is_finite() {
                return Err(CoilError::configuration(name, "must be a finite number"));
            }
            if value <= 0.0 {
                return Err(CoilError::configuration(
                    name,
                    format!("must be positive, got {value}"),
                ));
            }
        }

        if !self.origin.x.is_finite() || !self.origin.y.is_finite() {
            return Err(CoilError::configuration("origin", "must be finite"));
        }

        if self.via_drill >= self.via_size {
            return Err(CoilError::configuration(
                "via_drill",
                format!(
                    "drill {} mm must be smaller than via size {} mm",
                    self.via_drill, self.via_size
                ),
            ));
        }

        match self.shape {
            Shape::Polygon { vertices } if vertices < 3 => {
                return Err(CoilError::configuration(
                    "vertices",
                    format!("a polygon needs at least 3 vertices, got {vertices}"),
                ));
            }
            Shape::Helical { segment_length } => {
                if !segment_length.is_finite() || segment_length <= 0.0 {
                    return Err(CoilError::configuration(
                        "segment_length",
                        "must be a positive finite number",
                    ));
                }
                if std::f64::consts::PI * self.outer_diameter / segment_length < 3.0 {
                    return Err(CoilError::configuration(
                        "segment_length",
                        format!(
                            "{segment_length} mm is too long for a {} mm coil",
                            self.outer_diameter
                        ),
                    ));
                }
            }
            _ => {}
        }

        if self.layers.trace == self.layers.return_layer {
            return Err(CoilError::configuration(
                "layers",
                format!(
                    "trace and return layer must differ (both {})",
                    self.layers.trace
                ),
            ));
        }

        Ok(())
    }
}

/// The generated trace of one coil.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoilGeometry {
    /// Connected elements from the via to the outer terminal.
    pub elements: Vec<TraceElement>,
    /// Inner terminal where the via sits.
    pub via_point: Point,
    /// Final segment of the trace, oriented out of the coil.
    ///
    /// For an arc terminal this is a tangent stub ending on the arc end.
    pub terminal: Segment,
    /// Bounding box used for connector placement.
    pub bbox: BoundingBox,
    /// Sum of all element lengths in mm.
    pub trace_length: f64,
    /// Length of track facing a neighbouring turn in mm.
    pub capacitor_length: f64,
    /// Generator offset after the last turn (side length or radius).
    pub final_offset: f64,
    /// Inner diameter in mm.
    pub inner_diameter: f64,
    /// Outer diameter in mm.
    pub outer_diameter: f64,
    /// Orientation of the last orthogonal partial side: 0 vertical, 1 horizontal.
    pub last_dir: Option<u8>,
}

impl CoilGeometry {
    /// Runs the turn generator and normalises its output.
    ///
    /// # Errors
    ///
    /// Propagates validation and generation failures.
    pub fn generate(spec: &CoilSpec) -> CoilResult<Self> {
        spec.validate()?;
        let raw = generator::generate(spec)?;

        let elements: Vec<TraceElement> = if raw.winds_inward {
            raw.full
                .iter()
                .rev()
                .map(TraceElement::reversed)
                .chain(raw.partial.iter().copied())
                .collect()
        } else {
            raw.full.iter().chain(raw.partial.iter()).copied().collect()
        };

        let (Some(first), Some(last)) = (elements.first(), elements.last()) else {
            return Err(CoilError::fatal_geometry(
                0,
                format!("{} turns produced no geometry", spec.turns),
            ));
        };

        let terminal = match last {
            TraceElement::Segment(s) => *s,
            TraceElement::Arc(a) => {
                let (tx, ty) = a.end_tangent().ok_or_else(|| {
                    CoilError::fatal_geometry(spec.full_turns(), "degenerate terminal arc")
                })?;
                Segment::new(
                    a.end.offset(-tx * ARC_TERMINAL_STUB, -ty * ARC_TERMINAL_STUB),
                    a.end,
                )
            }
        };

        let bbox = if raw.state.bbox.is_empty() {
            elements
                .iter()
                .fold(BoundingBox::empty(), BoundingBox::including_element)
        } else {
            raw.state.bbox
        };

        Ok(Self {
            via_point: first.start(),
            terminal,
            bbox,
            trace_length: raw.state.trace_length,
            capacitor_length: raw.state.capacitor_length,
            final_offset: raw.state.offset,
            inner_diameter: spec.inner_diameter(),
            outer_diameter: spec.outer_diameter,
            last_dir: raw.last_dir,
            elements,
        })
    }

    /// Outer terminal point.
    #[must_use]
    pub const fn terminal_point(&self) -> Point {
        self.terminal.end
    }
}

/// A fully generated coil: parameters, trace and connector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coil {
    /// Parameters the coil was built from.
    pub spec: CoilSpec,
    /// Generated trace.
    pub geometry: CoilGeometry,
    /// Via, connector pad and return path.
    pub connector: Connector,
}

impl Coil {
    /// Generates a coil from `spec`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid or the turns do not
    /// fit. Nothing is produced in that case.
    pub fn build(spec: &CoilSpec) -> CoilResult<Self> {
        let geometry = CoilGeometry::generate(spec)?;
        let connector = Connector::place(spec, &geometry);

        info!(
            shape = %naming::shape_name(&spec.shape),
            turns = spec.turns,
            elements = geometry.elements.len(),
            trace_length_mm = geometry.trace_length,
            "Generated coil"
        );
        debug!(
            via_x = geometry.via_point.x,
            via_y = geometry.via_point.y,
            pad_x = connector.pad.origin.x,
            pad_y = connector.pad.origin.y,
            angle = %connector.pad.angle,
            "Placed connector"
        );

        Ok(Self {
            spec: *spec,
            geometry,
            connector,
        })
    }

    /// Total copper length on the trace layer, including any clearance
    /// extension at the terminal.
    #[must_use]
    pub fn trace_length(&self) -> f64 {
        self.geometry.trace_length + self.connector.extension.map_or(0.0, |s| s.length())
    }

    /// Every element on the trace layer in chain order, including the
    /// clearance extension.
    #[must_use]
    pub fn trace_elements(&self) -> Vec<TraceElement> {
        let mut elements = self.geometry.elements.clone();
        if let Some(ext) = self.connector.extension {
            elements.push(TraceElement::Segment(ext));
        }
        elements
    }

    /// Writes the coil into `sink`.
    ///
    /// With `coil_only` set only the trace is written; the via, connector
    /// and return path are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails.
    pub fn emit<S: BoardSink + ?Sized>(&self, sink: &mut S, coil_only: bool) -> CoilResult<()> {
        let width = self.spec.track_width;
        let layer = self.spec.layers.trace;

        for element in self.trace_elements() {
            match element {
                TraceElement::Segment(s) => sink.segment(&s, width, layer)?,
                TraceElement::Arc(a) => sink.arc(&a, width, layer)?,
            }
        }

        if coil_only {
            return Ok(());
        }

        sink.connector_pad(&self.connector.pad)?;
        for segment in &self.connector.return_path {
            sink.segment(segment, width, self.spec.layers.return_layer)?;
        }
        sink.via(&self.connector.via)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_is_valid() {
        assert!(CoilSpec::default().validate().is_ok());
    }

    #[test]
    fn inner_diameter_integer_turns() {
        let spec = CoilSpec {
            turns: 10.0,
            ..CoilSpec::default()
        };
        // 50 - 2 * (10 * 1.27 + 9 * 1.27)
        assert!((spec.inner_diameter() - 1.74).abs() < 1e-9);
    }

    #[test]
    fn inner_diameter_fractional_turns_counts_extra_width() {
        let spec = CoilSpec {
            turns: 4.5,
            ..CoilSpec::default()
        };
        // 50 - 2 * (5 * 1.27 + 3.5 * 1.27)
        assert!((spec.inner_diameter() - 28.41).abs() < 1e-9);
    }

    #[test]
    fn zero_gap_is_rejected() {
        let spec = CoilSpec {
            track_gap: 0.0,
            ..CoilSpec::default()
        };
        assert!(matches!(
            spec.validate(),
            Err(CoilError::Configuration { ref name, .. }) if name == "track_gap"
        ));
    }

    #[test]
    fn degenerate_polygon_is_rejected() {
        let spec = CoilSpec {
            shape: Shape::Polygon { vertices: 2 },
            ..CoilSpec::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn identical_layers_are_rejected() {
        let spec = CoilSpec {
            layers: LayerPair::new(Layer::BCu, Layer::BCu),
            ..CoilSpec::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn non_finite_turns_are_rejected() {
        let spec = CoilSpec {
            turns: f64::NAN,
            ..CoilSpec::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn greenhouse_vertices_by_shape() {
        assert_eq!(Shape::Circular.greenhouse_vertices(), 0);
        assert_eq!(
            Shape::Helical {
                segment_length: 0.1
            }
            .greenhouse_vertices(),
            0
        );
        assert_eq!(Shape::Orthogonal.greenhouse_vertices(), 4);
        assert_eq!(Shape::Polygon { vertices: 7 }.greenhouse_vertices(), 7);
    }

    #[test]
    fn fraction_snaps_to_zero() {
        let spec = CoilSpec {
            turns: 3.0,
            ..CoilSpec::default()
        };
        assert!(spec.fraction().abs() < f64::EPSILON);
        assert_eq!(spec.full_turns(), 3);
    }

    #[test]
    fn chain_starts_at_via_and_is_connected() {
        for shape in [
            Shape::Orthogonal,
            Shape::Circular,
            Shape::Polygon { vertices: 6 },
            Shape::Helical {
                segment_length: 0.5,
            },
        ] {
            let spec = CoilSpec {
                turns: 3.5,
                shape,
                ..CoilSpec::default()
            };
            let coil = Coil::build(&spec).unwrap();
            let elements = coil.trace_elements();
            assert!(elements[0].start().approx_eq(coil.geometry.via_point, 1e-9));
            for pair in elements.windows(2) {
                assert!(
                    pair[0].end().approx_eq(pair[1].start(), 1e-9),
                    "gap in {shape:?} chain"
                );
            }
        }
    }
}
