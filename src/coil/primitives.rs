//! Geometric primitives that make up a coil.
//!
//! These types represent the elements a coil is built from: points, straight
//! segments, three-point arcs, vias and the two-pin connector, plus the KiCad
//! copper layers they are placed on. All coordinates are in millimetres in
//! KiCad board space (+y points down).

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tolerance used when deciding whether three arc points are collinear.
const COLLINEAR_EPSILON: f64 = 1e-12;

/// A 2D point in board coordinates (mm).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate (mm).
    pub x: f64,
    /// Y coordinate (mm).
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Creates a point from polar coordinates around `centre`.
    #[must_use]
    pub fn polar(centre: Self, radius: f64, angle: f64) -> Self {
        Self::new(
            radius.mul_add(angle.cos(), centre.x),
            radius.mul_add(angle.sin(), centre.y),
        )
    }

    /// Returns the point translated by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        segment_length(self, other)
    }

    /// Returns true if both coordinates are within `tolerance` of `other`.
    #[must_use]
    pub fn approx_eq(self, other: Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

/// Euclidean distance between two points.
#[must_use]
pub fn segment_length(p1: Point, p2: Point) -> f64 {
    (p1.x - p2.x).hypot(p1.y - p2.y)
}

/// A straight track segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
}

impl Segment {
    /// Creates a new segment.
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Segment length in mm.
    #[must_use]
    pub fn length(&self) -> f64 {
        segment_length(self.start, self.end)
    }

    /// The same segment traversed the other way.
    #[must_use]
    pub const fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }

    /// Unit direction from start to end, or `None` for a zero-length segment.
    #[must_use]
    pub fn unit_direction(&self) -> Option<(f64, f64)> {
        let len = self.length();
        if len <= f64::EPSILON {
            return None;
        }
        Some(((self.end.x - self.start.x) / len, (self.end.y - self.start.y) / len))
    }
}

/// A circular arc described by start, mid and end points.
///
/// The mid point lies on the arc itself, not on the chord, which is what
/// KiCad's `gr_arc` record expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    /// Start point.
    pub start: Point,
    /// A point on the arc between start and end.
    pub mid: Point,
    /// End point.
    pub end: Point,
}

impl Arc {
    /// Creates a new three-point arc.
    #[must_use]
    pub const fn new(start: Point, mid: Point, end: Point) -> Self {
        Self { start, mid, end }
    }

    /// The same arc traversed the other way.
    #[must_use]
    pub const fn reversed(&self) -> Self {
        Self::new(self.end, self.mid, self.start)
    }

    /// Centre of the circle through the three points.
    ///
    /// Returns `None` when the points are collinear.
    #[must_use]
    pub fn centre(&self) -> Option<Point> {
        let (ax, ay) = (self.start.x, self.start.y);
        let (bx, by) = (self.mid.x, self.mid.y);
        let (cx, cy) = (self.end.x, self.end.y);

        let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
        if d.abs() < COLLINEAR_EPSILON {
            return None;
        }

        let a2 = ax.mul_add(ax, ay * ay);
        let b2 = bx.mul_add(bx, by * by);
        let c2 = cx.mul_add(cx, cy * cy);

        let ux = (a2 * (by - cy) + b2 * (cy - ay) + c2 * (ay - by)) / d;
        let uy = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;
        Some(Point::new(ux, uy))
    }

    /// Radius of the arc, or `None` when the points are collinear.
    #[must_use]
    pub fn radius(&self) -> Option<f64> {
        self.centre().map(|c| c.distance(self.start))
    }

    /// Signed sweep angle in radians from start through mid to end.
    ///
    /// Positive values sweep towards increasing angle (+x towards +y).
    #[must_use]
    pub fn sweep(&self) -> Option<f64> {
        let c = self.centre()?;
        let angle = |p: Point| (p.y - c.y).atan2(p.x - c.x);
        let a0 = angle(self.start);
        let a1 = angle(self.mid);
        let a2 = angle(self.end);

        let positive = |from: f64, to: f64| (to - from).rem_euclid(2.0 * PI);
        let ccw_total = positive(a0, a2);
        if positive(a0, a1) <= ccw_total {
            Some(ccw_total)
        } else {
            Some(-(2.0 * PI - ccw_total))
        }
    }

    /// Arc length in mm. Collinear points degrade to the chord length.
    #[must_use]
    pub fn length(&self) -> f64 {
        match (self.radius(), self.sweep()) {
            (Some(r), Some(sweep)) => r * sweep.abs(),
            _ => segment_length(self.start, self.end),
        }
    }

    /// Unit tangent at the end point in the direction of travel.
    #[must_use]
    pub fn end_tangent(&self) -> Option<(f64, f64)> {
        let c = self.centre()?;
        let sweep = self.sweep()?;
        let r = c.distance(self.end);
        let (rx, ry) = ((self.end.x - c.x) / r, (self.end.y - c.y) / r);
        // Travelling towards increasing angle means the tangent is the radius rotated +90°.
        if sweep >= 0.0 {
            Some((-ry, rx))
        } else {
            Some((ry, -rx))
        }
    }
}

/// One element of a coil trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceElement {
    /// Straight segment.
    Segment(Segment),
    /// Circular arc.
    Arc(Arc),
}

impl TraceElement {
    /// Start point in the direction of travel.
    #[must_use]
    pub const fn start(&self) -> Point {
        match self {
            Self::Segment(s) => s.start,
            Self::Arc(a) => a.start,
        }
    }

    /// End point in the direction of travel.
    #[must_use]
    pub const fn end(&self) -> Point {
        match self {
            Self::Segment(s) => s.end,
            Self::Arc(a) => a.end,
        }
    }

    /// Length in mm.
    #[must_use]
    pub fn length(&self) -> f64 {
        match self {
            Self::Segment(s) => s.length(),
            Self::Arc(a) => a.length(),
        }
    }

    /// The element traversed the other way.
    #[must_use]
    pub const fn reversed(&self) -> Self {
        match self {
            Self::Segment(s) => Self::Segment(s.reversed()),
            Self::Arc(a) => Self::Arc(a.reversed()),
        }
    }

    /// Points that bound the element (end points, plus the arc mid point).
    #[must_use]
    pub fn extreme_points(&self) -> Vec<Point> {
        match self {
            Self::Segment(s) => vec![s.start, s.end],
            Self::Arc(a) => vec![a.start, a.mid, a.end],
        }
    }

    /// Flattens the element into straight pieces no longer than `max_len`.
    #[must_use]
    pub fn flatten(&self, max_len: f64) -> Vec<Segment> {
        match self {
            Self::Segment(s) => vec![*s],
            Self::Arc(a) => {
                let (Some(c), Some(r), Some(sweep)) = (a.centre(), a.radius(), a.sweep()) else {
                    return vec![Segment::new(a.start, a.end)];
                };
                let pieces = if max_len > 0.0 {
                    ((r * sweep.abs()) / max_len).ceil().max(1.0)
                } else {
                    1.0
                };
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let count = pieces as usize;
                let a0 = (a.start.y - c.y).atan2(a.start.x - c.x);
                let mut out = Vec::with_capacity(count);
                let mut prev = a.start;
                for i in 1..=count {
                    #[allow(clippy::cast_precision_loss)]
                    let next = if i == count {
                        a.end
                    } else {
                        Point::polar(c, r, sweep.mul_add(i as f64 / count as f64, a0))
                    };
                    out.push(Segment::new(prev, next));
                    prev = next;
                }
                out
            }
        }
    }
}

/// Axis-aligned bounding box of emitted geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum X coordinate (mm).
    pub min_x: f64,
    /// Minimum Y coordinate (mm).
    pub min_y: f64,
    /// Maximum X coordinate (mm).
    pub max_x: f64,
    /// Maximum Y coordinate (mm).
    pub max_y: f64,
}

impl BoundingBox {
    /// An empty box that any point will expand.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Returns true if no point has been included yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Returns the box grown to include `p`.
    #[must_use]
    pub fn including(self, p: Point) -> Self {
        Self {
            min_x: self.min_x.min(p.x),
            min_y: self.min_y.min(p.y),
            max_x: self.max_x.max(p.x),
            max_y: self.max_y.max(p.y),
        }
    }

    /// Returns the box grown to include every extreme point of `element`.
    #[must_use]
    pub fn including_element(self, element: &TraceElement) -> Self {
        element
            .extreme_points()
            .into_iter()
            .fold(self, Self::including)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

/// A through via joining the trace layer to the return layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Via {
    /// Via centre.
    pub at: Point,
    /// Annular ring outer diameter in mm.
    pub size: f64,
    /// Drill diameter in mm.
    pub drill: f64,
    /// First copper layer.
    pub from_layer: Layer,
    /// Last copper layer.
    pub to_layer: Layer,
}

/// Orientation of the two-pin connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadAngle {
    /// 0°: pin 2 sits 2.54 mm below pin 1 (+y).
    #[default]
    Vertical,
    /// 90°: pin 2 sits 2.54 mm left of pin 1 (−x).
    Horizontal,
}

impl PadAngle {
    /// Rotation in degrees as written to the board file.
    #[must_use]
    pub const fn degrees(&self) -> f64 {
        match self {
            Self::Vertical => 0.0,
            Self::Horizontal => 90.0,
        }
    }

    /// Offset from pin 1 to pin 2 for a connector of the given pitch.
    #[must_use]
    pub const fn second_pin_offset(&self, pitch: f64) -> (f64, f64) {
        match self {
            Self::Vertical => (0.0, pitch),
            Self::Horizontal => (-pitch, 0.0),
        }
    }
}

impl fmt::Display for PadAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertical => write!(f, "vertical"),
            Self::Horizontal => write!(f, "horizontal"),
        }
    }
}

/// A 1x02 2.54 mm pin header used as the coil's external connection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectorPad {
    /// Footprint origin (pin 1 centre).
    pub origin: Point,
    /// Layer the footprint is placed on.
    pub layer: Layer,
    /// Footprint orientation.
    pub angle: PadAngle,
}

impl ConnectorPad {
    /// Pin pitch in mm.
    pub const PITCH: f64 = 2.54;

    /// Centre of pin 1.
    #[must_use]
    pub const fn pin1(&self) -> Point {
        self.origin
    }

    /// Centre of pin 2.
    #[must_use]
    pub fn pin2(&self) -> Point {
        let (dx, dy) = self.angle.second_pin_offset(Self::PITCH);
        self.origin.offset(dx, dy)
    }
}

/// KiCad copper layers available on the generated 6-layer board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Layer {
    /// Front copper.
    #[default]
    #[serde(rename = "F.Cu", alias = "FCu")]
    FCu,
    /// Inner copper layer 1.
    #[serde(rename = "In1.Cu", alias = "In1Cu")]
    In1Cu,
    /// Inner copper layer 2.
    #[serde(rename = "In2.Cu", alias = "In2Cu")]
    In2Cu,
    /// Inner copper layer 3.
    #[serde(rename = "In3.Cu", alias = "In3Cu")]
    In3Cu,
    /// Inner copper layer 4.
    #[serde(rename = "In4.Cu", alias = "In4Cu")]
    In4Cu,
    /// Back copper.
    #[serde(rename = "B.Cu", alias = "BCu")]
    BCu,
}

impl Layer {
    /// Returns the KiCad layer name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FCu => "F.Cu",
            Self::In1Cu => "In1.Cu",
            Self::In2Cu => "In2.Cu",
            Self::In3Cu => "In3.Cu",
            Self::In4Cu => "In4.Cu",
            Self::BCu => "B.Cu",
        }
    }

    /// Parses a layer from its KiCad name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "F.Cu" => Some(Self::FCu),
            "In1.Cu" => Some(Self::In1Cu),
            "In2.Cu" => Some(Self::In2Cu),
            "In3.Cu" => Some(Self::In3Cu),
            "In4.Cu" => Some(Self::In4Cu),
            "B.Cu" => Some(Self::BCu),
            _ => None,
        }
    }

    /// Position in the copper stack, front = 0.
    ///
    /// Arc sagitta direction alternates on odd indices.
    #[must_use]
    pub const fn stack_index(&self) -> usize {
        match self {
            Self::FCu => 0,
            Self::In1Cu => 1,
            Self::In2Cu => 2,
            Self::In3Cu => 3,
            Self::In4Cu => 4,
            Self::BCu => 5,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
