//! Turn generator.
//!
//! One [`ShapeStrategy`] per coil shape emits complete turns and the
//! fractional remainder. Every step consumes a [`GeneratorState`] and returns
//! a new one together with the elements it produced; nothing is mutated in
//! place, so a failed step leaves no partial output behind.
//!
//! Orthogonal and circular coils are wound from the outside in, starting at
//! the origin. Polygon and helical coils are wound from the centre out.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use tracing::{debug, trace};

use super::error::{CoilError, CoilResult};
use super::primitives::{Arc, BoundingBox, Point, Segment, TraceElement};
use super::{CoilSpec, Shape, FRACTION_EPSILON};

/// Quarter-turn fractions a circular coil can finish on.
const CIRCULAR_FRACTIONS: [f64; 3] = [0.25, 0.5, 0.75];

/// Running state threaded through the generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorState {
    /// Current pen position.
    pub cursor: Point,
    /// Side length (orthogonal), radius (circular, helical) or apothem
    /// (polygon) of the next turn.
    pub offset: f64,
    /// Current angle in radians (helical only).
    pub angle: f64,
    /// Number of complete turns emitted so far.
    pub turn: usize,
    /// Bounding box of the geometry used for connector placement.
    pub bbox: BoundingBox,
    /// Sum of emitted element lengths.
    pub trace_length: f64,
    /// Sum of lengths facing a neighbouring turn.
    pub capacitor_length: f64,
}

impl GeneratorState {
    const fn new(cursor: Point, offset: f64) -> Self {
        Self {
            cursor,
            offset,
            angle: 0.0,
            turn: 0,
            bbox: BoundingBox::empty(),
            trace_length: 0.0,
            capacitor_length: 0.0,
        }
    }

    fn with_element(self, element: &TraceElement, in_bbox: bool, capacitor: f64) -> Self {
        Self {
            cursor: element.end(),
            bbox: if in_bbox {
                self.bbox.including_element(element)
            } else {
                self.bbox
            },
            trace_length: self.trace_length + element.length(),
            capacitor_length: self.capacitor_length + capacitor,
            ..self
        }
    }
}

/// Elements produced by one generator step and the state after it.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnStep {
    /// State after the step.
    pub state: GeneratorState,
    /// Elements in generation order.
    pub elements: Vec<TraceElement>,
}

/// Raw generator output before it is normalised into a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTrace {
    /// Elements of the complete turns in generation order.
    pub full: Vec<TraceElement>,
    /// Elements of the fractional turn, travelling away from the coil.
    pub partial: Vec<TraceElement>,
    /// Final state.
    pub state: GeneratorState,
    /// True when the full turns were generated from the outside in.
    pub winds_inward: bool,
    /// Orientation of the last orthogonal partial side.
    pub last_dir: Option<u8>,
}

/// How turns of a given shape are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeStrategy {
    /// Four axis-aligned sides per turn, outside in.
    Orthogonal,
    /// Two half-circle arcs per turn, outside in.
    Circular,
    /// `n` straight sides per turn, inside out.
    Polygon(u32),
    /// Straight segments along an Archimedean spiral, inside out.
    Helical,
}

impl ShapeStrategy {
    /// Picks the strategy for a shape.
    #[must_use]
    pub const fn for_shape(shape: &Shape) -> Self {
        match shape {
            Shape::Orthogonal => Self::Orthogonal,
            Shape::Circular => Self::Circular,
            Shape::Polygon { vertices } => Self::Polygon(*vertices),
            Shape::Helical { .. } => Self::Helical,
        }
    }

    /// True for shapes generated from the outer edge towards the centre.
    #[must_use]
    pub const fn winds_inward(&self) -> bool {
        matches!(self, Self::Orthogonal | Self::Circular)
    }

    /// Rejects parameters this strategy cannot lay out.
    ///
    /// # Errors
    ///
    /// Returns [`CoilError::UnsupportedFractionalTurn`] for a circular coil
    /// whose fraction is not a quarter turn.
    pub fn check(&self, spec: &CoilSpec) -> CoilResult<()> {
        let f = spec.fraction();
        if matches!(self, Self::Circular)
            && f > 0.0
            && !CIRCULAR_FRACTIONS
                .iter()
                .any(|q| (f - q).abs() < FRACTION_EPSILON)
        {
            return Err(CoilError::unsupported_fraction(f));
        }
        Ok(())
    }

    /// State before the first turn.
    ///
    /// # Errors
    ///
    /// Returns [`CoilError::FatalGeometry`] if an inside-out coil has no
    /// room for its innermost track.
    pub fn initial_state(&self, spec: &CoilSpec) -> CoilResult<GeneratorState> {
        let inc = spec.increment();
        match self {
            Self::Orthogonal => {
                let side = spec.outer_diameter - orthogonal_shrink(spec.fraction()) * inc;
                Ok(GeneratorState::new(spec.origin, side))
            }
            Self::Circular => {
                let r0 = circular_start_radius(spec);
                Ok(GeneratorState::new(
                    spec.origin.offset(r0 + inc, 0.0),
                    r0,
                ))
            }
            Self::Polygon(n) => {
                let s0 = inside_out_start(spec)?;
                let cursor = polygon_vertex(spec.origin, *n, s0, 0);
                Ok(GeneratorState::new(cursor, s0))
            }
            Self::Helical => {
                let s0 = inside_out_start(spec)?;
                Ok(GeneratorState::new(Point::polar(spec.origin, s0, 0.0), s0))
            }
        }
    }

    /// Emits one complete turn.
    ///
    /// # Errors
    ///
    /// Returns [`CoilError::FatalGeometry`] if the turn would leave no room
    /// for the innermost track.
    pub fn full_turn(&self, spec: &CoilSpec, state: &GeneratorState) -> CoilResult<TurnStep> {
        let capacitive = turn_is_capacitive(spec, state.turn);
        let step = match self {
            Self::Orthogonal => orthogonal_turn(spec, state, capacitive)?,
            Self::Circular => circular_turn(spec, state, capacitive)?,
            Self::Polygon(n) => polygon_turn(spec, state, *n, capacitive),
            Self::Helical => helical_turn(spec, state, capacitive),
        };
        Ok(TurnStep {
            state: GeneratorState {
                turn: state.turn + 1,
                ..step.state
            },
            elements: step.elements,
        })
    }

    /// Emits the fractional remainder after the complete turns.
    ///
    /// Returns the step and, for orthogonal coils, the orientation of the
    /// last side (0 vertical, 1 horizontal).
    #[must_use]
    pub fn partial_turn(&self, spec: &CoilSpec, state: &GeneratorState) -> (TurnStep, Option<u8>) {
        match self {
            Self::Orthogonal => orthogonal_partial(spec, state),
            Self::Circular => (circular_partial(spec, state), None),
            Self::Polygon(n) => (polygon_partial(spec, state, *n), None),
            Self::Helical => (helical_partial(spec, state), None),
        }
    }
}

/// Runs the generator for `spec`.
///
/// # Errors
///
/// Returns an error if the fraction is unsupported for the shape or if the
/// turns do not fit inside the outer diameter.
pub fn generate(spec: &CoilSpec) -> CoilResult<RawTrace> {
    let strategy = ShapeStrategy::for_shape(&spec.shape);
    strategy.check(spec)?;

    let mut state = strategy.initial_state(spec)?;
    let mut full = Vec::new();
    for _ in 0..spec.full_turns() {
        let step = strategy.full_turn(spec, &state)?;
        trace!(
            turn = step.state.turn,
            offset = step.state.offset,
            elements = step.elements.len(),
            "Turn complete"
        );
        full.extend(step.elements);
        state = step.state;
    }

    let (partial, last_dir) = if spec.fraction() > 0.0 {
        let (step, last_dir) = strategy.partial_turn(spec, &state);
        state = step.state;
        (step.elements, last_dir)
    } else {
        (Vec::new(), None)
    };

    debug!(
        ?strategy,
        full_elements = full.len(),
        partial_elements = partial.len(),
        trace_length_mm = state.trace_length,
        capacitor_length_mm = state.capacitor_length,
        "Generator finished"
    );

    Ok(RawTrace {
        full,
        partial,
        state,
        winds_inward: strategy.winds_inward(),
        last_dir,
    })
}

/// Turns before the last one face a neighbour and contribute capacitance.
#[allow(clippy::cast_precision_loss)]
fn turn_is_capacitive(spec: &CoilSpec, turn: usize) -> bool {
    (turn as f64) < spec.turns - 1.0
}

/// Increments the orthogonal side shrinks by so that the fractional turn
/// can wrap outside the full turns without exceeding the outer diameter.
fn orthogonal_shrink(fraction: f64) -> f64 {
    match quarter_sides(fraction).0 {
        0 => 0.0,
        1 | 2 => 1.0,
        _ => 2.0,
    }
}

/// Splits a fraction of four sides into whole sides and a remainder.
fn quarter_sides(fraction: f64) -> (usize, f64) {
    split_sides(fraction, 4)
}

fn split_sides(fraction: f64, sides: u32) -> (usize, f64) {
    let scaled = fraction * f64::from(sides);
    let whole = scaled.floor();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = whole as usize;
    (count, scaled - whole)
}

/// Radius of the first circular turn's inner half.
fn circular_start_radius(spec: &CoilSpec) -> f64 {
    let inc = spec.increment();
    let diameter = if spec.fraction() > 0.0 {
        spec.outer_diameter - inc
    } else {
        spec.outer_diameter
    };
    diameter / 2.0 - inc / 2.0
}

/// Starting radius of an inside-out coil, checked for room.
fn inside_out_start(spec: &CoilSpec) -> CoilResult<f64> {
    let s0 = spec.inner_diameter() / 2.0;
    if s0 - spec.track_width / 2.0 <= 0.0 {
        return Err(CoilError::fatal_geometry(
            0,
            format!(
                "{} turns of {} mm track with {} mm gap leave an inner radius of {s0:.3} mm",
                spec.turns, spec.track_width, spec.track_gap
            ),
        ));
    }
    Ok(s0)
}

fn check_orthogonal_side(spec: &CoilSpec, state: &GeneratorState, side: f64) -> CoilResult<()> {
    if side - spec.track_width <= 0.0 {
        return Err(CoilError::fatal_geometry(
            state.turn,
            format!("orthogonal side shrank to {side:.3} mm, no room for the next track"),
        ));
    }
    Ok(())
}

fn push(
    state: GeneratorState,
    elements: &mut Vec<TraceElement>,
    element: TraceElement,
    in_bbox: bool,
    capacitor: f64,
) -> GeneratorState {
    let next = state.with_element(&element, in_bbox, capacitor);
    elements.push(element);
    next
}

fn seg(a: Point, b: Point) -> TraceElement {
    TraceElement::Segment(Segment::new(a, b))
}

fn orthogonal_turn(
    spec: &CoilSpec,
    state: &GeneratorState,
    capacitive: bool,
) -> CoilResult<TurnStep> {
    let inc = spec.increment();
    let side = state.offset;
    check_orthogonal_side(spec, state, side)?;
    let inner_side = side - inc;
    check_orthogonal_side(spec, state, inner_side)?;

    let p0 = state.cursor;
    let p1 = p0.offset(0.0, side);
    let p2 = p1.offset(side, 0.0);
    let p3 = p2.offset(0.0, -inner_side);
    let p4 = p3.offset(-inner_side, 0.0);

    let mut elements = Vec::with_capacity(4);
    let mut next = *state;
    for (a, b) in [(p0, p1), (p1, p2), (p2, p3), (p3, p4)] {
        let element = seg(a, b);
        let cap = if capacitive { element.length() } else { 0.0 };
        next = push(next, &mut elements, element, true, cap);
    }

    Ok(TurnStep {
        state: GeneratorState {
            offset: side - 2.0 * inc,
            ..next
        },
        elements,
    })
}

/// Side lengths of the orthogonal wrap-around turn for each whole-side count.
fn orthogonal_partial_sides(outer: f64, inc: f64, whole: usize) -> [f64; 4] {
    match whole {
        0..=2 => [outer, outer, outer + inc, outer + inc],
        _ => [outer - inc, outer - inc, outer, outer],
    }
}

fn orthogonal_partial(spec: &CoilSpec, state: &GeneratorState) -> (TurnStep, Option<u8>) {
    const DIRECTIONS: [(f64, f64); 4] = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];

    let inc = spec.increment();
    let (whole, remainder) = quarter_sides(spec.fraction());
    let sides = orthogonal_partial_sides(spec.outer_diameter, inc, whole);

    let mut lengths: Vec<(usize, f64)> = (0..whole.min(4)).map(|i| (i, sides[i])).collect();
    if remainder > FRACTION_EPSILON && whole < 4 {
        lengths.push((whole, remainder * sides[whole]));
    }

    let mut elements = Vec::with_capacity(lengths.len());
    let mut next = GeneratorState {
        cursor: spec.origin,
        ..*state
    };
    let last = lengths.len().saturating_sub(1);
    for (n, (i, len)) in lengths.iter().enumerate() {
        let (dx, dy) = DIRECTIONS[*i];
        let start = next.cursor;
        let element = seg(start, start.offset(dx * len, dy * len));
        next = push(next, &mut elements, element, n < last, 0.0);
    }

    let last_dir = lengths.last().map(|(i, _)| if i % 2 == 1 { 0 } else { 1 });
    (
        TurnStep {
            state: next,
            elements,
        },
        last_dir,
    )
}

/// Sagitta sign so that coils on adjacent layers nest.
fn circular_sagitta(spec: &CoilSpec) -> f64 {
    let winding = if spec.clockwise { 1.0 } else { -1.0 };
    let layer = if spec.layers.trace.stack_index() % 2 == 1 {
        -1.0
    } else {
        1.0
    };
    winding * layer
}

fn circular_turn(
    spec: &CoilSpec,
    state: &GeneratorState,
    capacitive: bool,
) -> CoilResult<TurnStep> {
    let inc = spec.increment();
    let r = state.offset;
    if r - spec.track_width / 2.0 <= 0.0 {
        return Err(CoilError::fatal_geometry(
            state.turn,
            format!("circular radius shrank to {r:.3} mm, no room for the next track"),
        ));
    }

    let c = spec.origin;
    let s = circular_sagitta(spec);
    let outer_half = Arc::new(
        c.offset(r + inc, 0.0),
        c.offset(inc / 2.0, s * (r + inc / 2.0)),
        c.offset(-r, 0.0),
    );
    let inner_half = Arc::new(c.offset(-r, 0.0), c.offset(0.0, -s * r), c.offset(r, 0.0));

    let mut elements = Vec::with_capacity(2);
    let mut next = *state;
    for arc in [outer_half, inner_half] {
        let element = TraceElement::Arc(arc);
        let cap = if capacitive { element.length() } else { 0.0 };
        next = push(next, &mut elements, element, true, cap);
    }

    Ok(TurnStep {
        state: GeneratorState {
            offset: r - inc,
            ..next
        },
        elements,
    })
}

fn circular_partial(spec: &CoilSpec, state: &GeneratorState) -> TurnStep {
    let inc = spec.increment();
    let c = spec.origin;
    let s = circular_sagitta(spec);
    let r = circular_start_radius(spec) + inc;
    let f = spec.fraction();

    let mut arcs = Vec::with_capacity(2);
    if (f - 0.25).abs() < FRACTION_EPSILON {
        arcs.push(Arc::new(
            c.offset(r, 0.0),
            Point::polar(c, r, -s * FRAC_PI_4),
            Point::polar(c, r, -s * FRAC_PI_2),
        ));
    } else {
        arcs.push(Arc::new(
            c.offset(r, 0.0),
            c.offset(0.0, -s * r),
            c.offset(-r, 0.0),
        ));
        if (f - 0.75).abs() < FRACTION_EPSILON {
            let centre = c.offset(inc / 2.0, 0.0);
            let radius = r + inc / 2.0;
            arcs.push(Arc::new(
                c.offset(-r, 0.0),
                Point::polar(centre, radius, PI - s * FRAC_PI_4),
                Point::polar(centre, radius, PI - s * FRAC_PI_2),
            ));
        }
    }

    let mut elements = Vec::with_capacity(arcs.len());
    let mut next = GeneratorState {
        cursor: c.offset(r, 0.0),
        ..*state
    };
    let last = arcs.len() - 1;
    for (i, arc) in arcs.into_iter().enumerate() {
        next = push(next, &mut elements, TraceElement::Arc(arc), i < last, 0.0);
    }
    TurnStep {
        state: next,
        elements,
    }
}

/// Angle of the first vertex, chosen so the polygon sits level.
fn polygon_theta(n: u32) -> f64 {
    let nf = f64::from(n);
    if n % 2 == 1 {
        PI / (2.0 * nf)
    } else {
        PI / nf
    }
}

/// Vertex `j` of the polygon with apothem `apothem`.
fn polygon_vertex(origin: Point, n: u32, apothem: f64, j: u32) -> Point {
    let nf = f64::from(n);
    let radius = apothem / (PI / nf).cos();
    let angle = f64::from(j % n).mul_add(TAU / nf, polygon_theta(n));
    Point::polar(origin, radius, angle)
}

fn polygon_turn(spec: &CoilSpec, state: &GeneratorState, n: u32, capacitive: bool) -> TurnStep {
    let inc = spec.increment();
    let nf = f64::from(n);
    let apothem = state.offset;
    let corner = inc * (PI / nf).tan();
    let extension = inc / (TAU / nf).sin();

    let mut elements = Vec::with_capacity(n as usize);
    let mut next = *state;
    let mut start = polygon_vertex(spec.origin, n, apothem, 0);
    for j in 0..n {
        let end = if j + 2 < n {
            polygon_vertex(spec.origin, n, apothem, j + 1)
        } else if j + 2 == n {
            let target = polygon_vertex(spec.origin, n, apothem, j + 1);
            let len = start.distance(target);
            let scale = (len + extension) / len;
            Point::new(
                (target.x - start.x).mul_add(scale, start.x),
                (target.y - start.y).mul_add(scale, start.y),
            )
        } else {
            polygon_vertex(spec.origin, n, apothem + inc, 0)
        };
        let element = seg(start, end);
        let cap = if capacitive {
            element.length() + corner
        } else {
            0.0
        };
        next = push(next, &mut elements, element, j + 1 < n, cap);
        start = end;
    }

    TurnStep {
        state: GeneratorState {
            offset: apothem + inc,
            ..next
        },
        elements,
    }
}

fn polygon_partial(spec: &CoilSpec, state: &GeneratorState, n: u32) -> TurnStep {
    let apothem = state.offset;
    let (whole, remainder) = split_sides(spec.fraction(), n);
    #[allow(clippy::cast_possible_truncation)]
    let whole = whole.min(n as usize) as u32;

    let mut pieces = Vec::new();
    for j in 0..whole {
        pieces.push((
            polygon_vertex(spec.origin, n, apothem, j),
            polygon_vertex(spec.origin, n, apothem, j + 1),
        ));
    }
    if remainder > FRACTION_EPSILON && whole < n {
        let a = polygon_vertex(spec.origin, n, apothem, whole);
        let b = polygon_vertex(spec.origin, n, apothem, whole + 1);
        pieces.push((
            a,
            Point::new(
                (b.x - a.x).mul_add(remainder, a.x),
                (b.y - a.y).mul_add(remainder, a.y),
            ),
        ));
    }

    let mut elements = Vec::with_capacity(pieces.len());
    let mut next = *state;
    let last = pieces.len().saturating_sub(1);
    for (i, (a, b)) in pieces.into_iter().enumerate() {
        next = push(next, &mut elements, seg(a, b), i < last, 0.0);
    }
    TurnStep {
        state: next,
        elements,
    }
}

/// Segments per loop, angle step and radius step of a helical coil.
fn helical_steps(spec: &CoilSpec) -> (f64, f64) {
    let segment_length = match spec.shape {
        Shape::Helical { segment_length } => segment_length,
        _ => spec.outer_diameter,
    };
    let per_loop = PI * spec.outer_diameter / segment_length;
    (TAU / per_loop, spec.increment() / per_loop)
}

fn helical_segment(
    spec: &CoilSpec,
    state: GeneratorState,
    d_theta: f64,
    d_r: f64,
) -> (TraceElement, f64, GeneratorState) {
    let (theta, r) = (state.angle, state.offset);
    let (next_theta, next_r) = (theta + d_theta, r + d_r);
    let c = spec.origin;
    let element = seg(
        Point::polar(c, r, theta),
        Point::polar(c, next_r, next_theta),
    );
    // Capacitance is integrated along the midline of the gap.
    let half_gap = spec.track_gap / 2.0;
    let midline = Point::polar(c, r + half_gap, theta)
        .distance(Point::polar(c, next_r + half_gap, next_theta));
    let advanced = GeneratorState {
        angle: next_theta,
        offset: next_r,
        ..state
    };
    (element, midline, advanced)
}

fn helical_turn(spec: &CoilSpec, state: &GeneratorState, capacitive: bool) -> TurnStep {
    let (d_theta, d_r) = helical_steps(spec);
    let mut elements = Vec::new();
    let mut next = *state;
    loop {
        let (element, midline, advanced) = helical_segment(spec, next, d_theta, d_r);
        let cap = if capacitive { midline } else { 0.0 };
        next = push(advanced, &mut elements, element, true, cap);
        if next.angle > TAU {
            next.angle -= TAU;
            break;
        }
    }
    TurnStep {
        state: next,
        elements,
    }
}

fn helical_partial(spec: &CoilSpec, state: &GeneratorState) -> TurnStep {
    let (d_theta, d_r) = helical_steps(spec);
    let target = spec.fraction() * TAU;
    let mut elements = Vec::new();
    let mut next = *state;
    while next.angle < target {
        let (element, _, advanced) = helical_segment(spec, next, d_theta, d_r);
        let in_bbox = advanced.angle < target;
        next = push(advanced, &mut elements, element, in_bbox, 0.0);
    }
    TurnStep {
        state: next,
        elements,
    }
}
