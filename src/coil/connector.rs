//! Terminal connector placement.
//!
//! Every coil ends in a via at its inner terminal and a 1x02 pin header just
//! outside its outer terminal. The return path runs on the return layer from
//! the via to the pin that is not on the trace terminal.
//!
//! Where the header goes depends on which way the terminal segment leaves
//! the coil and whether there is free board beyond it. The rules are kept in
//! [`PadRule::select`]; they are intentionally not mirror-symmetric.

use serde::Serialize;
use tracing::debug;

use super::primitives::{BoundingBox, ConnectorPad, PadAngle, Point, Segment, Via};
use super::{CoilGeometry, CoilSpec};

/// Minimum clearance in mm between the last turn and the connector.
pub const CLEARANCE: f64 = 2.0;

/// Header pin pitch in mm.
const PITCH: f64 = ConnectorPad::PITCH;

/// Direction the terminal segment travels, on truncated coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionClass {
    /// Left and down.
    LeftDown,
    /// Left, or left and up.
    Left,
    /// Right and down.
    RightDown,
    /// Right and up.
    RightUp,
    /// Right only.
    Right,
    /// Up only.
    Up,
    /// Down only.
    Down,
    /// No movement after truncation.
    Stationary,
}

#[allow(clippy::cast_possible_truncation)]
fn trunc(v: f64) -> i64 {
    v.trunc() as i64
}

impl DirectionClass {
    /// Classifies a terminal segment. Board coordinates have +y pointing
    /// down, so "up" means decreasing y.
    #[must_use]
    pub fn classify(terminal: &Segment) -> Self {
        let (x1, y1) = (trunc(terminal.start.x), trunc(terminal.start.y));
        let (x2, y2) = (trunc(terminal.end.x), trunc(terminal.end.y));
        let left = x1 > x2;
        let right = x1 < x2;
        let up = y1 > y2;
        let down = y1 < y2;

        if left {
            if down {
                Self::LeftDown
            } else {
                Self::Left
            }
        } else if right {
            if down {
                Self::RightDown
            } else if up {
                Self::RightUp
            } else {
                Self::Right
            }
        } else if up {
            Self::Up
        } else if down {
            Self::Down
        } else {
            Self::Stationary
        }
    }
}

/// Board context the rules look at.
#[derive(Debug, Clone, Copy)]
pub struct PlacementContext {
    /// Terminal point.
    pub terminal: Point,
    /// Bounding box of the coil.
    pub bbox: BoundingBox,
    /// Coil origin.
    pub origin: Point,
    /// Outer diameter.
    pub outer_diameter: f64,
    /// Track width plus gap.
    pub increment: f64,
}

/// Outcome of one decision-table row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PadRule {
    /// Shift of the header origin away from the terminal.
    pub pad_shift: (f64, f64),
    /// Offset from the header origin to the return-path end.
    pub return_offset: (f64, f64),
    /// Header orientation.
    pub angle: PadAngle,
    /// Route the L-shaped return path vertically first.
    pub vertical_first: bool,
}

impl PadRule {
    const fn new(
        pad_shift: (f64, f64),
        return_offset: (f64, f64),
        angle: PadAngle,
        vertical_first: bool,
    ) -> Self {
        Self {
            pad_shift,
            return_offset,
            angle,
            vertical_first,
        }
    }

    /// Header origin on the terminal, pin 2 one pitch to the left.
    const fn horizontal_left() -> Self {
        Self::new((0.0, 0.0), (-PITCH, 0.0), PadAngle::Horizontal, true)
    }

    /// Header origin on the terminal, pin 2 one pitch below.
    const fn vertical_below() -> Self {
        Self::new((0.0, 0.0), (0.0, PITCH), PadAngle::Vertical, true)
    }

    /// Header shifted one pitch right so pin 2 lands on the terminal.
    const fn shifted_right() -> Self {
        Self::new((PITCH, 0.0), (0.0, 0.0), PadAngle::Horizontal, true)
    }

    /// Header shifted one pitch up so pin 2 lands on the terminal.
    const fn shifted_up() -> Self {
        Self::new((0.0, -PITCH), (0.0, 0.0), PadAngle::Vertical, true)
    }

    const fn routed_horizontal_first(self) -> Self {
        Self {
            vertical_first: false,
            ..self
        }
    }

    /// Evaluates the decision table.
    #[must_use]
    pub fn select(class: DirectionClass, ctx: &PlacementContext) -> Self {
        let (x2, y2) = (ctx.terminal.x, ctx.terminal.y);
        let b = &ctx.bbox;

        let rule = match class {
            DirectionClass::LeftDown => {
                if y2 > b.max_y {
                    Self::horizontal_left()
                } else {
                    Self::vertical_below()
                }
                .routed_horizontal_first()
            }
            DirectionClass::Left => {
                let limit = ctx.outer_diameter + b.max_x - ctx.origin.x + ctx.increment;
                if trunc(x2) < trunc(limit) {
                    Self::vertical_below()
                } else {
                    Self::horizontal_left()
                }
                .routed_horizontal_first()
            }
            DirectionClass::RightDown => {
                if trunc(y2) > trunc(b.max_y) {
                    Self::horizontal_left()
                } else {
                    Self::shifted_right().routed_horizontal_first()
                }
            }
            DirectionClass::RightUp => {
                let limit = ctx.outer_diameter + b.max_y - ctx.origin.y;
                if trunc(y2) < trunc(limit) {
                    Self::shifted_right()
                } else {
                    Self::shifted_up()
                }
            }
            DirectionClass::Right => {
                if trunc(x2) > trunc(b.max_x) {
                    Self::shifted_up()
                } else {
                    Self::shifted_right().routed_horizontal_first()
                }
            }
            DirectionClass::Up => {
                if trunc(y2) < trunc(b.min_y) && trunc(x2) + 5 < trunc(-b.max_x) {
                    Self::shifted_right()
                } else {
                    Self::shifted_up()
                }
            }
            DirectionClass::Down => {
                if trunc(y2) > trunc(b.max_y) {
                    Self::horizontal_left()
                } else {
                    Self::vertical_below()
                }
            }
            DirectionClass::Stationary => Self::shifted_up(),
        };

        // A vertical header whose return end sits straight below it can only
        // be reached by going vertical first.
        let (dx, dy) = rule.return_offset;
        if rule.angle == PadAngle::Vertical && dx.abs() < f64::EPSILON && dy > 0.0 {
            return Self {
                vertical_first: true,
                ..rule
            };
        }
        rule
    }
}

/// Via, header and return path of one coil.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connector {
    /// Clearance extension appended to the trace, if the turns are packed
    /// tighter than [`CLEARANCE`].
    pub extension: Option<Segment>,
    /// Terminal segment after any extension.
    pub terminal: Segment,
    /// How the terminal was classified.
    pub class: DirectionClass,
    /// The rule that was applied.
    pub rule: PadRule,
    /// Header footprint.
    pub pad: ConnectorPad,
    /// End of the return path, on one of the header pins.
    pub return_end: Point,
    /// Return-path segments on the return layer.
    pub return_path: Vec<Segment>,
    /// Via at the inner terminal.
    pub via: Via,
}

impl Connector {
    /// Places the connector for a generated coil.
    #[must_use]
    pub fn place(spec: &CoilSpec, geometry: &CoilGeometry) -> Self {
        let inc = spec.increment();
        let original = geometry.terminal;

        let (extension, terminal) = match original.unit_direction() {
            Some((ux, uy)) if inc < CLEARANCE => {
                let len = CLEARANCE - inc;
                let end = original.end.offset(ux * len, uy * len);
                (
                    Some(Segment::new(original.end, end)),
                    Segment::new(original.start, end),
                )
            }
            _ => (None, original),
        };

        let bbox = if geometry.bbox.is_empty() {
            BoundingBox::empty().including(terminal.end)
        } else {
            geometry.bbox
        };

        let ctx = PlacementContext {
            terminal: terminal.end,
            bbox,
            origin: spec.origin,
            outer_diameter: spec.outer_diameter,
            increment: inc,
        };
        let class = DirectionClass::classify(&terminal);
        let rule = PadRule::select(class, &ctx);

        let origin = terminal
            .end
            .offset(rule.pad_shift.0, rule.pad_shift.1);
        let return_end = origin.offset(rule.return_offset.0, rule.return_offset.1);
        let via_point = geometry.via_point;

        let return_path = if spec.straight {
            let corner = if rule.vertical_first {
                Point::new(via_point.x, return_end.y)
            } else {
                Point::new(return_end.x, via_point.y)
            };
            vec![
                Segment::new(via_point, corner),
                Segment::new(corner, return_end),
            ]
        } else {
            vec![Segment::new(via_point, return_end)]
        };

        debug!(
            ?class,
            angle = %rule.angle,
            vertical_first = rule.vertical_first,
            extended = extension.is_some(),
            "Connector rule selected"
        );

        Self {
            extension,
            terminal,
            class,
            rule,
            pad: ConnectorPad {
                origin,
                layer: spec.connector_layer,
                angle: rule.angle,
            },
            return_end,
            return_path,
            via: Via {
                at: via_point,
                size: spec.via_size,
                drill: spec.via_drill,
                from_layer: spec.layers.trace,
                to_layer: spec.layers.return_layer,
            },
        }
    }
}
