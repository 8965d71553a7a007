//! Greenhouse/Mohan current-sheet coefficients for planar spirals.

use serde::Serialize;
use tracing::warn;

/// The four fitted coefficients of the current-sheet inductance expression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GreenhouseCoefficients {
    /// Leading factor.
    pub c1: f64,
    /// Logarithm numerator.
    pub c2: f64,
    /// Linear fill-ratio term.
    pub c3: f64,
    /// Quadratic fill-ratio term.
    pub c4: f64,
}

impl GreenhouseCoefficients {
    /// Circular spiral.
    pub const CIRCULAR: Self = Self::new(1.00, 2.46, 0.00, 0.20);
    /// Square spiral.
    pub const SQUARE: Self = Self::new(1.27, 2.07, 0.18, 0.13);
    /// Hexagonal spiral.
    pub const HEXAGONAL: Self = Self::new(1.09, 2.23, 0.00, 0.17);
    /// Octagonal spiral.
    pub const OCTAGONAL: Self = Self::new(1.07, 2.29, 0.00, 0.19);

    /// Creates a coefficient set.
    #[must_use]
    pub const fn new(c1: f64, c2: f64, c3: f64, c4: f64) -> Self {
        Self { c1, c2, c3, c4 }
    }

    /// Looks up the coefficients for a vertex count, if tabulated.
    ///
    /// 0 means circular.
    #[must_use]
    pub const fn lookup(vertices: u32) -> Option<Self> {
        match vertices {
            0 => Some(Self::CIRCULAR),
            4 => Some(Self::SQUARE),
            6 => Some(Self::HEXAGONAL),
            8 => Some(Self::OCTAGONAL),
            _ => None,
        }
    }

    /// Coefficients for a vertex count, falling back to circular with a
    /// warning when none are tabulated.
    #[must_use]
    pub fn for_vertices(vertices: u32) -> Self {
        Self::lookup(vertices).unwrap_or_else(|| {
            warn!(
                vertices,
                "No Greenhouse coefficients for this vertex count, using circular"
            );
            Self::CIRCULAR
        })
    }
}
