//! Closed-form electrical estimates for a generated coil.
//!
//! All inputs are in millimetres; results are in SI units (ohm, farad,
//! henry, hertz).
//!
//! - DC resistance of a rectangular copper track
//! - Inter-turn capacitance as parallel plates along the facing length
//! - Inductance from the Greenhouse/Mohan current-sheet expression
//! - Self-resonant frequency of the resulting LC pair

mod greenhouse;

pub use greenhouse::GreenhouseCoefficients;

pub use crate::coil::primitives::segment_length;

use std::f64::consts::PI;

use serde::Serialize;

use crate::coil::{naming, Coil, CoilError, CoilResult};

/// Copper resistivity in ohm metres.
pub const COPPER_RESISTIVITY: f64 = 1.75e-8;

/// 1 oz copper thickness in metres.
pub const COPPER_1OZ: f64 = 35.56e-6;

/// 2 oz copper thickness in metres.
pub const COPPER_2OZ: f64 = 71.12e-6;

/// Vacuum permeability in H/m.
pub const MU_0: f64 = 4.0 * PI * 1e-7;

/// Vacuum permittivity in F/m.
pub const EPSILON_0: f64 = 8.854e-12;

/// Fraction of field lines through the solder mask and its permittivity.
const MASK_FRACTION: f64 = 0.9;
const MASK_PERMITTIVITY: f64 = 3.1;
/// Fraction of field lines through the FR-4 board and its permittivity.
const BOARD_FRACTION: f64 = 0.1;
const BOARD_PERMITTIVITY: f64 = 4.7;

/// Relative permittivity between neighbouring turns.
fn effective_permittivity() -> f64 {
    MASK_FRACTION.mul_add(MASK_PERMITTIVITY, BOARD_FRACTION * BOARD_PERMITTIVITY)
}

/// Inter-turn capacitance of two tracks facing each other along
/// `gap_length_mm`, separated by `track_gap_mm`.
///
/// # Errors
///
/// Returns [`CoilError::Configuration`] if the gap is not positive.
pub fn capacitance(track_gap_mm: f64, gap_length_mm: f64) -> CoilResult<f64> {
    if !track_gap_mm.is_finite() || track_gap_mm <= 0.0 {
        return Err(CoilError::configuration(
            "track_gap",
            format!("capacitance needs a positive gap, got {track_gap_mm}"),
        ));
    }
    let permittivity = effective_permittivity();
    let gap_length_m = gap_length_mm / 1000.0;
    let track_gap_m = track_gap_mm / 1000.0;
    Ok(permittivity * EPSILON_0 * COPPER_1OZ * gap_length_m / track_gap_m)
}

/// Inductance of a planar spiral in henries.
///
/// `inner_mm` and `outer_mm` are the inner and outer diameters.
///
/// # Errors
///
/// Returns [`CoilError::Configuration`] if the fill ratio is not positive
/// and finite.
pub fn inductance(
    turns: f64,
    inner_mm: f64,
    outer_mm: f64,
    coefficients: GreenhouseCoefficients,
) -> CoilResult<f64> {
    let fill = (outer_mm - inner_mm) / (outer_mm + inner_mm);
    if !fill.is_finite() || fill <= 0.0 {
        return Err(CoilError::configuration(
            "diameters",
            format!("fill ratio must be positive, got {fill} for {inner_mm}/{outer_mm} mm"),
        ));
    }

    let GreenhouseCoefficients { c1, c2, c3, c4 } = coefficients;
    let d_avg = (inner_mm + outer_mm) / 2.0 / 1000.0;
    let value = (MU_0 * turns * turns * d_avg * c1 / 2.0)
        * (c4 * fill).mul_add(fill, c3.mul_add(fill, (c2 / fill).ln()));
    Ok(value)
}

/// Self-resonant frequency of an LC pair in hertz.
///
/// # Errors
///
/// Returns [`CoilError::Configuration`] unless both values are positive.
pub fn self_resonant_frequency(inductance_h: f64, capacitance_f: f64) -> CoilResult<f64> {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !positive(inductance_h) || !positive(capacitance_f) {
        return Err(CoilError::configuration(
            "self_resonance",
            format!("needs positive L and C, got {inductance_h} H and {capacitance_f} F"),
        ));
    }
    Ok(1.0 / (2.0 * PI * (inductance_h * capacitance_f).sqrt()))
}

/// DC resistance of a track in ohms.
#[must_use]
pub fn dc_resistance(length_mm: f64, width_mm: f64, thickness_m: f64) -> f64 {
    COPPER_RESISTIVITY * (length_mm / 1000.0) / ((width_mm / 1000.0) * thickness_m)
}

/// Electrical summary of one coil.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectricalReport {
    /// Shape name.
    pub shape: String,
    /// Number of turns.
    pub turns: f64,
    /// Outer diameter in mm.
    pub outer_diameter_mm: f64,
    /// Inner diameter in mm.
    pub inner_diameter_mm: f64,
    /// Trace length in mm.
    pub trace_length_mm: f64,
    /// Facing length between turns in mm.
    pub capacitor_length_mm: f64,
    /// DC resistance with 1 oz copper.
    pub resistance_1oz_ohm: f64,
    /// DC resistance with 2 oz copper.
    pub resistance_2oz_ohm: f64,
    /// Inter-turn capacitance.
    pub capacitance_f: f64,
    /// Coefficients used for the inductance.
    pub coefficients: GreenhouseCoefficients,
    /// Inductance.
    pub inductance_h: f64,
    /// Self-resonant frequency, when both L and C are positive.
    pub self_resonance_hz: Option<f64>,
}

impl ElectricalReport {
    /// Computes the report for a generated coil.
    ///
    /// # Errors
    ///
    /// Returns an error if the diameters give a non-positive fill ratio.
    pub fn for_coil(coil: &Coil) -> CoilResult<Self> {
        let spec = &coil.spec;
        let geometry = &coil.geometry;
        let trace_length = coil.trace_length();
        let coefficients = GreenhouseCoefficients::for_vertices(spec.shape.greenhouse_vertices());

        let capacitance_f = capacitance(spec.track_gap, geometry.capacitor_length)?;
        let inductance_h = inductance(
            spec.turns,
            geometry.inner_diameter,
            geometry.outer_diameter,
            coefficients,
        )?;

        Ok(Self {
            shape: naming::shape_name(&spec.shape),
            turns: spec.turns,
            outer_diameter_mm: geometry.outer_diameter,
            inner_diameter_mm: geometry.inner_diameter,
            trace_length_mm: trace_length,
            capacitor_length_mm: geometry.capacitor_length,
            resistance_1oz_ohm: dc_resistance(trace_length, spec.track_width, COPPER_1OZ),
            resistance_2oz_ohm: dc_resistance(trace_length, spec.track_width, COPPER_2OZ),
            capacitance_f,
            coefficients,
            inductance_h,
            self_resonance_hz: self_resonant_frequency(inductance_h, capacitance_f).ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacitance_scales_with_length_over_gap() {
        let c = capacitance(1.27, 100.0).unwrap();
        let expected = 3.26 * 8.854e-12 * 35.56e-6 * 0.1 / 0.00127;
        assert!((c - expected).abs() < 1e-20);
        let double = capacitance(1.27, 200.0).unwrap();
        assert!((double / c - 2.0).abs() < 1e-12);
    }

    #[test]
    fn field_mostly_crosses_the_solder_mask() {
        let permittivity = effective_permittivity();
        assert!((permittivity - 3.26).abs() < 1e-12);
        let mask_share = MASK_FRACTION * MASK_PERMITTIVITY / permittivity;
        assert!((mask_share - 2.79 / 3.26).abs() < 1e-12);
    }

    #[test]
    fn capacitance_rejects_zero_gap() {
        assert!(capacitance(0.0, 100.0).is_err());
        assert!(capacitance(-1.0, 100.0).is_err());
    }

    #[test]
    fn inductance_rejects_equal_diameters() {
        assert!(inductance(5.0, 30.0, 30.0, GreenhouseCoefficients::CIRCULAR).is_err());
    }

    #[test]
    fn inductance_grows_with_square_of_turns() {
        let one = inductance(1.0, 20.0, 40.0, GreenhouseCoefficients::SQUARE).unwrap();
        let three = inductance(3.0, 20.0, 40.0, GreenhouseCoefficients::SQUARE).unwrap();
        assert!((three / one - 9.0).abs() < 1e-9);
    }

    #[test]
    fn self_resonance_of_known_pair() {
        // 1 uH with 1 nF resonates near 5.033 MHz.
        let f = self_resonant_frequency(1e-6, 1e-9).unwrap();
        assert!((f - 5_032_921.0).abs() < 1.0);
        assert!(self_resonant_frequency(0.0, 1e-9).is_err());
    }

    #[test]
    fn dc_resistance_of_one_metre() {
        // 1 m of 1 mm wide, 1 oz track.
        let r = dc_resistance(1000.0, 1.0, COPPER_1OZ);
        assert!((r - 1.75e-8 / (1e-3 * 35.56e-6)).abs() < 1e-9);
        assert!((dc_resistance(1000.0, 1.0, COPPER_2OZ) * 2.0 - r).abs() < 1e-9);
    }
}
