//! Electrical estimate tests.

use pcb_coil::coil::{Coil, CoilSpec, Shape};
use pcb_coil::electrical::{
    capacitance, dc_resistance, inductance, self_resonant_frequency, ElectricalReport,
    GreenhouseCoefficients, COPPER_1OZ, COPPER_2OZ,
};

/// Helper to compare floats with a relative tolerance.
fn rel_eq(a: f64, b: f64, tolerance: f64) -> bool {
    ((a - b) / b).abs() < tolerance
}

#[test]
fn test_circular_inductance_reference_value() {
    let l = inductance(9.0, 27.1, 32.0, GreenhouseCoefficients::CIRCULAR)
        .expect("valid diameters");
    assert!(l.is_finite());
    // About 5.1 uH for this geometry.
    assert!(l > 4.5e-6 && l < 5.7e-6, "L = {l}");
}

#[test]
fn test_inductance_grows_with_turns_squared() {
    let l3 = inductance(3.0, 10.0, 40.0, GreenhouseCoefficients::SQUARE).expect("valid");
    let l6 = inductance(6.0, 10.0, 40.0, GreenhouseCoefficients::SQUARE).expect("valid");
    assert!(rel_eq(l6 / l3, 4.0, 1e-12));
}

#[test]
fn test_inductance_rejects_inverted_diameters() {
    assert!(inductance(5.0, 40.0, 20.0, GreenhouseCoefficients::CIRCULAR).is_err());
    assert!(inductance(5.0, 20.0, 20.0, GreenhouseCoefficients::CIRCULAR).is_err());
}

#[test]
fn test_resistance_halves_with_double_copper() {
    let r1 = dc_resistance(1000.0, 1.0, COPPER_1OZ);
    let r2 = dc_resistance(1000.0, 1.0, COPPER_2OZ);
    assert!(rel_eq(r1 / r2, 2.0, 1e-12));
    // 1 m of 1 mm wide 1 oz copper.
    assert!(rel_eq(r1, 1.75e-8 / (1e-3 * 35.56e-6), 1e-12));
}

#[test]
fn test_self_resonance_needs_both_values() {
    assert!(self_resonant_frequency(1e-6, 0.0).is_err());
    assert!(self_resonant_frequency(0.0, 1e-12).is_err());
    let f = self_resonant_frequency(1e-6, 1e-12).expect("positive L and C");
    assert!(rel_eq(f, 159.154_943e6, 1e-6));
}

#[test]
fn test_capacitance_is_linear_in_length() {
    let c1 = capacitance(0.2, 100.0).expect("positive gap");
    let c2 = capacitance(0.2, 300.0).expect("positive gap");
    assert!(rel_eq(c2 / c1, 3.0, 1e-12));
}

#[test]
fn test_report_for_square_coil() {
    let coil = Coil::build(&CoilSpec {
        turns: 6.0,
        shape: Shape::Polygon { vertices: 4 },
        ..CoilSpec::default()
    })
    .expect("Failed to build coil");
    let report = ElectricalReport::for_coil(&coil).expect("Failed to compute report");

    assert_eq!(report.shape, "square");
    assert_eq!(report.coefficients, GreenhouseCoefficients::SQUARE);
    assert!(rel_eq(report.trace_length_mm, coil.trace_length(), 1e-12));
    assert!(report.inductance_h > 0.0);
    assert!(report.capacitance_f > 0.0);
    assert!(report.self_resonance_hz.is_some());
    assert!(report.resistance_1oz_ohm > report.resistance_2oz_ohm);
}

#[test]
fn test_report_single_turn_has_no_resonance() {
    let coil = Coil::build(&CoilSpec {
        turns: 1.0,
        ..CoilSpec::default()
    })
    .expect("Failed to build coil");
    let report = ElectricalReport::for_coil(&coil).expect("Failed to compute report");
    assert!(report.capacitance_f.abs() < f64::EPSILON);
    assert!(report.self_resonance_hz.is_none());
}

#[test]
fn test_report_serialises_to_json() {
    let coil = Coil::build(&CoilSpec::default()).expect("Failed to build coil");
    let report = ElectricalReport::for_coil(&coil).expect("Failed to compute report");
    let json = serde_json::to_value(&report).expect("Failed to serialise");
    assert!(json["inductance_h"].is_f64());
    assert_eq!(json["coefficients"]["c1"], 1.27);
}
