//! Stress tests and edge cases.
//!
//! Dense coils, tiny dimensions and parameter boundaries.

use pcb_coil::coil::{Coil, CoilError, CoilSpec, Point, Shape, TraceElement};
use pcb_coil::electrical::ElectricalReport;
use pcb_coil::kicad::KicadWriter;

// =============================================================================
// Dense coils
// =============================================================================

#[test]
fn test_dense_octagon() {
    let spec = CoilSpec {
        outer_diameter: 47.24,
        turns: 91.0,
        track_width: 0.127,
        track_gap: 0.127,
        via_drill: 0.15,
        via_size: 0.25,
        shape: Shape::Polygon { vertices: 8 },
        ..CoilSpec::default()
    };
    let coil = Coil::build(&spec).expect("Failed to build coil");
    assert_eq!(coil.geometry.elements.len(), 91 * 8);
    assert!(coil.connector.extension.is_some());

    let report = ElectricalReport::for_coil(&coil).expect("Failed to compute report");
    assert!(report.inductance_h.is_finite() && report.inductance_h > 0.0);
    assert!(report.self_resonance_hz.is_some());
}

#[test]
fn test_fine_helical_spiral() {
    let spec = CoilSpec {
        turns: 10.0,
        track_width: 0.5,
        track_gap: 0.5,
        shape: Shape::Helical {
            segment_length: 0.05,
        },
        ..CoilSpec::default()
    };
    let coil = Coil::build(&spec).expect("Failed to build coil");
    assert!(coil.geometry.elements.len() > 10_000);

    let mut writer = KicadWriter::new(Vec::new());
    writer.begin().expect("Failed to write header");
    coil.emit(&mut writer, false).expect("Failed to emit coil");
    let text = String::from_utf8(writer.finish().expect("Failed to finish")).expect("UTF-8");
    assert!(text.len() > 1_000_000);
}

// =============================================================================
// Boundaries
// =============================================================================

#[test]
fn test_negative_origin() {
    let spec = CoilSpec {
        origin: Point::new(-49.53, -49.53),
        ..CoilSpec::default()
    };
    let coil = Coil::build(&spec).expect("Failed to build coil");
    assert!(coil.geometry.bbox.min_x < -49.53 + 25.0);
}

#[test]
fn test_fraction_just_above_whole() {
    // Float noise above an integer count must not produce a sliver turn.
    let spec = CoilSpec {
        turns: 3.0 + 1e-12,
        shape: Shape::Orthogonal,
        ..CoilSpec::default()
    };
    let coil = Coil::build(&spec).expect("Failed to build coil");
    assert_eq!(coil.geometry.elements.len(), 12);
}

#[test]
fn test_tiny_partial_turn() {
    let spec = CoilSpec {
        turns: 2.1,
        shape: Shape::Orthogonal,
        ..CoilSpec::default()
    };
    let coil = Coil::build(&spec).expect("Failed to build coil");
    let last = coil.geometry.elements.last().expect("has elements");
    assert!(matches!(last, TraceElement::Segment(_)));
    assert!((last.length() - 20.0).abs() < 1e-9);
}

#[test]
fn test_inside_out_without_room_is_fatal() {
    let spec = CoilSpec {
        turns: 12.0,
        shape: Shape::Polygon { vertices: 6 },
        ..CoilSpec::default()
    };
    let err = Coil::build(&spec).expect_err("12 turns of 1.27/1.27 cannot fit in 50 mm");
    assert!(matches!(err, CoilError::FatalGeometry { .. }));
}

#[test]
fn test_rejected_inputs() {
    let cases = [
        CoilSpec {
            outer_diameter: 0.0,
            ..CoilSpec::default()
        },
        CoilSpec {
            track_width: -1.0,
            ..CoilSpec::default()
        },
        CoilSpec {
            turns: f64::INFINITY,
            ..CoilSpec::default()
        },
        CoilSpec {
            via_drill: 1.5,
            via_size: 1.0,
            ..CoilSpec::default()
        },
        CoilSpec {
            shape: Shape::Helical {
                segment_length: 100.0,
            },
            ..CoilSpec::default()
        },
    ];
    for spec in cases {
        let err = Coil::build(&spec).expect_err("invalid spec");
        assert!(matches!(err, CoilError::Configuration { .. }), "{err}");
    }
}
