//! Connector, via and return-path placement tests.

use pcb_coil::coil::connector::DirectionClass;
use pcb_coil::coil::{Coil, CoilSpec, Layer, LayerPair, PadAngle, Point, Shape};

fn build(spec: &CoilSpec) -> Coil {
    Coil::build(spec).expect("Failed to build coil")
}

fn pins(coil: &Coil) -> [Point; 2] {
    [coil.connector.pad.pin1(), coil.connector.pad.pin2()]
}

#[test]
fn test_header_pin_on_terminal() {
    for shape in [
        Shape::Orthogonal,
        Shape::Circular,
        Shape::Polygon { vertices: 3 },
        Shape::Polygon { vertices: 8 },
        Shape::Helical {
            segment_length: 0.5,
        },
    ] {
        for turns in [2.0, 3.5, 5.0] {
            let coil = build(&CoilSpec {
                turns,
                shape,
                ..CoilSpec::default()
            });
            let terminal = coil.connector.terminal.end;
            let [p1, p2] = pins(&coil);

            assert!(
                p1.approx_eq(terminal, 1e-9) || p2.approx_eq(terminal, 1e-9),
                "{shape:?} {turns}: no pin on terminal {terminal:?}"
            );
            assert!((p1.distance(p2) - 2.54).abs() < 1e-9);
        }
    }
}

#[test]
fn test_square_four_turn_header_position() {
    let coil = build(&CoilSpec {
        turns: 4.0,
        shape: Shape::Orthogonal,
        ..CoilSpec::default()
    });
    let connector = &coil.connector;

    // The last side climbs back towards the origin row.
    assert_eq!(connector.class, DirectionClass::Up);
    let terminal = connector.terminal.end;
    assert!(terminal.approx_eq(Point::new(100.0, 100.0), 1e-9), "{terminal:?}");

    // Header shifted one pitch up, pin 2 on the terminal.
    assert_eq!(connector.pad.angle, PadAngle::Vertical);
    assert!(connector.pad.origin.approx_eq(Point::new(100.0, 97.46), 1e-9));
    assert!(connector.pad.pin2().approx_eq(terminal, 1e-9));
    assert!(connector.return_end.approx_eq(connector.pad.origin, 1e-9));
}

#[test]
fn test_return_path_runs_from_via_to_other_pin() {
    let coil = build(&CoilSpec {
        turns: 4.0,
        shape: Shape::Orthogonal,
        ..CoilSpec::default()
    });
    let path = &coil.connector.return_path;

    assert_eq!(path.len(), 2);
    assert!(path[0].start.approx_eq(coil.geometry.via_point, 1e-9));
    assert!(path[1].end.approx_eq(coil.connector.return_end, 1e-9));
    assert!(path[0].end.approx_eq(path[1].start, 1e-9));

    // L-shaped: each leg is axis-aligned.
    for leg in path {
        let dx = (leg.end.x - leg.start.x).abs();
        let dy = (leg.end.y - leg.start.y).abs();
        assert!(dx < 1e-9 || dy < 1e-9);
    }

    let [p1, p2] = pins(&coil);
    let ret = coil.connector.return_end;
    assert!(p1.approx_eq(ret, 1e-9) || p2.approx_eq(ret, 1e-9));
}

#[test]
fn test_diagonal_return_path() {
    let coil = build(&CoilSpec {
        turns: 4.0,
        straight: false,
        ..CoilSpec::default()
    });
    let path = &coil.connector.return_path;
    assert_eq!(path.len(), 1);
    assert!(path[0].start.approx_eq(coil.geometry.via_point, 1e-9));
    assert!(path[0].end.approx_eq(coil.connector.return_end, 1e-9));
}

#[test]
fn test_via_uses_spec_layers_and_sizes() {
    let coil = build(&CoilSpec {
        layers: LayerPair::new(Layer::In2Cu, Layer::In3Cu),
        via_drill: 0.3,
        via_size: 0.6,
        ..CoilSpec::default()
    });
    let via = coil.connector.via;
    assert!(via.at.approx_eq(coil.geometry.via_point, 1e-12));
    assert_eq!(via.from_layer, Layer::In2Cu);
    assert_eq!(via.to_layer, Layer::In3Cu);
    assert!((via.drill - 0.3).abs() < f64::EPSILON);
    assert!((via.size - 0.6).abs() < f64::EPSILON);
}

#[test]
fn test_tight_turns_get_clearance_extension() {
    let coil = build(&CoilSpec {
        turns: 20.0,
        track_width: 0.3,
        track_gap: 0.3,
        shape: Shape::Polygon { vertices: 4 },
        ..CoilSpec::default()
    });
    let extension = coil.connector.extension.expect("increment below clearance");

    // Extended by clearance minus increment, along the terminal direction.
    assert!((extension.length() - 1.4).abs() < 1e-9);
    assert!(extension.start.approx_eq(coil.geometry.terminal.end, 1e-9));
    assert!(extension.end.approx_eq(coil.connector.terminal.end, 1e-9));
    assert!(
        (coil.trace_length() - coil.geometry.trace_length - 1.4).abs() < 1e-9,
        "extension counts toward trace length"
    );
}

#[test]
fn test_wide_turns_need_no_extension() {
    let coil = build(&CoilSpec::default());
    assert!(coil.connector.extension.is_none());
    assert_eq!(coil.connector.terminal, coil.geometry.terminal);
}

#[test]
fn test_connector_layer_and_orientation() {
    let coil = build(&CoilSpec {
        connector_layer: Layer::BCu,
        ..CoilSpec::default()
    });
    assert_eq!(coil.connector.pad.layer, Layer::BCu);
    let angle = coil.connector.pad.angle;
    assert!(matches!(angle, PadAngle::Vertical | PadAngle::Horizontal));
}
