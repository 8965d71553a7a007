//! Shape names and output file naming.

use super::{CoilSpec, Shape};

/// Human-readable name of a shape, as used in output file names.
#[must_use]
pub fn shape_name(shape: &Shape) -> String {
    match shape {
        Shape::Circular => "circular".to_string(),
        Shape::Helical { .. } => "helical".to_string(),
        Shape::Orthogonal => "orthogonal".to_string(),
        Shape::Polygon { vertices } => polygon_name(*vertices),
    }
}

fn polygon_name(vertices: u32) -> String {
    let name = match vertices {
        3 => "triangular",
        4 => "square",
        5 => "pentagonal",
        6 => "hexagonal",
        7 => "heptagonal",
        8 => "octagonal",
        9 => "nonagonal",
        10 => "decagonal",
        n => return format!("{n}_gon"),
    };
    name.to_string()
}

/// Formats a turn count without a trailing `.0` for whole turns.
#[must_use]
pub fn format_turns(turns: f64) -> String {
    if turns.fract().abs() < f64::EPSILON && turns.abs() < 1e15 {
        format!("{turns:.0}")
    } else {
        format!("{turns}")
    }
}

/// Base name of the board file for a coil, e.g. `9_turn_octagonal_inductor`.
#[must_use]
pub fn module_name(spec: &CoilSpec) -> String {
    format!(
        "{}_turn_{}_inductor",
        format_turns(spec.turns),
        shape_name(&spec.shape)
    )
}

/// Board file name for a coil, e.g. `9_turn_octagonal_inductor.kicad_pcb`.
#[must_use]
pub fn board_file_name(spec: &CoilSpec) -> String {
    format!("{}.kicad_pcb", module_name(spec))
}
