//! Point-list export for the external field solver.
//!
//! The solver reads one straight current element per line as
//! `x,y,z,current` in centimetres. Each line holds the start point of one
//! piece; the end point of the last piece closes the list. Arcs are
//! flattened into pieces no longer than the requested segment length.

use std::io::Write;

use crate::coil::{Coil, CoilResult, Point};

fn field_line(p: Point) -> String {
    format!("{:.2},{:.2},0,1", p.x / 10.0, p.y / 10.0)
}

/// Solver lines for the trace of `coil`.
#[must_use]
pub fn field_lines(coil: &Coil, segment_length: f64) -> Vec<String> {
    let pieces: Vec<_> = coil
        .trace_elements()
        .iter()
        .flat_map(|e| e.flatten(segment_length))
        .collect();

    let mut lines: Vec<String> = pieces.iter().map(|s| field_line(s.start)).collect();
    if let Some(last) = pieces.last() {
        lines.push(field_line(last.end));
    }
    lines
}

/// Writes the solver lines for `coil` to `out`.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_field_points<W: Write>(coil: &Coil, segment_length: f64, out: &mut W) -> CoilResult<()> {
    for line in field_lines(coil, segment_length) {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}
