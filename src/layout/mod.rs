//! Multi-coil board layouts.
//!
//! A [`LayoutPlan`] places independent copies of one coil template at a
//! list of `(layer, origin)` positions. Positions come from a built-in
//! [`LayoutPreset`] or a CSV placement file with `layer,x,y` rows.
//!
//! Every coil is generated before anything is written, so a coil that does
//! not fit aborts the whole layout with an untouched output.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::coil::{Coil, CoilError, CoilResult, CoilSpec, Layer, LayerPair, Point, Shape};
use crate::kicad::{BoardSink, KicadWriter};

/// One coil position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Layer carrying the coil trace.
    pub layer: Layer,
    /// Coil origin.
    pub origin: Point,
}

/// Built-in placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutPreset {
    /// One square coil on each inner layer, on a 2x2 grid.
    FourLayer,
    /// Nine octagonal coils on the front layer and interleaved coils on the
    /// inner layers.
    NinePerLayer,
}

impl LayoutPreset {
    /// Parses a preset from its kebab-case name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "four-layer" => Some(Self::FourLayer),
            "nine-per-layer" => Some(Self::NinePerLayer),
            _ => None,
        }
    }

    /// Positions grouped by layer, in placement order.
    #[must_use]
    pub fn positions(&self) -> IndexMap<Layer, Vec<Point>> {
        let p = Point::new;
        let mut map = IndexMap::new();
        match self {
            Self::FourLayer => {
                map.insert(Layer::In1Cu, vec![p(38.0, 38.0)]);
                map.insert(Layer::In2Cu, vec![p(90.0, 38.0)]);
                map.insert(Layer::In3Cu, vec![p(38.0, 90.0)]);
                map.insert(Layer::In4Cu, vec![p(90.0, 90.0)]);
            }
            Self::NinePerLayer => {
                let g = 49.53;
                let h = 16.51;
                let t = 33.02;
                map.insert(
                    Layer::FCu,
                    vec![
                        p(g, g),
                        p(0.0, g),
                        p(-g, g),
                        p(0.0, 0.0),
                        p(g, 0.0),
                        p(-g, 0.0),
                        p(g, -g),
                        p(0.0, -g),
                        p(-g, -g),
                    ],
                );
                map.insert(
                    Layer::In1Cu,
                    vec![p(-t, g), p(h, g), p(-t, 0.0), p(h, 0.0), p(-t, -g), p(h, -g)],
                );
                map.insert(
                    Layer::In2Cu,
                    vec![p(-h, g), p(t, g), p(-h, 0.0), p(t, 0.0), p(-h, -g), p(t, -g)],
                );
                map.insert(
                    Layer::In3Cu,
                    vec![p(-g, t), p(-h, t), p(-g, -h), p(-h, -h)],
                );
                map.insert(Layer::In4Cu, vec![p(h, t), p(g, t), p(h, -h), p(g, -h)]);
            }
        }
        map
    }

    /// Coil template the preset was designed for.
    #[must_use]
    pub fn template(&self) -> CoilSpec {
        match self {
            Self::FourLayer => CoilSpec {
                outer_diameter: 47.0,
                turns: 9.0,
                shape: Shape::Polygon { vertices: 4 },
                track_width: 1.27,
                track_gap: 1.27,
                via_drill: 0.15,
                via_size: 0.25,
                ..CoilSpec::default()
            },
            Self::NinePerLayer => CoilSpec {
                outer_diameter: 47.24,
                turns: 91.0,
                shape: Shape::Polygon { vertices: 8 },
                track_width: 0.127,
                track_gap: 0.127,
                via_drill: 0.15,
                via_size: 0.25,
                ..CoilSpec::default()
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlacementRow {
    layer: String,
    x: f64,
    y: f64,
}

/// Ordered coil placements sharing one template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPlan {
    /// Parameters shared by every coil; origin and trace layer are replaced
    /// per placement.
    pub template: CoilSpec,
    /// Layer carrying every return path.
    pub return_layer: Layer,
    /// Coil positions in output order.
    pub placements: Vec<Placement>,
}

impl LayoutPlan {
    /// Creates a plan from positions grouped by layer.
    #[must_use]
    pub fn from_positions(
        template: CoilSpec,
        return_layer: Layer,
        positions: &IndexMap<Layer, Vec<Point>>,
    ) -> Self {
        let placements = positions
            .iter()
            .flat_map(|(layer, points)| {
                points.iter().map(|origin| Placement {
                    layer: *layer,
                    origin: *origin,
                })
            })
            .collect();
        Self {
            template,
            return_layer,
            placements,
        }
    }

    /// Creates a plan from a preset.
    #[must_use]
    pub fn from_preset(preset: LayoutPreset, template: CoilSpec, return_layer: Layer) -> Self {
        Self::from_positions(template, return_layer, &preset.positions())
    }

    /// Reads placements from CSV text with a `layer,x,y` header.
    ///
    /// # Errors
    ///
    /// Returns [`CoilError::Placement`] for malformed rows or unknown layers.
    pub fn from_csv_reader<R: std::io::Read>(
        template: CoilSpec,
        return_layer: Layer,
        source: &Path,
        reader: R,
    ) -> CoilResult<Self> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut placements = Vec::new();
        for (row_number, row) in csv.deserialize::<PlacementRow>().enumerate() {
            let row = row.map_err(|e| {
                CoilError::placement(source, format!("row {}: {e}", row_number + 1))
            })?;
            let layer = Layer::parse(&row.layer).ok_or_else(|| {
                CoilError::placement(
                    source,
                    format!("row {}: unknown copper layer '{}'", row_number + 1, row.layer),
                )
            })?;
            placements.push(Placement {
                layer,
                origin: Point::new(row.x, row.y),
            });
        }

        if placements.is_empty() {
            return Err(CoilError::placement(source, "no placements"));
        }
        debug!(coils = placements.len(), "Read placement file");

        Ok(Self {
            template,
            return_layer,
            placements,
        })
    }

    /// Reads placements from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`CoilError::Placement`] if the file cannot be read or parsed.
    pub fn from_csv_file(template: CoilSpec, return_layer: Layer, path: &Path) -> CoilResult<Self> {
        let file =
            File::open(path).map_err(|e| CoilError::placement(path, format!("cannot open: {e}")))?;
        Self::from_csv_reader(template, return_layer, path, file)
    }

    /// Coil parameters for one placement.
    #[must_use]
    pub fn spec_for(&self, placement: &Placement) -> CoilSpec {
        CoilSpec {
            origin: placement.origin,
            layers: LayerPair::new(placement.layer, self.return_layer),
            ..self.template
        }
    }

    /// Generates every coil in placement order.
    ///
    /// # Errors
    ///
    /// Returns the first generation error; no coils are returned then.
    pub fn build(&self) -> CoilResult<Vec<Coil>> {
        self.placements
            .iter()
            .map(|p| Coil::build(&self.spec_for(p)))
            .collect()
    }
}

/// Writes a complete board with every coil: header once, coils in order,
/// closer last.
///
/// # Errors
///
/// Returns an error if the sink fails.
pub fn write_board<W: Write>(coils: &[Coil], out: W) -> CoilResult<W> {
    let mut writer = KicadWriter::new(out);
    writer.begin()?;
    emit_all(coils, &mut writer)?;
    writer.finish()
}

/// Emits every coil into `sink` without a header or closer.
///
/// # Errors
///
/// Returns an error if the sink fails.
pub fn emit_all<S: BoardSink + ?Sized>(coils: &[Coil], sink: &mut S) -> CoilResult<()> {
    for coil in coils {
        coil.emit(sink, false)?;
    }
    Ok(())
}

/// Builds a plan and writes it to `path`.
///
/// The file is only created after every coil has been generated.
///
/// # Errors
///
/// Returns an error if any coil fails or the file cannot be written.
pub fn run_layout(plan: &LayoutPlan, path: &Path) -> CoilResult<Vec<Coil>> {
    let coils = plan.build()?;

    let file = File::create(path).map_err(|e| CoilError::file_write(path, e))?;
    write_board(&coils, BufWriter::new(file))?;

    info!(
        coils = coils.len(),
        path = %path.display(),
        "Layout written"
    );
    Ok(coils)
}

/// Writes one coil to `path`.
///
/// A full board replaces the file. With `coil_only` the trace elements are
/// added to the board already at `path`, inside its closing parenthesis, so
/// several single-coil runs build up one board. A missing file starts a new
/// board.
///
/// # Errors
///
/// Returns [`CoilError::ExistingBoard`] if the file at `path` is not a closed
/// KiCad board, or an I/O error if it cannot be read or written.
pub fn write_coil_file(coil: &Coil, path: &Path, coil_only: bool) -> CoilResult<()> {
    let existing = if coil_only && path.exists() {
        let text = fs::read_to_string(path).map_err(|e| CoilError::file_write(path, e))?;
        Some(board_body(path, &text)?.to_string())
    } else {
        None
    };

    let mut writer = KicadWriter::new(Vec::new());
    match &existing {
        Some(body) => writer.resume(body)?,
        None => writer.begin()?,
    }
    coil.emit(&mut writer, coil_only)?;
    let bytes = writer.finish()?;
    fs::write(path, bytes).map_err(|e| CoilError::file_write(path, e))?;

    debug!(
        path = %path.display(),
        coil_only,
        appended = existing.is_some(),
        "Coil board written"
    );
    Ok(())
}

/// Board text without its final closing parenthesis.
fn board_body<'a>(path: &Path, text: &'a str) -> CoilResult<&'a str> {
    if !text.trim_start().starts_with("(kicad_pcb") {
        return Err(CoilError::existing_board(path, "not a KiCad board"));
    }
    text.trim_end()
        .strip_suffix(')')
        .ok_or_else(|| CoilError::existing_board(path, "board is not closed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kicad::RecordingSink;

    #[test]
    fn nine_per_layer_counts() {
        let positions = LayoutPreset::NinePerLayer.positions();
        let counts: Vec<usize> = positions.values().map(Vec::len).collect();
        assert_eq!(counts, vec![9, 6, 6, 4, 4]);
        assert_eq!(positions.keys().next(), Some(&Layer::FCu));
    }

    #[test]
    fn preset_parse() {
        assert_eq!(LayoutPreset::parse("four-layer"), Some(LayoutPreset::FourLayer));
        assert_eq!(LayoutPreset::parse("nine-per-layer"), Some(LayoutPreset::NinePerLayer));
        assert_eq!(LayoutPreset::parse("ten"), None);
    }

    #[test]
    fn preset_templates_generate() {
        for preset in [LayoutPreset::FourLayer, LayoutPreset::NinePerLayer] {
            let plan = LayoutPlan::from_preset(preset, preset.template(), Layer::BCu);
            let spec = plan.spec_for(&plan.placements[0]);
            assert!(Coil::build(&spec).is_ok(), "{preset:?}");
        }
    }

    #[test]
    fn csv_rows_keep_order() {
        let text = "layer,x,y\nIn2.Cu, 10, 20\nF.Cu,30,40\nIn2.Cu,50,60\n";
        let plan = LayoutPlan::from_csv_reader(
            CoilSpec::default(),
            Layer::BCu,
            Path::new("inline.csv"),
            text.as_bytes(),
        )
        .unwrap();
        assert_eq!(plan.placements.len(), 3);
        assert_eq!(plan.placements[0].layer, Layer::In2Cu);
        assert_eq!(plan.placements[1].layer, Layer::FCu);
        assert!(plan.placements[2].origin.approx_eq(Point::new(50.0, 60.0), 1e-12));
    }

    #[test]
    fn csv_unknown_layer_is_rejected() {
        let text = "layer,x,y\nTop,1,2\n";
        let err = LayoutPlan::from_csv_reader(
            CoilSpec::default(),
            Layer::BCu,
            Path::new("bad.csv"),
            text.as_bytes(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("bad.csv"));
    }

    #[test]
    fn board_body_strips_only_the_closer() {
        let path = Path::new("board.kicad_pcb");
        let body = board_body(path, "(kicad_pcb\n\t(segment)\n)\n\n").unwrap();
        assert_eq!(body, "(kicad_pcb\n\t(segment)\n");
        assert!(board_body(path, "layer,x,y\n").is_err());
        assert!(board_body(path, "(kicad_pcb\n\t(segment)\n").is_err());
    }

    #[test]
    fn emit_all_writes_every_coil() {
        let template = CoilSpec {
            turns: 3.0,
            ..CoilSpec::default()
        };
        let plan = LayoutPlan::from_preset(LayoutPreset::FourLayer, template, Layer::BCu);
        let coils = plan.build().unwrap();
        let mut sink = RecordingSink::new();
        emit_all(&coils, &mut sink).unwrap();
        assert_eq!(sink.vias().len(), 4);
        assert_eq!(sink.connectors().len(), 4);
        assert_eq!(sink.segments_on(Layer::In3Cu).len(), 12);
    }
}
