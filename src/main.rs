//! pcb-coil: planar inductor coil generator for `KiCad` boards
//!
//! Generates spiral and polygon coils as `KiCad` PCB text and prints their
//! electrical estimates.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use pcb_coil::coil::{naming, Coil, CoilError, CoilResult, CoilSpec, Layer};
use pcb_coil::config::{self, CoilConfig, Config, ShapeKind};
use pcb_coil::electrical::ElectricalReport;
use pcb_coil::kicad::write_field_points;
use pcb_coil::layout::{self, LayoutPlan, LayoutPreset};

/// Planar inductor coil generator for `KiCad` boards.
///
/// Writes circular, helical, orthogonal and polygon coils with a connector,
/// return path and via, and prints resistance, inductance, capacitance and
/// self-resonance estimates.
#[derive(Parser, Debug)]
#[command(name = "pcb-coil")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG_FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a single coil board
    Generate(GenerateArgs),
    /// Place several coils on one board
    Layout(LayoutArgs),
}

/// Coil parameters; anything left unset comes from the configuration file.
#[derive(clap::Args, Debug, Default)]
struct CoilOverrides {
    /// Turn shape (circular, helical, orthogonal, polygon)
    #[arg(long, value_parser = parse_shape)]
    shape: Option<ShapeKind>,

    /// Polygon vertex count
    #[arg(long)]
    vertices: Option<u32>,

    /// Number of turns; fractions are allowed
    #[arg(short = 'n', long)]
    turns: Option<f64>,

    /// Outer diameter in mm
    #[arg(short = 'd', long)]
    outer_diameter: Option<f64>,

    /// Track width in mm
    #[arg(short = 'w', long)]
    track_width: Option<f64>,

    /// Gap between turns in mm
    #[arg(short = 'g', long)]
    track_gap: Option<f64>,

    /// Helical segment length in mm
    #[arg(long)]
    segment_length: Option<f64>,

    /// Via drill diameter in mm
    #[arg(long)]
    via_drill: Option<f64>,

    /// Via pad diameter in mm
    #[arg(long)]
    via_size: Option<f64>,

    /// Route the return path diagonally instead of as an L
    #[arg(long)]
    diagonal: bool,

    /// Wind circular coils counter-clockwise
    #[arg(long)]
    counter_clockwise: bool,

    /// Coil origin X in mm
    #[arg(long, allow_hyphen_values = true)]
    origin_x: Option<f64>,

    /// Coil origin Y in mm
    #[arg(long, allow_hyphen_values = true)]
    origin_y: Option<f64>,

    /// Layer carrying the spiral
    #[arg(long, value_parser = parse_layer)]
    trace_layer: Option<Layer>,

    /// Layer carrying the return path
    #[arg(long, value_parser = parse_layer)]
    return_layer: Option<Layer>,

    /// Layer carrying the connector footprint
    #[arg(long, value_parser = parse_layer)]
    connector_layer: Option<Layer>,
}

impl CoilOverrides {
    fn apply(&self, base: &CoilConfig) -> CoilConfig {
        let mut cfg = base.clone();
        if let Some(v) = self.shape {
            cfg.shape = v;
        }
        if let Some(v) = self.vertices {
            cfg.vertices = v;
        }
        if let Some(v) = self.turns {
            cfg.turns = v;
        }
        if let Some(v) = self.outer_diameter {
            cfg.outer_diameter = v;
        }
        if let Some(v) = self.track_width {
            cfg.track_width = v;
        }
        if let Some(v) = self.track_gap {
            cfg.track_gap = v;
        }
        if let Some(v) = self.segment_length {
            cfg.segment_length = v;
        }
        if let Some(v) = self.via_drill {
            cfg.via_drill = v;
        }
        if self.via_size.is_some() {
            cfg.via_size = self.via_size;
        }
        if self.diagonal {
            cfg.straight = false;
        }
        if self.counter_clockwise {
            cfg.clockwise = false;
        }
        if let Some(v) = self.origin_x {
            cfg.origin.x = v;
        }
        if let Some(v) = self.origin_y {
            cfg.origin.y = v;
        }
        if let Some(v) = self.trace_layer {
            cfg.trace_layer = v;
        }
        if let Some(v) = self.return_layer {
            cfg.return_layer = v;
        }
        if let Some(v) = self.connector_layer {
            cfg.connector_layer = v;
        }
        cfg
    }
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    coil: CoilOverrides,

    /// Directory for the board file
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Add only the trace to the existing board file, without connector or via
    #[arg(long)]
    coil_only: bool,

    /// Also write field-solver points to this file
    #[arg(long, value_name = "FILE")]
    field: Option<PathBuf>,

    /// Print the electrical report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct LayoutArgs {
    #[command(flatten)]
    coil: CoilOverrides,

    /// Built-in placement preset with its own coil template (four-layer, nine-per-layer)
    #[arg(long, value_parser = parse_preset, conflicts_with = "placements")]
    preset: Option<LayoutPreset>,

    /// CSV file with `layer,x,y` rows
    #[arg(long, value_name = "CSV", required_unless_present = "preset")]
    placements: Option<PathBuf>,

    /// Board file to write
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,
}

fn parse_shape(s: &str) -> Result<ShapeKind, String> {
    ShapeKind::parse(s).ok_or_else(|| format!("unknown shape '{s}'"))
}

fn parse_layer(s: &str) -> Result<Layer, String> {
    Layer::parse(s).ok_or_else(|| format!("unknown copper layer '{s}'"))
}

fn parse_preset(s: &str) -> Result<LayoutPreset, String> {
    LayoutPreset::parse(s).ok_or_else(|| format!("unknown layout preset '{s}'"))
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &ElectricalReport, json: bool) -> CoilResult<()> {
    if json {
        let text = serde_json::to_string_pretty(report)
            .map_err(|e| CoilError::configuration("report", e.to_string()))?;
        println!("{text}");
        return Ok(());
    }

    println!("shape:              {}", report.shape);
    println!("turns:              {}", naming::format_turns(report.turns));
    println!("outer diameter:     {:.3} mm", report.outer_diameter_mm);
    println!("inner diameter:     {:.3} mm", report.inner_diameter_mm);
    println!("trace length:       {:.3} mm", report.trace_length_mm);
    println!("resistance (1 oz):  {:.4} ohm", report.resistance_1oz_ohm);
    println!("resistance (2 oz):  {:.4} ohm", report.resistance_2oz_ohm);
    println!("capacitance:        {:.4} pF", report.capacitance_f * 1e12);
    println!("inductance:         {:.4} uH", report.inductance_h * 1e6);
    match report.self_resonance_hz {
        Some(f) => println!("self resonance:     {:.4} MHz", f / 1e6),
        None => println!("self resonance:     n/a"),
    }
    Ok(())
}

fn run_generate(args: &GenerateArgs, cfg: &Config) -> CoilResult<()> {
    let spec: CoilSpec = args.coil.apply(&cfg.coil).to_spec();
    let coil = Coil::build(&spec)?;
    let report = ElectricalReport::for_coil(&coil)?;

    let dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| cfg.output.directory.clone());
    fs::create_dir_all(&dir).map_err(|e| CoilError::file_write(&dir, e))?;
    let path = dir.join(naming::board_file_name(&spec));
    layout::write_coil_file(&coil, &path, args.coil_only)?;
    info!(path = %path.display(), coil_only = args.coil_only, "Board written");

    if let Some(field_path) = &args.field {
        let file = File::create(field_path).map_err(|e| CoilError::file_write(field_path, e))?;
        let mut out = BufWriter::new(file);
        write_field_points(&coil, cfg.output.field_segment_length, &mut out)?;
        info!(path = %field_path.display(), "Field points written");
    }

    print_report(&report, args.json)
}

fn run_layout(args: &LayoutArgs, cfg: &Config) -> CoilResult<()> {
    let coil_cfg = args.coil.apply(&cfg.coil);
    let plan = match (&args.preset, &args.placements) {
        (Some(preset), _) => {
            LayoutPlan::from_preset(*preset, preset.template(), coil_cfg.return_layer)
        }
        (None, Some(csv)) => {
            LayoutPlan::from_csv_file(coil_cfg.to_spec(), coil_cfg.return_layer, csv)?
        }
        (None, None) => {
            return Err(CoilError::configuration(
                "layout",
                "either --preset or --placements is required",
            ))
        }
    };

    let coils = layout::run_layout(&plan, &args.output)?;
    println!("{} coils written to {}", coils.len(), args.output.display());
    Ok(())
}

/// Entry point for pcb-coil.
fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = std::error::Error::source(cause);
            }
            if let Some(default_path) = config::default_config_path() {
                eprintln!("\nDefault config location: {}", default_path.display());
                eprintln!("Create one based on config/example-config.json");
            }
            return ExitCode::FAILURE;
        }
    };

    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting pcb-coil");

    let result = match &args.command {
        Command::Generate(generate) => run_generate(generate, &cfg),
        Command::Layout(layout_args) => run_layout(layout_args, &cfg),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Generation failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn log_level_from_flags() {
        assert_eq!(get_log_level(0, true, "trace"), Level::ERROR);
        assert_eq!(get_log_level(2, false, "warn"), Level::DEBUG);
        assert_eq!(get_log_level(0, false, "info"), Level::INFO);
        assert_eq!(get_log_level(0, false, "nonsense"), Level::WARN);
    }

    #[test]
    fn overrides_replace_config_values() {
        let args = Args::parse_from([
            "pcb-coil",
            "generate",
            "--shape",
            "circular",
            "-n",
            "4.5",
            "--diagonal",
            "--trace-layer",
            "In1.Cu",
        ]);
        let Command::Generate(generate) = args.command else {
            panic!("expected generate");
        };
        let cfg = generate.coil.apply(&CoilConfig::default());
        assert_eq!(cfg.shape, ShapeKind::Circular);
        assert!((cfg.turns - 4.5).abs() < f64::EPSILON);
        assert!(!cfg.straight);
        assert_eq!(cfg.trace_layer, Layer::In1Cu);
        assert!((cfg.track_width - 1.27).abs() < f64::EPSILON);
    }

    #[test]
    fn layout_requires_placements() {
        let result = Args::try_parse_from(["pcb-coil", "layout", "--output", "x.kicad_pcb"]);
        assert!(result.is_err());
    }
}
