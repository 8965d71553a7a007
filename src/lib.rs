//! pcb-coil: planar inductor coil generator for `KiCad` boards
//!
//! This library turns a handful of coil parameters into copper geometry and
//! writes it as `KiCad` PCB text, together with electrical estimates.
//!
//! # Architecture
//!
//! - **Geometry**: circular, helical, orthogonal and regular-polygon spirals,
//!   wound turn by turn with a running bounding box and trace length
//! - **Connector**: a 2.54 mm two-pin header placed on the outer terminal,
//!   a return path on a second layer, and a via at the inner end
//! - **Output**: `KiCad` board records, field-solver point lists and
//!   multi-coil layouts
//! - **Estimates**: DC resistance, Greenhouse inductance, inter-turn
//!   capacitance and self-resonant frequency
//!
//! # Modules
//!
//! - [`coil`] — Coil parameters, geometry generation and connector placement
//! - [`electrical`] — Electrical estimates
//! - [`kicad`] — Board sink and `KiCad` text writer
//! - [`layout`] — Multi-coil board layouts
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Configuration error types

pub mod coil;
pub mod config;
pub mod electrical;
pub mod error;
pub mod kicad;
pub mod layout;
