//! Board output.
//!
//! Coils are written through the [`BoardSink`] trait so the same geometry
//! can go to a `.kicad_pcb` file ([`KicadWriter`]) or be captured in memory
//! ([`RecordingSink`]).
//!
//! # Board structure
//!
//! A board file is a single s-expression:
//!
//! ```text
//! (kicad_pcb
//!     (version ...) (layers ...) (setup ...) (net 0 "")
//!     (segment ...) (gr_arc ...) (via ...) (footprint ...)
//! )
//! ```
//!
//! [`KicadWriter::begin`] writes everything up to and including the net
//! table, [`KicadWriter::finish`] writes the closing parenthesis. Records in
//! between can come from any number of coils.

pub mod field;
mod writer;

pub use field::{field_lines, write_field_points};
pub use writer::{format_mm, KicadWriter};

use crate::coil::{Arc, ConnectorPad, CoilResult, Layer, Segment, Via};

/// Destination for board records.
pub trait BoardSink {
    /// Writes a straight track.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn segment(&mut self, segment: &Segment, width: f64, layer: Layer) -> CoilResult<()>;

    /// Writes an arc track.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn arc(&mut self, arc: &Arc, width: f64, layer: Layer) -> CoilResult<()>;

    /// Writes a through via.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn via(&mut self, via: &Via) -> CoilResult<()>;

    /// Writes a two-pin header footprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn connector_pad(&mut self, pad: &ConnectorPad) -> CoilResult<()>;
}

/// One record captured by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum BoardRecord {
    /// Straight track.
    Segment {
        /// Geometry.
        segment: Segment,
        /// Track width.
        width: f64,
        /// Copper layer.
        layer: Layer,
    },
    /// Arc track.
    Arc {
        /// Geometry.
        arc: Arc,
        /// Track width.
        width: f64,
        /// Copper layer.
        layer: Layer,
    },
    /// Via.
    Via(Via),
    /// Header footprint.
    Connector(ConnectorPad),
}

/// In-memory sink, mainly for tests and analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSink {
    /// Records in the order they were written.
    pub records: Vec<BoardRecord>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Tracks written on `layer`.
    #[must_use]
    pub fn segments_on(&self, layer: Layer) -> Vec<Segment> {
        self.records
            .iter()
            .filter_map(|r| match r {
                BoardRecord::Segment {
                    segment, layer: l, ..
                } if *l == layer => Some(*segment),
                _ => None,
            })
            .collect()
    }

    /// Vias written so far.
    #[must_use]
    pub fn vias(&self) -> Vec<Via> {
        self.records
            .iter()
            .filter_map(|r| match r {
                BoardRecord::Via(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    /// Connector footprints written so far.
    #[must_use]
    pub fn connectors(&self) -> Vec<ConnectorPad> {
        self.records
            .iter()
            .filter_map(|r| match r {
                BoardRecord::Connector(p) => Some(*p),
                _ => None,
            })
            .collect()
    }
}

impl BoardSink for RecordingSink {
    fn segment(&mut self, segment: &Segment, width: f64, layer: Layer) -> CoilResult<()> {
        self.records.push(BoardRecord::Segment {
            segment: *segment,
            width,
            layer,
        });
        Ok(())
    }

    fn arc(&mut self, arc: &Arc, width: f64, layer: Layer) -> CoilResult<()> {
        self.records.push(BoardRecord::Arc {
            arc: *arc,
            width,
            layer,
        });
        Ok(())
    }

    fn via(&mut self, via: &Via) -> CoilResult<()> {
        self.records.push(BoardRecord::Via(*via));
        Ok(())
    }

    fn connector_pad(&mut self, pad: &ConnectorPad) -> CoilResult<()> {
        self.records.push(BoardRecord::Connector(*pad));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coil::{PadAngle, Point};

    #[test]
    fn recording_sink_filters_by_layer() {
        let mut sink = RecordingSink::new();
        let seg = Segment::new(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        sink.segment(&seg, 0.2, Layer::FCu).unwrap();
        sink.segment(&seg, 0.2, Layer::BCu).unwrap();
        sink.connector_pad(&ConnectorPad {
            origin: Point::new(0.0, 0.0),
            layer: Layer::FCu,
            angle: PadAngle::Vertical,
        })
        .unwrap();

        assert_eq!(sink.segments_on(Layer::FCu).len(), 1);
        assert_eq!(sink.segments_on(Layer::In1Cu).len(), 0);
        assert_eq!(sink.connectors().len(), 1);
        assert!(sink.vias().is_empty());
    }
}
