//! `.kicad_pcb` text writer.

use std::io::Write;

use uuid::Uuid;

use super::BoardSink;
use crate::coil::{Arc, ConnectorPad, CoilResult, Layer, PadAngle, Segment, Via};

/// Namespace for the deterministic footprint and pad identifiers.
const UUID_NAMESPACE: Uuid = Uuid::from_u128(0x8c1f_2a6e_5b3d_4e7a_9f10_c0ce_1de5_1a7b);

/// Footprint library id of the connector.
const HEADER_FOOTPRINT: &str = "Connector_PinHeader_2.54mm:PinHeader_1x02_P2.54mm_Vertical";

/// Board preamble: format version, six copper layers and their stackup.
const BOARD_HEADER: &str = r#"(kicad_pcb
	(version 20240108)
	(generator "pcb-coil")
	(generator_version "8.0")
	(general
		(thickness 1.6)
		(legacy_teardrops no)
	)
	(paper "A5")
	(layers
		(0 "F.Cu" signal)
		(1 "In1.Cu" signal)
		(2 "In2.Cu" signal)
		(3 "In3.Cu" signal)
		(4 "In4.Cu" signal)
		(31 "B.Cu" signal)
		(32 "B.Adhes" user "B.Adhesive")
		(33 "F.Adhes" user "F.Adhesive")
		(34 "B.Paste" user)
		(35 "F.Paste" user)
		(36 "B.SilkS" user "B.Silkscreen")
		(37 "F.SilkS" user "F.Silkscreen")
		(38 "B.Mask" user)
		(39 "F.Mask" user)
		(40 "Dwgs.User" user "User.Drawings")
		(41 "Cmts.User" user "User.Comments")
		(42 "Eco1.User" user "User.Eco1")
		(43 "Eco2.User" user "User.Eco2")
		(44 "Edge.Cuts" user)
		(45 "Margin" user)
		(46 "B.CrtYd" user "B.Courtyard")
		(47 "F.CrtYd" user "F.Courtyard")
		(48 "B.Fab" user)
		(49 "F.Fab" user)
	)
	(setup
		(stackup
			(layer "F.SilkS"
				(type "Top Silk Screen")
			)
			(layer "F.Paste"
				(type "Top Solder Paste")
			)
			(layer "F.Mask"
				(type "Top Solder Mask")
				(thickness 0.01)
			)
			(layer "F.Cu"
				(type "copper")
				(thickness 0.035)
			)
			(layer "dielectric 1"
				(type "prepreg")
				(thickness 0.1)
				(material "FR4")
				(epsilon_r 4.5)
				(loss_tangent 0.02)
			)
			(layer "In1.Cu"
				(type "copper")
				(thickness 0.035)
			)
			(layer "dielectric 2"
				(type "core")
				(thickness 0.535)
				(material "FR4")
				(epsilon_r 4.5)
				(loss_tangent 0.02)
			)
			(layer "In2.Cu"
				(type "copper")
				(thickness 0.035)
			)
			(layer "dielectric 3"
				(type "prepreg")
				(thickness 0.1)
				(material "FR4")
				(epsilon_r 4.5)
				(loss_tangent 0.02)
			)
			(layer "In3.Cu"
				(type "copper")
				(thickness 0.035)
			)
			(layer "dielectric 4"
				(type "core")
				(thickness 0.535)
				(material "FR4")
				(epsilon_r 4.5)
				(loss_tangent 0.02)
			)
			(layer "In4.Cu"
				(type "copper")
				(thickness 0.035)
			)
			(layer "dielectric 5"
				(type "prepreg")
				(thickness 0.1)
				(material "FR4")
				(epsilon_r 4.5)
				(loss_tangent 0.02)
			)
			(layer "B.Cu"
				(type "copper")
				(thickness 0.035)
			)
			(layer "B.Mask"
				(type "Bottom Solder Mask")
				(thickness 0.01)
			)
			(layer "B.Paste"
				(type "Bottom Solder Paste")
			)
			(layer "B.SilkS"
				(type "Bottom Silk Screen")
			)
			(copper_finish "None")
			(dielectric_constraints no)
		)
		(pad_to_mask_clearance 0)
		(allow_soldermask_bridges_in_footprints no)
	)
	(net 0 "")
"#;

/// Formats a length in mm with three decimals, never as `-0.000`.
#[must_use]
pub fn format_mm(value: f64) -> String {
    let s = format!("{value:.3}");
    if s == "-0.000" {
        "0.000".to_string()
    } else {
        s
    }
}

/// Writes coils as KiCad board text.
///
/// ```
/// use pcb_coil::coil::{Coil, CoilSpec};
/// use pcb_coil::kicad::KicadWriter;
///
/// let coil = Coil::build(&CoilSpec::default()).unwrap();
/// let mut writer = KicadWriter::new(Vec::new());
/// writer.begin().unwrap();
/// coil.emit(&mut writer, false).unwrap();
/// let text = String::from_utf8(writer.finish().unwrap()).unwrap();
/// assert!(text.starts_with("(kicad_pcb"));
/// ```
#[derive(Debug)]
pub struct KicadWriter<W: Write> {
    out: W,
    footprints: usize,
}

impl<W: Write> KicadWriter<W> {
    /// Wraps an output stream.
    pub const fn new(out: W) -> Self {
        Self { out, footprints: 0 }
    }

    /// Writes the board header.
    ///
    /// Skip this when appending coils to a board that already has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn begin(&mut self) -> CoilResult<()> {
        self.out.write_all(BOARD_HEADER.as_bytes())?;
        Ok(())
    }

    /// Writes the body of an existing board in place of the header.
    ///
    /// `body` is the board text up to, but not including, its final closing
    /// parenthesis. Coils emitted afterwards land inside that board.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn resume(&mut self, body: &str) -> CoilResult<()> {
        self.out.write_all(body.as_bytes())?;
        Ok(())
    }

    /// Writes the closing parenthesis, flushes and returns the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn finish(mut self) -> CoilResult<W> {
        writeln!(self.out, ")")?;
        self.out.flush()?;
        Ok(self.out)
    }

    /// Flushes and returns the stream without closing the board.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be flushed.
    pub fn into_inner(mut self) -> CoilResult<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn next_uuid(&mut self, kind: &str, x: f64, y: f64) -> Uuid {
        let name = format!(
            "{kind}:{}:{}:{}",
            self.footprints,
            format_mm(x),
            format_mm(y)
        );
        Uuid::new_v5(&UUID_NAMESPACE, name.as_bytes())
    }
}

impl<W: Write> BoardSink for KicadWriter<W> {
    fn segment(&mut self, segment: &Segment, width: f64, layer: Layer) -> CoilResult<()> {
        write!(
            self.out,
            "\t(segment\n\
             \t\t(start {} {})\n\
             \t\t(end {} {})\n\
             \t\t(width {})\n\
             \t\t(layer \"{}\")\n\
             \t\t(net 0)\n\
             \t)\n",
            format_mm(segment.start.x),
            format_mm(segment.start.y),
            format_mm(segment.end.x),
            format_mm(segment.end.y),
            format_mm(width),
            layer.as_str(),
        )?;
        Ok(())
    }

    fn arc(&mut self, arc: &Arc, width: f64, layer: Layer) -> CoilResult<()> {
        write!(
            self.out,
            "\t(gr_arc\n\
             \t\t(start {} {})\n\
             \t\t(mid {} {})\n\
             \t\t(end {} {})\n\
             \t\t(stroke\n\
             \t\t\t(width {})\n\
             \t\t\t(type default)\n\
             \t\t)\n\
             \t\t(layer \"{}\")\n\
             \t)\n",
            format_mm(arc.start.x),
            format_mm(arc.start.y),
            format_mm(arc.mid.x),
            format_mm(arc.mid.y),
            format_mm(arc.end.x),
            format_mm(arc.end.y),
            format_mm(width),
            layer.as_str(),
        )?;
        Ok(())
    }

    fn via(&mut self, via: &Via) -> CoilResult<()> {
        write!(
            self.out,
            "\t(via\n\
             \t\t(at {} {})\n\
             \t\t(size {})\n\
             \t\t(drill {})\n\
             \t\t(layers \"{}\" \"{}\")\n\
             \t\t(net 0)\n\
             \t)\n",
            format_mm(via.at.x),
            format_mm(via.at.y),
            format_mm(via.size),
            format_mm(via.drill),
            via.from_layer.as_str(),
            via.to_layer.as_str(),
        )?;
        Ok(())
    }

    fn connector_pad(&mut self, pad: &ConnectorPad) -> CoilResult<()> {
        let (x, y) = (pad.origin.x, pad.origin.y);
        let footprint = self.next_uuid("footprint", x, y);
        let pin1 = self.next_uuid("pad1", x, y);
        let pin2 = self.next_uuid("pad2", x, y);
        self.footprints += 1;

        let rotation = match pad.angle {
            PadAngle::Vertical => String::new(),
            PadAngle::Horizontal => format!(" -{}", pad.angle.degrees()),
        };

        write!(
            self.out,
            "\t(footprint \"{HEADER_FOOTPRINT}\"\n\
             \t\t(layer \"{layer}\")\n\
             \t\t(uuid \"{footprint}\")\n\
             \t\t(at {x} {y}{rotation})\n\
             \t\t(descr \"Through hole straight pin header, 1x02, 2.54mm pitch, single row\")\n\
             \t\t(tags \"Through hole pin header THT 1x02 2.54mm single row\")\n\
             \t\t(property \"Reference\" \"REF**\"\n\
             \t\t\t(at 2.54 -2.54{rotation})\n\
             \t\t\t(layer \"F.SilkS\")\n\
             \t\t\t(effects\n\
             \t\t\t\t(font\n\
             \t\t\t\t\t(size 1 1)\n\
             \t\t\t\t\t(thickness 0.15)\n\
             \t\t\t\t)\n\
             \t\t\t)\n\
             \t\t)\n\
             \t\t(property \"Value\" \"PinHeader_1x02_P2.54mm_Vertical\"\n\
             \t\t\t(at 0 4.87{rotation})\n\
             \t\t\t(layer \"F.Fab\")\n\
             \t\t\t(hide yes)\n\
             \t\t\t(effects\n\
             \t\t\t\t(font\n\
             \t\t\t\t\t(size 1 1)\n\
             \t\t\t\t\t(thickness 0.15)\n\
             \t\t\t\t)\n\
             \t\t\t)\n\
             \t\t)\n\
             \t\t(attr through_hole)\n\
             \t\t(fp_line\n\
             \t\t\t(start -1.8 -1.8)\n\
             \t\t\t(end 1.8 -1.8)\n\
             \t\t\t(stroke\n\
             \t\t\t\t(width 0.05)\n\
             \t\t\t\t(type solid)\n\
             \t\t\t)\n\
             \t\t\t(layer \"F.CrtYd\")\n\
             \t\t)\n\
             \t\t(fp_line\n\
             \t\t\t(start 1.8 -1.8)\n\
             \t\t\t(end 1.8 4.35)\n\
             \t\t\t(stroke\n\
             \t\t\t\t(width 0.05)\n\
             \t\t\t\t(type solid)\n\
             \t\t\t)\n\
             \t\t\t(layer \"F.CrtYd\")\n\
             \t\t)\n\
             \t\t(fp_line\n\
             \t\t\t(start 1.8 4.35)\n\
             \t\t\t(end -1.8 4.35)\n\
             \t\t\t(stroke\n\
             \t\t\t\t(width 0.05)\n\
             \t\t\t\t(type solid)\n\
             \t\t\t)\n\
             \t\t\t(layer \"F.CrtYd\")\n\
             \t\t)\n\
             \t\t(fp_line\n\
             \t\t\t(start -1.8 4.35)\n\
             \t\t\t(end -1.8 -1.8)\n\
             \t\t\t(stroke\n\
             \t\t\t\t(width 0.05)\n\
             \t\t\t\t(type solid)\n\
             \t\t\t)\n\
             \t\t\t(layer \"F.CrtYd\")\n\
             \t\t)\n\
             \t\t(pad \"1\" thru_hole rect\n\
             \t\t\t(at 0 0 270)\n\
             \t\t\t(size 1.7 1.7)\n\
             \t\t\t(drill 1)\n\
             \t\t\t(layers \"*.Cu\" \"*.Mask\")\n\
             \t\t\t(remove_unused_layers no)\n\
             \t\t\t(uuid \"{pin1}\")\n\
             \t\t)\n\
             \t\t(pad \"2\" thru_hole oval\n\
             \t\t\t(at 0 2.54 270)\n\
             \t\t\t(size 1.7 1.7)\n\
             \t\t\t(drill 1)\n\
             \t\t\t(layers \"*.Cu\" \"*.Mask\")\n\
             \t\t\t(remove_unused_layers no)\n\
             \t\t\t(uuid \"{pin2}\")\n\
             \t\t)\n\
             \t\t(model \"${{KICAD8_3DMODEL_DIR}}/Connector_PinHeader_2.54mm.3dshapes/PinHeader_1x02_P2.54mm_Vertical.wrl\"\n\
             \t\t\t(offset\n\
             \t\t\t\t(xyz 0 0 0)\n\
             \t\t\t)\n\
             \t\t\t(scale\n\
             \t\t\t\t(xyz 1 1 1)\n\
             \t\t\t)\n\
             \t\t\t(rotate\n\
             \t\t\t\t(xyz 0 0 0)\n\
             \t\t\t)\n\
             \t\t)\n\
             \t)\n",
            layer = pad.layer.as_str(),
            x = format_mm(x),
            y = format_mm(y),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coil::Point;

    fn render(f: impl FnOnce(&mut KicadWriter<Vec<u8>>)) -> String {
        let mut writer = KicadWriter::new(Vec::new());
        f(&mut writer);
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn format_mm_uses_three_decimals() {
        assert_eq!(format_mm(1.23456), "1.235");
        assert_eq!(format_mm(-0.0001), "0.000");
        assert_eq!(format_mm(100.0), "100.000");
    }

    #[test]
    fn segment_record() {
        let text = render(|w| {
            w.segment(
                &Segment::new(Point::new(1.0, 2.0), Point::new(3.5, 2.0)),
                1.27,
                Layer::In2Cu,
            )
            .unwrap();
        });
        assert!(text.contains("(start 1.000 2.000)"));
        assert!(text.contains("(end 3.500 2.000)"));
        assert!(text.contains("(width 1.270)"));
        assert!(text.contains("(layer \"In2.Cu\")"));
        assert!(text.contains("(net 0)"));
    }

    #[test]
    fn arc_record_has_mid_point() {
        let text = render(|w| {
            w.arc(
                &Arc::new(Point::new(-1.0, 0.0), Point::new(0.0, -1.0), Point::new(1.0, 0.0)),
                0.5,
                Layer::FCu,
            )
            .unwrap();
        });
        assert!(text.starts_with("\t(gr_arc"));
        assert!(text.contains("(mid 0.000 -1.000)"));
        assert!(text.contains("(type default)"));
    }

    #[test]
    fn via_record_lists_both_layers() {
        let text = render(|w| {
            w.via(&Via {
                at: Point::new(5.0, 5.0),
                size: 1.27,
                drill: 0.5,
                from_layer: Layer::In3Cu,
                to_layer: Layer::BCu,
            })
            .unwrap();
        });
        assert!(text.contains("(layers \"In3.Cu\" \"B.Cu\")"));
        assert!(text.contains("(drill 0.500)"));
    }

    #[test]
    fn horizontal_connector_is_rotated() {
        let pad = ConnectorPad {
            origin: Point::new(10.0, 20.0),
            layer: Layer::FCu,
            angle: PadAngle::Horizontal,
        };
        let text = render(|w| w.connector_pad(&pad).unwrap());
        assert!(text.contains("(at 10.000 20.000 -90)"));
        assert!(text.contains("(pad \"1\" thru_hole rect"));
        assert!(text.contains("(pad \"2\" thru_hole oval"));
        assert!(text.contains("${KICAD8_3DMODEL_DIR}"));
    }

    #[test]
    fn connector_uuids_are_deterministic_and_unique() {
        let pad = ConnectorPad {
            origin: Point::new(10.0, 20.0),
            layer: Layer::FCu,
            angle: PadAngle::Vertical,
        };
        let twice = || {
            render(|w| {
                w.connector_pad(&pad).unwrap();
                w.connector_pad(&pad).unwrap();
            })
        };
        let a = twice();
        let b = twice();
        assert_eq!(a, b);

        let uuids: Vec<&str> = a
            .lines()
            .filter_map(|l| l.trim().strip_prefix("(uuid \""))
            .collect();
        assert_eq!(uuids.len(), 6);
        let mut unique = uuids.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn begin_and_finish_wrap_board() {
        let mut writer = KicadWriter::new(Vec::new());
        writer.begin().unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(text.starts_with("(kicad_pcb"));
        assert!(text.contains("(31 \"B.Cu\" signal)"));
        assert!(text.trim_end().ends_with(')'));
        assert_eq!(text.matches('(').count(), text.matches(')').count());
    }
}
