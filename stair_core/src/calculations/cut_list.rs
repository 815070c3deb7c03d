//! Cut-list formatting
//!
//! Turns placed pieces into the strings a tiler reads on site, e.g.
//! `60×30`, `40×30 (cut)` or `20×30 (from waste: step 1 arm A top)`.
//! The slab solver never builds these strings itself.

use crate::calculations::slabs::{PieceSource, PlacedPiece, SlabPlacement, WastePiece, WasteProvenance};

/// Format a length in cm, dropping the decimals of whole numbers
pub fn fmt_cm(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if (rounded - rounded.round()).abs() < 1e-9 {
        format!("{}", rounded.round() as i64)
    } else {
        format!("{:.1}", rounded)
    }
}

fn provenance_tag(provenance: &WasteProvenance) -> String {
    if provenance.remainder {
        format!("from waste: remaining from {}", provenance.source)
    } else {
        format!("from waste: {}", provenance.source)
    }
}

/// One piece, e.g. `40×30 (cut)`
pub fn format_piece(piece: &PlacedPiece) -> String {
    let dims = format!("{}×{}", fmt_cm(piece.width_cm), fmt_cm(piece.depth_cm));
    match &piece.source {
        PieceSource::FullSlab => dims,
        PieceSource::NewCut => format!("{} (cut)", dims),
        PieceSource::Waste(provenance) => format!("{} ({})", dims, provenance_tag(provenance)),
    }
}

/// Pieces of one surface, with consecutive repeats collapsed to `2× 60×30`
pub fn format_cut_list(pieces: &[PlacedPiece]) -> Vec<String> {
    let mut lines: Vec<(String, usize)> = Vec::new();
    for piece in pieces {
        let text = format_piece(piece);
        match lines.last_mut() {
            Some((last, count)) if *last == text => *count += 1,
            _ => lines.push((text, 1)),
        }
    }
    lines
        .into_iter()
        .map(|(text, count)| if count > 1 { format!("{}× {}", count, text) } else { text })
        .collect()
}

/// One surface on a single line
pub fn format_placement(placement: &SlabPlacement) -> String {
    let pieces = if placement.pieces.is_empty() {
        "nothing to clad".to_string()
    } else {
        format_cut_list(&placement.pieces).join(", ")
    };
    format!(
        "{} ({}×{} cm): {} new, {} cuts - {}",
        placement.surface,
        fmt_cm(placement.width_cm),
        fmt_cm(placement.depth_cm),
        placement.new_slabs,
        placement.cuts,
        pieces
    )
}

/// A leftover offcut, e.g. `#3 20×30 from step 1 arm A top`
pub fn format_waste_piece(piece: &WastePiece) -> String {
    let origin = if piece.remainder { "remaining from" } else { "from" };
    format!(
        "#{} {}×{} {} {}",
        piece.id,
        fmt_cm(piece.width_cm),
        fmt_cm(piece.length_cm),
        origin,
        piece.source
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::geometry::Arm;
    use crate::calculations::slabs::{Surface, SurfaceRef};

    fn source() -> SurfaceRef {
        SurfaceRef {
            step: 0,
            arm: Arm::A,
            surface: Surface::Top,
        }
    }

    fn piece(width_cm: f64, depth_cm: f64, source: PieceSource) -> PlacedPiece {
        PlacedPiece {
            width_cm,
            depth_cm,
            source,
        }
    }

    #[test]
    fn test_fmt_cm() {
        assert_eq!(fmt_cm(60.0), "60");
        assert_eq!(fmt_cm(29.7), "29.7");
        assert_eq!(fmt_cm(12.34), "12.3");
        assert_eq!(fmt_cm(44.999), "45");
    }

    #[test]
    fn test_format_piece_tags() {
        assert_eq!(format_piece(&piece(60.0, 30.0, PieceSource::FullSlab)), "60×30");
        assert_eq!(format_piece(&piece(40.0, 30.0, PieceSource::NewCut)), "40×30 (cut)");

        let reused = PieceSource::Waste(WasteProvenance {
            piece_id: 0,
            source: source(),
            remainder: false,
        });
        assert_eq!(
            format_piece(&piece(20.0, 30.0, reused)),
            "20×30 (from waste: step 1 arm A top)"
        );

        let remainder = PieceSource::Waste(WasteProvenance {
            piece_id: 4,
            source: source(),
            remainder: true,
        });
        assert!(format_piece(&piece(5.0, 30.0, remainder)).contains("remaining from step 1 arm A top"));
    }

    #[test]
    fn test_repeats_collapse() {
        let pieces = [
            piece(60.0, 30.0, PieceSource::FullSlab),
            piece(60.0, 30.0, PieceSource::FullSlab),
            piece(40.0, 30.0, PieceSource::NewCut),
        ];
        assert_eq!(format_cut_list(&pieces), vec!["2× 60×30", "40×30 (cut)"]);
    }

    #[test]
    fn test_format_waste_piece() {
        let w = WastePiece {
            id: 3,
            width_cm: 20.0,
            length_cm: 30.0,
            source: source(),
            remainder: false,
            rotatable: true,
        };
        assert_eq!(format_waste_piece(&w), "#3 20×30 from step 1 arm A top");
    }
}
