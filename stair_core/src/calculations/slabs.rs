//! # Slab Tiling and Cutting
//!
//! Clads every step with finish slabs: a top (tread) and a front (riser)
//! surface on each arm, processed per step in the order top A, top B,
//! front A, front B.
//!
//! ## Surfaces
//!
//! - **Top** depth is the tread. **Front** depth is the rise over the step
//!   below; with [`FrontLayout::FrontsOnTop`] every front above the first
//!   also loses the top slab thickness.
//! - With a butt joint the dominant arm spans its full external length and
//!   the other arm stops short by the dominant slab's thickness plus the gap
//!   (tread depth on tops, front slab thickness on fronts). A mitre joint runs
//!   both arms full length and adds one mitre cut per surface.
//!
//! ## Tiling
//!
//! The slab's long side is the pitch along the surface width and the short
//! side spans the depth in rows. A row that is not an exact multiple of the
//! pitch (within 0.1 cm) is closed with one remainder piece
//! ([`CutPolicy::OneCut`]) or two equal edge pieces ([`CutPolicy::TwoCuts`]).
//!
//! Each piece is first taken from the waste pool: the smallest-area offcut
//! that covers it, rotated if allowed. The offcut is split guillotine style
//! and both remainders go back into the pool. Only when nothing fits is a new
//! slab cut, leaving a width-direction and a length-direction offcut.
//!
//! Fronts first check for top offcuts left on the same step and arm. Any
//! such offcut covers the whole front, and all of them are taken.
//!
//! ## Conservation
//!
//! The [`WasteLedger`] tracks every cm² bought. At any point
//! `purchased = used + pooled + discarded`, where discarded is scrap under
//! 1 cm on a side.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calculations::geometry::{Arm, StepGeometry};
use crate::errors::{CalcError, CalcResult};
use crate::materials::{SlabSize, SlabType, ADHESIVE_KG_PER_M2};
use crate::units::{SquareCentimeters, SquareMeters};

/// Tolerance for treating a dimension as matching exactly (cm)
pub const EXACT_FIT_TOLERANCE_CM: f64 = 0.1;

/// Smallest side an offcut needs to be kept (cm)
pub const MIN_WASTE_SIDE_CM: f64 = 1.0;

/// Cut lengths are counted against the nearest of these sizes (cm)
pub const CUT_BUCKETS_CM: [u32; 4] = [30, 60, 90, 120];

/// Which way the inside corner of the L is finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CornerJoint {
    /// Dominant arm runs through, the other butts against it
    #[default]
    Butt,
    /// Both arms meet on a 45° cut
    Mitre,
}

/// How a row that does not divide into whole slabs is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CutPolicy {
    /// Full slabs plus one remainder piece at the end
    #[default]
    OneCut,
    /// Two equal edge pieces flanking the full slabs
    TwoCuts,
}

/// How fronts meet the tops above them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FrontLayout {
    /// Tops overhang the fronts, fronts run the full rise
    #[default]
    TopsOverFronts,
    /// Fronts stand on the top slab of the step below
    FrontsOnTop,
}

/// Tread or riser face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Top,
    Front,
}

impl std::fmt::Display for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Surface::Top => write!(f, "top"),
            Surface::Front => write!(f, "front"),
        }
    }
}

/// Caller choices for the slab pass.
///
/// ## JSON Example
///
/// ```json
/// {
///   "slab_size": "60x30",
///   "slab_type": "porcelain",
///   "gap_cm": 0.3,
///   "cut_policy": "one_cut",
///   "corner_joint": "butt",
///   "top_dominant_arm": "A",
///   "front_dominant_arm": "A",
///   "front_layout": "tops_over_fronts",
///   "rotate_offcuts": true
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlabOptions {
    pub slab_size: SlabSize,
    pub slab_type: SlabType,
    /// Joint between slabs (fuga) in cm
    pub gap_cm: f64,
    pub cut_policy: CutPolicy,
    pub corner_joint: CornerJoint,
    /// Arm whose top slab covers the corner
    pub top_dominant_arm: Arm,
    /// Arm whose front slab covers the corner
    pub front_dominant_arm: Arm,
    pub front_layout: FrontLayout,
    /// Whether offcuts may be turned 90° when reused
    pub rotate_offcuts: bool,
}

impl Default for SlabOptions {
    fn default() -> Self {
        Self {
            slab_size: SlabSize::default(),
            slab_type: SlabType::default(),
            gap_cm: 0.0,
            cut_policy: CutPolicy::default(),
            corner_joint: CornerJoint::default(),
            top_dominant_arm: Arm::A,
            front_dominant_arm: Arm::A,
            front_layout: FrontLayout::default(),
            rotate_offcuts: true,
        }
    }
}

impl SlabOptions {
    pub fn validate(&self) -> CalcResult<()> {
        if !self.gap_cm.is_finite() || self.gap_cm < 0.0 {
            return Err(CalcError::invalid_input(
                "gap_cm",
                self.gap_cm.to_string(),
                "Gap must be zero or positive",
            ));
        }
        let (_, short) = self.slab_size.dimensions_cm();
        if self.gap_cm >= short {
            return Err(CalcError::invalid_input(
                "gap_cm",
                self.gap_cm.to_string(),
                format!("Gap must be smaller than the slab ({} cm)", short),
            ));
        }
        Ok(())
    }
}

/// Identifies one clad surface: step, arm and face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceRef {
    /// Zero-based step index
    pub step: usize,
    pub arm: Arm,
    pub surface: Surface,
}

impl std::fmt::Display for SurfaceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {} arm {} {}", self.step + 1, self.arm, self.surface)
    }
}

/// An offcut in the waste pool. Never changed once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WastePiece {
    /// Creation order within one pass
    pub id: u32,
    /// Side that ran along the arm when cut (cm)
    pub width_cm: f64,
    /// Other side (cm)
    pub length_cm: f64,
    /// Surface whose cutting produced the first offcut of this lineage
    pub source: SurfaceRef,
    /// True when this is what was left of an earlier offcut
    pub remainder: bool,
    pub rotatable: bool,
}

impl WastePiece {
    pub fn area_cm2(&self) -> f64 {
        self.width_cm * self.length_cm
    }

    /// Oriented (along width, along depth) if this piece covers a
    /// `width x depth` piece
    fn orientation_for(&self, width_cm: f64, depth_cm: f64) -> Option<(f64, f64)> {
        if self.width_cm <= MIN_WASTE_SIDE_CM || self.length_cm <= MIN_WASTE_SIDE_CM {
            return None;
        }
        if self.width_cm >= width_cm && self.length_cm >= depth_cm {
            Some((self.width_cm, self.length_cm))
        } else if self.rotatable && self.length_cm >= width_cm && self.width_cm >= depth_cm {
            Some((self.length_cm, self.width_cm))
        } else {
            None
        }
    }
}

/// Where a reused piece came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WasteProvenance {
    pub piece_id: u32,
    pub source: SurfaceRef,
    pub remainder: bool,
}

/// How a placed piece was obtained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PieceSource {
    /// A whole slab, laid uncut
    FullSlab,
    /// Cut from a new slab
    NewCut,
    /// Taken from the waste pool
    Waste(WasteProvenance),
}

/// One piece laid on a surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedPiece {
    pub width_cm: f64,
    pub depth_cm: f64,
    pub source: PieceSource,
}

/// A rectangular surface to clad
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSpec {
    pub surface: SurfaceRef,
    /// Span along the arm (cm)
    pub width_cm: f64,
    /// Tread depth or riser height (cm)
    pub depth_cm: f64,
    /// Whether the corner end needs a mitre cut
    pub mitre: bool,
}

/// Result of cladding one surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabPlacement {
    pub surface: SurfaceRef,
    pub width_cm: f64,
    pub depth_cm: f64,
    /// Slabs bought for this surface
    pub new_slabs: u32,
    /// Cut operations on this surface
    pub cuts: u32,
    /// Surface area (cm²)
    pub area_cm2: f64,
    /// Pieces in laying order
    pub pieces: Vec<PlacedPiece>,
    /// True when the whole surface came out of the waste pool
    pub covered_from_waste: bool,
    /// Cuts over this and all earlier surfaces
    pub running_cuts: u32,
    /// Area over this and all earlier surfaces (cm²)
    pub running_area_cm2: f64,
}

/// Area bookkeeping for one pass (cm²)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WasteLedger {
    /// Area of every new slab
    pub purchased_cm2: f64,
    /// Area laid on surfaces, including offcuts taken whole by fronts
    pub used_cm2: f64,
    /// Area still in the waste pool
    pub pooled_cm2: f64,
    /// Scrap too small to keep
    pub discarded_cm2: f64,
}

impl WasteLedger {
    /// `purchased - (used + pooled + discarded)`, zero when balanced
    pub fn imbalance_cm2(&self) -> f64 {
        self.purchased_cm2 - (self.used_cm2 + self.pooled_cm2 + self.discarded_cm2)
    }
}

/// Count of laid pieces of one size, sides rounded to the cm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationBucket {
    pub long_cm: u32,
    pub short_cm: u32,
    pub count: u32,
}

/// Output of the slab pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabResult {
    pub placements: Vec<SlabPlacement>,
    pub new_top_slabs: u32,
    pub new_front_slabs: u32,
    pub total_new_slabs: u32,
    pub total_cuts: u32,
    pub top_area_m2: f64,
    pub front_area_m2: f64,
    pub adhesive_kg: f64,
    /// Cut bucket (cm) to number of cuts
    pub cut_histogram: BTreeMap<u32, u32>,
    /// Laid pieces grouped by rounded size
    pub installation_histogram: Vec<InstallationBucket>,
    /// Offcuts left over at the end of the pass
    pub waste: Vec<WastePiece>,
    pub ledger: WasteLedger,
}

/// Nearest cut bucket; ties go to the smaller size
pub fn cut_bucket(length_cm: f64) -> u32 {
    CUT_BUCKETS_CM
        .iter()
        .copied()
        .min_by(|a, b| {
            let da = (*a as f64 - length_cm).abs();
            let db = (*b as f64 - length_cm).abs();
            da.total_cmp(&db).then(a.cmp(b))
        })
        .unwrap_or(CUT_BUCKETS_CM[0])
}

/// Row depths across a surface
fn row_depths(depth_cm: f64, short_cm: f64, gap_cm: f64) -> Vec<f64> {
    let mut rows = Vec::new();
    let mut remaining = depth_cm;
    while remaining > EXACT_FIT_TOLERANCE_CM {
        let row = remaining.min(short_cm);
        rows.push(row);
        remaining -= row + gap_cm;
    }
    rows
}

/// Piece widths along one row
fn row_widths(width_cm: f64, pitch_cm: f64, gap_cm: f64, policy: CutPolicy) -> Vec<f64> {
    let whole = ((width_cm + gap_cm) / (pitch_cm + gap_cm)).round();
    if whole >= 1.0 && (whole * pitch_cm + (whole - 1.0) * gap_cm - width_cm).abs() <= EXACT_FIT_TOLERANCE_CM {
        return vec![pitch_cm; whole as usize];
    }

    let slots = ((width_cm + gap_cm) / (pitch_cm + gap_cm)).ceil().max(1.0) as usize;
    let mut full = slots - 1;
    match policy {
        CutPolicy::OneCut => {
            let remainder = width_cm - full as f64 * (pitch_cm + gap_cm);
            let mut widths = vec![pitch_cm; full];
            // a sliver under the tolerance is taken up by the joints
            if remainder > EXACT_FIT_TOLERANCE_CM || full == 0 {
                widths.push(remainder);
            }
            widths
        }
        CutPolicy::TwoCuts => {
            if full == 0 {
                return vec![width_cm];
            }
            let edge_for = |full: usize| (width_cm - full as f64 * pitch_cm - (full + 1) as f64 * gap_cm) / 2.0;
            let mut edge = edge_for(full);
            if edge < pitch_cm / 2.0 {
                full -= 1;
                edge = edge_for(full);
            }
            let mut widths = Vec::with_capacity(full + 2);
            widths.push(edge);
            widths.extend(std::iter::repeat(pitch_cm).take(full));
            widths.push(edge);
            widths
        }
    }
}

/// The four surfaces of every step, in processing order.
pub fn surface_specs(
    steps: &[StepGeometry],
    top_slab_thickness_cm: f64,
    front_slab_thickness_cm: f64,
    options: &SlabOptions,
) -> Vec<SurfaceSpec> {
    let mitre = options.corner_joint == CornerJoint::Mitre;
    let width = |step: &StepGeometry, arm: Arm, dominant: Arm, reduction: f64| {
        let external = step.external_cm(arm);
        if mitre || arm == dominant {
            external
        } else {
            external - reduction - options.gap_cm
        }
    };

    let mut specs = Vec::with_capacity(steps.len() * 4);
    for (i, step) in steps.iter().enumerate() {
        let below = if i == 0 { None } else { steps.get(i - 1) };
        let mut front_depth = step.rise_delta_cm(below);
        if below.is_some() && options.front_layout == FrontLayout::FrontsOnTop {
            front_depth -= top_slab_thickness_cm;
        }

        for arm in Arm::BOTH {
            specs.push(SurfaceSpec {
                surface: SurfaceRef {
                    step: step.index,
                    arm,
                    surface: Surface::Top,
                },
                width_cm: width(step, arm, options.top_dominant_arm, top_slab_thickness_cm),
                depth_cm: step.tread_depth_cm,
                mitre,
            });
        }
        for arm in Arm::BOTH {
            specs.push(SurfaceSpec {
                surface: SurfaceRef {
                    step: step.index,
                    arm,
                    surface: Surface::Front,
                },
                width_cm: width(step, arm, options.front_dominant_arm, front_slab_thickness_cm),
                depth_cm: front_depth,
                mitre,
            });
        }
    }
    specs
}

/// Owns the waste pool and running totals for one slab pass.
#[derive(Debug, Clone)]
pub struct SlabSolver {
    options: SlabOptions,
    pool: Vec<WastePiece>,
    next_id: u32,
    placements: Vec<SlabPlacement>,
    cut_histogram: BTreeMap<u32, u32>,
    purchased_cm2: f64,
    used_cm2: f64,
    discarded_cm2: f64,
    running_cuts: u32,
    running_area_cm2: f64,
}

impl SlabSolver {
    pub fn new(options: SlabOptions) -> Self {
        Self {
            options,
            pool: Vec::new(),
            next_id: 0,
            placements: Vec::new(),
            cut_histogram: BTreeMap::new(),
            purchased_cm2: 0.0,
            used_cm2: 0.0,
            discarded_cm2: 0.0,
            running_cuts: 0,
            running_area_cm2: 0.0,
        }
    }

    /// Current waste pool, in creation order
    pub fn waste(&self) -> &[WastePiece] {
        &self.pool
    }

    pub fn placements(&self) -> &[SlabPlacement] {
        &self.placements
    }

    pub fn ledger(&self) -> WasteLedger {
        WasteLedger {
            purchased_cm2: self.purchased_cm2,
            used_cm2: self.used_cm2,
            pooled_cm2: self.pool.iter().map(WastePiece::area_cm2).sum(),
            discarded_cm2: self.discarded_cm2,
        }
    }

    /// Clad one surface: fronts try same-step top waste first, then tile.
    pub fn place(&mut self, spec: SurfaceSpec) -> &SlabPlacement {
        let placement = match spec.surface.surface {
            Surface::Front => self
                .try_use_front_from_waste(&spec)
                .unwrap_or_else(|| self.tile(&spec)),
            Surface::Top => self.tile(&spec),
        };
        self.record(placement)
    }

    /// Clad one surface by tiling, without the front shortcut.
    pub fn tile_surface(&mut self, spec: SurfaceSpec) -> &SlabPlacement {
        let placement = self.tile(&spec);
        self.record(placement)
    }

    fn record(&mut self, mut placement: SlabPlacement) -> &SlabPlacement {
        self.running_cuts += placement.cuts;
        self.running_area_cm2 += placement.area_cm2;
        placement.running_cuts = self.running_cuts;
        placement.running_area_cm2 = self.running_area_cm2;
        debug!(
            surface = %placement.surface,
            width_cm = placement.width_cm,
            depth_cm = placement.depth_cm,
            new_slabs = placement.new_slabs,
            cuts = placement.cuts,
            from_waste = placement.covered_from_waste,
            "surface clad"
        );
        let index = self.placements.len();
        self.placements.push(placement);
        &self.placements[index]
    }

    fn empty_placement(spec: &SurfaceSpec) -> SlabPlacement {
        SlabPlacement {
            surface: spec.surface,
            width_cm: spec.width_cm,
            depth_cm: spec.depth_cm,
            new_slabs: 0,
            cuts: 0,
            area_cm2: 0.0,
            pieces: Vec::new(),
            covered_from_waste: false,
            running_cuts: 0,
            running_area_cm2: 0.0,
        }
    }

    /// Cover a whole front with top offcuts from the same step and arm.
    ///
    /// Every matching offcut is taken out of the pool, however large.
    pub fn try_use_front_from_waste(&mut self, spec: &SurfaceSpec) -> Option<SlabPlacement> {
        if spec.width_cm <= EXACT_FIT_TOLERANCE_CM || spec.depth_cm <= EXACT_FIT_TOLERANCE_CM {
            return None;
        }
        let top = SurfaceRef {
            surface: Surface::Top,
            ..spec.surface
        };
        let first = self.pool.iter().find(|p| p.source == top)?;
        let provenance = WasteProvenance {
            piece_id: first.id,
            source: first.source,
            remainder: first.remainder,
        };

        let (taken, kept): (Vec<WastePiece>, Vec<WastePiece>) =
            std::mem::take(&mut self.pool).into_iter().partition(|p| p.source == top);
        self.pool = kept;
        let taken_area: f64 = taken.iter().map(WastePiece::area_cm2).sum();
        self.used_cm2 += taken_area;
        debug!(
            surface = %spec.surface,
            pieces = taken.len(),
            area_cm2 = taken_area,
            "front covered from top waste"
        );

        // laid at the slab pitch like any other surface
        let (pitch, short) = self.options.slab_size.dimensions_cm();
        let gap = self.options.gap_cm;
        let widths = row_widths(spec.width_cm, pitch, gap, self.options.cut_policy);
        let mut pieces = Vec::new();
        for depth in row_depths(spec.depth_cm, short, gap) {
            for &width in &widths {
                pieces.push(PlacedPiece {
                    width_cm: width,
                    depth_cm: depth,
                    source: PieceSource::Waste(provenance),
                });
            }
        }

        Some(SlabPlacement {
            new_slabs: 0,
            cuts: 0,
            area_cm2: spec.width_cm * spec.depth_cm,
            pieces,
            covered_from_waste: true,
            ..Self::empty_placement(spec)
        })
    }

    fn tile(&mut self, spec: &SurfaceSpec) -> SlabPlacement {
        if spec.width_cm <= EXACT_FIT_TOLERANCE_CM || spec.depth_cm <= EXACT_FIT_TOLERANCE_CM {
            debug!(surface = %spec.surface, width_cm = spec.width_cm, depth_cm = spec.depth_cm, "surface skipped");
            return Self::empty_placement(spec);
        }

        let (pitch, short) = self.options.slab_size.dimensions_cm();
        let gap = self.options.gap_cm;
        let mut placement = SlabPlacement {
            area_cm2: spec.width_cm * spec.depth_cm,
            ..Self::empty_placement(spec)
        };

        for depth in row_depths(spec.depth_cm, short, gap) {
            for width in row_widths(spec.width_cm, pitch, gap, self.options.cut_policy) {
                let piece = match self.take_from_pool(width, depth, &mut placement.cuts) {
                    Some(piece) => piece,
                    None => {
                        placement.new_slabs += 1;
                        self.cut_new(spec.surface, width, depth, &mut placement.cuts)
                    }
                };
                placement.pieces.push(piece);
            }
        }

        if spec.mitre {
            self.count_cut(spec.depth_cm);
            placement.cuts += 1;
        }

        placement.covered_from_waste =
            placement.new_slabs == 0 && placement.pieces.iter().all(|p| matches!(p.source, PieceSource::Waste(_)));
        placement
    }

    fn count_cut(&mut self, line_cm: f64) {
        *self.cut_histogram.entry(cut_bucket(line_cm)).or_insert(0) += 1;
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Pool an offcut when both sides are usable, otherwise scrap it
    fn keep_or_discard(&mut self, width_cm: f64, length_cm: f64, source: SurfaceRef, remainder: bool, rotatable: bool) {
        if width_cm >= MIN_WASTE_SIDE_CM && length_cm >= MIN_WASTE_SIDE_CM {
            let id = self.next_id();
            self.pool.push(WastePiece {
                id,
                width_cm,
                length_cm,
                source,
                remainder,
                rotatable,
            });
        } else {
            self.discarded_cm2 += (width_cm * length_cm).max(0.0);
        }
    }

    /// Smallest offcut that covers `width x depth`, split guillotine style
    fn take_from_pool(&mut self, width_cm: f64, depth_cm: f64, cuts: &mut u32) -> Option<PlacedPiece> {
        let (index, (along, across)) = self
            .pool
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.orientation_for(width_cm, depth_cm).map(|o| (i, o)))
            .min_by(|(a, _), (b, _)| {
                let (pa, pb) = (&self.pool[*a], &self.pool[*b]);
                pa.area_cm2().total_cmp(&pb.area_cm2()).then(pa.id.cmp(&pb.id))
            })?;
        let parent = self.pool.remove(index);

        self.used_cm2 += width_cm * depth_cm;
        if along - width_cm > EXACT_FIT_TOLERANCE_CM {
            self.count_cut(across);
            *cuts += 1;
        }
        if across - depth_cm > EXACT_FIT_TOLERANCE_CM {
            self.count_cut(width_cm);
            *cuts += 1;
        }
        self.keep_or_discard(along - width_cm, across, parent.source, true, parent.rotatable);
        self.keep_or_discard(width_cm, across - depth_cm, parent.source, true, parent.rotatable);

        Some(PlacedPiece {
            width_cm,
            depth_cm,
            source: PieceSource::Waste(WasteProvenance {
                piece_id: parent.id,
                source: parent.source,
                remainder: parent.remainder,
            }),
        })
    }

    /// Cut `width x depth` out of a fresh slab
    fn cut_new(&mut self, surface: SurfaceRef, width_cm: f64, depth_cm: f64, cuts: &mut u32) -> PlacedPiece {
        let (pitch, short) = self.options.slab_size.dimensions_cm();
        let rotatable = self.options.rotate_offcuts;
        self.purchased_cm2 += pitch * short;
        self.used_cm2 += width_cm * depth_cm;

        let mut cut = false;
        if pitch - width_cm > EXACT_FIT_TOLERANCE_CM {
            self.count_cut(short);
            *cuts += 1;
            cut = true;
        }
        if short - depth_cm > EXACT_FIT_TOLERANCE_CM {
            self.count_cut(width_cm);
            *cuts += 1;
            cut = true;
        }
        self.keep_or_discard(pitch - width_cm, short, surface, false, rotatable);
        self.keep_or_discard(width_cm, short - depth_cm, surface, false, rotatable);

        PlacedPiece {
            width_cm,
            depth_cm,
            source: if cut { PieceSource::NewCut } else { PieceSource::FullSlab },
        }
    }

    /// Close the pass and total everything up.
    pub fn finish(self) -> SlabResult {
        let ledger = self.ledger();
        let mut new_top_slabs = 0;
        let mut new_front_slabs = 0;
        let mut top_area = SquareCentimeters(0.0);
        let mut front_area = SquareCentimeters(0.0);
        let mut sizes: BTreeMap<(u32, u32), u32> = BTreeMap::new();

        for placement in &self.placements {
            match placement.surface.surface {
                Surface::Top => {
                    new_top_slabs += placement.new_slabs;
                    top_area = top_area + SquareCentimeters(placement.area_cm2);
                }
                Surface::Front => {
                    new_front_slabs += placement.new_slabs;
                    front_area = front_area + SquareCentimeters(placement.area_cm2);
                }
            }
            for piece in &placement.pieces {
                let a = piece.width_cm.round() as u32;
                let b = piece.depth_cm.round() as u32;
                *sizes.entry((a.max(b), a.min(b))).or_insert(0) += 1;
            }
        }

        let top_area_m2: SquareMeters = top_area.into();
        let front_area_m2: SquareMeters = front_area.into();
        let adhesive_kg = (top_area_m2 + front_area_m2).value() * ADHESIVE_KG_PER_M2;
        let total_cuts: u32 = self.cut_histogram.values().sum();

        info!(
            new_slabs = new_top_slabs + new_front_slabs,
            total_cuts,
            offcuts_left = self.pool.len(),
            adhesive_kg,
            "slab pass complete"
        );

        SlabResult {
            placements: self.placements,
            new_top_slabs,
            new_front_slabs,
            total_new_slabs: new_top_slabs + new_front_slabs,
            total_cuts,
            top_area_m2: top_area_m2.value(),
            front_area_m2: front_area_m2.value(),
            adhesive_kg,
            cut_histogram: self.cut_histogram,
            installation_histogram: sizes
                .into_iter()
                .map(|((long_cm, short_cm), count)| InstallationBucket {
                    long_cm,
                    short_cm,
                    count,
                })
                .collect(),
            waste: self.pool,
            ledger,
        }
    }
}

/// Clad every step of the staircase.
pub fn solve(
    steps: &[StepGeometry],
    top_slab_thickness_cm: f64,
    front_slab_thickness_cm: f64,
    options: &SlabOptions,
) -> CalcResult<SlabResult> {
    options.validate()?;
    let mut solver = SlabSolver::new(*options);
    for spec in surface_specs(steps, top_slab_thickness_cm, front_slab_thickness_cm, options) {
        solver.place(spec);
    }
    Ok(solver.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::fixtures::sample_steps;

    fn top(step: usize, arm: Arm, width_cm: f64, depth_cm: f64) -> SurfaceSpec {
        SurfaceSpec {
            surface: SurfaceRef {
                step,
                arm,
                surface: Surface::Top,
            },
            width_cm,
            depth_cm,
            mitre: false,
        }
    }

    #[test]
    fn test_cut_bucket_nearest() {
        assert_eq!(cut_bucket(16.0), 30);
        assert_eq!(cut_bucket(44.0), 30);
        assert_eq!(cut_bucket(45.0), 30);
        assert_eq!(cut_bucket(46.0), 60);
        assert_eq!(cut_bucket(200.0), 120);
    }

    #[test]
    fn test_row_widths_exact_fit() {
        assert_eq!(row_widths(120.0, 60.0, 0.0, CutPolicy::OneCut), vec![60.0, 60.0]);
        assert_eq!(row_widths(120.05, 60.0, 0.0, CutPolicy::TwoCuts), vec![60.0, 60.0]);
        // 60 + 0.5 + 60 with a 0.5 gap
        assert_eq!(row_widths(120.5, 60.0, 0.5, CutPolicy::OneCut), vec![60.0, 60.0]);
    }

    #[test]
    fn test_row_widths_one_cut() {
        assert_eq!(row_widths(100.0, 60.0, 0.0, CutPolicy::OneCut), vec![60.0, 40.0]);
        assert_eq!(row_widths(40.0, 60.0, 0.0, CutPolicy::OneCut), vec![40.0]);
    }

    #[test]
    fn test_row_widths_two_cuts() {
        // 150 = 45 + 60 + 45
        assert_eq!(row_widths(150.0, 60.0, 0.0, CutPolicy::TwoCuts), vec![45.0, 60.0, 45.0]);
        // 130: edges of 5 would be too thin, drop a slab -> 35 + 60 + 35
        assert_eq!(row_widths(130.0, 60.0, 0.0, CutPolicy::TwoCuts), vec![35.0, 60.0, 35.0]);
        assert_eq!(row_widths(40.0, 60.0, 0.0, CutPolicy::TwoCuts), vec![40.0]);
    }

    #[test]
    fn test_row_depths() {
        assert_eq!(row_depths(30.0, 30.0, 0.3), vec![30.0]);
        assert_eq!(row_depths(16.0, 30.0, 0.0), vec![16.0]);
        assert_eq!(row_depths(50.0, 30.0, 0.0), vec![30.0, 20.0]);
    }

    #[test]
    fn test_offcut_reused_on_next_surface() {
        let mut solver = SlabSolver::new(SlabOptions::default());
        let first = solver.tile_surface(top(0, Arm::A, 100.0, 30.0)).clone();
        assert_eq!(first.new_slabs, 2);
        assert_eq!(first.cuts, 1);
        assert_eq!(solver.waste().len(), 1);
        assert_eq!(solver.waste()[0].width_cm, 20.0);
        assert_eq!(solver.waste()[0].length_cm, 30.0);

        let second = solver.tile_surface(top(0, Arm::B, 20.0, 30.0)).clone();
        assert_eq!(second.new_slabs, 0);
        assert!(second.covered_from_waste);
        match second.pieces[0].source {
            PieceSource::Waste(p) => {
                assert_eq!(p.source, first.surface);
                assert!(!p.remainder);
            }
            other => panic!("expected waste piece, got {:?}", other),
        }
        assert!(solver.waste().is_empty());
    }

    #[test]
    fn test_smallest_fitting_offcut_wins() {
        let mut solver = SlabSolver::new(SlabOptions::default());
        let source = top(0, Arm::A, 0.0, 0.0).surface;
        solver.keep_or_discard(50.0, 30.0, source, false, true);
        solver.keep_or_discard(20.0, 30.0, source, false, true);

        solver.tile_surface(top(1, Arm::A, 15.0, 30.0));
        // the 20x30 piece was used and left a 5x30 remainder
        let left: Vec<(f64, bool)> = solver.waste().iter().map(|p| (p.width_cm, p.remainder)).collect();
        assert_eq!(left, vec![(50.0, false), (5.0, true)]);
    }

    #[test]
    fn test_rotated_offcut() {
        let mut solver = SlabSolver::new(SlabOptions::default());
        // a 14 cm deep strip off a 60x30 slab leaves 60x16
        solver.tile_surface(top(0, Arm::A, 60.0, 14.0));
        assert_eq!(solver.waste()[0].width_cm, 60.0);
        assert_eq!(solver.waste()[0].length_cm, 16.0);
        // a 16 wide x 25 deep piece only fits the offcut turned
        let p = solver.tile_surface(top(0, Arm::B, 16.0, 25.0)).clone();
        assert_eq!(p.new_slabs, 0);

        let mut fixed = SlabSolver::new(SlabOptions {
            rotate_offcuts: false,
            ..SlabOptions::default()
        });
        fixed.tile_surface(top(0, Arm::A, 60.0, 14.0));
        let p = fixed.tile_surface(top(0, Arm::B, 16.0, 25.0)).clone();
        assert_eq!(p.new_slabs, 1);
    }

    #[test]
    fn test_front_covered_from_top_waste() {
        let mut solver = SlabSolver::new(SlabOptions::default());
        solver.place(top(0, Arm::A, 100.0, 30.0));
        solver.place(top(0, Arm::B, 100.0, 30.0));
        assert_eq!(solver.waste().len(), 2);

        let front = SurfaceSpec {
            surface: SurfaceRef {
                step: 0,
                arm: Arm::A,
                surface: Surface::Front,
            },
            width_cm: 100.0,
            depth_cm: 16.0,
            mitre: false,
        };
        let placement = solver.place(front).clone();
        assert!(placement.covered_from_waste);
        assert_eq!(placement.new_slabs, 0);
        // only the arm A offcut was taken
        assert_eq!(solver.waste().len(), 1);
        assert_eq!(solver.waste()[0].source.arm, Arm::B);
        assert!(solver.ledger().imbalance_cm2().abs() < 1e-6);
    }

    #[test]
    fn test_waste_front_installed_at_slab_pitch() {
        let mut solver = SlabSolver::new(SlabOptions::default());
        solver.place(top(0, Arm::A, 150.0, 30.0));
        let front = SurfaceSpec {
            surface: SurfaceRef {
                step: 0,
                arm: Arm::A,
                surface: Surface::Front,
            },
            width_cm: 150.0,
            depth_cm: 16.0,
            mitre: false,
        };
        let placement = solver.place(front).clone();
        assert!(placement.covered_from_waste);
        let widths: Vec<f64> = placement.pieces.iter().map(|p| p.width_cm).collect();
        assert_eq!(widths, vec![60.0, 60.0, 30.0]);
        assert!(placement.pieces.iter().all(|p| p.depth_cm == 16.0));

        let result = solver.finish();
        let buckets: Vec<(u32, u32, u32)> = result
            .installation_histogram
            .iter()
            .map(|b| (b.long_cm, b.short_cm, b.count))
            .collect();
        // top: 60, 60, 30 wide at 30 deep; front: the same widths at 16
        assert_eq!(buckets, vec![(30, 16, 1), (30, 30, 1), (60, 16, 2), (60, 30, 2)]);
        assert!(result.installation_histogram.iter().all(|b| b.long_cm <= 60));
    }

    #[test]
    fn test_surface_order_and_widths() {
        let steps = sample_steps();
        let options = SlabOptions::default();
        let specs = surface_specs(&steps, 2.0, 2.0, &options);
        assert_eq!(specs.len(), steps.len() * 4);

        let kinds: Vec<(Arm, Surface)> = specs[..4].iter().map(|s| (s.surface.arm, s.surface.surface)).collect();
        assert_eq!(
            kinds,
            vec![
                (Arm::A, Surface::Top),
                (Arm::B, Surface::Top),
                (Arm::A, Surface::Front),
                (Arm::B, Surface::Front),
            ]
        );
        // arm A dominant: full 150; arm B stops short by the slab thickness
        assert_eq!(specs[0].width_cm, 150.0);
        assert_eq!(specs[1].width_cm, 160.0 - 2.0);
        assert_eq!(specs[3].width_cm, 160.0 - 2.0);
        // first front is the whole target height, then one step height each
        assert_eq!(specs[2].depth_cm, 16.0);
        assert_eq!(specs[6].depth_cm, 18.0);
    }

    #[test]
    fn test_non_dominant_width_uses_own_thickness() {
        let steps = sample_steps();
        let options = SlabOptions {
            gap_cm: 0.5,
            top_dominant_arm: Arm::B,
            front_dominant_arm: Arm::A,
            ..SlabOptions::default()
        };
        let specs = surface_specs(&steps, 4.0, 1.5, &options);
        // tops: B runs full, A loses st + gap
        assert_eq!(specs[0].width_cm, 150.0 - 4.0 - 0.5);
        assert_eq!(specs[1].width_cm, 160.0);
        // fronts: A runs full, B loses sf + gap
        assert_eq!(specs[2].width_cm, 150.0);
        assert_eq!(specs[3].width_cm, 160.0 - 1.5 - 0.5);
    }

    #[test]
    fn test_fronts_on_top_layout() {
        let steps = sample_steps();
        let options = SlabOptions {
            front_layout: FrontLayout::FrontsOnTop,
            ..SlabOptions::default()
        };
        let specs = surface_specs(&steps, 2.0, 2.0, &options);
        assert_eq!(specs[2].depth_cm, 16.0);
        assert_eq!(specs[6].depth_cm, 16.0);
    }

    #[test]
    fn test_mitre_joint() {
        let steps = sample_steps();
        let butt = solve(&steps, 2.0, 2.0, &SlabOptions::default()).unwrap();
        let mitre_opts = SlabOptions {
            corner_joint: CornerJoint::Mitre,
            ..SlabOptions::default()
        };
        let specs = surface_specs(&steps, 2.0, 2.0, &mitre_opts);
        assert_eq!(specs[1].width_cm, 160.0);
        let mitre = solve(&steps, 2.0, 2.0, &mitre_opts).unwrap();
        assert!(mitre.total_cuts > butt.total_cuts);
        assert!(mitre.top_area_m2 > butt.top_area_m2);
    }

    #[test]
    fn test_full_pass_totals() {
        let steps = sample_steps();
        let result = solve(&steps, 2.0, 2.0, &SlabOptions::default()).unwrap();
        assert_eq!(result.placements.len(), 20);
        assert_eq!(result.total_new_slabs, result.new_top_slabs + result.new_front_slabs);
        assert!(result.total_new_slabs > 0);

        let histogram_total: u32 = result.cut_histogram.values().sum();
        assert_eq!(histogram_total, result.total_cuts);
        let placement_cuts: u32 = result.placements.iter().map(|p| p.cuts).sum();
        assert_eq!(placement_cuts, result.total_cuts);
        assert_eq!(result.placements.last().unwrap().running_cuts, result.total_cuts);

        let expected_adhesive = (result.top_area_m2 + result.front_area_m2) * ADHESIVE_KG_PER_M2;
        assert!((result.adhesive_kg - expected_adhesive).abs() < 1e-9);
    }

    #[test]
    fn test_waste_conservation() {
        let steps = sample_steps();
        for cut_policy in [CutPolicy::OneCut, CutPolicy::TwoCuts] {
            for slab_size in SlabSize::ALL {
                let options = SlabOptions {
                    cut_policy,
                    slab_size,
                    gap_cm: 0.3,
                    ..SlabOptions::default()
                };
                let mut solver = SlabSolver::new(options);
                for spec in surface_specs(&steps, 2.0, 2.0, &options) {
                    solver.place(spec);
                    assert!(solver.ledger().imbalance_cm2().abs() < 1e-6);
                }
                let ledger = solver.finish().ledger;
                assert!(ledger.purchased_cm2 > 0.0);
                assert!(ledger.imbalance_cm2().abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_waste_pieces_are_usable() {
        let steps = sample_steps();
        let result = solve(&steps, 2.0, 2.0, &SlabOptions::default()).unwrap();
        for piece in &result.waste {
            assert!(piece.width_cm >= MIN_WASTE_SIDE_CM);
            assert!(piece.length_cm >= MIN_WASTE_SIDE_CM);
        }
        let ids: Vec<u32> = result.waste.iter().map(|p| p.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_invalid_gap() {
        let steps = sample_steps();
        let options = SlabOptions {
            gap_cm: -1.0,
            ..SlabOptions::default()
        };
        let err = solve(&steps, 2.0, 2.0, &options).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { ref field, .. } if field == "gap_cm"));
    }
}
