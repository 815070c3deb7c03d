//! # Masonry Courses
//!
//! Chooses, for every step, which masonry unit builds its riser, how many
//! courses it takes and how thick the mortar joints must be. Then counts the
//! blocks on each arm and estimates mortar.
//!
//! ## Fit Rule
//!
//! For `c` courses of laid height `u` the nominal stack is
//! `c*u + 2 + (c-1)*1` cm (bed joints plus 1 cm joints between courses).
//! A course count fits a target height when either
//!
//! - the nominal stack is at most 0.5 cm below the target, or
//! - the uniform joint solving `target = c*u + 2 + (c-1)*j` lies in
//!   [0.5, 3.0] cm.
//!
//! Units are tried in the order the caller selected them; the first unit with
//! a fitting course count wins. This is first-fit, not best-fit: changing
//! the order changes the quantities.
//!
//! ## Buried Depth
//!
//! When some step has no fit at its nominal height, the staircase can be sunk
//! below grade. Depths 2..=8 cm are tried nearest-to-5 first; the first depth
//! at which every step fits (at its own height or sunk) is used. A step that
//! still cannot be coursed falls back to the first selected unit and is
//! flagged as needing cut units.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calculations::geometry::StepGeometry;
use crate::errors::{CalcError, CalcResult};
use crate::materials::{
    BrickOrientation, MasonryUnit, BASE_JOINT_ALLOWANCE_CM, FILL_DENSITY_KG_PER_M3, MORTAR_KG_PER_UNIT,
    MORTAR_MIX_FACTOR, NOMINAL_JOINT_CM,
};
use crate::units::{CubicCentimeters, CubicMeters};

/// Smallest acceptable mortar joint (cm)
pub const MIN_JOINT_CM: f64 = 0.5;

/// Largest acceptable mortar joint (cm)
pub const MAX_JOINT_CM: f64 = 3.0;

/// How far below the target a nominal stack may stop (cm)
pub const DOWNWARD_TOLERANCE_CM: f64 = 0.5;

/// Burial depths in search order, nearest to 5 cm first
pub const BURIAL_SEARCH_ORDER_CM: [f64; 7] = [5.0, 4.0, 6.0, 3.0, 7.0, 2.0, 8.0];

const EPSILON: f64 = 1e-9;

/// A course count that fits a target height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourseFit {
    /// Unit used for the riser
    pub unit: MasonryUnit,
    /// Number of courses
    pub courses: u32,
    /// Joint between courses (cm)
    pub joint_thickness_cm: f64,
    /// Height of the finished stack including bed joints (cm)
    pub coursed_height_cm: f64,
}

/// Per-step masonry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTally {
    /// Zero-based step index
    pub step_index: usize,
    /// Unit chosen for this step
    pub unit: MasonryUnit,
    /// Blocks on arm A
    pub arm_a_blocks: u32,
    /// Blocks on arm B
    pub arm_b_blocks: u32,
    /// Number of courses
    pub courses: u32,
    /// Joint between courses (cm)
    pub joint_thickness_cm: f64,
    /// Height of the finished stack including bed joints (cm)
    pub coursed_height_cm: f64,
    /// True when no joint thickness fits and units must be cut on site
    pub needs_cutting: bool,
    /// Depth the stack sinks below grade, when the fit needed it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buried_depth_cm: Option<f64>,
}

impl StepTally {
    /// Blocks on both arms
    pub fn total_blocks(&self) -> u32 {
        self.arm_a_blocks.saturating_add(self.arm_b_blocks)
    }
}

/// Block totals for one masonry unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialTally {
    /// Masonry unit
    pub unit: MasonryUnit,
    /// Blocks over all steps built with this unit
    pub total_blocks: u32,
    /// Steps built with this unit
    pub steps: Vec<StepTally>,
}

/// Output of the course solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseResult {
    /// One record per step, bottom to top
    pub steps: Vec<StepTally>,
    /// Non-empty tallies, in the caller's unit order
    pub tallies: Vec<MaterialTally>,
    /// Shared burial depth, when the staircase had to be sunk (cm)
    pub buried_depth_cm: Option<f64>,
    /// Blocks over all units
    pub total_blocks: u32,
    /// Joint mortar (kg)
    pub joint_mortar_kg: f64,
    /// Concrete fill behind the risers (kg)
    pub fill_mortar_kg: f64,
    /// Joint mortar plus fill (kg)
    pub total_mortar_kg: f64,
}

impl CourseResult {
    /// Whether any step fell back to cut units
    pub fn any_needs_cutting(&self) -> bool {
        self.steps.iter().any(|s| s.needs_cutting)
    }
}

/// Nominal stack height for `courses` courses of `laid_height_cm`
pub fn nominal_stack_cm(courses: u32, laid_height_cm: f64) -> f64 {
    courses as f64 * laid_height_cm + BASE_JOINT_ALLOWANCE_CM + courses.saturating_sub(1) as f64 * NOMINAL_JOINT_CM
}

/// Uniform joint that makes `courses` courses hit `target_cm` exactly.
///
/// `None` for a single course, which has no joint between courses.
pub fn implied_joint_cm(target_cm: f64, courses: u32, laid_height_cm: f64) -> Option<f64> {
    if courses < 2 {
        return None;
    }
    Some((target_cm - courses as f64 * laid_height_cm - BASE_JOINT_ALLOWANCE_CM) / (courses - 1) as f64)
}

/// Search course counts `1 ..= ceil(target/u) + 1` for one unit.
///
/// Returns `(courses, joint, coursed height)` of the first count that fits.
pub fn fit_courses(target_cm: f64, laid_height_cm: f64) -> Option<(u32, f64, f64)> {
    if target_cm <= 0.0 || laid_height_cm <= 0.0 {
        return None;
    }
    let max_courses = ((target_cm / laid_height_cm).ceil() as u32).saturating_add(1);
    (1..=max_courses).find_map(|courses| {
        let nominal = nominal_stack_cm(courses, laid_height_cm);
        if nominal <= target_cm + EPSILON && nominal >= target_cm - DOWNWARD_TOLERANCE_CM - EPSILON {
            return Some((courses, NOMINAL_JOINT_CM, nominal));
        }
        implied_joint_cm(target_cm, courses, laid_height_cm)
            .filter(|joint| *joint >= MIN_JOINT_CM - EPSILON && *joint <= MAX_JOINT_CM + EPSILON)
            .map(|joint| (courses, joint, target_cm))
    })
}

/// First selected unit that can course `target_cm`.
pub fn first_fit(target_cm: f64, units: &[MasonryUnit], brick: BrickOrientation) -> Option<CourseFit> {
    units.iter().find_map(|&unit| {
        fit_courses(target_cm, unit.laid_height_cm(brick)).map(|(courses, joint, coursed)| CourseFit {
            unit,
            courses,
            joint_thickness_cm: joint,
            coursed_height_cm: coursed,
        })
    })
}

/// Find the shared burial depth, if any step needs one.
fn search_buried_depth(
    steps: &[StepGeometry],
    nominal: &[Option<CourseFit>],
    units: &[MasonryUnit],
    brick: BrickOrientation,
) -> Option<f64> {
    if nominal.iter().all(Option::is_some) {
        return None;
    }
    let depth = BURIAL_SEARCH_ORDER_CM.iter().copied().find(|&depth| {
        steps
            .iter()
            .zip(nominal)
            .all(|(step, fit)| fit.is_some() || first_fit(step.target_height_cm + depth, units, brick).is_some())
    });
    match depth {
        Some(d) => debug!(buried_depth_cm = d, "staircase sunk below grade"),
        None => debug!("no burial depth lets every step fit"),
    }
    depth
}

/// Blocks needed along one arm for one step
fn arm_blocks(inner_cm: f64, unit: MasonryUnit, courses: u32) -> u32 {
    if inner_cm <= 0.0 {
        return 0;
    }
    let per_course = (inner_cm / (unit.length_cm() + NOMINAL_JOINT_CM)).ceil() as u32;
    per_course.saturating_mul(courses)
}

/// Block total over several steps, pinned at `u32::MAX`
fn sum_blocks(steps: &[StepTally]) -> u32 {
    steps
        .iter()
        .map(StepTally::total_blocks)
        .fold(0, u32::saturating_add)
}

/// L-shaped fill volume behind one step's riser (cm³).
///
/// The two arm strips overlap in a `fill x fill` corner square which is
/// subtracted once.
fn fill_volume_cm3(step: &StepGeometry, unit_length_cm: f64) -> f64 {
    let fill = step.tread_depth_cm - unit_length_cm;
    if fill <= 0.0 {
        return 0.0;
    }
    (step.arm_a_inner_cm * fill + step.arm_b_inner_cm * fill - fill * fill) * step.target_height_cm
}

/// Course every step and tally blocks and mortar.
///
/// # Returns
///
/// * `Ok(CourseResult)` - Always, once at least one unit is selected
/// * `Err(CalcError::NoMasonryUnitSelected)` - Empty unit selection
pub fn solve(steps: &[StepGeometry], units: &[MasonryUnit], brick: BrickOrientation) -> CalcResult<CourseResult> {
    let first_unit = *units.first().ok_or(CalcError::NoMasonryUnitSelected)?;

    let nominal: Vec<Option<CourseFit>> = steps
        .iter()
        .map(|step| first_fit(step.target_height_cm, units, brick))
        .collect();
    let buried_depth = search_buried_depth(steps, &nominal, units, brick);

    let mut step_tallies = Vec::with_capacity(steps.len());
    for (step, fit) in steps.iter().zip(&nominal) {
        let buried_fit = || {
            buried_depth.and_then(|depth| {
                first_fit(step.target_height_cm + depth, units, brick).map(|fit| (fit, Some(depth)))
            })
        };
        let (fit, step_burial, needs_cutting) = match fit.map(|f| (f, None)).or_else(buried_fit) {
            Some((fit, burial)) => (fit, burial, false),
            None => {
                let laid = first_unit.laid_height_cm(brick);
                let courses = ((step.target_height_cm / laid).ceil() as u32).max(1);
                warn!(
                    step = step.index + 1,
                    target_cm = step.target_height_cm,
                    unit = %first_unit,
                    courses,
                    "no joint thickness fits, units need cutting"
                );
                let fallback = CourseFit {
                    unit: first_unit,
                    courses,
                    joint_thickness_cm: NOMINAL_JOINT_CM,
                    coursed_height_cm: nominal_stack_cm(courses, laid),
                };
                (fallback, None, true)
            }
        };

        let tally = StepTally {
            step_index: step.index,
            unit: fit.unit,
            arm_a_blocks: arm_blocks(step.arm_a_inner_cm, fit.unit, fit.courses),
            arm_b_blocks: arm_blocks(step.arm_b_inner_cm, fit.unit, fit.courses),
            courses: fit.courses,
            joint_thickness_cm: fit.joint_thickness_cm,
            coursed_height_cm: fit.coursed_height_cm,
            needs_cutting,
            buried_depth_cm: step_burial,
        };
        debug!(
            step = step.index + 1,
            unit = %tally.unit,
            courses = tally.courses,
            joint_cm = tally.joint_thickness_cm,
            blocks = tally.total_blocks(),
            "step coursed"
        );
        step_tallies.push(tally);
    }

    let mut tallies: Vec<MaterialTally> = Vec::new();
    for &unit in units {
        if tallies.iter().any(|t| t.unit == unit) {
            continue;
        }
        let steps_for_unit: Vec<StepTally> = step_tallies.iter().filter(|s| s.unit == unit).cloned().collect();
        let total_blocks = sum_blocks(&steps_for_unit);
        if total_blocks > 0 {
            tallies.push(MaterialTally {
                unit,
                total_blocks,
                steps: steps_for_unit,
            });
        }
    }

    let total_blocks = sum_blocks(&step_tallies);
    let joint_mortar_kg = total_blocks as f64 * MORTAR_KG_PER_UNIT * MORTAR_MIX_FACTOR;

    let fill_cm3: f64 = steps
        .iter()
        .map(|step| fill_volume_cm3(step, first_unit.length_cm()))
        .sum();
    let fill_m3: CubicMeters = CubicCentimeters(fill_cm3).into();
    let fill_mortar_kg = fill_m3.mass_at(FILL_DENSITY_KG_PER_M3).value();

    info!(total_blocks, joint_mortar_kg, fill_mortar_kg, "masonry tallied");

    Ok(CourseResult {
        steps: step_tallies,
        tallies,
        buried_depth_cm: buried_depth,
        total_blocks,
        joint_mortar_kg,
        fill_mortar_kg,
        total_mortar_kg: joint_mortar_kg + fill_mortar_kg,
    })
}
