//! # Step Geometry
//!
//! Turns the site measurements of an L-shaped staircase into a sequence of
//! steps. Every step is an L-shaped band: it runs along arm A and arm B and
//! meets itself at the corner. Each step eats `tread - overhang` from both
//! arms; the last step (the platform) eats `tread - overhang - front slab`
//! because a finish slab closes it instead of another riser.
//!
//! ## Lengths
//!
//! - **external**: visible length of the arm at this step, measured before
//!   the step's own consumption is removed
//! - **inner**: what remains of the arm for the steps above, measured after
//!
//! Inner lengths shrink strictly from step to step and must stay positive on
//! both arms, platform included. A staircase that breaks this is rejected
//! before any step is produced.
//!
//! ## Example
//!
//! ```rust
//! use stair_core::calculations::geometry::{solve, StairMeasurements};
//!
//! let m = StairMeasurements {
//!     total_rise_cm: 90.0,
//!     step_height_cm: 18.0,
//!     tread_depth_cm: 30.0,
//!     arm_a_length_cm: 150.0,
//!     arm_b_length_cm: 150.0,
//!     top_slab_thickness_cm: 2.0,
//!     front_slab_thickness_cm: 2.0,
//!     front_overhang_cm: 3.0,
//! };
//!
//! let geometry = solve(&m).unwrap();
//! assert_eq!(geometry.step_count, 5);
//! assert!(geometry.steps.last().unwrap().is_platform);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, CalcResult};

/// Step heights closer than this to the requested height are not reported
/// as adjusted (cm)
const HEIGHT_ADJUSTMENT_TOLERANCE_CM: f64 = 0.01;

/// One of the two straight runs of the staircase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Arm {
    #[default]
    A,
    B,
}

impl Arm {
    /// Both arms, in processing order
    pub const BOTH: [Arm; 2] = [Arm::A, Arm::B];

    /// The arm meeting this one at the corner
    pub fn other(self) -> Arm {
        match self {
            Arm::A => Arm::B,
            Arm::B => Arm::A,
        }
    }
}

impl std::fmt::Display for Arm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arm::A => write!(f, "A"),
            Arm::B => write!(f, "B"),
        }
    }
}

/// Site measurements of an L-shaped staircase. All values in cm.
///
/// Missing fields deserialize as 0 and are rejected by [`validate`](Self::validate)
/// as missing measurements.
///
/// ## JSON Example
///
/// ```json
/// {
///   "total_rise_cm": 90.0,
///   "step_height_cm": 18.0,
///   "tread_depth_cm": 30.0,
///   "arm_a_length_cm": 150.0,
///   "arm_b_length_cm": 150.0,
///   "top_slab_thickness_cm": 2.0,
///   "front_slab_thickness_cm": 2.0,
///   "front_overhang_cm": 3.0
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StairMeasurements {
    /// Total height to climb (H)
    pub total_rise_cm: f64,

    /// Desired step height before rounding to a whole number of steps (h0)
    pub step_height_cm: f64,

    /// Desired tread depth (t0)
    pub tread_depth_cm: f64,

    /// Length of arm A measured from the corner (La)
    pub arm_a_length_cm: f64,

    /// Length of arm B measured from the corner (Lb)
    pub arm_b_length_cm: f64,

    /// Thickness of the finish slabs laid on the treads (st)
    pub top_slab_thickness_cm: f64,

    /// Thickness of the finish slabs on the risers (sf)
    pub front_slab_thickness_cm: f64,

    /// How far each tread overhangs the riser below (o)
    pub front_overhang_cm: f64,
}

impl StairMeasurements {
    fn fields(&self) -> [(&'static str, f64); 8] {
        [
            ("total_rise_cm", self.total_rise_cm),
            ("step_height_cm", self.step_height_cm),
            ("tread_depth_cm", self.tread_depth_cm),
            ("arm_a_length_cm", self.arm_a_length_cm),
            ("arm_b_length_cm", self.arm_b_length_cm),
            ("top_slab_thickness_cm", self.top_slab_thickness_cm),
            ("front_slab_thickness_cm", self.front_slab_thickness_cm),
            ("front_overhang_cm", self.front_overhang_cm),
        ]
    }

    /// Validate that every measurement is present and usable.
    pub fn validate(&self) -> CalcResult<()> {
        for (field, value) in self.fields() {
            if !value.is_finite() || value == 0.0 {
                return Err(CalcError::missing_field(field));
            }
            if value < 0.0 {
                return Err(CalcError::invalid_input(
                    field,
                    value.to_string(),
                    "Measurement must be positive",
                ));
            }
        }
        if self.platform_consumption_cm() <= 0.0 {
            return Err(CalcError::invalid_input(
                "tread_depth_cm",
                self.tread_depth_cm.to_string(),
                format!(
                    "Tread must exceed overhang plus front slab ({:.1} cm) so every step moves inward",
                    self.front_overhang_cm + self.front_slab_thickness_cm
                ),
            ));
        }
        Ok(())
    }

    /// Length of the given arm
    pub fn arm_length_cm(&self, arm: Arm) -> f64 {
        match arm {
            Arm::A => self.arm_a_length_cm,
            Arm::B => self.arm_b_length_cm,
        }
    }

    /// Arm length consumed by an ordinary step (r = t0 - o)
    pub fn tread_consumption_cm(&self) -> f64 {
        self.tread_depth_cm - self.front_overhang_cm
    }

    /// Arm length consumed by the platform (r - sf)
    pub fn platform_consumption_cm(&self) -> f64 {
        self.tread_consumption_cm() - self.front_slab_thickness_cm
    }
}

/// Geometry of a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepGeometry {
    /// Zero-based step index, counted from the bottom
    pub index: usize,

    /// Height of the masonry under this step's top slab, from grade (cm)
    ///
    /// `h * (index + 1) - st`
    pub target_height_cm: f64,

    /// Visible rise of one step without its top slab (`h - st`)
    pub visible_rise_cm: f64,

    /// Tread depth (cm)
    pub tread_depth_cm: f64,

    /// Arm A length seen from outside at this step (cm)
    pub arm_a_external_cm: f64,

    /// Arm B length seen from outside at this step (cm)
    pub arm_b_external_cm: f64,

    /// Arm A length left for the steps above (cm)
    pub arm_a_inner_cm: f64,

    /// Arm B length left for the steps above (cm)
    pub arm_b_inner_cm: f64,

    /// True only for the topmost step
    pub is_platform: bool,

    /// Depth the lowest course sinks below grade, when the coursing needed it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buried_depth_cm: Option<f64>,
}

impl StepGeometry {
    /// External length of an arm at this step
    pub fn external_cm(&self, arm: Arm) -> f64 {
        match arm {
            Arm::A => self.arm_a_external_cm,
            Arm::B => self.arm_b_external_cm,
        }
    }

    /// Inner length of an arm at this step
    pub fn inner_cm(&self, arm: Arm) -> f64 {
        match arm {
            Arm::A => self.arm_a_inner_cm,
            Arm::B => self.arm_b_inner_cm,
        }
    }

    /// Height gained over the step below (the whole target height for the
    /// first step)
    pub fn rise_delta_cm(&self, below: Option<&StepGeometry>) -> f64 {
        match below {
            Some(prev) => self.target_height_cm - prev.target_height_cm,
            None => self.target_height_cm,
        }
    }
}

/// Informational note that the step height was changed to divide the rise evenly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightAdjustment {
    /// Height the caller asked for (cm)
    pub requested_cm: f64,
    /// Height actually used (cm)
    pub actual_cm: f64,
}

/// Output of the geometry solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryResult {
    /// Steps from bottom to top; the last one is the platform
    pub steps: Vec<StepGeometry>,

    /// Number of steps (N)
    pub step_count: u32,

    /// Actual step height H / N (cm)
    pub step_height_cm: f64,

    /// Present when the actual height differs from the requested one
    pub height_adjustment: Option<HeightAdjustment>,

    /// Arm A length as measured (cm)
    pub arm_a_length_cm: f64,

    /// Arm B length as measured (cm)
    pub arm_b_length_cm: f64,

    /// Arm length consumed by all steps together (cm)
    pub total_consumed_cm: f64,
}

impl GeometryResult {
    /// The platform (topmost) step
    pub fn platform(&self) -> Option<&StepGeometry> {
        self.steps.last()
    }
}

/// Solve the step geometry.
///
/// # Returns
///
/// * `Ok(GeometryResult)` - Every step, bottom to top
/// * `Err(CalcError::MissingField | InvalidInput)` - A measurement is absent or unusable
/// * `Err(CalcError::InvalidStepCount)` - The rise rounds to zero steps
/// * `Err(CalcError::ArmTooShort)` - An arm cannot hold every tread
pub fn solve(m: &StairMeasurements) -> CalcResult<GeometryResult> {
    m.validate()?;

    let raw_count = (m.total_rise_cm / m.step_height_cm).round() as i64;
    let step_count = match u32::try_from(raw_count) {
        Ok(count) if count > 0 => count,
        _ => {
            return Err(CalcError::InvalidStepCount {
                total_rise_cm: m.total_rise_cm,
                step_height_cm: m.step_height_cm,
                step_count: raw_count,
            })
        }
    };
    let step_height = m.total_rise_cm / step_count as f64;

    let height_adjustment = if (step_height - m.step_height_cm).abs() > HEIGHT_ADJUSTMENT_TOLERANCE_CM {
        debug!(
            requested = m.step_height_cm,
            actual = step_height,
            "step height adjusted to divide the rise evenly"
        );
        Some(HeightAdjustment {
            requested_cm: m.step_height_cm,
            actual_cm: step_height,
        })
    } else {
        None
    };

    let consumption = |index: u32| {
        if index + 1 == step_count {
            m.platform_consumption_cm()
        } else {
            m.tread_consumption_cm()
        }
    };

    let total_consumed = (step_count - 1) as f64 * m.tread_consumption_cm() + m.platform_consumption_cm();
    for arm in Arm::BOTH {
        let available = m.arm_length_cm(arm);
        if available - total_consumed <= 0.0 {
            return Err(CalcError::arm_too_short(arm, step_count, total_consumed, available));
        }
    }

    let mut steps = Vec::with_capacity(step_count as usize);
    let mut consumed_so_far = 0.0;
    for index in 0..step_count {
        let arm_a_external = m.arm_a_length_cm - consumed_so_far;
        let arm_b_external = m.arm_b_length_cm - consumed_so_far;
        consumed_so_far += consumption(index);

        steps.push(StepGeometry {
            index: index as usize,
            target_height_cm: step_height * (index + 1) as f64 - m.top_slab_thickness_cm,
            visible_rise_cm: step_height - m.top_slab_thickness_cm,
            tread_depth_cm: m.tread_depth_cm,
            arm_a_external_cm: arm_a_external,
            arm_b_external_cm: arm_b_external,
            arm_a_inner_cm: m.arm_a_length_cm - consumed_so_far,
            arm_b_inner_cm: m.arm_b_length_cm - consumed_so_far,
            is_platform: index + 1 == step_count,
            buried_depth_cm: None,
        });
    }

    debug!(step_count, step_height, total_consumed, "step geometry solved");

    Ok(GeometryResult {
        steps,
        step_count,
        step_height_cm: step_height,
        height_adjustment,
        arm_a_length_cm: m.arm_a_length_cm,
        arm_b_length_cm: m.arm_b_length_cm,
        total_consumed_cm: total_consumed,
    })
}
