//! # L-Shaped Staircase Estimate
//!
//! Runs the whole estimate for one staircase: step geometry, masonry courses,
//! slab cladding and labor. Geometry feeds both the course and the slab pass;
//! their quantities feed the labor projection.
//!
//! ## Example
//!
//! ```rust
//! use stair_core::calculations::l_stair::{calculate, LStairInput};
//! use stair_core::calculations::geometry::StairMeasurements;
//! use stair_core::materials::MasonryUnit;
//! use stair_core::tasks::ReferenceData;
//!
//! let input = LStairInput {
//!     label: "Garden stair".to_string(),
//!     measurements: StairMeasurements {
//!         total_rise_cm: 90.0,
//!         step_height_cm: 18.0,
//!         tread_depth_cm: 30.0,
//!         arm_a_length_cm: 150.0,
//!         arm_b_length_cm: 150.0,
//!         top_slab_thickness_cm: 2.0,
//!         front_slab_thickness_cm: 2.0,
//!         front_overhang_cm: 3.0,
//!     },
//!     masonry_units: vec![MasonryUnit::Block7In],
//!     ..Default::default()
//! };
//!
//! let result = calculate(&input, &ReferenceData::default()).unwrap();
//! println!("Steps: {}", result.geometry.step_count);
//! println!("Blocks: {}", result.masonry.total_blocks);
//! println!("New slabs: {}", result.slabs.total_new_slabs);
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calculations::cut_list::format_placement;
use crate::calculations::geometry::{self, GeometryResult, StairMeasurements};
use crate::calculations::slabs::{self, SlabOptions, SlabResult};
use crate::calculations::courses::{self, CourseResult};
use crate::errors::{CalcError, CalcResult};
use crate::materials::{BrickOrientation, MasonryUnit};
use crate::tasks::{self, ReferenceData, TaskLineItem, TransportPlan};

/// Input for one L-shaped staircase.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Garden stair",
///   "measurements": {
///     "total_rise_cm": 90.0,
///     "step_height_cm": 18.0,
///     "tread_depth_cm": 30.0,
///     "arm_a_length_cm": 150.0,
///     "arm_b_length_cm": 150.0,
///     "top_slab_thickness_cm": 2.0,
///     "front_slab_thickness_cm": 2.0,
///     "front_overhang_cm": 3.0
///   },
///   "masonry_units": ["block-7in", "brick"],
///   "brick_orientation": "Flat",
///   "slabs": { "slab_size": "60x30", "slab_type": "granite", "gap_cm": 0.3 },
///   "transport": { "distance_m": 40.0 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LStairInput {
    /// User label (e.g., "Front entrance")
    #[serde(default)]
    pub label: String,

    pub measurements: StairMeasurements,

    /// Units to try, in order of preference. The first that fits a step wins.
    #[serde(default)]
    pub masonry_units: Vec<MasonryUnit>,

    /// Only matters when the brick is selected
    #[serde(default)]
    pub brick_orientation: BrickOrientation,

    #[serde(default)]
    pub slabs: SlabOptions,

    /// Transport from drop-off, when it should be costed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportPlan>,
}

impl LStairInput {
    /// Validate everything before any solver runs.
    pub fn validate(&self) -> CalcResult<()> {
        self.measurements.validate()?;
        if self.masonry_units.is_empty() {
            return Err(CalcError::NoMasonryUnitSelected);
        }
        self.slabs.validate()?;
        if let Some(plan) = &self.transport {
            if !plan.distance_m.value().is_finite() || plan.distance_m.value() < 0.0 {
                return Err(CalcError::invalid_input(
                    "distance_m",
                    plan.distance_m.value().to_string(),
                    "Distance must be zero or positive",
                ));
            }
        }
        Ok(())
    }
}

/// An aggregate material quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialQuantity {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

impl MaterialQuantity {
    fn new(name: impl Into<String>, amount: f64, unit: &str) -> Self {
        Self {
            name: name.into(),
            amount,
            unit: unit.to_string(),
        }
    }
}

/// Full estimate for one staircase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LStairResult {
    /// Steps, with burial depths filled in by the course pass
    pub geometry: GeometryResult,
    pub masonry: CourseResult,
    pub slabs: SlabResult,
    /// Shopping list
    pub materials: Vec<MaterialQuantity>,
    /// Labor lines
    pub tasks: Vec<TaskLineItem>,
    /// Sum of labor hours
    pub total_hours: f64,
}

impl LStairResult {
    /// Find a material line by name
    pub fn material(&self, name: &str) -> Option<&MaterialQuantity> {
        self.materials.iter().find(|m| m.name == name)
    }

    /// Human-readable cut list, one line per clad surface
    pub fn cut_list_lines(&self) -> Vec<String> {
        self.slabs.placements.iter().map(format_placement).collect()
    }

    /// Whether any step needs units cut on site
    pub fn needs_cutting(&self) -> bool {
        self.masonry.any_needs_cutting()
    }
}

/// Estimate materials and labor for an L-shaped staircase.
///
/// # Returns
///
/// * `Ok(LStairResult)` - Geometry, quantities and labor
/// * `Err(CalcError)` - Missing or invalid input, or a staircase that does not fit
pub fn calculate(input: &LStairInput, reference: &ReferenceData) -> CalcResult<LStairResult> {
    input.validate()?;
    let m = &input.measurements;

    let mut geometry = geometry::solve(m)?;
    let masonry = courses::solve(&geometry.steps, &input.masonry_units, input.brick_orientation)?;
    for (step, tally) in geometry.steps.iter_mut().zip(&masonry.steps) {
        step.buried_depth_cm = tally.buried_depth_cm;
    }

    let slabs = slabs::solve(
        &geometry.steps,
        m.top_slab_thickness_cm,
        m.front_slab_thickness_cm,
        &input.slabs,
    )?;

    let tasks = tasks::project(
        &masonry,
        &slabs,
        input.slabs.slab_type,
        input.transport.as_ref(),
        reference,
    );
    let total_hours = tasks::projection::total_hours(&tasks).value();

    let mut materials = Vec::new();
    for tally in &masonry.tallies {
        materials.push(MaterialQuantity::new(
            tally.unit.display_name(),
            tally.total_blocks as f64,
            "pcs",
        ));
    }
    materials.push(MaterialQuantity::new("Mortar", masonry.total_mortar_kg, "kg"));
    materials.push(MaterialQuantity::new(
        format!("Slab {} {}", input.slabs.slab_size, input.slabs.slab_type),
        slabs.total_new_slabs as f64,
        "pcs",
    ));
    materials.push(MaterialQuantity::new("Tile adhesive", slabs.adhesive_kg, "kg"));

    info!(
        label = %input.label,
        steps = geometry.step_count,
        blocks = masonry.total_blocks,
        slabs = slabs.total_new_slabs,
        hours = total_hours,
        "staircase estimated"
    );

    Ok(LStairResult {
        geometry,
        masonry,
        slabs,
        materials,
        tasks,
        total_hours,
    })
}
