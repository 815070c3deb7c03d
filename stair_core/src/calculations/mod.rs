//! # Staircase Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Result` - Calculation results (JSON-serializable)
//! - `calculate(input, ...) -> Result<*Result, CalcError>` - Pure calculation function
//!
//! ## Passes
//!
//! - [`geometry`] - Step count, step height and arm lengths per step
//! - [`courses`] - Masonry unit, courses and joints per step; blocks and mortar
//! - [`slabs`] - Slab tiling, offcut reuse, cuts and adhesive
//! - [`cut_list`] - Readable cut lists from placed pieces
//! - [`l_stair`] - The full L-shaped staircase estimate

pub mod courses;
pub mod cut_list;
pub mod geometry;
pub mod l_stair;
pub mod slabs;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use courses::{CourseFit, CourseResult, MaterialTally, StepTally};
pub use geometry::{Arm, GeometryResult, StairMeasurements, StepGeometry};
pub use l_stair::{LStairInput, LStairResult, MaterialQuantity};
pub use slabs::{CornerJoint, CutPolicy, FrontLayout, SlabOptions, SlabPlacement, SlabResult, WastePiece};

/// Enum wrapper for all calculation types.
///
/// Lets an estimate file hold different calculations in one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationItem {
    /// L-shaped staircase
    LStair(LStairInput),
}

impl CalculationItem {
    /// Get the user-provided label for this calculation
    pub fn label(&self) -> &str {
        match self {
            CalculationItem::LStair(s) => &s.label,
        }
    }

    /// Get the calculation type as a string
    pub fn calc_type(&self) -> &'static str {
        match self {
            CalculationItem::LStair(_) => "L-Stair",
        }
    }
}
