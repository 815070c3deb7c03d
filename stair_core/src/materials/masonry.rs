//! Masonry Units
//!
//! Built-in catalog of the units a step riser can be coursed with. Blocks are
//! always laid flat, so their course height is the width dimension. The brick
//! can be laid flat or on edge.
//!
//! ## Dimensions (H x W x L, cm)
//!
//! - 6-inch block: 19 x 14 x 39
//! - 7-inch block: 19 x 17 x 39
//! - brick: 6.5 x 12 x 25

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Masonry unit catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MasonryUnit {
    /// 6-inch concrete block (19 x 14 x 39 cm)
    #[serde(rename = "block-6in")]
    Block6In,
    /// 7-inch concrete block (19 x 17 x 39 cm)
    #[serde(rename = "block-7in")]
    Block7In,
    /// Solid clay brick (6.5 x 12 x 25 cm)
    #[serde(rename = "brick")]
    Brick,
}

impl MasonryUnit {
    /// All masonry units for UI selection
    pub const ALL: [MasonryUnit; 3] = [MasonryUnit::Block6In, MasonryUnit::Block7In, MasonryUnit::Brick];

    /// External dimensions (height, width, length) in cm
    pub fn dimensions_cm(&self) -> (f64, f64, f64) {
        match self {
            MasonryUnit::Block6In => (19.0, 14.0, 39.0),
            MasonryUnit::Block7In => (19.0, 17.0, 39.0),
            MasonryUnit::Brick => (6.5, 12.0, 25.0),
        }
    }

    /// Unit length in cm (the dimension running along an arm)
    pub fn length_cm(&self) -> f64 {
        self.dimensions_cm().2
    }

    /// Height of one course of this unit.
    ///
    /// Blocks lie flat, so a course is as tall as the block is wide. The brick
    /// follows the requested orientation.
    pub fn laid_height_cm(&self, brick_orientation: BrickOrientation) -> f64 {
        let (height, width, _) = self.dimensions_cm();
        match self {
            MasonryUnit::Brick => match brick_orientation {
                BrickOrientation::Flat => height,
                BrickOrientation::OnEdge => width,
            },
            _ => width,
        }
    }

    /// Whether the unit can be laid in more than one orientation
    pub fn has_orientations(&self) -> bool {
        matches!(self, MasonryUnit::Brick)
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.to_lowercase().replace([' ', '_'], "-").as_str() {
            "block-6in" | "6-inch-block" | "6in" | "block6" => Ok(MasonryUnit::Block6In),
            "block-7in" | "7-inch-block" | "7in" | "block7" => Ok(MasonryUnit::Block7In),
            "brick" => Ok(MasonryUnit::Brick),
            _ => Err(CalcError::material_not_found(s)),
        }
    }

    /// Get display name (also used to match "building steps with ..." tasks)
    pub fn display_name(&self) -> &'static str {
        match self {
            MasonryUnit::Block6In => "6-inch block",
            MasonryUnit::Block7In => "7-inch block",
            MasonryUnit::Brick => "brick",
        }
    }
}

impl std::fmt::Display for MasonryUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// How the brick is laid in a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BrickOrientation {
    /// Bed face down, course height = brick height
    #[default]
    Flat,
    /// Stretcher face down, course height = brick width
    OnEdge,
}
