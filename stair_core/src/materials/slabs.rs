//! Finish Slabs
//!
//! Standard slab sizes for cladding treads and risers, plus the slab
//! materials used when naming cutting tasks.
//!
//! Sizes are given as long x short side in cm. During tiling the long side
//! runs along the arm (the tiling pitch) and the short side spans the tread or
//! riser depth.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Standard slab size designation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SlabSize {
    /// 90 x 60 cm
    #[serde(rename = "90x60")]
    S90x60,
    /// 60 x 60 cm
    #[serde(rename = "60x60")]
    S60x60,
    /// 60 x 30 cm
    #[default]
    #[serde(rename = "60x30")]
    S60x30,
    /// 30 x 30 cm
    #[serde(rename = "30x30")]
    S30x30,
}

impl SlabSize {
    /// All slab sizes for UI selection
    pub const ALL: [SlabSize; 4] = [SlabSize::S90x60, SlabSize::S60x60, SlabSize::S60x30, SlabSize::S30x30];

    /// Returns (long_side_cm, short_side_cm)
    pub fn dimensions_cm(&self) -> (f64, f64) {
        match self {
            SlabSize::S90x60 => (90.0, 60.0),
            SlabSize::S60x60 => (60.0, 60.0),
            SlabSize::S60x30 => (60.0, 30.0),
            SlabSize::S30x30 => (30.0, 30.0),
        }
    }

    /// Face area of one slab in cm²
    pub fn area_cm2(&self) -> f64 {
        let (long, short) = self.dimensions_cm();
        long * short
    }

    /// Parse "90x60", "90×60" or "90 x 60"
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let normalized: String = s
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == '×' || c == '*' { 'x' } else { c })
            .collect();
        match normalized.as_str() {
            "90x60" | "60x90" => Ok(SlabSize::S90x60),
            "60x60" => Ok(SlabSize::S60x60),
            "60x30" | "30x60" => Ok(SlabSize::S60x30),
            "30x30" => Ok(SlabSize::S30x30),
            _ => Err(CalcError::material_not_found(s)),
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            SlabSize::S90x60 => "90×60",
            SlabSize::S60x60 => "60×60",
            SlabSize::S60x30 => "60×30",
            SlabSize::S30x30 => "30×30",
        }
    }
}

impl std::fmt::Display for SlabSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Slab material, used in "cutting <size>cm <type> slab" task names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlabType {
    #[default]
    Porcelain,
    Granite,
    Sandstone,
}

impl SlabType {
    /// All slab types for UI selection
    pub const ALL: [SlabType; 3] = [SlabType::Porcelain, SlabType::Granite, SlabType::Sandstone];

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            SlabType::Porcelain => "porcelain",
            SlabType::Granite => "granite",
            SlabType::Sandstone => "sandstone",
        }
    }
}

impl std::fmt::Display for SlabType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
