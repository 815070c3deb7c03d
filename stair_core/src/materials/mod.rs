//! # Materials Catalog
//!
//! Compile-time material catalogs for staircase estimates. These are fixed
//! reference data, not user-editable tables.
//!
//! ## Material Types
//!
//! - **Masonry units**: blocks and brick used to course each step riser
//! - **Slabs**: finish slabs for treads (tops) and risers (fronts)
//!
//! ## Example
//!
//! ```rust
//! use stair_core::materials::{BrickOrientation, MasonryUnit, SlabSize};
//!
//! let unit = MasonryUnit::Block7In;
//! assert_eq!(unit.laid_height_cm(BrickOrientation::Flat), 17.0);
//!
//! let (long, short) = SlabSize::S90x60.dimensions_cm();
//! assert_eq!((long, short), (90.0, 60.0));
//! ```

pub mod masonry;
pub mod slabs;

pub use masonry::{BrickOrientation, MasonryUnit};
pub use slabs::{SlabSize, SlabType};

/// Mortar used per laid masonry unit, before the mixing factor (kg)
pub const MORTAR_KG_PER_UNIT: f64 = 0.5;

/// Mixing factor applied to the per-unit joint mortar
pub const MORTAR_MIX_FACTOR: f64 = 3.0;

/// Density of the concrete fill poured behind the risers (kg/m³)
pub const FILL_DENSITY_KG_PER_M3: f64 = 1600.0;

/// Tile adhesive consumption per m² of clad surface (kg/m²)
pub const ADHESIVE_KG_PER_M2: f64 = 5.0;

/// Nominal mortar joint between units (cm)
pub const NOMINAL_JOINT_CM: f64 = 1.0;

/// Combined bed joint allowance below the first and above the last course (cm)
pub const BASE_JOINT_ALLOWANCE_CM: f64 = 2.0;
