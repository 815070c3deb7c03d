//! # Unit Types
//!
//! Type-safe wrappers for the quantities a staircase estimate moves around.
//! These provide compile-time safety against unit confusion while remaining
//! lightweight (just f64 wrappers).
//!
//! ## Metric Units
//!
//! All measurements are taken on site in centimeters, so the solvers work in
//! centimeters internally and convert only when reporting:
//! - Length: centimeters (cm), meters (m)
//! - Area: square centimeters (cm²), square meters (m²)
//! - Volume: cubic centimeters (cm³), cubic meters (m³)
//! - Mass: kilograms (kg)
//! - Labor: hours (h)
//!
//! ## Example
//!
//! ```rust
//! use stair_core::units::{SquareCentimeters, SquareMeters};
//!
//! let tread = SquareCentimeters(120.0 * 30.0);
//! let m2: SquareMeters = tread.into();
//! assert!((m2.0 - 0.36).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Length Units
// ============================================================================

/// Length in centimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Centimeters(pub f64);

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

impl From<Meters> for Centimeters {
    fn from(m: Meters) -> Self {
        Centimeters(m.0 * 100.0)
    }
}

impl From<Centimeters> for Meters {
    fn from(cm: Centimeters) -> Self {
        Meters(cm.0 / 100.0)
    }
}

// ============================================================================
// Area Units
// ============================================================================

/// Area in square centimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareCentimeters(pub f64);

/// Area in square meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareMeters(pub f64);

impl From<SquareMeters> for SquareCentimeters {
    fn from(m2: SquareMeters) -> Self {
        SquareCentimeters(m2.0 * 10_000.0)
    }
}

impl From<SquareCentimeters> for SquareMeters {
    fn from(cm2: SquareCentimeters) -> Self {
        SquareMeters(cm2.0 / 10_000.0)
    }
}

// ============================================================================
// Volume Units
// ============================================================================

/// Volume in cubic centimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CubicCentimeters(pub f64);

/// Volume in cubic meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CubicMeters(pub f64);

impl From<CubicMeters> for CubicCentimeters {
    fn from(m3: CubicMeters) -> Self {
        CubicCentimeters(m3.0 * 1_000_000.0)
    }
}

impl From<CubicCentimeters> for CubicMeters {
    fn from(cm3: CubicCentimeters) -> Self {
        CubicMeters(cm3.0 / 1_000_000.0)
    }
}

impl CubicMeters {
    /// Mass of this volume at the given density (kg/m³)
    pub fn mass_at(self, density_kg_per_m3: f64) -> Kilograms {
        Kilograms(self.0 * density_kg_per_m3)
    }
}

// ============================================================================
// Mass and Labor
// ============================================================================

/// Mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilograms(pub f64);

/// Labor time in hours
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hours(pub f64);

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Centimeters);
impl_arithmetic!(Meters);
impl_arithmetic!(SquareCentimeters);
impl_arithmetic!(SquareMeters);
impl_arithmetic!(CubicCentimeters);
impl_arithmetic!(CubicMeters);
impl_arithmetic!(Kilograms);
impl_arithmetic!(Hours);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centimeters_to_meters() {
        let cm = Centimeters(250.0);
        let m: Meters = cm.into();
        assert_eq!(m.0, 2.5);
    }

    #[test]
    fn test_area_conversion() {
        let cm2 = SquareCentimeters(90.0 * 60.0);
        let m2: SquareMeters = cm2.into();
        assert!((m2.0 - 0.54).abs() < 1e-12);
    }

    #[test]
    fn test_volume_to_mass() {
        let cm3 = CubicCentimeters(1_000_000.0);
        let m3: CubicMeters = cm3.into();
        assert_eq!(m3.mass_at(1600.0), Kilograms(1600.0));
    }

    #[test]
    fn test_arithmetic() {
        let a = Kilograms(10.0);
        let b = Kilograms(5.0);
        assert_eq!((a + b).0, 15.0);
        assert_eq!((a - b).0, 5.0);
        assert_eq!((a * 2.0).0, 20.0);
        assert_eq!((a / 2.0).0, 5.0);
    }

    #[test]
    fn test_serialization() {
        let h = Hours(12.5);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, "12.5");

        let roundtrip: Hours = serde_json::from_str(&json).unwrap();
        assert_eq!(h, roundtrip);
    }
}
