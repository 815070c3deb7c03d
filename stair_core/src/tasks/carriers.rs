//! Carriers
//!
//! Equipment that moves material from the drop-off point to the staircase.
//! Each carrier has a speed and a per-trip capacity for every material it can
//! carry. When no carrier is chosen, or the chosen tonnage is not in the
//! table, material goes by wheelbarrow.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::units::Meters;

/// Material kinds with their own carrying capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMaterial {
    /// Masonry units, counted in pieces
    Blocks,
    /// Finish slabs, counted in pieces
    Slabs,
    /// Mortar, in kg
    Mortar,
    /// Tile adhesive, in kg
    Adhesive,
}

impl TransportMaterial {
    pub const ALL: [TransportMaterial; 4] = [
        TransportMaterial::Blocks,
        TransportMaterial::Slabs,
        TransportMaterial::Mortar,
        TransportMaterial::Adhesive,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            TransportMaterial::Blocks => "blocks",
            TransportMaterial::Slabs => "slabs",
            TransportMaterial::Mortar => "mortar",
            TransportMaterial::Adhesive => "adhesive",
        }
    }
}

impl std::fmt::Display for TransportMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One row of the carrier table.
///
/// ## JSON Example
///
/// ```json
/// {
///   "name": "mini dumper",
///   "tonnage": 0.5,
///   "speed_kmh": 4.0,
///   "capacities": { "blocks": 20, "slabs": 8, "mortar": 400, "adhesive": 300 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    pub name: String,
    /// Rated load in tonnes, used as the lookup key
    pub tonnage: f64,
    pub speed_kmh: f64,
    /// Amount carried per trip (pieces or kg)
    #[serde(default)]
    pub capacities: BTreeMap<TransportMaterial, f64>,
}

impl Carrier {
    /// The fallback carrier
    pub fn wheelbarrow() -> Self {
        Self {
            name: "wheelbarrow".to_string(),
            tonnage: 0.1,
            speed_kmh: 3.0,
            capacities: BTreeMap::from([
                (TransportMaterial::Blocks, 4.0),
                (TransportMaterial::Slabs, 2.0),
                (TransportMaterial::Mortar, 80.0),
                (TransportMaterial::Adhesive, 75.0),
            ]),
        }
    }

    /// Per-trip capacity, if this carrier can move the material
    pub fn capacity(&self, material: TransportMaterial) -> Option<f64> {
        self.capacities.get(&material).copied().filter(|c| *c > 0.0)
    }

    /// Round trips needed for `amount`
    pub fn trips(&self, material: TransportMaterial, amount: f64) -> Option<u32> {
        let capacity = self.capacity(material)?;
        Some((amount / capacity).ceil() as u32)
    }

    /// Hours spent on `trips` round trips over `distance`
    pub fn travel_hours(&self, trips: u32, distance: Meters) -> f64 {
        if self.speed_kmh <= 0.0 {
            return 0.0;
        }
        trips as f64 * 2.0 * (distance.value() / 1000.0) / self.speed_kmh
    }
}

/// The carrier table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarrierTable(pub Vec<Carrier>);

impl CarrierTable {
    pub fn new(carriers: Vec<Carrier>) -> Self {
        Self(carriers)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Carrier rated at `tonnage`
    pub fn find(&self, tonnage: f64) -> Option<&Carrier> {
        self.0.iter().find(|c| (c.tonnage - tonnage).abs() < 1e-6)
    }
}

/// Transport request for one staircase.
///
/// ## JSON Example
///
/// ```json
/// { "distance_m": 40.0, "carrier_tonnage": 0.5 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransportPlan {
    /// One-way distance from drop-off to the stair
    pub distance_m: Meters,
    /// Chosen carrier; wheelbarrow when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_tonnage: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheelbarrow_trips() {
        let barrow = Carrier::wheelbarrow();
        assert_eq!(barrow.trips(TransportMaterial::Blocks, 30.0), Some(8));
        assert_eq!(barrow.trips(TransportMaterial::Mortar, 80.0), Some(1));
        assert_eq!(barrow.trips(TransportMaterial::Mortar, 80.5), Some(2));
    }

    #[test]
    fn test_travel_hours() {
        let barrow = Carrier::wheelbarrow();
        // 10 trips x 2 x 0.15 km / 3 km/h = 1 h
        let hours = barrow.travel_hours(10, Meters(150.0));
        assert!((hours - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_capacity() {
        let dumper = Carrier {
            name: "dumper".to_string(),
            tonnage: 1.0,
            speed_kmh: 5.0,
            capacities: BTreeMap::from([(TransportMaterial::Blocks, 40.0)]),
        };
        assert!(dumper.trips(TransportMaterial::Slabs, 10.0).is_none());
    }

    #[test]
    fn test_table_lookup_and_json() {
        let json = r#"[
            { "name": "mini dumper", "tonnage": 0.5, "speed_kmh": 4.0,
              "capacities": { "blocks": 20, "mortar": 400 } }
        ]"#;
        let table: CarrierTable = serde_json::from_str(json).unwrap();
        let dumper = table.find(0.5).unwrap();
        assert_eq!(dumper.capacity(TransportMaterial::Mortar), Some(400.0));
        assert!(table.find(2.0).is_none());
    }
}
