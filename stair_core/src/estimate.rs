//! # Estimate Files
//!
//! The `EstimateFile` struct is the root container for a job's staircases.
//! Estimates serialize to `.stw` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! EstimateFile
//! ├── meta: EstimateMetadata (version, estimator, job info, timestamps)
//! ├── settings: EstimateSettings (defaults for new staircases)
//! ├── reference: ReferenceData (task rates, carriers)
//! └── items: HashMap<Uuid, CalculationItem> (all staircases)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use stair_core::estimate::EstimateFile;
//!
//! let estimate = EstimateFile::new("Dana Estimator", "26-014", "Hillside Villas");
//! let json = serde_json::to_string_pretty(&estimate).unwrap();
//! assert!(json.contains("26-014"));
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::geometry::StairMeasurements;
use crate::calculations::l_stair::{self, LStairInput, LStairResult};
use crate::calculations::slabs::SlabOptions;
use crate::calculations::CalculationItem;
use crate::errors::CalcResult;
use crate::materials::{BrickOrientation, MasonryUnit};
use crate::tasks::ReferenceData;

/// Current schema version for .stw files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root estimate container.
///
/// Items are stored in a flat UUID-keyed map; listing sorts by label so
/// reports come out in a stable order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateFile {
    pub meta: EstimateMetadata,

    #[serde(default)]
    pub settings: EstimateSettings,

    /// Task rates and carriers every item is costed against
    #[serde(default)]
    pub reference: ReferenceData,

    pub items: HashMap<Uuid, CalculationItem>,
}

impl EstimateFile {
    /// Create a new empty estimate.
    ///
    /// # Arguments
    ///
    /// * `estimator` - Name of the person preparing the estimate
    /// * `job_id` - Job number (e.g., "26-001")
    /// * `client` - Client name
    pub fn new(estimator: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        EstimateFile {
            meta: EstimateMetadata {
                version: SCHEMA_VERSION.to_string(),
                estimator: estimator.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: EstimateSettings::default(),
            reference: ReferenceData::default(),
            items: HashMap::new(),
        }
    }

    /// Add an item, returning its new UUID
    pub fn add_item(&mut self, item: CalculationItem) -> Uuid {
        let id = Uuid::new_v4();
        self.items.insert(id, item);
        self.touch();
        id
    }

    /// Remove an item by UUID.
    pub fn remove_item(&mut self, id: &Uuid) -> Option<CalculationItem> {
        let item = self.items.remove(id);
        if item.is_some() {
            self.touch();
        }
        item
    }

    pub fn get_item(&self, id: &Uuid) -> Option<&CalculationItem> {
        self.items.get(id)
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// A new staircase input carrying this estimate's defaults
    pub fn new_stair(&self, label: impl Into<String>, measurements: StairMeasurements) -> LStairInput {
        LStairInput {
            label: label.into(),
            measurements,
            masonry_units: self.settings.masonry_units.clone(),
            brick_orientation: self.settings.brick_orientation,
            slabs: self.settings.slabs,
            transport: None,
        }
    }

    /// Items sorted by label, then id
    pub fn sorted_items(&self) -> Vec<(Uuid, &CalculationItem)> {
        let mut items: Vec<(Uuid, &CalculationItem)> = self.items.iter().map(|(id, item)| (*id, item)).collect();
        items.sort_by(|(a_id, a), (b_id, b)| a.label().cmp(b.label()).then(a_id.cmp(b_id)));
        items
    }

    /// Run every item against the estimate's reference data.
    ///
    /// A failing item does not stop the others.
    pub fn calculate_all(&self) -> Vec<(Uuid, String, CalcResult<LStairResult>)> {
        self.sorted_items()
            .into_iter()
            .map(|(id, item)| {
                let result = match item {
                    CalculationItem::LStair(input) => l_stair::calculate(input, &self.reference),
                };
                (id, item.label().to_string(), result)
            })
            .collect()
    }
}

impl Default for EstimateFile {
    fn default() -> Self {
        EstimateFile::new("", "", "")
    }
}

/// Estimate metadata stored in the file header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Person preparing the estimate
    pub estimator: String,

    /// Job number
    pub job_id: String,

    /// Client name
    pub client: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

/// Defaults applied to new staircases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateSettings {
    /// Masonry units to try, in order
    pub masonry_units: Vec<MasonryUnit>,

    pub brick_orientation: BrickOrientation,

    /// Slab size, type, gap, cut policy and corner joint
    pub slabs: SlabOptions,
}

impl Default for EstimateSettings {
    fn default() -> Self {
        EstimateSettings {
            masonry_units: vec![MasonryUnit::Block7In, MasonryUnit::Block6In, MasonryUnit::Brick],
            brick_orientation: BrickOrientation::default(),
            slabs: SlabOptions::default(),
        }
    }
}
