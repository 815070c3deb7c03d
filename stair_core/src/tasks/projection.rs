//! Task-cost projection
//!
//! Maps the masonry and slab quantities of one staircase onto the task-rate
//! and carrier tables. A quantity without a matching rate is left out of the
//! result; the projection never fails.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::courses::CourseResult;
use crate::calculations::slabs::SlabResult;
use crate::materials::SlabType;
use crate::tasks::carriers::{Carrier, TransportMaterial, TransportPlan};
use crate::tasks::{ReferenceData, TaskRate, MIXING_TASK_NAME};
use crate::units::{Hours, SquareCentimeters, SquareMeters};

/// Mortar mixed per batch (kg)
pub const MORTAR_BATCH_KG: f64 = 125.0;

/// One labor line.
///
/// ## JSON Example
///
/// ```json
/// { "task": "Building steps with 7-inch block", "quantity": 58.0, "unit": "pcs", "hours": 11.6 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskLineItem {
    pub task: String,
    pub quantity: f64,
    pub unit: String,
    pub hours: f64,
}

impl TaskLineItem {
    fn from_rate(rate: &TaskRate, quantity: f64, unit: &str) -> Self {
        Self {
            task: rate.name.clone(),
            quantity,
            unit: if rate.unit.is_empty() { unit.to_string() } else { rate.unit.clone() },
            hours: quantity * rate.estimated_hours,
        }
    }
}

/// Sum of all line hours
pub fn total_hours(items: &[TaskLineItem]) -> Hours {
    items.iter().fold(Hours(0.0), |acc, item| acc + Hours(item.hours))
}

/// Labor lines for one staircase.
pub fn project(
    masonry: &CourseResult,
    slabs: &SlabResult,
    slab_type: SlabType,
    transport: Option<&TransportPlan>,
    reference: &ReferenceData,
) -> Vec<TaskLineItem> {
    let rates = &reference.task_rates;
    let mut items = Vec::new();

    for tally in &masonry.tallies {
        let name = format!("building steps with {}", tally.unit.display_name());
        match rates.find_exact(&name) {
            Some(rate) => items.push(TaskLineItem::from_rate(rate, tally.total_blocks as f64, "pcs")),
            None => debug!(task = %name, "no rate, line skipped"),
        }
    }

    for (&bucket, &count) in &slabs.cut_histogram {
        let name = format!("cutting {}cm {} slab", bucket, slab_type.display_name());
        match rates.find_prefix(&name) {
            Some(rate) => items.push(TaskLineItem::from_rate(rate, count as f64, "pcs")),
            None => debug!(task = %name, "no rate, line skipped"),
        }
    }

    let mut installation: Vec<TaskLineItem> = Vec::new();
    for bucket in &slabs.installation_histogram {
        let Some(rate) = rates.nearest_installation(bucket.long_cm as f64, bucket.short_cm as f64) else {
            debug!(long_cm = bucket.long_cm, short_cm = bucket.short_cm, "no installation rate, line skipped");
            continue;
        };
        let quantity = if rate.is_per_area() {
            let area = SquareCentimeters((bucket.long_cm * bucket.short_cm * bucket.count) as f64);
            SquareMeters::from(area).value()
        } else {
            bucket.count as f64
        };
        let line = TaskLineItem::from_rate(rate, quantity, "pcs");
        match installation.iter_mut().find(|l| l.task == line.task) {
            Some(existing) => {
                existing.quantity += line.quantity;
                existing.hours += line.hours;
            }
            None => installation.push(line),
        }
    }
    items.extend(installation);

    if masonry.total_mortar_kg > 0.0 {
        match rates.find_exact(MIXING_TASK_NAME) {
            Some(rate) => {
                let batches = (masonry.total_mortar_kg / MORTAR_BATCH_KG).ceil();
                items.push(TaskLineItem::from_rate(rate, batches, "batch"));
            }
            None => debug!(task = MIXING_TASK_NAME, "no rate, line skipped"),
        }
    }

    if let Some(plan) = transport {
        items.extend(transport_lines(masonry, slabs, plan, reference));
    }

    items
}

fn transport_lines(
    masonry: &CourseResult,
    slabs: &SlabResult,
    plan: &TransportPlan,
    reference: &ReferenceData,
) -> Vec<TaskLineItem> {
    let fallback = Carrier::wheelbarrow();
    let carrier = match plan.carrier_tonnage {
        Some(tonnage) => reference.carriers.find(tonnage).unwrap_or_else(|| {
            warn!(tonnage, "carrier not in table, using wheelbarrow");
            &fallback
        }),
        None => &fallback,
    };

    TransportMaterial::ALL
        .iter()
        .filter_map(|&material| {
            let amount = match material {
                TransportMaterial::Blocks => masonry.total_blocks as f64,
                TransportMaterial::Slabs => slabs.total_new_slabs as f64,
                TransportMaterial::Mortar => masonry.total_mortar_kg,
                TransportMaterial::Adhesive => slabs.adhesive_kg,
            };
            if amount <= 0.0 {
                return None;
            }
            let Some(trips) = carrier.trips(material, amount) else {
                debug!(carrier = %carrier.name, %material, "carrier cannot move material, line skipped");
                return None;
            };
            Some(TaskLineItem {
                task: format!("transport {} ({})", material, carrier.name),
                quantity: trips as f64,
                unit: "trips".to_string(),
                hours: carrier.travel_hours(trips, plan.distance_m),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::courses;
    use crate::calculations::fixtures::sample_steps;
    use crate::calculations::slabs::{self, SlabOptions};
    use crate::materials::{BrickOrientation, MasonryUnit};
    use crate::tasks::carriers::CarrierTable;
    use crate::tasks::test_support::{rate, sample_rates};
    use crate::tasks::TaskRateTable;
    use crate::units::Meters;

    fn quantities() -> (CourseResult, SlabResult) {
        let steps = sample_steps();
        let masonry = courses::solve(&steps, &[MasonryUnit::Block7In], BrickOrientation::Flat).unwrap();
        let slab = slabs::solve(&steps, 2.0, 2.0, &SlabOptions::default()).unwrap();
        (masonry, slab)
    }

    fn reference() -> ReferenceData {
        ReferenceData {
            task_rates: sample_rates(),
            carriers: CarrierTable::default(),
        }
    }

    #[test]
    fn test_building_line() {
        let (masonry, slab) = quantities();
        let items = project(&masonry, &slab, SlabType::Porcelain, None, &reference());
        let building = items
            .iter()
            .find(|i| i.task == "Building steps with 7-inch block")
            .unwrap();
        assert_eq!(building.quantity, masonry.total_blocks as f64);
        assert!((building.hours - masonry.total_blocks as f64 * 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_mixing_batches() {
        let (masonry, slab) = quantities();
        let items = project(&masonry, &slab, SlabType::Porcelain, None, &reference());
        let mixing = items.iter().find(|i| i.task == "Mixing mortar").unwrap();
        assert_eq!(mixing.quantity, (masonry.total_mortar_kg / 125.0).ceil());
        assert_eq!(mixing.unit, "batch");
    }

    #[test]
    fn test_cutting_lines_follow_histogram() {
        let (masonry, slab) = quantities();
        let items = project(&masonry, &slab, SlabType::Porcelain, None, &reference());
        let cut_30 = slab.cut_histogram.get(&30).copied().unwrap_or(0);
        let line = items.iter().find(|i| i.task == "Cutting 30cm porcelain slab");
        if cut_30 > 0 {
            assert_eq!(line.unwrap().quantity, cut_30 as f64);
        } else {
            assert!(line.is_none());
        }
        // no granite rates in the table
        let granite = project(&masonry, &slab, SlabType::Granite, None, &reference());
        assert!(granite.iter().all(|i| !i.task.to_lowercase().starts_with("cutting")));
    }

    #[test]
    fn test_installation_lines_merge() {
        let (masonry, slab) = quantities();
        let items = project(&masonry, &slab, SlabType::Porcelain, None, &reference());
        let installs: Vec<&TaskLineItem> = items
            .iter()
            .filter(|i| i.task.starts_with("Tile installation"))
            .collect();
        let mut names: Vec<&str> = installs.iter().map(|i| i.task.as_str()).collect();
        names.dedup();
        assert_eq!(names.len(), installs.len());
        let pieces: u32 = slab.installation_histogram.iter().map(|b| b.count).sum();
        let counted: f64 = installs.iter().map(|i| i.quantity).sum();
        assert_eq!(counted, pieces as f64);
    }

    #[test]
    fn test_installation_per_area() {
        let (masonry, slab) = quantities();
        let reference = ReferenceData {
            task_rates: TaskRateTable::new(vec![rate("tile installation 60x30", "m2", 1.0)]),
            carriers: CarrierTable::default(),
        };
        let items = project(&masonry, &slab, SlabType::Porcelain, None, &reference);
        assert_eq!(items.len(), 1);
        let expected: f64 = slab
            .installation_histogram
            .iter()
            .map(|b| (b.long_cm * b.short_cm * b.count) as f64 / 10_000.0)
            .sum();
        assert!((items[0].quantity - expected).abs() < 1e-9);
    }

    #[test]
    fn test_empty_table_gives_no_lines() {
        let (masonry, slab) = quantities();
        let items = project(&masonry, &slab, SlabType::Porcelain, None, &ReferenceData::default());
        assert!(items.is_empty());
        assert_eq!(total_hours(&items).value(), 0.0);
    }

    #[test]
    fn test_transport_defaults_to_wheelbarrow() {
        let (masonry, slab) = quantities();
        let plan = TransportPlan {
            distance_m: Meters(30.0),
            carrier_tonnage: Some(7.5),
        };
        let items = project(&masonry, &slab, SlabType::Porcelain, Some(&plan), &ReferenceData::default());
        let blocks = items.iter().find(|i| i.task == "transport blocks (wheelbarrow)").unwrap();
        let trips = (masonry.total_blocks as f64 / 4.0).ceil();
        assert_eq!(blocks.quantity, trips);
        assert!((blocks.hours - trips * 2.0 * 0.03 / 3.0).abs() < 1e-9);
        assert_eq!(items.len(), 4);
    }

    #[test]
    fn test_transport_uses_table_carrier() {
        let (masonry, slab) = quantities();
        let dumper = Carrier {
            name: "mini dumper".to_string(),
            tonnage: 0.5,
            speed_kmh: 6.0,
            capacities: std::collections::BTreeMap::from([
                (TransportMaterial::Blocks, 20.0),
                (TransportMaterial::Slabs, 8.0),
                (TransportMaterial::Mortar, 400.0),
            ]),
        };
        let reference = ReferenceData {
            task_rates: TaskRateTable::default(),
            carriers: CarrierTable::new(vec![Carrier::wheelbarrow(), dumper]),
        };
        let plan = TransportPlan {
            distance_m: Meters(40.0),
            carrier_tonnage: Some(0.5),
        };
        let items = project(&masonry, &slab, SlabType::Porcelain, Some(&plan), &reference);

        let blocks = items.iter().find(|i| i.task == "transport blocks (mini dumper)").unwrap();
        let trips = (masonry.total_blocks as f64 / 20.0).ceil();
        assert_eq!(blocks.quantity, trips);
        assert_eq!(blocks.unit, "trips");
        assert!((blocks.hours - trips * 2.0 * 0.04 / 6.0).abs() < 1e-9);

        let slabs_line = items.iter().find(|i| i.task == "transport slabs (mini dumper)").unwrap();
        assert_eq!(slabs_line.quantity, (slab.total_new_slabs as f64 / 8.0).ceil());

        // no adhesive capacity, so that line is skipped rather than falling back
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| i.task.ends_with("(mini dumper)")));
    }

    #[test]
    fn test_total_hours() {
        let (masonry, slab) = quantities();
        let items = project(&masonry, &slab, SlabType::Porcelain, None, &reference());
        let sum: f64 = items.iter().map(|i| i.hours).sum();
        assert!((total_hours(&items).value() - sum).abs() < 1e-9);
    }
}
