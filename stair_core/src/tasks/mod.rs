//! # Labor Tasks
//!
//! Reference tables consulted when turning material quantities into labor
//! hours. Both tables are read-only inputs; an empty table is valid and simply
//! produces no line items.
//!
//! ## Task Names
//!
//! Rates are matched by name, ignoring case and repeated whitespace:
//!
//! - `building steps with <unit>` (exact), per masonry unit
//! - `cutting <size>cm <slab type> slab` (prefix), per cut
//! - `tile installation ... <W>x<L>` (nearest size), per piece or per m²
//! - `mixing mortar` (exact), per 125 kg batch
//!
//! ## JSON Example
//!
//! ```json
//! [
//!   { "name": "building steps with 7-inch block", "unit": "pcs", "estimated_hours": 0.12 },
//!   { "name": "cutting 30cm porcelain slab", "unit": "pcs", "estimated_hours": 0.05 },
//!   { "name": "tile installation 60x30", "unit": "pcs", "estimated_hours": 0.25 },
//!   { "name": "mixing mortar", "unit": "batch", "estimated_hours": 0.5 }
//! ]
//! ```

pub mod carriers;
pub mod projection;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use carriers::{Carrier, CarrierTable, TransportMaterial, TransportPlan};
pub use projection::{project, TaskLineItem};

/// Name prefix of installation tasks
pub const INSTALLATION_TASK_PREFIX: &str = "tile installation";

/// Name of the mortar mixing task
pub const MIXING_TASK_NAME: &str = "mixing mortar";

static INSTALLATION_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*[x×]\s*(\d+(?:\.\d+)?)").expect("valid installation size pattern")
});

/// Lowercase and collapse whitespace for name comparison
pub fn normalize_task_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Parse the `WxL` size out of an installation task name
pub fn parse_installation_size(name: &str) -> Option<(f64, f64)> {
    let caps = INSTALLATION_SIZE.captures(name)?;
    let w: f64 = caps.get(1)?.as_str().parse().ok()?;
    let l: f64 = caps.get(2)?.as_str().parse().ok()?;
    Some((w, l))
}

/// One row of the task-rate table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRate {
    pub name: String,
    /// Unit the rate is given per, e.g. "pcs", "m2", "batch"
    #[serde(default)]
    pub unit: String,
    /// Hours per unit
    pub estimated_hours: f64,
}

impl TaskRate {
    /// Whether the rate is per square meter
    pub fn is_per_area(&self) -> bool {
        matches!(self.unit.trim().to_lowercase().as_str(), "m2" | "m²" | "sqm")
    }
}

/// The task-rate table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskRateTable(pub Vec<TaskRate>);

impl TaskRateTable {
    pub fn new(rates: Vec<TaskRate>) -> Self {
        Self(rates)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskRate> {
        self.0.iter()
    }

    /// First rate whose name equals `name`
    pub fn find_exact(&self, name: &str) -> Option<&TaskRate> {
        let wanted = normalize_task_name(name);
        self.0.iter().find(|r| normalize_task_name(&r.name) == wanted)
    }

    /// First rate whose name starts with `prefix`
    pub fn find_prefix(&self, prefix: &str) -> Option<&TaskRate> {
        let wanted = normalize_task_name(prefix);
        self.0.iter().find(|r| normalize_task_name(&r.name).starts_with(&wanted))
    }

    /// Installation rate whose size is nearest to `long x short`.
    ///
    /// Sizes compare with the long side first, so `30x60` and `60x30` are the
    /// same task. Ties keep the earlier row.
    pub fn nearest_installation(&self, long_cm: f64, short_cm: f64) -> Option<&TaskRate> {
        self.0
            .iter()
            .filter(|r| normalize_task_name(&r.name).starts_with(INSTALLATION_TASK_PREFIX))
            .filter_map(|r| {
                let (w, l) = parse_installation_size(&r.name)?;
                let distance = (w.max(l) - long_cm).hypot(w.min(l) - short_cm);
                Some((r, distance))
            })
            .fold(None, |best: Option<(&TaskRate, f64)>, (r, d)| match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((r, d)),
            })
            .map(|(r, _)| r)
    }
}

/// Read-only reference data a projection runs against.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
    pub task_rates: TaskRateTable,
    pub carriers: CarrierTable,
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_parse_installation_size() {
        assert_eq!(parse_installation_size("tile installation 60x30"), Some((60.0, 30.0)));
        assert_eq!(parse_installation_size("Tile installation (90 × 60 cm)"), Some((90.0, 60.0)));
        assert_eq!(parse_installation_size("tile installation small"), None);
    }

    #[test]
    fn test_exact_match_ignores_case_and_spacing() {
        let table = sample_rates();
        assert!(table.find_exact("building steps with 7-inch  block").is_some());
        assert!(table.find_exact("building steps with 7-inch").is_none());
        assert!(table.find_exact("MIXING MORTAR").is_some());
    }

    #[test]
    fn test_prefix_match() {
        let table = sample_rates();
        let r = table.find_prefix("cutting 90cm porcelain slab").unwrap();
        assert_eq!(r.estimated_hours, 0.2);
        assert!(table.find_prefix("cutting 120cm porcelain slab").is_none());
        assert!(table.find_prefix("cutting 30cm granite slab").is_none());
    }

    #[test]
    fn test_nearest_installation() {
        let table = sample_rates();
        assert_eq!(table.nearest_installation(58.0, 30.0).unwrap().name, "Tile installation 60x30");
        assert_eq!(table.nearest_installation(30.0, 20.0).unwrap().name, "Tile installation 30x30");
        assert!(TaskRateTable::default().nearest_installation(60.0, 30.0).is_none());
    }

    #[test]
    fn test_per_area_unit() {
        assert!(rate("tile installation 60x60", "m2", 1.0).is_per_area());
        assert!(!rate("tile installation 60x60", "pcs", 1.0).is_per_area());
    }

    #[test]
    fn test_reference_data_from_json() {
        let json = r#"{ "task_rates": [ { "name": "mixing mortar", "unit": "batch", "estimated_hours": 0.5 } ] }"#;
        let reference: ReferenceData = serde_json::from_str(json).unwrap();
        assert_eq!(reference.task_rates.len(), 1);
        assert!(reference.carriers.is_empty());
    }
}
