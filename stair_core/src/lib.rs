//! # stair_core - L-Shaped Staircase Estimation Engine
//!
//! `stair_core` turns the measurements of an L-shaped masonry staircase into a
//! bill of materials, a slab cut list and a labor estimate. All inputs and
//! outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Data, not failures**: Steps that need cutting and missing task rates
//!   show up in the result, not as errors
//!
//! ## Quick Start
//!
//! ```rust
//! use stair_core::estimate::EstimateFile;
//!
//! // Create a new estimate
//! let estimate = EstimateFile::new("Dana Estimator", "26-014", "Hillside Villas");
//!
//! // Serialize to JSON for storage or transmission
//! let json = serde_json::to_string_pretty(&estimate).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`estimate`] - Estimate container, metadata, and settings
//! - [`calculations`] - Geometry, course, slab and full-staircase passes
//! - [`tasks`] - Task-rate and carrier tables, labor projection
//! - [`materials`] - Masonry unit and slab catalogs
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - File operations with atomic saves and locking
//! - [`pdf`] - Typst-rendered PDF reports

pub mod calculations;
pub mod errors;
pub mod estimate;
pub mod file_io;
pub mod materials;
pub mod pdf;
pub mod tasks;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use errors::{CalcError, CalcResult};
pub use estimate::{EstimateFile, EstimateMetadata, EstimateSettings};
pub use file_io::{load_estimate, save_estimate, FileLock};
