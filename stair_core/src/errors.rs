//! # Error Types
//!
//! Structured error types for stair_core. Every variant carries enough context
//! for a caller to point the user at the exact input that needs changing
//! (arm A vs. arm B vs. step count vs. a missing measurement).
//!
//! Degraded-but-valid outcomes (a step that needs cut blocks, a buried first
//! course, a task missing from the rate table) are reported as data in the
//! results, never as errors.
//!
//! ## Example
//!
//! ```rust
//! use stair_core::errors::{CalcError, CalcResult};
//!
//! fn validate_rise(total_rise_cm: f64) -> CalcResult<()> {
//!     if total_rise_cm <= 0.0 {
//!         return Err(CalcError::missing_field("total_rise_cm"));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::Arm;

/// Result type alias for stair_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for estimation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, inconsistent with another input)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required measurement is missing (absent or zero)
    #[error("Missing measurement: {field}")]
    MissingField { field: String },

    /// No masonry unit was selected for the course solver
    #[error("No masonry unit selected - pick at least one block or brick")]
    NoMasonryUnitSelected,

    /// Rounding total rise / desired step height produced no steps
    #[error(
        "Invalid step count: total rise {total_rise_cm} cm / step height {step_height_cm} cm gives {step_count} steps"
    )]
    InvalidStepCount {
        total_rise_cm: f64,
        step_height_cm: f64,
        step_count: i64,
    },

    /// An arm is too short to contain every step tread
    #[error(
        "Arm {arm} too short: {step_count} steps need {required_cm:.1} cm but only {available_cm:.1} cm available (short by {:.1} cm)",
        .required_cm - .available_cm
    )]
    ArmTooShort {
        arm: Arm,
        step_count: u32,
        required_cm: f64,
        available_cm: f64,
    },

    /// Material not found in a catalog
    #[error("Material not found: {material_name}")]
    MaterialNotFound { material_name: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create an ArmTooShort error
    pub fn arm_too_short(arm: Arm, step_count: u32, required_cm: f64, available_cm: f64) -> Self {
        CalcError::ArmTooShort {
            arm,
            step_count,
            required_cm,
            available_cm,
        }
    }

    /// Create a MaterialNotFound error
    pub fn material_not_found(material_name: impl Into<String>) -> Self {
        CalcError::MaterialNotFound {
            material_name: material_name.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        CalcError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CalcError::FileLocked { .. })
    }

    /// Check if this error is caused by the staircase measurements
    /// rather than by files or internal state
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CalcError::InvalidInput { .. }
                | CalcError::MissingField { .. }
                | CalcError::NoMasonryUnitSelected
                | CalcError::InvalidStepCount { .. }
                | CalcError::ArmTooShort { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::NoMasonryUnitSelected => "NO_MASONRY_UNIT",
            CalcError::InvalidStepCount { .. } => "INVALID_STEP_COUNT",
            CalcError::ArmTooShort { .. } => "ARM_TOO_SHORT",
            CalcError::MaterialNotFound { .. } => "MATERIAL_NOT_FOUND",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::arm_too_short(Arm::A, 5, 133.0, 120.0);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("ArmTooShort"));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_arm_too_short_message_names_arm_and_shortfall() {
        let msg = CalcError::arm_too_short(Arm::B, 5, 133.0, 120.0).to_string();
        assert!(msg.contains("Arm B"));
        assert!(msg.contains("5 steps"));
        assert!(msg.contains("133.0"));
        assert!(msg.contains("short by 13.0"));
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            CalcError::invalid_input("tread_depth_cm", "2", "too small"),
            CalcError::missing_field("total_rise_cm"),
            CalcError::NoMasonryUnitSelected,
            CalcError::InvalidStepCount {
                total_rise_cm: 5.0,
                step_height_cm: 18.0,
                step_count: 0,
            },
            CalcError::arm_too_short(Arm::A, 5, 133.0, 20.0),
            CalcError::material_not_found("granite 120x60"),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.error_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(errors.iter().all(|e| e.is_input_error() || e.error_code() == "MATERIAL_NOT_FOUND"));
    }

    #[test]
    fn test_recoverable() {
        assert!(CalcError::file_locked("a.stw", "me", "now").is_recoverable());
        assert!(!CalcError::missing_field("x").is_recoverable());
    }
}
