//! Error handling for Milestone
//!
//! Every error carries a stable code and, where one exists, a recovery hint
//! that the CLI prints under the message.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Milestone operations
pub type Result<T> = std::result::Result<T, PlanError>;

/// Main error type for Milestone operations
#[derive(Error, Debug)]
pub enum PlanError {
    // Validation Errors
    #[error("Invalid line kind: '{value}' (expected section, task or note)")]
    InvalidLineKind { value: String },

    #[error("Section '{section}' has negative weight {weight}")]
    NegativeWeight { section: String, weight: i64 },

    #[error("Line {sequence} is a {kind}, not a task")]
    NotATask { sequence: i64, kind: String },

    #[error("Invalid date range for {context}: start {start} is after end {end}")]
    InvalidDateRange {
        context: String,
        start: String,
        end: String,
    },

    // Import Errors
    #[error("Cannot find header row with '{marker}'")]
    MissingHeaderRow { marker: String },

    #[error("Invalid cell at row {row}, column {column}: {reason}")]
    InvalidCell {
        row: usize,
        column: usize,
        reason: String,
    },

    // Lookup Errors
    #[error("No line with sequence {sequence} in plan '{plan}'")]
    LineNotFound { plan: String, sequence: i64 },

    // Payment Errors
    #[error("Cannot snooze {stage} payment more than {limit} times")]
    SnoozeLimit { stage: String, limit: u32 },

    #[error("Plan '{plan}' has no payment schedule")]
    NoPaymentSchedule { plan: String },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Schema Errors
    #[error("Invalid plan schema version: {version}")]
    InvalidSchemaVersion { version: String },

    #[error("Migration failed from {from} to {to}: {reason}")]
    MigrationError {
        from: String,
        to: String,
        reason: String,
    },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlanError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            PlanError::InvalidLineKind { .. } => "INVALID_LINE_KIND",
            PlanError::NegativeWeight { .. } => "NEGATIVE_WEIGHT",
            PlanError::NotATask { .. } => "NOT_A_TASK",
            PlanError::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            PlanError::MissingHeaderRow { .. } => "MISSING_HEADER_ROW",
            PlanError::InvalidCell { .. } => "INVALID_CELL",
            PlanError::LineNotFound { .. } => "LINE_NOT_FOUND",
            PlanError::SnoozeLimit { .. } => "SNOOZE_LIMIT",
            PlanError::NoPaymentSchedule { .. } => "NO_PAYMENT_SCHEDULE",
            PlanError::FileNotFound { .. } => "FILE_NOT_FOUND",
            PlanError::FileReadError { .. } => "FILE_READ_ERROR",
            PlanError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            PlanError::InvalidSchemaVersion { .. } => "INVALID_SCHEMA_VERSION",
            PlanError::MigrationError { .. } => "MIGRATION_ERROR",
            PlanError::Config { .. } => "CONFIG_ERROR",
            PlanError::Io(_) => "IO_ERROR",
            PlanError::Json(_) => "JSON_ERROR",
        }
    }

    /// Whether the error comes from bad plan data rather than the environment.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PlanError::InvalidLineKind { .. }
                | PlanError::NegativeWeight { .. }
                | PlanError::NotATask { .. }
                | PlanError::InvalidDateRange { .. }
                | PlanError::MissingHeaderRow { .. }
                | PlanError::InvalidCell { .. }
        )
    }

    /// Returns a user-facing recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            PlanError::InvalidLineKind { .. } => {
                Some("Use one of: section, task, note (or line_section / line_note).")
            }
            PlanError::NegativeWeight { .. } => {
                Some("Set the section weight to 0 or a positive percentage.")
            }
            PlanError::NotATask { .. } => {
                Some("Only task lines have a done flag; pick a task sequence.")
            }
            PlanError::LineNotFound { .. } => {
                Some("Run `milestone breakdown` or open the plan file to find the sequence.")
            }
            PlanError::SnoozeLimit { .. } => {
                Some("Mark the payment done or reset the schedule to pending.")
            }
            PlanError::NoPaymentSchedule { .. } => {
                Some("Add a \"payment\" object with contract, uat and live due dates.")
            }
            PlanError::InvalidDateRange { .. } => Some("Swap the start and end dates."),
            PlanError::MissingHeaderRow { .. } => {
                Some("The first column of the header row must read 'Task Name'.")
            }
            PlanError::FileNotFound { .. } => Some("Check the file path and try again."),
            PlanError::InvalidSchemaVersion { .. } => {
                Some("The plan was written by a newer version; upgrade milestone.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = PlanError::InvalidLineKind {
            value: "chapter".to_string(),
        };
        assert_eq!(err.error_code(), "INVALID_LINE_KIND");
        assert!(err.is_validation());
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = PlanError::MissingHeaderRow {
            marker: "Task Name".to_string(),
        };
        assert!(err.recovery_suggestion().is_some());

        let err = PlanError::Config {
            reason: "bad".to_string(),
        };
        assert!(err.recovery_suggestion().is_none());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_lookup_errors() {
        let err = PlanError::LineNotFound {
            plan: "Rollout".to_string(),
            sequence: 42,
        };
        assert_eq!(err.error_code(), "LINE_NOT_FOUND");
        assert!(err.to_string().contains("42"));
        assert!(err.recovery_suggestion().is_some());

        let err = PlanError::NotATask {
            sequence: 1,
            kind: "section".to_string(),
        };
        assert_eq!(err.error_code(), "NOT_A_TASK");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Line 1 is a section, not a task");
    }

    #[test]
    fn test_display_mentions_value() {
        let err = PlanError::NegativeWeight {
            section: "Phase 1".to_string(),
            weight: -5,
        };
        assert!(err.to_string().contains("-5"));
    }
}
