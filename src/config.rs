//! Settings
//!
//! All settings have defaults, so a missing file or a partial file is fine.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::calendar::WorkCalendar;
use crate::error::{PlanError, Result};
use crate::import::ImportOptions;
use crate::progress::WeightPolicy;
use crate::reminder::ReminderSettings;

/// Environment variable naming the settings file.
pub const CONFIG_ENV_VAR: &str = "MILESTONE_CONFIG";

/// Crate-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub calendar: WorkCalendar,
    pub reminders: ReminderSettings,
    pub import: ImportOptions,
    pub weight_policy: WeightPolicy,
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("no settings file, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            return Err(PlanError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| PlanError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Reject settings that would make the arithmetic meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(self.calendar.hours_per_day > 0.0 && self.calendar.hours_per_day <= 24.0) {
            return Err(PlanError::Config {
                reason: format!(
                    "hours_per_day must be in (0, 24], got {}",
                    self.calendar.hours_per_day
                ),
            });
        }
        if self.calendar.weekend.len() >= 7 {
            return Err(PlanError::Config {
                reason: "weekend cannot cover the whole week".to_string(),
            });
        }
        if self.reminders.window_days < 0 {
            return Err(PlanError::Config {
                reason: format!(
                    "reminder window must not be negative, got {}",
                    self.reminders.window_days
                ),
            });
        }
        for leave in &self.calendar.leaves {
            if leave.from > leave.to {
                return Err(PlanError::InvalidDateRange {
                    context: format!("leave '{}'", leave.name),
                    start: leave.from.to_string(),
                    end: leave.to.to_string(),
                });
            }
        }
        Ok(())
    }
}
