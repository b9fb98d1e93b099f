//! Plan Lines
//!
//! A plan is an ordered list of lines. Section lines open a milestone and
//! carry its weight, task lines carry a done flag, and note lines are free
//! text that never takes part in progress.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::calendar::WorkCalendar;
use crate::error::{PlanError, Result};

/// Kind of a plan line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum LineKind {
    /// Milestone header with a completion weight.
    Section,
    /// Work item with a done flag.
    #[default]
    Task,
    /// Free text, ignored by progress.
    Note,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::Section => "section",
            LineKind::Task => "task",
            LineKind::Note => "note",
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineKind {
    type Err = PlanError;

    /// Accepts the plain names and the legacy display types
    /// (`line_section`, `line_note`).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "section" | "line_section" => Ok(LineKind::Section),
            "task" => Ok(LineKind::Task),
            "note" | "line_note" => Ok(LineKind::Note),
            _ => Err(PlanError::InvalidLineKind {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for LineKind {
    type Error = PlanError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// One row of a project plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanLine {
    /// Display order within the plan.
    pub sequence: i64,

    pub kind: LineKind,

    pub name: String,

    /// Percentage weight; only meaningful on sections.
    #[serde(default)]
    pub weight: i64,

    /// Completion flag; only meaningful on tasks.
    #[serde(default)]
    pub done: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_start: Option<NaiveDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_end: Option<NaiveDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_start: Option<NaiveDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_end: Option<NaiveDateTime>,

    /// Person responsible for the line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,

    /// Category of a section (e.g. "Gap Analysis", "Training").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_type: Option<String>,

    /// Name of the section a task belongs to, set by milestone assignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
}

impl PlanLine {
    /// Create a bare line of the given kind.
    pub fn new(sequence: i64, kind: LineKind, name: impl Into<String>) -> Self {
        Self {
            sequence,
            kind,
            name: name.into(),
            weight: 0,
            done: false,
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            owner: None,
            comments: None,
            milestone_type: None,
            milestone: None,
        }
    }

    /// Create a section line.
    pub fn section(sequence: i64, name: impl Into<String>, weight: i64) -> Self {
        Self {
            weight,
            ..Self::new(sequence, LineKind::Section, name)
        }
    }

    /// Create a task line.
    pub fn task(sequence: i64, name: impl Into<String>, done: bool) -> Self {
        Self {
            done,
            ..Self::new(sequence, LineKind::Task, name)
        }
    }

    /// Create a note line.
    pub fn note(sequence: i64, name: impl Into<String>) -> Self {
        Self::new(sequence, LineKind::Note, name)
    }

    /// Set the planned window.
    pub fn with_planned(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.planned_start = Some(start);
        self.planned_end = Some(end);
        self
    }

    /// Set the actual window.
    pub fn with_actual(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.actual_start = Some(start);
        self.actual_end = Some(end);
        self
    }

    pub fn is_section(&self) -> bool {
        self.kind == LineKind::Section
    }

    pub fn is_task(&self) -> bool {
        self.kind == LineKind::Task
    }

    pub fn is_note(&self) -> bool {
        self.kind == LineKind::Note
    }

    /// Check that start dates do not come after end dates.
    pub fn validate(&self) -> Result<()> {
        check_range(&self.name, "planned", self.planned_start, self.planned_end)?;
        check_range(&self.name, "actual", self.actual_start, self.actual_end)?;
        Ok(())
    }

    /// Planned duration in working days; zero when either bound is missing.
    pub fn planned_duration(&self, calendar: &WorkCalendar) -> Result<f64> {
        duration(calendar, self.planned_start, self.planned_end)
    }

    /// Actual duration in working days; zero when either bound is missing.
    pub fn actual_duration(&self, calendar: &WorkCalendar) -> Result<f64> {
        duration(calendar, self.actual_start, self.actual_end)
    }
}

fn check_range(
    name: &str,
    label: &str,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> Result<()> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(PlanError::InvalidDateRange {
            context: format!("{} dates of '{}'", label, name),
            start: start.to_string(),
            end: end.to_string(),
        }),
        _ => Ok(()),
    }
}

fn duration(
    calendar: &WorkCalendar,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> Result<f64> {
    match (start, end) {
        (Some(start), Some(end)) => calendar.working_days(start, end),
        _ => Ok(0.0),
    }
}
