//! Project plan document.
//!
//! A plan is stored as a single JSON file. Loading runs schema migration
//! first, so legacy exports open transparently.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::calendar::WorkCalendar;
use crate::error::{PlanError, Result};
use crate::payment::PaymentSchedule;
use crate::plan::line::{LineKind, PlanLine};
use crate::plan::migration::{migrate_plan, CURRENT_SCHEMA_VERSION};
use crate::progress::{self, Breakdown};

/// File extension of plan documents.
pub const PLAN_EXTENSION: &str = "json";

fn default_schema_version() -> String {
    CURRENT_SCHEMA_VERSION.to_string()
}

/// A project and its ordered plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPlan {
    /// Schema version for migration support.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    pub name: String,

    /// Project manager, included in deadline reminders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_start: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_end: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_start: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_end: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_support_start: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_support_end: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_start: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_end: Option<NaiveDate>,

    /// Contract, UAT and live payment milestones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentSchedule>,

    /// Plan lines, kept in sequence order.
    #[serde(default)]
    pub lines: Vec<PlanLine>,

    /// Timestamp of the last save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,

    /// File the plan was loaded from (not serialized).
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

/// A section viewed as a project milestone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub name: String,
    pub weight: i64,
    pub milestone_type: Option<String>,
    /// Planned end of the section line.
    pub deadline: Option<NaiveDateTime>,
}

/// Working-day durations of one task line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineDuration {
    pub sequence: i64,
    pub name: String,
    pub planned_days: f64,
    pub actual_days: f64,
}

impl ProjectPlan {
    /// Create an empty plan.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema_version: default_schema_version(),
            name: name.into(),
            manager: None,
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            free_support_start: None,
            free_support_end: None,
            contract_start: None,
            contract_end: None,
            payment: None,
            lines: Vec::new(),
            modified_at: None,
            path: None,
        }
    }

    /// Parse a plan from JSON text, migrating older schemas.
    ///
    /// # Errors
    /// Besides parse and migration failures, returns
    /// `PlanError::InvalidDateRange` for any reversed date range.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(content)?;
        let migrated = migrate_plan(raw)?;
        let mut plan: ProjectPlan = serde_json::from_value(migrated)?;
        plan.sort_lines();
        plan.validate()?;
        Ok(plan)
    }

    /// Load a plan file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PlanError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| PlanError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut plan = Self::from_json(&content)?;
        plan.path = Some(path.to_path_buf());
        debug!("loaded plan '{}' ({} lines)", plan.name, plan.lines.len());
        Ok(plan)
    }

    /// Load every plan file under `dir`, skipping files that fail to parse.
    pub fn load_dir(dir: &Path) -> Result<Vec<Self>> {
        if !dir.exists() {
            return Err(PlanError::FileNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut plans = Vec::new();
        for entry in WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(PLAN_EXTENSION)
            {
                continue;
            }
            match Self::load(path) {
                Ok(plan) => plans.push(plan),
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }

        info!("loaded {} plans from {}", plans.len(), dir.display());
        Ok(plans)
    }

    /// Save to the file the plan was loaded from.
    pub fn save(&mut self) -> Result<()> {
        let path = self.path.clone().ok_or_else(|| PlanError::Config {
            reason: format!("plan '{}' has no file path", self.name),
        })?;
        self.save_to(&path)
    }

    /// Save to `path` and remember it for later saves.
    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PlanError::FileWriteError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        self.validate()?;

        self.schema_version = default_schema_version();
        self.modified_at = Some(Utc::now());
        self.sort_lines();

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| PlanError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.path = Some(path.to_path_buf());
        info!("saved plan '{}' to {}", self.name, path.display());
        Ok(())
    }

    fn sort_lines(&mut self) {
        self.lines.sort_by_key(|line| line.sequence);
    }

    /// Sequence number following the last line.
    pub fn next_sequence(&self) -> i64 {
        self.lines.iter().map(|line| line.sequence).max().unwrap_or(0) + 1
    }

    fn push(&mut self, kind: LineKind, name: impl Into<String>) -> &mut PlanLine {
        let line = PlanLine::new(self.next_sequence(), kind, name);
        self.lines.push(line);
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    /// Append a section line.
    pub fn push_section(&mut self, name: impl Into<String>, weight: i64) -> &mut PlanLine {
        let line = self.push(LineKind::Section, name);
        line.weight = weight;
        line
    }

    /// Append a task line.
    pub fn push_task(&mut self, name: impl Into<String>, done: bool) -> &mut PlanLine {
        let line = self.push(LineKind::Task, name);
        line.done = done;
        line
    }

    /// Append a note line.
    pub fn push_note(&mut self, name: impl Into<String>) -> &mut PlanLine {
        self.push(LineKind::Note, name)
    }

    /// Append lines after the existing ones, renumbering their sequences
    /// but keeping their relative order.
    pub fn append_lines(&mut self, mut lines: Vec<PlanLine>) {
        lines.sort_by_key(|line| line.sequence);
        let mut sequence = self.next_sequence();
        for mut line in lines {
            line.sequence = sequence;
            sequence += 1;
            self.lines.push(line);
        }
    }

    /// Find a line by sequence.
    pub fn line(&self, sequence: i64) -> Option<&PlanLine> {
        self.lines.iter().find(|line| line.sequence == sequence)
    }

    /// Set the done flag of the task with `sequence`.
    ///
    /// Returns the plan's completion after the change.
    pub fn set_done(&mut self, sequence: i64, done: bool) -> Result<f64> {
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.sequence == sequence)
            .ok_or_else(|| PlanError::LineNotFound {
                plan: self.name.clone(),
                sequence,
            })?;

        if line.kind != LineKind::Task {
            return Err(PlanError::NotATask {
                sequence,
                kind: line.kind.to_string(),
            });
        }

        line.done = done;
        Ok(self.completion_percent())
    }

    /// Task lines in sequence order.
    pub fn tasks(&self) -> impl Iterator<Item = &PlanLine> {
        self.lines.iter().filter(|line| line.is_task())
    }

    /// Completion percentage, recomputed from the current lines.
    pub fn completion_percent(&self) -> f64 {
        progress::completion_percent(&self.lines)
    }

    /// Per-section completion.
    pub fn breakdown(&self) -> Breakdown {
        progress::section_breakdown(&self.lines)
    }

    /// Validate the project's date ranges and those of every line.
    pub fn validate(&self) -> Result<()> {
        let ranges = [
            ("planned", self.planned_start, self.planned_end),
            ("actual", self.actual_start, self.actual_end),
            ("free support", self.free_support_start, self.free_support_end),
            ("contract", self.contract_start, self.contract_end),
        ];
        for (label, start, end) in ranges {
            if let (Some(start), Some(end)) = (start, end) {
                if start > end {
                    return Err(PlanError::InvalidDateRange {
                        context: format!("{} dates of project '{}'", label, self.name),
                        start: start.to_string(),
                        end: end.to_string(),
                    });
                }
            }
        }
        self.lines.iter().try_for_each(PlanLine::validate)
    }

    /// Tag each task with the name of the section above it.
    ///
    /// Tasks ahead of the first section get no milestone. Returns the number
    /// of tasks tagged.
    pub fn assign_milestones(&mut self) -> usize {
        let mut current: Option<String> = None;
        let mut tagged = 0;
        for line in &mut self.lines {
            match line.kind {
                LineKind::Section => current = Some(line.name.clone()),
                LineKind::Task => {
                    line.milestone = current.clone();
                    if current.is_some() {
                        tagged += 1;
                    }
                }
                LineKind::Note => {}
            }
        }
        tagged
    }

    /// Sections as milestones, in plan order. Duplicate names collapse into
    /// the first occurrence.
    pub fn milestones(&self) -> Vec<Milestone> {
        let mut milestones: Vec<Milestone> = Vec::new();
        for line in self.lines.iter().filter(|line| line.is_section()) {
            if milestones.iter().any(|m| m.name == line.name) {
                continue;
            }
            milestones.push(Milestone {
                name: line.name.clone(),
                weight: line.weight,
                milestone_type: line.milestone_type.clone(),
                deadline: line.planned_end,
            });
        }
        milestones
    }

    /// Planned and actual working days of every task line.
    pub fn durations(&self, calendar: &WorkCalendar) -> Result<Vec<LineDuration>> {
        self.tasks()
            .map(|line| {
                Ok(LineDuration {
                    sequence: line.sequence,
                    name: line.name.clone(),
                    planned_days: line.planned_duration(calendar)?,
                    actual_days: line.actual_duration(calendar)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn sample() -> ProjectPlan {
        let mut plan = ProjectPlan::new("ERP Rollout");
        plan.push_section("Phase 1", 40);
        plan.push_task("Kickoff", true);
        plan.push_note("Waiting on customer data");
        plan.push_task("Gap analysis", false);
        plan.push_section("Phase 2", 60);
        plan.push_task("Go live", false);
        plan
    }

    #[test]
    fn test_push_assigns_sequences() {
        let plan = sample();
        let sequences: Vec<i64> = plan.lines.iter().map(|l| l.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_completion_follows_done_changes() {
        let mut plan = sample();
        assert_relative_eq!(plan.completion_percent(), 20.0);
        assert_relative_eq!(plan.set_done(6, true).unwrap(), 80.0);
        assert_relative_eq!(plan.set_done(2, false).unwrap(), 60.0);
    }

    #[test]
    fn test_set_done_rejects_sections() {
        let mut plan = sample();
        let err = plan.set_done(1, true).unwrap_err();
        assert_eq!(err.error_code(), "NOT_A_TASK");
        assert_eq!(err.to_string(), "Line 1 is a section, not a task");

        let err = plan.set_done(99, true).unwrap_err();
        assert_eq!(err.error_code(), "LINE_NOT_FOUND");
    }

    #[test]
    fn test_reversed_project_dates_rejected_on_load() {
        let json = r#"{
            "schema_version": "2.0.0",
            "name": "Backwards",
            "planned_start": "2024-06-10",
            "planned_end": "2024-06-01"
        }"#;
        let err = ProjectPlan::from_json(json).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATE_RANGE");
        assert!(err.to_string().contains("planned dates of project 'Backwards'"));
    }

    #[test]
    fn test_validate_checks_support_and_contract_ranges() {
        let mut plan = sample();
        plan.free_support_start = Some(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        plan.free_support_end = Some(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(plan.validate().is_err());

        plan.free_support_end = None;
        plan.contract_start = Some(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        plan.contract_end = Some(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_save_refuses_reversed_dates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");

        let mut plan = sample();
        plan.actual_start = Some(NaiveDate::from_ymd_opt(2024, 6, 9).unwrap());
        plan.actual_end = Some(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());

        let err = plan.save_to(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATE_RANGE");
        assert!(!path.exists());
    }

    #[test]
    fn test_assign_milestones() {
        let mut plan = ProjectPlan::new("p");
        plan.push_task("Orphan", false);
        plan.push_section("Phase 1", 0);
        plan.push_task("A", false);
        plan.push_note("n");
        plan.push_section("Phase 2", 0);
        plan.push_task("B", true);

        assert_eq!(plan.assign_milestones(), 2);
        assert_eq!(plan.lines[0].milestone, None);
        assert_eq!(plan.lines[2].milestone.as_deref(), Some("Phase 1"));
        assert_eq!(plan.lines[3].milestone, None);
        assert_eq!(plan.lines[5].milestone.as_deref(), Some("Phase 2"));
    }

    #[test]
    fn test_milestones_collapse_duplicates() {
        let mut plan = sample();
        plan.push_section("Phase 1", 5);
        let milestones = plan.milestones();
        assert_eq!(milestones.len(), 2);
        assert_eq!(milestones[0].weight, 40);
    }

    #[test]
    fn test_append_lines_renumbers() {
        let mut plan = sample();
        plan.append_lines(vec![
            PlanLine::task(2, "Second", false),
            PlanLine::section(1, "Phase 3", 0),
        ]);
        assert_eq!(plan.lines[6].name, "Phase 3");
        assert_eq!(plan.lines[6].sequence, 7);
        assert_eq!(plan.lines[7].sequence, 8);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plans").join("rollout.json");

        let mut plan = sample();
        plan.save_to(&path).unwrap();

        let loaded = ProjectPlan::load(&path).unwrap();
        assert_eq!(loaded.name, "ERP Rollout");
        assert_eq!(loaded.lines, plan.lines);
        assert_eq!(loaded.schema_version, CURRENT_SCHEMA_VERSION);
        assert!(loaded.modified_at.is_some());
    }

    #[test]
    fn test_load_sorts_by_sequence() {
        let json = r#"{
            "schema_version": "2.0.0",
            "name": "p",
            "lines": [
                {"sequence": 2, "kind": "task", "name": "t", "done": true},
                {"sequence": 1, "kind": "section", "name": "s", "weight": 10}
            ]
        }"#;
        let plan = ProjectPlan::from_json(json).unwrap();
        assert!(plan.lines[0].is_section());
        assert_relative_eq!(plan.completion_percent(), 10.0);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ProjectPlan::load(Path::new("/nonexistent/plan.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_load_dir_skips_broken_files() {
        let dir = TempDir::new().unwrap();
        sample().save_to(&dir.path().join("a.json")).unwrap();
        fs::write(dir.path().join("b.json"), "not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let plans = ProjectPlan::load_dir(dir.path()).unwrap();
        assert_eq!(plans.len(), 1);
    }
}
