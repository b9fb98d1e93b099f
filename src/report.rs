//! Planned vs Actual Report
//!
//! Compares each project's planned dates with its actual ones, in days and
//! in working hours, sets the completion reached against the progress the
//! elapsed working days call for, and classifies the project.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::calendar::WorkCalendar;
use crate::plan::ProjectPlan;

/// Schedule status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    OnTrack,
    Delayed,
    OnTime,
    Early,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::OnTrack => "On Track",
            ScheduleStatus::Delayed => "Delayed",
            ScheduleStatus::OnTime => "On Time",
            ScheduleStatus::Early => "Early",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional date window a project's planned dates must touch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportFilter {
    /// A project matches `from` if its planned start or end is on/after it,
    /// and `to` if its planned start or end is on/before it. Projects
    /// without planned dates never match an active bound.
    pub fn matches(&self, plan: &ProjectPlan) -> bool {
        let dates = [plan.planned_start, plan.planned_end];
        let after_from = self
            .from
            .map_or(true, |from| dates.iter().flatten().any(|d| *d >= from));
        let before_to = self
            .to
            .map_or(true, |to| dates.iter().flatten().any(|d| *d <= to));
        after_from && before_to
    }
}

/// One project's row in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarianceRow {
    pub project: String,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub actual_start: Option<NaiveDate>,
    pub actual_end: Option<NaiveDate>,
    /// `actual_start - planned_start` in days; 0 when either is missing.
    pub start_variance_days: i64,
    /// `actual_end - planned_end` in days; 0 when either is missing.
    pub end_variance_days: i64,
    pub planned_hours: f64,
    pub actual_hours: f64,
    pub hours_variance: f64,
    /// Working dates from planned start to planned end.
    pub planned_working_days: u32,
    /// Working dates from planned start to the actual end, or to today while
    /// the project runs.
    pub days_passed: u32,
    /// Share of the planned working days already elapsed, capped at 100.
    pub expected_progress: f64,
    pub completion_percent: f64,
    /// `completion_percent - expected_progress`; negative means behind.
    pub progress_gap: f64,
    pub status: ScheduleStatus,
}

fn variance(planned: Option<NaiveDate>, actual: Option<NaiveDate>) -> i64 {
    match (planned, actual) {
        (Some(planned), Some(actual)) => (actual - planned).num_days(),
        _ => 0,
    }
}

/// Progress a project should show after `days_passed` of `planned_days`
/// working days: `min(100 * passed / planned, 100)`, 0 without a plan.
pub fn expected_progress(planned_days: u32, days_passed: u32) -> f64 {
    if planned_days == 0 {
        return 0.0;
    }
    (f64::from(days_passed) / f64::from(planned_days) * 100.0).min(100.0)
}

/// Classify a project. Rules apply in order; the first match wins.
pub fn determine_status(
    start_variance: i64,
    end_variance: i64,
    planned_end: Option<NaiveDate>,
    actual_end: Option<NaiveDate>,
    today: NaiveDate,
) -> ScheduleStatus {
    if let Some(planned_end) = planned_end {
        let finished_in_time = actual_end.is_some_and(|actual| actual <= planned_end);
        if planned_end < today && !finished_in_time {
            return ScheduleStatus::Delayed;
        }
        if finished_in_time {
            return ScheduleStatus::OnTime;
        }
    }

    if start_variance > 0 || end_variance > 0 {
        return ScheduleStatus::Delayed;
    }
    if start_variance < 0 || end_variance < 0 {
        return ScheduleStatus::Early;
    }
    ScheduleStatus::OnTrack
}

/// Build the report row for one project.
pub fn variance_row(plan: &ProjectPlan, calendar: &WorkCalendar, today: NaiveDate) -> VarianceRow {
    let start_variance_days = variance(plan.planned_start, plan.actual_start);
    let end_variance_days = variance(plan.planned_end, plan.actual_end);

    let planned_hours = calendar.working_hours(plan.planned_start, plan.planned_end);
    let actual_hours = calendar.working_hours(plan.actual_start, plan.actual_end);

    let planned_working_days = calendar.working_date_count(plan.planned_start, plan.planned_end);
    let days_passed =
        calendar.working_date_count(plan.planned_start, Some(plan.actual_end.unwrap_or(today)));
    let expected = expected_progress(planned_working_days, days_passed);
    let completion = plan.completion_percent();

    let status = determine_status(
        start_variance_days,
        end_variance_days,
        plan.planned_end,
        plan.actual_end,
        today,
    );
    debug!("{}: {}", plan.name, status);

    VarianceRow {
        project: plan.name.clone(),
        planned_start: plan.planned_start,
        planned_end: plan.planned_end,
        actual_start: plan.actual_start,
        actual_end: plan.actual_end,
        start_variance_days,
        end_variance_days,
        planned_hours,
        actual_hours,
        hours_variance: actual_hours - planned_hours,
        planned_working_days,
        days_passed,
        expected_progress: expected,
        completion_percent: completion,
        progress_gap: completion - expected,
        status,
    }
}

/// Planned-vs-actual rows for the projects matching `filter`, most
/// delayed first, ties broken by project name.
pub fn planned_vs_actual(
    plans: &[ProjectPlan],
    calendar: &WorkCalendar,
    filter: &ReportFilter,
    today: NaiveDate,
) -> Vec<VarianceRow> {
    let mut rows: Vec<VarianceRow> = plans
        .iter()
        .filter(|plan| filter.matches(plan))
        .map(|plan| variance_row(plan, calendar, today))
        .collect();

    rows.sort_by(|a, b| match b.end_variance_days.cmp(&a.end_variance_days) {
        Ordering::Equal => a.project.cmp(&b.project),
        other => other,
    });

    info!("planned vs actual: {} of {} projects", rows.len(), plans.len());
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project(name: &str, planned: (NaiveDate, NaiveDate), actual: Option<(NaiveDate, NaiveDate)>) -> ProjectPlan {
        let mut plan = ProjectPlan::new(name);
        plan.planned_start = Some(planned.0);
        plan.planned_end = Some(planned.1);
        if let Some((start, end)) = actual {
            plan.actual_start = Some(start);
            plan.actual_end = Some(end);
        }
        plan
    }

    #[test]
    fn test_status_precedence() {
        let today = date(2024, 6, 15);
        // Past planned end, not finished
        assert_eq!(
            determine_status(0, 0, Some(date(2024, 6, 1)), None, today),
            ScheduleStatus::Delayed
        );
        // Finished before planned end, even with a late start
        assert_eq!(
            determine_status(3, -1, Some(date(2024, 6, 1)), Some(date(2024, 5, 31)), today),
            ScheduleStatus::OnTime
        );
        // Future planned end, late start
        assert_eq!(
            determine_status(2, 0, Some(date(2024, 7, 1)), None, today),
            ScheduleStatus::Delayed
        );
        // No planned end, early start
        assert_eq!(determine_status(-2, 0, None, None, today), ScheduleStatus::Early);
        assert_eq!(determine_status(0, 0, None, None, today), ScheduleStatus::OnTrack);
    }

    #[test]
    fn test_variance_row_hours() {
        // Planned Sun 2 Jun .. Thu 6 Jun (5 working days); actual runs to Sun 9 Jun (6).
        let plan = project(
            "Rollout",
            (date(2024, 6, 2), date(2024, 6, 6)),
            Some((date(2024, 6, 2), date(2024, 6, 9))),
        );
        let row = variance_row(&plan, &WorkCalendar::new(), date(2024, 6, 20));
        assert_eq!(row.start_variance_days, 0);
        assert_eq!(row.end_variance_days, 3);
        assert_relative_eq!(row.planned_hours, 40.0);
        assert_relative_eq!(row.actual_hours, 48.0);
        assert_relative_eq!(row.hours_variance, 8.0);
        assert_eq!(row.status, ScheduleStatus::Delayed);
    }

    #[test]
    fn test_expected_progress_caps_at_100() {
        assert_relative_eq!(expected_progress(0, 4), 0.0);
        assert_relative_eq!(expected_progress(5, 2), 40.0);
        assert_relative_eq!(expected_progress(5, 9), 100.0);
    }

    #[test]
    fn test_running_project_progress_against_today() {
        // Planned Sun 2 Jun .. Thu 6 Jun; by Tue 4 Jun three of five days are gone.
        let mut plan = project("Rollout", (date(2024, 6, 2), date(2024, 6, 6)), None);
        plan.push_section("Build", 100);
        plan.push_task("Configure", true);
        plan.push_task("Test", false);

        let row = variance_row(&plan, &WorkCalendar::new(), date(2024, 6, 4));
        assert_eq!(row.planned_working_days, 5);
        assert_eq!(row.days_passed, 3);
        assert_relative_eq!(row.expected_progress, 60.0);
        assert_relative_eq!(row.completion_percent, 50.0);
        assert_relative_eq!(row.progress_gap, -10.0);
    }

    #[test]
    fn test_finished_project_counts_days_to_actual_end() {
        let plan = project(
            "Rollout",
            (date(2024, 6, 2), date(2024, 6, 6)),
            Some((date(2024, 6, 2), date(2024, 6, 3))),
        );
        let row = variance_row(&plan, &WorkCalendar::new(), date(2024, 6, 30));
        assert_eq!(row.days_passed, 2);
        assert_relative_eq!(row.expected_progress, 40.0);

        let later = project("Later", (date(2024, 6, 2), date(2024, 6, 6)), None);
        let row = variance_row(&later, &WorkCalendar::new(), date(2024, 5, 1));
        assert_eq!(row.days_passed, 0);
        assert_relative_eq!(row.expected_progress, 0.0);
    }

    #[test]
    fn test_rows_sorted_and_filtered() {
        let today = date(2024, 6, 20);
        let plans = vec![
            project("B", (date(2024, 6, 2), date(2024, 6, 6)), Some((date(2024, 6, 2), date(2024, 6, 5)))),
            project("A", (date(2024, 6, 2), date(2024, 6, 6)), Some((date(2024, 6, 2), date(2024, 6, 5)))),
            project("C", (date(2024, 6, 2), date(2024, 6, 6)), Some((date(2024, 6, 2), date(2024, 6, 10)))),
            project("Old", (date(2023, 1, 1), date(2023, 2, 1)), None),
        ];
        let filter = ReportFilter {
            from: Some(date(2024, 1, 1)),
            to: None,
        };

        let rows = planned_vs_actual(&plans, &WorkCalendar::new(), &filter, today);
        let names: Vec<&str> = rows.iter().map(|r| r.project.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_filter_without_dates() {
        let plan = ProjectPlan::new("Undated");
        assert!(ReportFilter::default().matches(&plan));
        let filter = ReportFilter {
            from: None,
            to: Some(date(2024, 1, 1)),
        };
        assert!(!filter.matches(&plan));
    }
}
