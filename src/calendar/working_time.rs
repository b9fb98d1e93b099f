//! Working days and hours over a `WorkCalendar`.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

/// Hours counted for one full working day.
pub const DEFAULT_HOURS_PER_DAY: f64 = 8.0;

fn default_weekend() -> Vec<Weekday> {
    vec![Weekday::Fri, Weekday::Sat]
}

fn default_hours_per_day() -> f64 {
    DEFAULT_HOURS_PER_DAY
}

/// A closed interval during which no work is counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leave {
    /// Display name (e.g. "Eid al-Fitr").
    pub name: String,

    /// First instant of the leave.
    pub from: NaiveDateTime,

    /// Last instant of the leave.
    pub to: NaiveDateTime,

    /// Resource the leave applies to; `None` for a public holiday.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl Leave {
    /// Create a public holiday covering whole days from `first` to `last`.
    pub fn public(name: impl Into<String>, first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            name: name.into(),
            from: first.and_time(NaiveTime::MIN),
            to: last.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::seconds(1),
            resource: None,
        }
    }

    /// Whether the leave applies to everyone.
    pub fn is_public(&self) -> bool {
        self.resource.is_none()
    }

    /// Whether `instant` lies within the leave (bounds inclusive).
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.from <= instant && instant <= self.to
    }

    /// Whether the leave overlaps any part of `date`.
    pub fn overlaps_date(&self, date: NaiveDate) -> bool {
        let day_start = date.and_time(NaiveTime::MIN);
        let next_day = day_start + Duration::days(1);
        self.from < next_day && self.to >= day_start
    }
}

/// Calendar used to turn date ranges into working days and hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    /// Non-working weekdays.
    #[serde(default = "default_weekend")]
    pub weekend: Vec<Weekday>,

    /// Hours in a full working day.
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: f64,

    /// Holidays and absences.
    #[serde(default)]
    pub leaves: Vec<Leave>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            weekend: default_weekend(),
            hours_per_day: DEFAULT_HOURS_PER_DAY,
            leaves: Vec::new(),
        }
    }
}

impl WorkCalendar {
    /// Create a calendar with the default Friday/Saturday weekend and no leaves.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leave, returning the calendar for chaining.
    pub fn with_leave(mut self, leave: Leave) -> Self {
        self.leaves.push(leave);
        self
    }

    /// Whether `date` falls on a weekend day.
    pub fn is_weekend(&self, date: NaiveDate) -> bool {
        self.weekend.contains(&date.weekday())
    }

    /// Whether a public holiday overlaps `date`.
    pub fn is_public_holiday(&self, date: NaiveDate) -> bool {
        self.leaves
            .iter()
            .any(|leave| leave.is_public() && leave.overlaps_date(date))
    }

    /// Working days between two instants.
    ///
    /// Every calendar day from `start` up to the last whole day of the span
    /// is visited once, inclusive of both ends. A day counts unless it is a
    /// weekend day or its start instant lies inside a leave. A trailing
    /// partial day adds `hours / hours_per_day`.
    ///
    /// # Errors
    /// Returns `PlanError::InvalidDateRange` if `start` is after `end`.
    pub fn working_days(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<f64> {
        if start > end {
            return Err(PlanError::InvalidDateRange {
                context: "working days".to_string(),
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let span = end - start;
        let whole_days = span.num_days();

        let mut days = 0.0;
        for offset in 0..=whole_days {
            let instant = start + Duration::days(offset);
            if self.is_weekend(instant.date()) {
                continue;
            }
            if self.leaves.iter().any(|leave| leave.contains(instant)) {
                continue;
            }
            days += 1.0;
        }

        let remainder = (span - Duration::days(whole_days)).num_seconds();
        if remainder > 0 {
            days += remainder as f64 / 3600.0 / self.hours_per_day;
        }

        debug!("working days {} -> {}: {}", start, end, days);
        Ok(days)
    }

    /// Whole working dates between two dates, both inclusive: dates that
    /// are neither weekend days nor public holidays. A missing bound, or a
    /// start after the end, yields zero.
    pub fn working_date_count(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> u32 {
        let (Some(start), Some(end)) = (start, end) else {
            return 0;
        };

        let mut count = 0u32;
        let mut current = start;
        while current <= end {
            if !self.is_weekend(current) && !self.is_public_holiday(current) {
                count += 1;
            }
            current = current + Duration::days(1);
        }
        count
    }

    /// Working hours between two dates, both inclusive.
    ///
    /// [`working_date_count`](Self::working_date_count) times `hours_per_day`.
    pub fn working_hours(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> f64 {
        let working_days = self.working_date_count(start, end);
        let hours = f64::from(working_days) * self.hours_per_day;
        debug!(
            "working hours {:?} -> {:?}: {} days, {} hours",
            start, end, working_days, hours
        );
        hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        date(y, m, d).and_time(NaiveTime::MIN)
    }

    #[test]
    fn test_full_week_skips_friday_and_saturday() {
        // 2024-06-02 is a Sunday, 2024-06-08 the following Saturday.
        let calendar = WorkCalendar::new();
        let days = calendar
            .working_days(midnight(2024, 6, 2), midnight(2024, 6, 8))
            .unwrap();
        assert_relative_eq!(days, 5.0);
    }

    #[test]
    fn test_single_day_counts_once() {
        let calendar = WorkCalendar::new();
        let days = calendar
            .working_days(midnight(2024, 6, 3), midnight(2024, 6, 3))
            .unwrap();
        assert_relative_eq!(days, 1.0);
    }

    #[test]
    fn test_leave_is_excluded() {
        let calendar =
            WorkCalendar::new().with_leave(Leave::public("Holiday", date(2024, 6, 4), date(2024, 6, 5)));
        let days = calendar
            .working_days(midnight(2024, 6, 2), midnight(2024, 6, 8))
            .unwrap();
        assert_relative_eq!(days, 3.0);
    }

    #[test]
    fn test_resource_leave_is_excluded_from_working_days() {
        let mut calendar = WorkCalendar::new();
        calendar.leaves.push(Leave {
            name: "Annual leave".to_string(),
            from: midnight(2024, 6, 3),
            to: midnight(2024, 6, 3) + Duration::hours(23),
            resource: Some("Mona".to_string()),
        });
        assert!(!calendar.is_public_holiday(date(2024, 6, 3)));

        let days = calendar
            .working_days(midnight(2024, 6, 2), midnight(2024, 6, 8))
            .unwrap();
        assert_relative_eq!(days, 4.0);
    }

    #[test]
    fn test_partial_day_adds_fraction() {
        let calendar = WorkCalendar::new();
        let start = midnight(2024, 6, 3);
        let end = start + Duration::hours(4);
        let days = calendar.working_days(start, end).unwrap();
        assert_relative_eq!(days, 1.5);
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let calendar = WorkCalendar::new();
        let err = calendar
            .working_days(midnight(2024, 6, 8), midnight(2024, 6, 2))
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATE_RANGE");
    }

    #[test]
    fn test_working_hours_uses_public_holidays_only() {
        let mut calendar = WorkCalendar::new();
        calendar.leaves.push(Leave {
            name: "Sick".to_string(),
            from: midnight(2024, 6, 3),
            to: midnight(2024, 6, 3) + Duration::hours(23),
            resource: Some("Mona".to_string()),
        });
        calendar
            .leaves
            .push(Leave::public("Holiday", date(2024, 6, 4), date(2024, 6, 4)));

        let hours = calendar.working_hours(Some(date(2024, 6, 2)), Some(date(2024, 6, 8)));
        assert_relative_eq!(hours, 32.0);
    }

    #[test]
    fn test_working_hours_missing_or_reversed() {
        let calendar = WorkCalendar::new();
        assert_relative_eq!(calendar.working_hours(None, Some(date(2024, 6, 8))), 0.0);
        assert_relative_eq!(
            calendar.working_hours(Some(date(2024, 6, 8)), Some(date(2024, 6, 2))),
            0.0
        );
    }

    #[test]
    fn test_custom_weekend() {
        let calendar = WorkCalendar {
            weekend: vec![Weekday::Sat, Weekday::Sun],
            ..WorkCalendar::default()
        };
        // Monday through Sunday
        let hours = calendar.working_hours(Some(date(2024, 6, 3)), Some(date(2024, 6, 9)));
        assert_relative_eq!(hours, 40.0);
    }
}
