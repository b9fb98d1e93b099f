//! Deadline Reminders
//!
//! Picks the project deadlines that fall inside the reminder window and
//! works out who should hear about them. Delivery is left to the caller.

use std::fmt;

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::plan::ProjectPlan;

/// Default number of days ahead that trigger a reminder.
pub const DEFAULT_WINDOW_DAYS: i64 = 10;

fn default_window_days() -> i64 {
    DEFAULT_WINDOW_DAYS
}

/// Reminder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    /// A deadline `n` days away triggers when `0 <= n <= window_days`.
    #[serde(default = "default_window_days")]
    pub window_days: i64,

    /// Recipients notified about every project, ahead of its manager.
    #[serde(default)]
    pub fixed_recipients: Vec<String>,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            fixed_recipients: Vec::new(),
        }
    }
}

/// Which project date a reminder is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Deadline {
    ProjectEnd,
    FreeSupportEnd,
    ContractSupportEnd,
}

impl Deadline {
    pub const ALL: [Deadline; 3] = [
        Deadline::ProjectEnd,
        Deadline::FreeSupportEnd,
        Deadline::ContractSupportEnd,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Deadline::ProjectEnd => "Project End",
            Deadline::FreeSupportEnd => "Free Support End",
            Deadline::ContractSupportEnd => "Contract Support End",
        }
    }

    fn date_of(&self, plan: &ProjectPlan) -> Option<NaiveDate> {
        match self {
            Deadline::ProjectEnd => plan.actual_end,
            Deadline::FreeSupportEnd => plan.free_support_end,
            Deadline::ContractSupportEnd => plan.contract_end,
        }
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A deadline inside the reminder window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reminder {
    pub project: String,
    pub deadline: Deadline,
    pub due: NaiveDate,
    pub days_left: i64,
    pub recipients: Vec<String>,
}

impl Reminder {
    /// One-line subject, e.g. "Project End ends in 3 day(s)".
    pub fn summary(&self) -> String {
        format!("{} ends in {} day(s)", self.deadline, self.days_left)
    }

    /// Message body.
    pub fn message(&self) -> String {
        format!(
            "Reminder: {} for project '{}' ends on {}.",
            self.deadline, self.project, self.due
        )
    }
}

/// Reminders due on `today` across `plans`, in plan order then deadline
/// order.
pub fn due_reminders(
    plans: &[ProjectPlan],
    settings: &ReminderSettings,
    today: NaiveDate,
) -> Vec<Reminder> {
    let mut reminders = Vec::new();

    for plan in plans {
        for deadline in Deadline::ALL {
            let Some(due) = deadline.date_of(plan) else {
                continue;
            };

            let days_left = (due - today).num_days();
            debug!("{}: {} ends in {} days", plan.name, deadline, days_left);
            if !(0..=settings.window_days).contains(&days_left) {
                continue;
            }

            reminders.push(Reminder {
                project: plan.name.clone(),
                deadline,
                due,
                days_left,
                recipients: recipients(plan, settings),
            });
        }
    }

    reminders
}

fn recipients(plan: &ProjectPlan, settings: &ReminderSettings) -> Vec<String> {
    let mut recipients: Vec<String> = Vec::new();
    for recipient in settings.fixed_recipients.iter().chain(plan.manager.as_ref()) {
        if !recipients.contains(recipient) {
            recipients.push(recipient.clone());
        }
    }
    recipients
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn settings() -> ReminderSettings {
        ReminderSettings {
            window_days: 10,
            fixed_recipients: vec!["Omar".to_string(), "Shrouq".to_string()],
        }
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let today = date(2024, 6, 1);
        let mut plan = ProjectPlan::new("Rollout");
        plan.actual_end = Some(today);
        plan.free_support_end = Some(date(2024, 6, 11));
        plan.contract_end = Some(date(2024, 6, 12));

        let reminders = due_reminders(&[plan], &settings(), today);
        let kinds: Vec<(Deadline, i64)> =
            reminders.iter().map(|r| (r.deadline, r.days_left)).collect();
        assert_eq!(
            kinds,
            vec![(Deadline::ProjectEnd, 0), (Deadline::FreeSupportEnd, 10)]
        );
    }

    #[test]
    fn test_past_deadlines_are_ignored() {
        let today = date(2024, 6, 1);
        let mut plan = ProjectPlan::new("Rollout");
        plan.actual_end = Some(date(2024, 5, 31));
        assert!(due_reminders(&[plan], &settings(), today).is_empty());
    }

    #[test]
    fn test_project_end_follows_actual_end() {
        let today = date(2024, 6, 1);
        let mut plan = ProjectPlan::new("Rollout");
        plan.planned_start = Some(date(2024, 4, 1));
        plan.planned_end = Some(date(2024, 5, 1));
        plan.actual_end = Some(date(2024, 6, 5));

        let reminders = due_reminders(&[plan.clone()], &ReminderSettings::default(), today);
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].deadline, Deadline::ProjectEnd);
        assert_eq!(reminders[0].days_left, 4);

        plan.actual_end = None;
        plan.planned_end = Some(date(2024, 6, 5));
        assert!(due_reminders(&[plan], &ReminderSettings::default(), today).is_empty());
    }

    #[test]
    fn test_recipients_deduplicated_with_manager_last() {
        let today = date(2024, 6, 1);
        let mut plan = ProjectPlan::new("Rollout");
        plan.actual_end = Some(date(2024, 6, 4));
        plan.manager = Some("Mahmoud".to_string());

        let reminders = due_reminders(&[plan.clone()], &settings(), today);
        assert_eq!(reminders[0].recipients, vec!["Omar", "Shrouq", "Mahmoud"]);

        plan.manager = Some("Omar".to_string());
        let reminders = due_reminders(&[plan], &settings(), today);
        assert_eq!(reminders[0].recipients, vec!["Omar", "Shrouq"]);
    }

    #[test]
    fn test_messages() {
        let reminder = Reminder {
            project: "Rollout".to_string(),
            deadline: Deadline::ContractSupportEnd,
            due: date(2024, 6, 4),
            days_left: 3,
            recipients: Vec::new(),
        };
        assert_eq!(reminder.summary(), "Contract Support End ends in 3 day(s)");
        assert_eq!(
            reminder.message(),
            "Reminder: Contract Support End for project 'Rollout' ends on 2024-06-04."
        );
    }
}
