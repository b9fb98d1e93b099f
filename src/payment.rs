//! Payment Milestones
//!
//! Each project may carry three payment milestones: contract, UAT and live.
//! A milestone is announced once its due date is a week away, announced
//! again the day before, and can be snoozed a limited number of times.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::plan::ProjectPlan;

/// Days before the due date at which the first notice goes out.
pub const NOTICE_DAYS: i64 = 7;

/// Days a snooze postpones the next notice.
pub const SNOOZE_DAYS: i64 = 3;

/// Snoozes allowed per milestone.
pub const MAX_SNOOZES: u32 = 2;

/// One of the three payment milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStage {
    Contract,
    Uat,
    Live,
}

impl PaymentStage {
    pub const ALL: [PaymentStage; 3] = [PaymentStage::Contract, PaymentStage::Uat, PaymentStage::Live];

    pub fn label(&self) -> &'static str {
        match self {
            PaymentStage::Contract => "Contract",
            PaymentStage::Uat => "UAT",
            PaymentStage::Live => "Live",
        }
    }
}

impl fmt::Display for PaymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a payment schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    #[default]
    Pending,
    SnoozedContract,
    SnoozedUat,
    SnoozedLive,
    Completed,
}

impl PaymentState {
    fn snoozed(stage: PaymentStage) -> Self {
        match stage {
            PaymentStage::Contract => PaymentState::SnoozedContract,
            PaymentStage::Uat => PaymentState::SnoozedUat,
            PaymentStage::Live => PaymentState::SnoozedLive,
        }
    }

    pub fn is_snoozed(&self) -> bool {
        matches!(
            self,
            PaymentState::SnoozedContract | PaymentState::SnoozedUat | PaymentState::SnoozedLive
        )
    }
}

/// Tracking data for one payment milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMilestone {
    pub due: NaiveDate,

    #[serde(default)]
    pub done: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<NaiveDateTime>,

    /// Whether the first notice has gone out since the last snooze or reset.
    #[serde(default)]
    pub notified: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snoozed_until: Option<NaiveDate>,

    #[serde(default)]
    pub snooze_count: u32,
}

impl PaymentMilestone {
    pub fn new(due: NaiveDate) -> Self {
        Self {
            due,
            done: false,
            done_at: None,
            notified: false,
            snoozed_until: None,
            snooze_count: 0,
        }
    }

    fn snooze_active(&self) -> bool {
        self.snoozed_until.is_some() && !self.done
    }
}

/// Payment milestones of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSchedule {
    /// Customer notified alongside the project manager.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,

    pub contract: PaymentMilestone,
    pub uat: PaymentMilestone,
    pub live: PaymentMilestone,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default)]
    pub state: PaymentState,
}

impl PaymentSchedule {
    pub fn new(contract: NaiveDate, uat: NaiveDate, live: NaiveDate) -> Self {
        Self {
            customer: None,
            contract: PaymentMilestone::new(contract),
            uat: PaymentMilestone::new(uat),
            live: PaymentMilestone::new(live),
            notes: None,
            state: PaymentState::Pending,
        }
    }

    pub fn milestone(&self, stage: PaymentStage) -> &PaymentMilestone {
        match stage {
            PaymentStage::Contract => &self.contract,
            PaymentStage::Uat => &self.uat,
            PaymentStage::Live => &self.live,
        }
    }

    pub fn milestone_mut(&mut self, stage: PaymentStage) -> &mut PaymentMilestone {
        match stage {
            PaymentStage::Contract => &mut self.contract,
            PaymentStage::Uat => &mut self.uat,
            PaymentStage::Live => &mut self.live,
        }
    }

    /// Recompute `state`: an active snooze wins (contract, then UAT, then
    /// live), then completion, else pending.
    pub fn update_state(&mut self) {
        let snoozed = PaymentStage::ALL
            .into_iter()
            .find(|&stage| self.milestone(stage).snooze_active());

        self.state = match snoozed {
            Some(stage) => PaymentState::snoozed(stage),
            None if PaymentStage::ALL.iter().all(|&s| self.milestone(s).done) => {
                PaymentState::Completed
            }
            None => PaymentState::Pending,
        };
    }

    /// Record a milestone as paid.
    pub fn mark_done(&mut self, stage: PaymentStage, at: NaiveDateTime) {
        let milestone = self.milestone_mut(stage);
        milestone.done = true;
        milestone.notified = true;
        milestone.done_at = Some(at);
        self.update_state();
        info!("{} payment marked done", stage);
    }

    /// Postpone a milestone's notice by [`SNOOZE_DAYS`] from `today`.
    ///
    /// # Errors
    /// Returns `PlanError::SnoozeLimit` once the milestone was snoozed
    /// [`MAX_SNOOZES`] times.
    pub fn snooze(&mut self, stage: PaymentStage, today: NaiveDate) -> Result<NaiveDate> {
        let milestone = self.milestone_mut(stage);
        if milestone.snooze_count >= MAX_SNOOZES {
            return Err(PlanError::SnoozeLimit {
                stage: stage.to_string(),
                limit: MAX_SNOOZES,
            });
        }

        let until = today + Duration::days(SNOOZE_DAYS);
        milestone.snoozed_until = Some(until);
        milestone.notified = false;
        milestone.snooze_count += 1;
        let count = milestone.snooze_count;
        self.update_state();

        info!("{} payment snoozed until {} (#{}/{})", stage, until, count, MAX_SNOOZES);
        Ok(until)
    }

    /// Clear every snooze, done flag and notice flag.
    ///
    /// Snooze counts are kept, so a reset does not grant new snoozes.
    pub fn reset(&mut self) {
        for stage in PaymentStage::ALL {
            let milestone = self.milestone_mut(stage);
            milestone.snoozed_until = None;
            milestone.done = false;
            milestone.notified = false;
        }
        self.update_state();
    }
}

/// A payment notice due today.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentNotice {
    pub project: String,
    pub stage: PaymentStage,
    pub due: NaiveDate,
    pub days_left: i64,
    /// The day-before notice rather than the first one.
    pub final_notice: bool,
    pub recipients: Vec<String>,
}

impl PaymentNotice {
    pub fn subject(&self) -> String {
        if self.final_notice {
            format!("FINAL REMINDER: {} - {} Due TOMORROW", self.project, self.stage)
        } else {
            format!(
                "Reminder: {} - {} Due in {} Day(s)",
                self.project, self.stage, self.days_left
            )
        }
    }

    pub fn summary(&self) -> String {
        if self.final_notice {
            format!("FINAL: {} Due TOMORROW", self.stage)
        } else {
            format!("{} Due in {} days", self.stage, self.days_left)
        }
    }
}

fn recipients(manager: Option<&str>, customer: Option<&str>) -> Vec<String> {
    let mut recipients: Vec<String> = Vec::new();
    for name in manager.into_iter().chain(customer) {
        if !recipients.iter().any(|r| r == name) {
            recipients.push(name.to_string());
        }
    }
    recipients
}

/// Notices due on `today` for one project's schedule.
///
/// A milestone gets its first notice when it is unpaid, not yet notified,
/// due within [`NOTICE_DAYS`] (overdue included) and its snooze, if any,
/// has run out. Sending it marks the milestone notified and returns the
/// schedule to pending. An unpaid milestone due tomorrow also gets a final
/// notice. Nothing is sent for a completed schedule. Notices without any
/// recipient are dropped, but still mark the milestone notified.
pub fn schedule_notices(
    schedule: &mut PaymentSchedule,
    project: &str,
    manager: Option<&str>,
    today: NaiveDate,
) -> Vec<PaymentNotice> {
    let mut notices = Vec::new();
    if schedule.state == PaymentState::Completed {
        return notices;
    }

    let notice_limit = today + Duration::days(NOTICE_DAYS);
    let tomorrow = today + Duration::days(1);
    let to = recipients(manager, schedule.customer.as_deref());

    for stage in PaymentStage::ALL {
        let state = schedule.state;
        let milestone = schedule.milestone(stage);
        if milestone.done {
            continue;
        }

        let due = milestone.due;
        let snooze_over = milestone.snoozed_until.map_or(true, |until| until <= today);
        let open = state == PaymentState::Pending || state.is_snoozed();
        let first = due <= notice_limit && !milestone.notified && open && snooze_over;

        let mut sent = Vec::new();
        if first {
            schedule.milestone_mut(stage).notified = true;
            schedule.state = PaymentState::Pending;
            sent.push(false);
        }
        if due == tomorrow {
            sent.push(true);
        }

        for final_notice in sent {
            if to.is_empty() {
                warn!("{}: no recipients for {} payment notice", project, stage);
                continue;
            }
            debug!("{}: {} payment due {}", project, stage, due);
            notices.push(PaymentNotice {
                project: project.to_string(),
                stage,
                due,
                days_left: (due - today).num_days(),
                final_notice,
                recipients: to.clone(),
            });
        }
    }

    notices
}

/// Payment notices due on `today` across `plans`. Plans whose schedule
/// changed are reported by index so the caller can save them.
pub fn due_payment_notices(
    plans: &mut [ProjectPlan],
    today: NaiveDate,
) -> (Vec<PaymentNotice>, Vec<usize>) {
    let mut notices = Vec::new();
    let mut changed = Vec::new();

    for (index, plan) in plans.iter_mut().enumerate() {
        let Some(schedule) = plan.payment.as_mut() else {
            continue;
        };
        let before = schedule.clone();
        notices.extend(schedule_notices(
            schedule,
            &plan.name,
            plan.manager.as_deref(),
            today,
        ));
        if *schedule != before {
            changed.push(index);
        }
    }

    info!("{} payment notice(s) due", notices.len());
    (notices, changed)
}
