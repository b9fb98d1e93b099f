//! Milestone - Weighted Completion for Project Plans
//!
//! A project plan is an ordered list of lines. Section lines carry a weight
//! (a percentage of the project), task lines carry a done flag, and note
//! lines carry nothing that counts.
//!
//! # Completion
//!
//! - If any section has a positive weight, every section contributes
//!   `weight * done / total` over the tasks that follow it.
//! - Otherwise completion is the plain share of done tasks.
//!
//! Around that core sit a working-day calendar, sheet import/export,
//! a planned-vs-actual report, deadline reminders and payment milestones.

pub mod calendar;
pub mod cli;
pub mod config;
pub mod error;
pub mod import;
pub mod payment;
pub mod plan;
pub mod progress;
pub mod reminder;
pub mod report;

pub use error::{PlanError, Result};
pub use plan::{LineKind, PlanLine, ProjectPlan};
pub use progress::completion_percent;
