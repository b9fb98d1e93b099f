//! CLI Command Implementations

use std::path::Path;

use chrono::{Local, NaiveDate};
use log::{info, warn};

use crate::cli::PaymentAction;
use crate::config::Settings;
use crate::error::{PlanError, Result};
use crate::import::{export_sheet, import_sheet, read_sheet, write_sheet, ImportOptions};
use crate::payment::{due_payment_notices, PaymentStage, MAX_SNOOZES};
use crate::plan::ProjectPlan;
use crate::progress::{apply_weight_policy, total_weight, WeightPolicy};
use crate::reminder::due_reminders;
use crate::report::{planned_vs_actual, ReportFilter};

fn today_or(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

/// Apply the weight policy to a plan whose completion is about to be
/// computed. Every command that reports a percentage goes through here.
fn weigh(mut plan: ProjectPlan, policy: WeightPolicy) -> Result<ProjectPlan> {
    let adjusted = apply_weight_policy(&mut plan.lines, policy)?;
    if adjusted > 0 {
        info!("{}: {} section weight(s) clamped", plan.name, adjusted);
    }
    Ok(plan)
}

fn open_plan(path: &Path, policy: WeightPolicy) -> Result<ProjectPlan> {
    weigh(ProjectPlan::load(path)?, policy)
}

/// Print a plan's completion percentage.
pub fn completion(path: &Path, policy: Option<WeightPolicy>, settings: &Settings) -> Result<()> {
    let plan = open_plan(path, policy.unwrap_or(settings.weight_policy))?;

    let weights = total_weight(&plan.lines);
    if weights > 0 && weights != 100 {
        warn!("section weights of '{}' sum to {}, not 100", plan.name, weights);
    }

    println!("{}: {:.2}%", plan.name, plan.completion_percent());
    Ok(())
}

/// Show per-section completion.
pub fn breakdown(path: &Path, settings: &Settings) -> Result<()> {
    let plan = open_plan(path, settings.weight_policy)?;
    let breakdown = plan.breakdown();

    println!(
        "{} ({} rule)",
        plan.name,
        if breakdown.weighted { "weighted" } else { "unweighted" }
    );
    println!("{:-<60}", "");
    for section in &breakdown.sections {
        println!(
            "{:<30} {:>6} {:>4}/{:<4} {:>8.2}",
            section.name.as_deref().unwrap_or("(no section)"),
            section.weight,
            section.done,
            section.total,
            section.contribution
        );
    }
    println!("{:-<60}", "");
    println!("Completion: {:.2}%", breakdown.percent);

    if breakdown.weighted && breakdown.orphan_tasks > 0 {
        warn!(
            "{} task(s) precede the first section and do not count toward completion",
            breakdown.orphan_tasks
        );
    }

    Ok(())
}

/// Set or clear a task's done flag and save.
///
/// The weight policy only shapes the printed percentage; clamped weights are
/// not written back.
pub fn done(path: &Path, sequence: i64, undo: bool, settings: &Settings) -> Result<()> {
    let mut plan = ProjectPlan::load(path)?;
    let mut weighed = weigh(plan.clone(), settings.weight_policy)?;

    plan.set_done(sequence, !undo)?;
    plan.save()?;
    let percent = weighed.set_done(sequence, !undo)?;

    println!(
        "Line {} marked {}. {}: {:.2}%",
        sequence,
        if undo { "not done" } else { "done" },
        plan.name,
        percent
    );
    Ok(())
}

/// Import a sheet into a new or existing plan.
pub fn import(sheet_path: &Path, output: &Path, name: Option<&str>, settings: &Settings) -> Result<()> {
    info!("Importing {} into {}", sheet_path.display(), output.display());

    let mut plan = if output.exists() {
        ProjectPlan::load(output)?
    } else {
        let default_name = sheet_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Imported plan");
        ProjectPlan::new(name.unwrap_or(default_name))
    };

    let sheet = read_sheet(sheet_path)?;
    let options = ImportOptions {
        first_sequence: plan.next_sequence(),
        ..settings.import.clone()
    };
    let outcome = import_sheet(&sheet, &options)?;

    plan.append_lines(outcome.lines);
    plan.save_to(output)?;

    let summary = &outcome.summary;
    println!(
        "Successfully imported {} lines ({} sections) into '{}'",
        summary.imported, summary.sections, plan.name
    );
    if summary.skipped_rows > 0 {
        println!("Skipped {} row(s)", summary.skipped_rows);
    }
    for warning in &summary.warnings {
        println!("  warning: {}", warning);
    }

    Ok(())
}

/// Export a plan as sheet rows.
pub fn export(path: &Path, output: &Path) -> Result<()> {
    let plan = ProjectPlan::load(path)?;
    let sheet = export_sheet(&plan);
    write_sheet(output, &sheet)?;

    println!("Exported {} rows to {}", sheet.len() - 1, output.display());
    Ok(())
}

/// Tag tasks with their milestones, save, and list the milestones.
pub fn milestones(path: &Path) -> Result<()> {
    let mut plan = ProjectPlan::load(path)?;
    let tagged = plan.assign_milestones();
    plan.save()?;

    let milestones = plan.milestones();
    if milestones.is_empty() {
        println!("No milestones in '{}'.", plan.name);
        return Ok(());
    }

    for milestone in &milestones {
        let deadline = milestone
            .deadline
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<30} {:>4}%  due {}", milestone.name, milestone.weight, deadline);
    }
    println!("{} task(s) tagged", tagged);
    Ok(())
}

/// Print working-day durations per task.
pub fn durations(path: &Path, settings: &Settings) -> Result<()> {
    let plan = ProjectPlan::load(path)?;
    let durations = plan.durations(&settings.calendar)?;

    println!("{:<6} {:<30} {:>8} {:>8}", "Seq", "Task", "Planned", "Actual");
    for line in durations {
        println!(
            "{:<6} {:<30} {:>8.2} {:>8.2}",
            line.sequence, line.name, line.planned_days, line.actual_days
        );
    }
    Ok(())
}

/// Print the planned-vs-actual report for a directory of plans.
pub fn report(
    dir: &Path,
    filter: ReportFilter,
    today: Option<NaiveDate>,
    settings: &Settings,
) -> Result<()> {
    let plans = ProjectPlan::load_dir(dir)?
        .into_iter()
        .map(|plan| weigh(plan, settings.weight_policy))
        .collect::<Result<Vec<_>>>()?;
    let rows = planned_vs_actual(&plans, &settings.calendar, &filter, today_or(today));

    if rows.is_empty() {
        println!("No projects match.");
        return Ok(());
    }

    println!(
        "{:<24} {:>7} {:>7} {:>9} {:>9} {:>9} {:>7} {:>7}  {}",
        "Project", "Start", "End", "Planned h", "Actual h", "Diff h", "Expect %", "Done %", "Status"
    );
    for row in rows {
        println!(
            "{:<24} {:>7} {:>7} {:>9.2} {:>9.2} {:>9.2} {:>7.2} {:>7.2}  {}",
            row.project,
            row.start_variance_days,
            row.end_variance_days,
            row.planned_hours,
            row.actual_hours,
            row.hours_variance,
            row.expected_progress,
            row.completion_percent,
            row.status
        );
    }
    Ok(())
}

/// Print the reminders due for a directory of plans.
pub fn reminders(dir: &Path, today: Option<NaiveDate>, settings: &Settings) -> Result<()> {
    let plans = ProjectPlan::load_dir(dir)?;
    let reminders = due_reminders(&plans, &settings.reminders, today_or(today));

    if reminders.is_empty() {
        println!("No deadlines within {} days.", settings.reminders.window_days);
        return Ok(());
    }

    for reminder in reminders {
        println!("{}", reminder.message());
        println!("  {} -> {}", reminder.summary(), reminder.recipients.join(", "));
    }
    Ok(())
}

/// Print payment notices due for a directory of plans, saving the plans
/// whose notice flags changed.
pub fn payments(dir: &Path, today: Option<NaiveDate>) -> Result<()> {
    let mut plans = ProjectPlan::load_dir(dir)?;
    let (notices, changed) = due_payment_notices(&mut plans, today_or(today));

    for index in changed {
        plans[index].save()?;
    }

    if notices.is_empty() {
        println!("No payment notices due.");
        return Ok(());
    }
    for notice in notices {
        println!("{}", notice.subject());
        println!("  {} -> {}", notice.summary(), notice.recipients.join(", "));
    }
    Ok(())
}

/// Update a plan's payment schedule.
pub fn payment(path: &Path, action: PaymentAction) -> Result<()> {
    let mut plan = ProjectPlan::load(path)?;
    let name = plan.name.clone();
    let schedule = plan
        .payment
        .as_mut()
        .ok_or(PlanError::NoPaymentSchedule { plan: name.clone() })?;

    match action {
        PaymentAction::Status => {}
        PaymentAction::Done { stage } => {
            schedule.mark_done(stage, Local::now().naive_local());
        }
        PaymentAction::Snooze { stage, today } => {
            let until = schedule.snooze(stage, today_or(today))?;
            println!("{} payment snoozed until {}", stage, until);
        }
        PaymentAction::Reset => schedule.reset(),
    }

    let state = schedule.state;
    let lines: Vec<String> = PaymentStage::ALL
        .into_iter()
        .map(|stage| {
            let milestone = schedule.milestone(stage);
            format!(
                "{:<10} due {}  {}  snoozed {}/{}",
                stage.label(),
                milestone.due,
                if milestone.done { "paid" } else { "open" },
                milestone.snooze_count,
                MAX_SNOOZES
            )
        })
        .collect();

    plan.save()?;

    println!("{}: {:?}", name, state);
    for line in lines {
        println!("  {}", line);
    }
    Ok(())
}

/// Rewrite a plan file in the current schema.
pub fn migrate(path: &Path) -> Result<()> {
    let mut plan = ProjectPlan::load(path)?;
    plan.save()?;

    println!("Plan '{}' saved as schema {}", plan.name, plan.schema_version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn plan_with_negative_weight(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("plan.json");
        let mut plan = ProjectPlan::new("Negative");
        plan.push_section("Refund", -20);
        plan.push_task("Issue credit note", true);
        plan.push_section("Delivery", 100);
        plan.push_task("Ship", false);
        plan.save_to(&path).unwrap();
        path
    }

    fn settings(policy: WeightPolicy) -> Settings {
        Settings {
            weight_policy: policy,
            ..Settings::default()
        }
    }

    #[test]
    fn test_reject_policy_applies_to_every_completion_command() {
        let dir = TempDir::new().unwrap();
        let path = plan_with_negative_weight(&dir);
        let reject = settings(WeightPolicy::Reject);

        let err = breakdown(&path, &reject).unwrap_err();
        assert_eq!(err.error_code(), "NEGATIVE_WEIGHT");

        let err = completion(&path, None, &reject).unwrap_err();
        assert_eq!(err.error_code(), "NEGATIVE_WEIGHT");

        let err = report(dir.path(), ReportFilter::default(), None, &reject).unwrap_err();
        assert_eq!(err.error_code(), "NEGATIVE_WEIGHT");

        let err = done(&path, 4, false, &reject).unwrap_err();
        assert_eq!(err.error_code(), "NEGATIVE_WEIGHT");
        assert!(!ProjectPlan::load(&path).unwrap().line(4).unwrap().done);
    }

    #[test]
    fn test_permissive_policy_allows_negative_weights() {
        let dir = TempDir::new().unwrap();
        let path = plan_with_negative_weight(&dir);
        let permissive = settings(WeightPolicy::Permissive);

        assert!(breakdown(&path, &permissive).is_ok());
        assert!(report(dir.path(), ReportFilter::default(), None, &permissive).is_ok());
    }

    #[test]
    fn test_clamp_is_not_written_back_by_done() {
        let dir = TempDir::new().unwrap();
        let path = plan_with_negative_weight(&dir);

        done(&path, 4, false, &settings(WeightPolicy::Clamp)).unwrap();

        let plan = ProjectPlan::load(&path).unwrap();
        assert!(plan.line(4).unwrap().done);
        assert_eq!(plan.line(1).unwrap().weight, -20);
    }

    #[test]
    fn test_payment_requires_schedule() {
        let dir = TempDir::new().unwrap();
        let path = plan_with_negative_weight(&dir);
        let err = payment(&path, PaymentAction::Status).unwrap_err();
        assert_eq!(err.error_code(), "NO_PAYMENT_SCHEDULE");
    }
}
