//! Weighted completion.
//!
//! Two rules, chosen once for the whole plan:
//!
//! - **Unweighted**: no section has a positive weight. Completion is the
//!   share of done tasks across the plan.
//! - **Weighted**: at least one section has a positive weight. Each section
//!   contributes `weight * done / total` over the tasks that follow it up to
//!   the next section. Weights are not normalized, so the result is whatever
//!   the contributions sum to.
//!
//! Tasks ahead of the first section have no weight to scale and drop out of
//! the weighted rule; [`section_breakdown`] reports how many there were.

use log::debug;
use serde::Serialize;

use crate::plan::{LineKind, PlanLine};

/// One contiguous run of tasks, opened by a section or by the start of
/// the plan.
#[derive(Debug, Clone, Copy)]
struct Run<'a> {
    section: Option<&'a PlanLine>,
    done: usize,
    total: usize,
}

impl<'a> Run<'a> {
    fn opened_by(section: Option<&'a PlanLine>) -> Self {
        Self {
            section,
            done: 0,
            total: 0,
        }
    }

    fn weight(&self) -> i64 {
        self.section.map_or(0, |section| section.weight)
    }

    /// Weighted contribution of the run; zero without a positive weight or
    /// without tasks.
    fn contribution(&self) -> f64 {
        if self.weight() <= 0 || self.total == 0 {
            return 0.0;
        }
        self.weight() as f64 * (self.done as f64 / self.total as f64)
    }
}

/// Split the plan into runs, in order. The leading run without a section
/// only appears when tasks precede the first section.
fn runs(lines: &[PlanLine]) -> Vec<Run<'_>> {
    let mut runs = Vec::new();
    let mut current = Run::opened_by(None);

    for line in lines {
        match line.kind {
            LineKind::Section => {
                if current.section.is_some() || current.total > 0 {
                    runs.push(current);
                }
                current = Run::opened_by(Some(line));
            }
            LineKind::Task => {
                current.total += 1;
                if line.done {
                    current.done += 1;
                }
            }
            LineKind::Note => {}
        }
    }

    if current.section.is_some() || current.total > 0 {
        runs.push(current);
    }
    runs
}

/// Whether any section in the plan carries a positive weight.
pub fn has_weighted_section(lines: &[PlanLine]) -> bool {
    lines
        .iter()
        .any(|line| line.kind == LineKind::Section && line.weight > 0)
}

/// Completion percentage of a plan, given its lines in sequence order.
///
/// Pure and deterministic; an empty plan yields `0.0`.
pub fn completion_percent(lines: &[PlanLine]) -> f64 {
    let percent = if has_weighted_section(lines) {
        weighted_completion(lines)
    } else {
        unweighted_completion(lines)
    };
    debug!("completion over {} lines: {}", lines.len(), percent);
    percent
}

fn unweighted_completion(lines: &[PlanLine]) -> f64 {
    let (done, total) = task_counts(lines);
    if total == 0 {
        return 0.0;
    }
    100.0 * done as f64 / total as f64
}

fn weighted_completion(lines: &[PlanLine]) -> f64 {
    runs(lines).iter().map(Run::contribution).sum()
}

fn task_counts(lines: &[PlanLine]) -> (usize, usize) {
    lines
        .iter()
        .filter(|line| line.kind == LineKind::Task)
        .fold((0, 0), |(done, total), line| {
            (done + usize::from(line.done), total + 1)
        })
}

/// Progress of one section (or of the tasks ahead of the first section).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionProgress {
    /// Section name; `None` for tasks that precede every section.
    pub name: Option<String>,
    pub sequence: Option<i64>,
    pub weight: i64,
    pub done: usize,
    pub total: usize,
    /// Percentage points this run adds to the plan's completion.
    pub contribution: f64,
}

/// Per-section view of a plan's completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    /// Whether the weighted rule applied.
    pub weighted: bool,
    pub sections: Vec<SectionProgress>,
    /// Tasks ahead of the first section. Under the weighted rule they do
    /// not count toward completion.
    pub orphan_tasks: usize,
    /// Sum of the contributions, equal to [`completion_percent`].
    pub percent: f64,
}

/// Break a plan's completion down by section.
///
/// Under the unweighted rule each run contributes its share of the flat
/// ratio, so the contributions still add up to the plan's completion.
pub fn section_breakdown(lines: &[PlanLine]) -> Breakdown {
    let weighted = has_weighted_section(lines);
    let (_, all_tasks) = task_counts(lines);

    let runs = runs(lines);
    let orphan_tasks = runs
        .iter()
        .find(|run| run.section.is_none())
        .map_or(0, |run| run.total);

    let sections: Vec<SectionProgress> = runs
        .iter()
        .map(|run| {
            let contribution = if weighted {
                run.contribution()
            } else if all_tasks == 0 {
                0.0
            } else {
                100.0 * run.done as f64 / all_tasks as f64
            };
            SectionProgress {
                name: run.section.map(|section| section.name.clone()),
                sequence: run.section.map(|section| section.sequence),
                weight: run.weight(),
                done: run.done,
                total: run.total,
                contribution,
            }
        })
        .collect();

    let percent = if weighted {
        sections.iter().map(|section| section.contribution).sum()
    } else {
        unweighted_completion(lines)
    };

    Breakdown {
        weighted,
        sections,
        orphan_tasks,
        percent,
    }
}
