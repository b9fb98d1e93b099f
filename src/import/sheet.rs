//! Sheet rows <-> plan lines.
//!
//! Column layout after the header row:
//!
//! | # | column |
//! |---|--------|
//! | 0 | Task Name |
//! | 1 | Milestone Type (non-empty makes the row a section) |
//! | 2 | Milestone Weight |
//! | 3 | Planned Start Date |
//! | 4 | Actual Start Date |
//! | 5 | Planned End Date |
//! | 6 | Actual End Date |
//! | 7 | Task Owner |
//! | 8 | Done |
//! | 9 | Comments |

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::import::cell::{parse_date_text, parse_done_flag, parse_weight, Cell};
use crate::plan::{LineKind, PlanLine, ProjectPlan};

/// A decoded sheet: rows of cells.
pub type Sheet = Vec<Vec<Cell>>;

/// Header row written on export.
pub const HEADERS: [&str; 10] = [
    "Task Name",
    "Milestone Type",
    "Milestone Weight",
    "Planned Start Date",
    "Actual Start Date",
    "Planned End Date",
    "Actual End Date",
    "Task Owner",
    "Done",
    "Comments",
];

const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn default_header_marker() -> String {
    HEADERS[0].to_string()
}

fn default_first_sequence() -> i64 {
    1
}

/// Options controlling sheet import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Text the first cell of the header row must contain.
    #[serde(default = "default_header_marker")]
    pub header_marker: String,

    /// Sequence given to the first imported line.
    #[serde(default = "default_first_sequence")]
    pub first_sequence: i64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            header_marker: default_header_marker(),
            first_sequence: default_first_sequence(),
        }
    }
}

/// Counters and messages from one import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub sections: usize,
    /// Rows with a blank name.
    pub blank_rows: usize,
    /// Rows dropped because a cell could not be used.
    pub skipped_rows: usize,
    pub warnings: Vec<String>,
}

/// Result of importing a sheet.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub lines: Vec<PlanLine>,
    pub summary: ImportSummary,
}

/// Read a sheet from a JSON file holding an array of rows.
pub fn read_sheet(path: &Path) -> Result<Sheet> {
    if !path.exists() {
        return Err(PlanError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path).map_err(|e| PlanError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Write a sheet to a JSON file.
pub fn write_sheet(path: &Path, sheet: &Sheet) -> Result<()> {
    let content = serde_json::to_string_pretty(sheet)?;
    fs::write(path, content).map_err(|e| PlanError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Index of the header row.
pub fn find_header_row(sheet: &Sheet, marker: &str) -> Option<usize> {
    sheet.iter().position(|row| {
        row.first()
            .and_then(Cell::as_text)
            .is_some_and(|text| text.contains(marker))
    })
}

/// Convert the rows below the header into plan lines.
///
/// Rows with a blank name are skipped silently; rows with an unusable cell
/// are skipped with a warning. Only a missing header row fails the import.
///
/// # Errors
/// Returns `PlanError::MissingHeaderRow` if no row starts with the marker.
pub fn import_sheet(sheet: &Sheet, options: &ImportOptions) -> Result<ImportOutcome> {
    let header = find_header_row(sheet, &options.header_marker).ok_or_else(|| {
        PlanError::MissingHeaderRow {
            marker: options.header_marker.clone(),
        }
    })?;

    let mut summary = ImportSummary::default();
    let mut lines = Vec::new();
    let mut sequence = options.first_sequence;

    for (row_idx, row) in sheet.iter().enumerate().skip(header + 1) {
        if row.first().map_or(true, Cell::is_blank) {
            summary.blank_rows += 1;
            continue;
        }

        match row_to_line(row, row_idx, sequence, &mut summary.warnings) {
            Ok(line) => {
                if line.is_section() {
                    summary.sections += 1;
                }
                lines.push(line);
                sequence += 1;
            }
            Err(e) => {
                let message = format!("Error processing row {}: {}", row_idx, e);
                warn!("{}", message);
                summary.warnings.push(message);
                summary.skipped_rows += 1;
            }
        }
    }

    summary.imported = lines.len();
    info!(
        "imported {} plan lines ({} sections, {} skipped)",
        summary.imported, summary.sections, summary.skipped_rows
    );
    Ok(ImportOutcome { lines, summary })
}

static EMPTY_CELL: Cell = Cell::Empty;

fn cell(row: &[Cell], column: usize) -> &Cell {
    row.get(column).unwrap_or(&EMPTY_CELL)
}

fn row_to_line(
    row: &[Cell],
    row_idx: usize,
    sequence: i64,
    warnings: &mut Vec<String>,
) -> Result<PlanLine> {
    let name = cell(row, 0).as_text().unwrap_or_default();
    let milestone_type = cell(row, 1).as_text();

    let kind = if milestone_type.is_some() {
        LineKind::Section
    } else {
        LineKind::Task
    };

    let mut line = PlanLine::new(sequence, kind, name);
    line.milestone_type = milestone_type;

    let weight_cell = cell(row, 2);
    if let Cell::Bool(_) = weight_cell {
        return Err(invalid(row_idx, 2, "weight cannot be a boolean"));
    }
    line.weight = parse_weight(weight_cell);

    line.planned_start = date_cell(row, row_idx, 3, warnings)?;
    line.actual_start = date_cell(row, row_idx, 4, warnings)?;
    line.planned_end = date_cell(row, row_idx, 5, warnings)?;
    line.actual_end = date_cell(row, row_idx, 6, warnings)?;

    line.owner = cell(row, 7).as_text();
    line.done = parse_done_flag(cell(row, 8));
    line.comments = cell(row, 9).as_text();

    line.validate()?;
    Ok(line)
}

fn date_cell(
    row: &[Cell],
    row_idx: usize,
    column: usize,
    warnings: &mut Vec<String>,
) -> Result<Option<NaiveDateTime>> {
    match cell(row, column) {
        Cell::Empty => Ok(None),
        Cell::Bool(_) => Err(invalid(row_idx, column, "date cannot be a boolean")),
        other => {
            let text = other.as_text().unwrap_or_default();
            if text.is_empty() {
                return Ok(None);
            }
            let parsed = parse_date_text(&text);
            if parsed.is_none() {
                let message = format!("Cannot parse date: {} (row {})", text, row_idx);
                warn!("{}", message);
                warnings.push(message);
            }
            Ok(parsed)
        }
    }
}

fn invalid(row: usize, column: usize, reason: &str) -> PlanError {
    PlanError::InvalidCell {
        row,
        column,
        reason: reason.to_string(),
    }
}

/// Render a plan as a sheet with the import column layout.
///
/// Notes have no column representation and are left out. Sections without
/// a milestone type export their own name as the type so they re-import as
/// sections.
pub fn export_sheet(plan: &ProjectPlan) -> Sheet {
    let mut sheet: Sheet = vec![HEADERS.iter().map(|&h| Cell::from(h)).collect()];

    for line in plan.lines.iter().filter(|line| !line.is_note()) {
        let fmt_date = |value: Option<NaiveDateTime>| {
            Cell::from(value.map(|v| v.format(EXPORT_DATE_FORMAT).to_string()))
        };

        let (milestone_type, weight, done) = if line.is_section() {
            (
                Cell::from(
                    line.milestone_type
                        .clone()
                        .unwrap_or_else(|| line.name.clone()),
                ),
                Cell::from(line.weight),
                Cell::Empty,
            )
        } else {
            (Cell::Empty, Cell::Empty, Cell::from(line.done))
        };

        sheet.push(vec![
            Cell::from(line.name.as_str()),
            milestone_type,
            weight,
            fmt_date(line.planned_start),
            fmt_date(line.actual_start),
            fmt_date(line.planned_end),
            fmt_date(line.actual_end),
            Cell::from(line.owner.clone()),
            done,
            Cell::from(line.comments.clone()),
        ]);
    }

    sheet
}
