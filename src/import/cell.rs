//! Sheet cells and their coercion into plan values.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Date-time formats accepted in date columns, tried in order.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Date-only formats accepted in date columns, tried in order. Day-first
/// wins over month-first when both would match.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];

/// Spellings that mark a task as done.
const DONE_MARKERS: &[&str] = &["true", "1", "yes", "done", "x"];

/// A decoded spreadsheet cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Whether the cell holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed text rendering; `None` for blank cells.
    ///
    /// Whole numbers render without a fractional part.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Bool(value) => Some(value.to_string()),
            Cell::Number(value) if value.fract() == 0.0 && value.is_finite() => {
                Some(format!("{}", *value as i64))
            }
            Cell::Number(value) => Some(value.to_string()),
            Cell::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Empty, Into::into)
    }
}

/// Interpret a done column. Blank cells are not done.
pub fn parse_done_flag(cell: &Cell) -> bool {
    match cell {
        Cell::Bool(value) => *value,
        other => other
            .as_text()
            .map(|text| DONE_MARKERS.contains(&text.to_lowercase().as_str()))
            .unwrap_or(false),
    }
}

/// Interpret a weight column. Fractions truncate; anything unparsable is 0.
pub fn parse_weight(cell: &Cell) -> i64 {
    match cell {
        Cell::Number(value) if value.is_finite() => value.trunc() as i64,
        Cell::Text(text) => text.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

/// Parse a date or date-time string in any accepted format.
///
/// Date-only values resolve to midnight.
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Cell::text("Yes"), true ; "yes any case")]
    #[test_case(Cell::text(" x "), true ; "padded x")]
    #[test_case(Cell::text("DONE"), true ; "done upper")]
    #[test_case(Cell::Number(1.0), true ; "number one")]
    #[test_case(Cell::Bool(true), true ; "bool true")]
    #[test_case(Cell::text("no"), false ; "no")]
    #[test_case(Cell::Number(2.0), false ; "number two")]
    #[test_case(Cell::Empty, false ; "empty")]
    fn test_done_flag(cell: Cell, expected: bool) {
        assert_eq!(parse_done_flag(&cell), expected);
    }

    #[test_case(Cell::Number(25.0), 25 ; "whole number")]
    #[test_case(Cell::Number(33.9), 33 ; "fraction truncates")]
    #[test_case(Cell::text(" 50 "), 50 ; "text number")]
    #[test_case(Cell::text("25.5"), 0 ; "text fraction")]
    #[test_case(Cell::text("half"), 0 ; "text word")]
    #[test_case(Cell::Empty, 0 ; "empty")]
    fn test_weight(cell: Cell, expected: i64) {
        assert_eq!(parse_weight(&cell), expected);
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_date_text("2024-03-05"), Some(expected));
        assert_eq!(parse_date_text("05/03/2024"), Some(expected));
        assert_eq!(parse_date_text("05-03-2024"), Some(expected));
        assert_eq!(
            parse_date_text("2024-03-05 09:30"),
            Some(expected + chrono::Duration::minutes(570))
        );
    }

    #[test]
    fn test_month_first_fallback() {
        // 13 cannot be a month, so only %m/%d/%Y matches.
        let parsed = parse_date_text("03/13/2024").unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 3, 13).unwrap());
    }

    #[test]
    fn test_unparsable_date() {
        assert_eq!(parse_date_text("next week"), None);
        assert_eq!(parse_date_text("   "), None);
    }

    #[test]
    fn test_cells_deserialize_from_json() {
        let row: Vec<Cell> = serde_json::from_str(r#"["Phase 1", 25, null, true]"#).unwrap();
        assert_eq!(
            row,
            vec![
                Cell::text("Phase 1"),
                Cell::Number(25.0),
                Cell::Empty,
                Cell::Bool(true)
            ]
        );
    }

    #[test]
    fn test_as_text_renders_whole_numbers() {
        assert_eq!(Cell::Number(7.0).as_text().as_deref(), Some("7"));
        assert_eq!(Cell::text("  ").as_text(), None);
    }
}
