//! Plan Import / Export
//!
//! Spreadsheet rows, already decoded into cells, are mapped onto plan lines
//! and back. Decoding the workbook itself happens outside this crate.

pub mod cell;
pub mod sheet;

pub use cell::{parse_date_text, parse_done_flag, parse_weight, Cell};
pub use sheet::{
    export_sheet, find_header_row, import_sheet, read_sheet, write_sheet, ImportOptions,
    ImportOutcome, ImportSummary, Sheet, HEADERS,
};
