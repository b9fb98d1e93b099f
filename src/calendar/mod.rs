//! Work Calendar
//!
//! Working-day and working-hour arithmetic over a calendar with a
//! configurable weekend and a list of leaves (public holidays or
//! resource-specific absences).

mod working_time;

pub use working_time::{Leave, WorkCalendar, DEFAULT_HOURS_PER_DAY};
