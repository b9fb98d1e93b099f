//! Plan Module
//!
//! Plan lines, the project plan document, and schema migration.

pub mod line;
pub mod migration;
pub mod project;

pub use line::{LineKind, PlanLine};
pub use migration::{migrate_plan, CURRENT_SCHEMA_VERSION};
pub use project::{LineDuration, Milestone, ProjectPlan};
