//! Progress
//!
//! Completion percentage of a plan from its section weights and task flags.

pub mod completion;
pub mod weights;

pub use completion::{
    completion_percent, has_weighted_section, section_breakdown, Breakdown, SectionProgress,
};
pub use weights::{apply_weight_policy, total_weight, WeightPolicy};
