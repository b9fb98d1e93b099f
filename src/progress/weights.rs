//! Section weight policy.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::plan::PlanLine;

/// How negative section weights are handled before computing completion.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum WeightPolicy {
    /// Keep negative weights; such sections simply contribute nothing.
    #[default]
    Permissive,
    /// Rewrite negative weights to zero.
    Clamp,
    /// Fail on the first negative weight.
    Reject,
}

/// Apply `policy` to the section weights of `lines`.
///
/// Returns the number of sections whose weight was rewritten.
///
/// # Errors
/// Returns `PlanError::NegativeWeight` under [`WeightPolicy::Reject`].
pub fn apply_weight_policy(lines: &mut [PlanLine], policy: WeightPolicy) -> Result<usize> {
    let mut adjusted = 0;
    for line in lines.iter_mut().filter(|line| line.is_section() && line.weight < 0) {
        match policy {
            WeightPolicy::Permissive => {}
            WeightPolicy::Clamp => {
                warn!(
                    "clamping weight {} of section '{}' to 0",
                    line.weight, line.name
                );
                line.weight = 0;
                adjusted += 1;
            }
            WeightPolicy::Reject => {
                return Err(PlanError::NegativeWeight {
                    section: line.name.clone(),
                    weight: line.weight,
                });
            }
        }
    }
    Ok(adjusted)
}

/// Sum of the positive section weights, saturating at `i64::MAX`.
pub fn total_weight(lines: &[PlanLine]) -> i64 {
    lines
        .iter()
        .filter(|line| line.is_section() && line.weight > 0)
        .map(|line| line.weight)
        .fold(0i64, i64::saturating_add)
}
