//! Caller-tunable parameters.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration.

use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Layout iterations before the thorough-mode multiplier and the cap apply.
pub const BASE_ITERATIONS: usize = 50;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Multiplies [`BASE_ITERATIONS`] in thorough mode.
    pub iteration_multiplier: usize,
    /// Upper bound on layout iterations.
    pub iteration_cap: usize,
    /// Spend more effort: more layout iterations, more super layouts.
    pub thorough: bool,
    /// Super layouts generated normally.
    pub super_layout_limit: usize,
    /// Super layouts generated in thorough mode.
    pub thorough_super_layout_limit: usize,
    /// States per meta-node when aggregating.
    pub aggregate_size: usize,
    /// Smallest accepted board side for boards read from files.
    pub min_dimension: usize,
    /// Largest accepted board side for boards read from files.
    pub max_dimension: usize,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            iteration_multiplier: 3,
            iteration_cap: 200,
            thorough: false,
            super_layout_limit: 8,
            thorough_super_layout_limit: 20,
            aggregate_size: 10,
            min_dimension: 3,
            max_dimension: 8,
        }
    }
}

impl Tunables {
    /// Loads tunables from a JSON file; absent keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Layout iteration count: `min(BASE_ITERATIONS * multiplier, cap)`, where
    /// the multiplier only applies in thorough mode.
    pub fn layout_iterations(&self) -> usize {
        let multiplier = if self.thorough {
            self.iteration_multiplier
        } else {
            1
        };
        BASE_ITERATIONS
            .saturating_mul(multiplier)
            .min(self.iteration_cap)
    }

    /// Ceiling on the number of super layouts.
    pub fn super_limit(&self) -> usize {
        if self.thorough {
            self.thorough_super_layout_limit
        } else {
            self.super_layout_limit
        }
    }

    /// Accepted board side lengths.
    pub fn dimension_range(&self) -> RangeInclusive<usize> {
        self.min_dimension..=self.max_dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iterations_respect_mode_and_cap() {
        let mut tunables = Tunables::default();
        assert_eq!(tunables.layout_iterations(), 50);
        tunables.thorough = true;
        assert_eq!(tunables.layout_iterations(), 150);
        tunables.iteration_multiplier = 10;
        assert_eq!(tunables.layout_iterations(), 200);
        tunables.iteration_multiplier = usize::MAX;
        assert_eq!(tunables.layout_iterations(), 200);
    }

    #[test]
    fn test_super_limit_follows_mode() {
        let mut tunables = Tunables::default();
        assert_eq!(tunables.super_limit(), 8);
        tunables.thorough = true;
        assert_eq!(tunables.super_limit(), 20);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tunables: Tunables = serde_json::from_str(r#"{"aggregate_size": 4}"#).unwrap();
        assert_eq!(tunables.aggregate_size, 4);
        assert_eq!(tunables.iteration_cap, 200);
        assert_eq!(tunables.dimension_range(), 3..=8);
    }
}
