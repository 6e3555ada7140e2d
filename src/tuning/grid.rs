//! Expansion of a parameter grid into concrete candidates

use itertools::iproduct;

use crate::config::ParamGrid;
use crate::error::{PipelineError, Result};
use crate::model::BoosterParams;

/// Every grid point, in sorted parameter-name order
///
/// Axes are nested as `colsample_bytree`, `learning_rate`, `max_depth`,
/// `n_estimators`, `subsample`, with the last varying fastest. This order
/// decides which candidate wins a tie.
pub fn expand_grid(grid: &ParamGrid, seed: u64) -> Result<Vec<BoosterParams>> {
    if grid.is_empty() {
        return Err(PipelineError::InvalidConfig(
            "parameter grid has an empty axis".to_string(),
        ));
    }

    let candidates = iproduct!(
        &grid.colsample_bytree,
        &grid.learning_rate,
        &grid.max_depth,
        &grid.n_estimators,
        &grid.subsample
    )
    .map(
        |(&colsample_bytree, &learning_rate, &max_depth, &n_estimators, &subsample)| BoosterParams {
            n_estimators,
            max_depth,
            learning_rate,
            subsample,
            colsample_bytree,
            seed,
            ..BoosterParams::default()
        },
    )
    .collect();

    Ok(candidates)
}

impl ParamGrid {
    /// Every grid point as booster parameters, see [`expand_grid`]
    pub fn candidates(&self, seed: u64) -> Result<Vec<BoosterParams>> {
        expand_grid(self, seed)
    }
}
