//! Class rebalancing for the training partition
//!
//! Combines synthetic minority oversampling with Tomek-link cleaning. Only the
//! training rows are ever passed through here.

pub mod neighbors;
pub mod smote;
pub mod tomek;

use std::time::Instant;

use log::info;
use serde::Serialize;

use crate::data::table::Dataset;
use crate::error::Result;

pub use smote::Smote;
pub use tomek::TomekLinks;

/// Balanced dataset plus bookkeeping about what changed
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleOutcome {
    /// Rebalanced rows
    pub dataset: Dataset,
    /// Statistics of the run
    pub stats: ResampleStats,
}

/// Class counts and row changes of a rebalancing run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResampleStats {
    /// Rows per class before oversampling
    pub counts_before: Vec<usize>,
    /// Rows per class after cleaning
    pub counts_after: Vec<usize>,
    /// Rows synthesised by SMOTE
    pub synthetic_rows: usize,
    /// Rows removed by Tomek-link cleaning
    pub removed_rows: usize,
}

/// SMOTE followed by Tomek-link removal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmoteTomek {
    smote: Smote,
    tomek: TomekLinks,
}

impl SmoteTomek {
    /// Create a combined resampler
    #[must_use]
    pub const fn new(k_neighbors: usize, seed: u64) -> Self {
        Self {
            smote: Smote::new(k_neighbors, seed),
            tomek: TomekLinks,
        }
    }

    /// Oversample, then clean class boundaries
    pub fn fit_resample(&self, data: &Dataset, n_classes: usize) -> Result<ResampleOutcome> {
        let start = Instant::now();
        let counts_before = data.class_counts(n_classes);

        let oversampled = self.smote.fit_resample(data, n_classes)?;
        let synthetic_rows = oversampled.len() - data.len();

        let (dataset, removed_rows) = self.tomek.fit_resample(&oversampled);
        let counts_after = dataset.class_counts(n_classes);

        info!(
            "Rebalanced training rows {counts_before:?} -> {counts_after:?} ({synthetic_rows} synthesised, {removed_rows} removed) in {:?}",
            start.elapsed()
        );

        Ok(ResampleOutcome {
            dataset,
            stats: ResampleStats {
                counts_before,
                counts_after,
                synthetic_rows,
                removed_rows,
            },
        })
    }
}
