//! Synthetic minority oversampling
//!
//! Every class other than the majority is grown to the majority's row count.
//! A synthetic row lies on the segment between a class member and one of its
//! `k` nearest same-class neighbours.

use log::debug;
use rand::prelude::*;

use crate::data::table::Dataset;
use crate::error::{PipelineError, Result};
use crate::resample::neighbors::k_nearest_within;

/// SMOTE oversampler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Smote {
    /// Neighbours considered per class member
    pub k_neighbors: usize,
    /// Seed for pair and gap selection
    pub seed: u64,
}

impl Default for Smote {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
        }
    }
}

impl Smote {
    /// Create an oversampler
    #[must_use]
    pub const fn new(k_neighbors: usize, seed: u64) -> Self {
        Self { k_neighbors, seed }
    }

    /// Return the original rows followed by the synthetic rows
    ///
    /// Synthetic rows are appended class by class in code order. Classes with
    /// no rows are left empty.
    pub fn fit_resample(&self, data: &Dataset, n_classes: usize) -> Result<Dataset> {
        if self.k_neighbors == 0 {
            return Err(PipelineError::InvalidConfig(
                "SMOTE needs at least one neighbour".to_string(),
            ));
        }

        let counts = data.class_counts(n_classes);
        let majority = counts.iter().copied().max().unwrap_or(0);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut resampled = data.clone();

        for (class, &count) in counts.iter().enumerate() {
            if count == 0 || count == majority {
                continue;
            }
            if count < 2 {
                return Err(PipelineError::DegenerateClass(format!(
                    "class {class} has a single training row; oversampling needs at least 2"
                )));
            }

            let members: Vec<usize> = (0..data.len()).filter(|&i| data.labels[i] == class).collect();
            let k = self.k_neighbors.min(count - 1);
            let neighbors = k_nearest_within(&data.features, &members, k);
            let needed = majority - count;
            debug!("Synthesising {needed} rows for class {class} from {count} members (k = {k})");

            let mut row = vec![0.0; data.features.n_cols()];
            for _ in 0..needed {
                let pick = rng.random_range(0..count * k);
                let (base, nth) = (pick / k, pick % k);
                let gap: f64 = rng.random();

                let origin = data.features.row(members[base]);
                let target = data.features.row(members[neighbors[base][nth]]);
                for ((out, &a), &b) in row.iter_mut().zip(origin).zip(target) {
                    *out = a + gap * (b - a);
                }

                resampled.features.push_row(&row);
                resampled.labels.push(class);
            }
        }

        Ok(resampled)
    }
}
