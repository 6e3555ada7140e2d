//! Brute-force nearest-neighbour queries
//!
//! Distances are Euclidean on the raw feature values. Ties are broken by the
//! lower row index, so results do not depend on thread scheduling.

use rayon::prelude::*;
use smallvec::SmallVec;

use crate::data::table::FeatureMatrix;

/// Neighbour list of a single row
pub type Neighbors = SmallVec<[usize; 8]>;

/// Squared Euclidean distance between two rows
#[inline]
#[must_use]
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// The `k` nearest other members of `members`, for every member
///
/// Returned neighbour entries are positions within `members`, nearest first.
#[must_use]
pub fn k_nearest_within(matrix: &FeatureMatrix, members: &[usize], k: usize) -> Vec<Neighbors> {
    members
        .par_iter()
        .enumerate()
        .map(|(pos, &row)| {
            let query = matrix.row(row);
            let mut candidates: Vec<(f64, usize)> = members
                .iter()
                .enumerate()
                .filter(|&(other, _)| other != pos)
                .map(|(other, &other_row)| (squared_distance(query, matrix.row(other_row)), other))
                .collect();

            let take = k.min(candidates.len());
            let by_distance = |a: &(f64, usize), b: &(f64, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
            if take < candidates.len() && take > 0 {
                candidates.select_nth_unstable_by(take - 1, by_distance);
                candidates.truncate(take);
            }
            candidates.sort_unstable_by(by_distance);
            candidates.into_iter().take(take).map(|(_, other)| other).collect()
        })
        .collect()
}

/// Index of the single nearest other row, for every row of the matrix
///
/// Returns `None` for a matrix with a single row.
#[must_use]
pub fn nearest_neighbor(matrix: &FeatureMatrix) -> Vec<Option<usize>> {
    let n = matrix.n_rows();
    (0..n)
        .into_par_iter()
        .map(|row| {
            let query = matrix.row(row);
            (0..n)
                .filter(|&other| other != row)
                .map(|other| (squared_distance(query, matrix.row(other)), other))
                .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
                .map(|(_, other)| other)
        })
        .collect()
}
