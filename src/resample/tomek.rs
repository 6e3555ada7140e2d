//! Tomek-link cleaning
//!
//! Two rows form a Tomek link when each is the other's nearest neighbour and
//! their labels differ. Both rows of every link are removed.

use crate::data::table::Dataset;
use crate::resample::neighbors::nearest_neighbor;

/// Tomek-link remover
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TomekLinks;

impl TomekLinks {
    /// Every link as `(lower, higher)` row index, sorted
    #[must_use]
    pub fn find_links(&self, data: &Dataset) -> Vec<(usize, usize)> {
        let nearest = nearest_neighbor(&data.features);
        nearest
            .iter()
            .enumerate()
            .filter_map(|(row, &nn)| {
                let nn = nn?;
                let mutual = nearest[nn] == Some(row);
                (row < nn && mutual && data.labels[row] != data.labels[nn]).then_some((row, nn))
            })
            .collect()
    }

    /// Drop both rows of every link, keeping the remaining order
    ///
    /// Returns the cleaned dataset and the number of rows removed.
    #[must_use]
    pub fn fit_resample(&self, data: &Dataset) -> (Dataset, usize) {
        let mut removed = vec![false; data.len()];
        for (a, b) in self.find_links(data) {
            removed[a] = true;
            removed[b] = true;
        }
        let kept: Vec<usize> = (0..data.len()).filter(|&i| !removed[i]).collect();
        let n_removed = data.len() - kept.len();
        (data.subset(&kept), n_removed)
    }
}
