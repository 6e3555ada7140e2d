//! Second-order regression trees for gradient boosting
//!
//! Trees grow depth-wise with exact greedy split search over pre-sorted
//! columns. Split quality is the usual gradient/hessian gain
//! `½[G_L²/(H_L+λ) + G_R²/(H_R+λ) − G²/(H+λ)] − γ`, and a leaf predicts
//! `−η·G/(H+λ)`.

use crate::data::table::FeatureMatrix;

/// Smallest gain that still counts as an improvement
const MIN_SPLIT_GAIN: f64 = 1e-6;

/// Growth and regularisation settings for one tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// Maximum depth; the root is depth 0
    pub max_depth: usize,
    /// L2 penalty on leaf weights
    pub reg_lambda: f64,
    /// Minimum hessian sum in each child
    pub min_child_weight: f64,
    /// Minimum gain required to split
    pub gamma: f64,
    /// Shrinkage applied to every leaf
    pub learning_rate: f64,
}

/// Row indices of every column, sorted by value
///
/// Built once per training matrix and shared by all trees fitted on it.
#[derive(Debug, Clone)]
pub struct SortedColumns {
    order: Vec<Vec<usize>>,
}

impl SortedColumns {
    /// Sort every column of the matrix (ties by row index)
    #[must_use]
    pub fn new(matrix: &FeatureMatrix) -> Self {
        let order = (0..matrix.n_cols())
            .map(|col| {
                let mut rows: Vec<usize> = (0..matrix.n_rows()).collect();
                rows.sort_by(|&a, &b| matrix.value(a, col).total_cmp(&matrix.value(b, col)));
                rows
            })
            .collect();
        Self { order }
    }

    fn column(&self, col: usize) -> &[usize] {
        &self.order[col]
    }
}

/// A node of a fitted tree
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    /// Internal node; rows with `value < threshold` go left
    Split {
        /// Feature column
        feature: usize,
        /// Split point
        threshold: f64,
        /// Index of the left child
        left: usize,
        /// Index of the right child
        right: usize,
    },
    /// Terminal node
    Leaf {
        /// Contribution added to the margin
        value: f64,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    gain: f64,
    feature: usize,
    threshold: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct ScanState {
    grad_left: f64,
    hess_left: f64,
    last_value: Option<f64>,
}

/// A fitted regression tree
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Fit one tree to per-row gradients and hessians
    ///
    /// Only rows with `in_sample[row]` contribute to the statistics, and only
    /// the listed `features` are considered for splits.
    #[must_use]
    pub fn fit(
        matrix: &FeatureMatrix,
        sorted: &SortedColumns,
        grad: &[f64],
        hess: &[f64],
        in_sample: &[bool],
        features: &[usize],
        params: &TreeParams,
    ) -> Self {
        let n_rows = matrix.n_rows();
        let mut position: Vec<Option<usize>> =
            (0..n_rows).map(|row| in_sample[row].then_some(0)).collect();

        let mut nodes = vec![TreeNode::Leaf { value: 0.0 }];
        let (g, h) = (0..n_rows)
            .filter(|&row| in_sample[row])
            .fold((0.0, 0.0), |(g, h), row| (g + grad[row], h + hess[row]));
        let mut stats = vec![(g, h)];
        let mut frontier = vec![0usize];

        for _ in 0..params.max_depth {
            if frontier.is_empty() {
                break;
            }

            let mut slot_of = vec![None; nodes.len()];
            for (slot, &node) in frontier.iter().enumerate() {
                slot_of[node] = Some(slot);
            }

            let best = Self::find_splits(matrix, sorted, grad, hess, &position, &slot_of, &frontier, &stats, features, params);

            // Children of split nodes; nodes without a split become leaves
            let mut child_of = vec![None; nodes.len()];
            let mut next_frontier = Vec::new();
            for (slot, &node) in frontier.iter().enumerate() {
                match best[slot] {
                    Some(split) => {
                        let left = nodes.len();
                        let right = left + 1;
                        nodes.push(TreeNode::Leaf { value: 0.0 });
                        nodes.push(TreeNode::Leaf { value: 0.0 });
                        stats.push((0.0, 0.0));
                        stats.push((0.0, 0.0));
                        nodes[node] = TreeNode::Split {
                            feature: split.feature,
                            threshold: split.threshold,
                            left,
                            right,
                        };
                        child_of[node] = Some((split.feature, split.threshold, left, right));
                        next_frontier.push(left);
                        next_frontier.push(right);
                    }
                    None => nodes[node] = Self::leaf(stats[node], params),
                }
            }

            for row in 0..n_rows {
                let Some(node) = position[row] else { continue };
                let Some((feature, threshold, left, right)) = child_of.get(node).copied().flatten() else {
                    continue;
                };
                let child = if matrix.value(row, feature) < threshold { left } else { right };
                position[row] = Some(child);
                stats[child].0 += grad[row];
                stats[child].1 += hess[row];
            }

            frontier = next_frontier;
        }

        for node in frontier {
            nodes[node] = Self::leaf(stats[node], params);
        }

        Self { nodes }
    }

    #[allow(clippy::too_many_arguments)]
    fn find_splits(
        matrix: &FeatureMatrix,
        sorted: &SortedColumns,
        grad: &[f64],
        hess: &[f64],
        position: &[Option<usize>],
        slot_of: &[Option<usize>],
        frontier: &[usize],
        stats: &[(f64, f64)],
        features: &[usize],
        params: &TreeParams,
    ) -> Vec<Option<SplitCandidate>> {
        let lambda = params.reg_lambda;
        let score = |g: f64, h: f64| g * g / (h + lambda);
        let mut best: Vec<Option<SplitCandidate>> = vec![None; frontier.len()];

        for &feature in features {
            let mut scan = vec![ScanState::default(); frontier.len()];

            for &row in sorted.column(feature) {
                let Some(node) = position[row] else { continue };
                let Some(slot) = slot_of.get(node).copied().flatten() else {
                    continue;
                };
                let value = matrix.value(row, feature);
                let state = &mut scan[slot];

                if let Some(prev) = state.last_value {
                    if value > prev {
                        let (g_total, h_total) = stats[frontier[slot]];
                        let (gl, hl) = (state.grad_left, state.hess_left);
                        let (gr, hr) = (g_total - gl, h_total - hl);
                        if hl >= params.min_child_weight && hr >= params.min_child_weight {
                            let gain = 0.5 * (score(gl, hl) + score(gr, hr) - score(g_total, h_total))
                                - params.gamma;
                            let improves = gain > MIN_SPLIT_GAIN
                                && best[slot].is_none_or(|current| gain > current.gain);
                            if improves {
                                best[slot] = Some(SplitCandidate {
                                    gain,
                                    feature,
                                    threshold: split_threshold(prev, value),
                                });
                            }
                        }
                    }
                }

                state.grad_left += grad[row];
                state.hess_left += hess[row];
                state.last_value = Some(value);
            }
        }

        best
    }

    fn leaf((g, h): (f64, f64), params: &TreeParams) -> TreeNode {
        TreeNode::Leaf {
            value: -params.learning_rate * g / (h + params.reg_lambda),
        }
    }

    /// Margin contribution for one row
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] < *threshold { *left } else { *right };
                }
            }
        }
    }

    /// All nodes, root first
    #[must_use]
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Number of leaves
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    /// Length of the longest root-to-leaf path
    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Midpoint of two adjacent distinct values, or `value` when the midpoint rounds to `prev`
fn split_threshold(prev: f64, value: f64) -> f64 {
    let mid = prev + (value - prev) / 2.0;
    if mid > prev { mid } else { value }
}
