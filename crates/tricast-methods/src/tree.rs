// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Depth-limited regression tree over dense feature rows.
//!
//! Shared by the bagged-forest, gradient-boosting and stacking methods.
//! Splits greedily minimize the summed squared error across the `K`
//! outputs; candidate features can be subsampled per split for forest-style
//! decorrelation.

use tricast_core::StableRng;

/// Minimum samples a node needs before a split is attempted.
const MIN_SAMPLES_SPLIT: usize = 2;

#[derive(Clone, Debug)]
enum Node<const K: usize> {
    Leaf {
        value: [f64; K],
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Tree growth parameters.
#[derive(Clone, Copy, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    /// Candidate features considered per split; `None` means all.
    pub feature_subsample: Option<usize>,
}

/// A fitted regression tree with `K` outputs per leaf.
#[derive(Clone, Debug)]
pub struct RegressionTree<const K: usize> {
    nodes: Vec<Node<K>>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

fn mean_target<const K: usize>(targets: &[[f64; K]], indices: &[usize]) -> [f64; K] {
    let mut out = [0.0; K];
    if indices.is_empty() {
        return out;
    }
    for &idx in indices {
        for k in 0..K {
            out[k] += targets[idx][k];
        }
    }
    for slot in out.iter_mut() {
        *slot /= indices.len() as f64;
    }
    out
}

/// Summed squared error of `indices` around their mean, over all outputs.
fn node_sse<const K: usize>(targets: &[[f64; K]], indices: &[usize]) -> f64 {
    let mean = mean_target(targets, indices);
    let mut sse = 0.0;
    for &idx in indices {
        for k in 0..K {
            let d = targets[idx][k] - mean[k];
            sse += d * d;
        }
    }
    sse
}

impl<const K: usize> RegressionTree<K> {
    /// Fits a tree on `indices` into `rows`/`targets`.
    ///
    /// `importance` (feature-indexed) accumulates the raw SSE decrease of
    /// every accepted split; callers normalize across an ensemble.
    pub fn fit(
        rows: &[Vec<f64>],
        targets: &[[f64; K]],
        indices: Vec<usize>,
        config: &TreeConfig,
        rng: &mut StableRng,
        importance: &mut [f64],
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(rows, targets, indices, 0, config, rng, importance);
        tree
    }

    fn grow(
        &mut self,
        rows: &[Vec<f64>],
        targets: &[[f64; K]],
        indices: Vec<usize>,
        depth: usize,
        config: &TreeConfig,
        rng: &mut StableRng,
        importance: &mut [f64],
    ) -> usize {
        let parent_sse = node_sse(targets, &indices);
        let make_leaf = depth >= config.max_depth
            || indices.len() < MIN_SAMPLES_SPLIT
            || parent_sse <= f64::EPSILON;

        let candidate = if make_leaf {
            None
        } else {
            best_split(rows, targets, &indices, parent_sse, config, rng)
        };

        let Some(split) = candidate else {
            let node = Node::Leaf {
                value: mean_target(targets, &indices),
            };
            self.nodes.push(node);
            return self.nodes.len() - 1;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&idx| rows[idx][split.feature] <= split.threshold);

        if split.feature < importance.len() {
            importance[split.feature] += split.score;
        }

        // Reserve the split slot before growing children so child indices
        // are known only after recursion.
        let slot = self.nodes.len();
        self.nodes.push(Node::Leaf { value: [0.0; K] });
        let left = self.grow(rows, targets, left_idx, depth + 1, config, rng, importance);
        let right = self.grow(rows, targets, right_idx, depth + 1, config, rng, importance);
        self.nodes[slot] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        slot
    }

    pub fn predict(&self, row: &[f64]) -> [f64; K] {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Exhaustive threshold scan over the candidate features.
fn best_split<const K: usize>(
    rows: &[Vec<f64>],
    targets: &[[f64; K]],
    indices: &[usize],
    parent_sse: f64,
    config: &TreeConfig,
    rng: &mut StableRng,
) -> Option<SplitCandidate> {
    let feature_count = rows.first().map(Vec::len)?;
    let candidates: Vec<usize> = match config.feature_subsample {
        Some(count) if count < feature_count => {
            // Sample without replacement via a partial Fisher-Yates pass.
            let mut pool: Vec<usize> = (0..feature_count).collect();
            for i in 0..count {
                let j = i + rng.index(feature_count - i);
                pool.swap(i, j);
            }
            pool.truncate(count);
            pool
        }
        _ => (0..feature_count).collect(),
    };

    let mut best: Option<SplitCandidate> = None;
    for feature in candidates {
        let mut ordered: Vec<usize> = indices.to_vec();
        ordered.sort_by(|&a, &b| {
            rows[a][feature]
                .partial_cmp(&rows[b][feature])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Prefix sums over ordered targets give O(1) SSE per threshold.
        let m = ordered.len();
        let mut prefix_sum = vec![[0.0; K]; m + 1];
        let mut prefix_sq = vec![0.0; m + 1];
        for (i, &idx) in ordered.iter().enumerate() {
            for k in 0..K {
                prefix_sum[i + 1][k] = prefix_sum[i][k] + targets[idx][k];
            }
            let mut sq = 0.0;
            for k in 0..K {
                sq += targets[idx][k] * targets[idx][k];
            }
            prefix_sq[i + 1] = prefix_sq[i] + sq;
        }
        let total_sq = prefix_sq[m];

        for cut in 1..m {
            // Only cut between distinct feature values.
            if rows[ordered[cut - 1]][feature] == rows[ordered[cut]][feature] {
                continue;
            }
            let left_n = cut as f64;
            let right_n = (m - cut) as f64;
            let mut left_mean_sq = 0.0;
            let mut right_mean_sq = 0.0;
            for k in 0..K {
                let left_sum = prefix_sum[cut][k];
                let right_sum = prefix_sum[m][k] - left_sum;
                left_mean_sq += left_sum * left_sum / left_n;
                right_mean_sq += right_sum * right_sum / right_n;
            }
            let children_sse = total_sq - left_mean_sq - right_mean_sq;
            let score = parent_sse - children_sse;

            let improves = match &best {
                Some(current) => score > current.score,
                None => score > 1e-12,
            };
            if improves {
                best = Some(SplitCandidate {
                    feature,
                    threshold: (rows[ordered[cut - 1]][feature]
                        + rows[ordered[cut]][feature])
                        / 2.0,
                    score,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::{RegressionTree, TreeConfig};
    use tricast_core::StableRng;

    fn config(max_depth: usize) -> TreeConfig {
        TreeConfig {
            max_depth,
            feature_subsample: None,
        }
    }

    #[test]
    fn single_feature_step_function_is_learned_exactly() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let targets: Vec<[f64; 1]> =
            (0..20).map(|i| [if i < 10 { 1.0 } else { 5.0 }]).collect();
        let mut rng = StableRng::new(0);
        let mut importance = vec![0.0; 1];
        let tree = RegressionTree::fit(
            &rows,
            &targets,
            (0..20).collect(),
            &config(3),
            &mut rng,
            &mut importance,
        );
        assert_eq!(tree.predict(&[3.0]), [1.0]);
        assert_eq!(tree.predict(&[15.0]), [5.0]);
        assert!(importance[0] > 0.0);
    }

    #[test]
    fn depth_zero_tree_is_the_global_mean() {
        let rows: Vec<Vec<f64>> = (0..4).map(|i| vec![i as f64]).collect();
        let targets = vec![[0.0], [2.0], [4.0], [6.0]];
        let mut rng = StableRng::new(0);
        let mut importance = vec![0.0; 1];
        let tree = RegressionTree::fit(
            &rows,
            &targets,
            (0..4).collect(),
            &config(0),
            &mut rng,
            &mut importance,
        );
        assert_eq!(tree.predict(&[100.0]), [3.0]);
        assert_eq!(importance[0], 0.0);
    }

    #[test]
    fn multi_output_leaves_predict_vector_means() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let targets: Vec<[f64; 3]> = (0..10)
            .map(|i| {
                if i < 5 {
                    [1.0, 2.0, 3.0]
                } else {
                    [7.0, 8.0, 9.0]
                }
            })
            .collect();
        let mut rng = StableRng::new(0);
        let mut importance = vec![0.0; 1];
        let tree = RegressionTree::fit(
            &rows,
            &targets,
            (0..10).collect(),
            &config(4),
            &mut rng,
            &mut importance,
        );
        assert_eq!(tree.predict(&[1.0]), [1.0, 2.0, 3.0]);
        assert_eq!(tree.predict(&[9.0]), [7.0, 8.0, 9.0]);
    }

    #[test]
    fn constant_targets_produce_a_single_leaf() {
        let rows: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64, (i * 2) as f64]).collect();
        let targets = vec![[4.0]; 6];
        let mut rng = StableRng::new(0);
        let mut importance = vec![0.0; 2];
        let tree = RegressionTree::fit(
            &rows,
            &targets,
            (0..6).collect(),
            &config(5),
            &mut rng,
            &mut importance,
        );
        assert_eq!(tree.predict(&[0.0, 0.0]), [4.0]);
        assert!(importance.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn irrelevant_feature_gets_no_importance() {
        // Feature 0 fully determines the target; feature 1 is constant.
        let rows: Vec<Vec<f64>> = (0..12)
            .map(|i| vec![i as f64, 1.0])
            .collect();
        let targets: Vec<[f64; 1]> =
            (0..12).map(|i| [if i < 6 { 0.0 } else { 10.0 }]).collect();
        let mut rng = StableRng::new(0);
        let mut importance = vec![0.0; 2];
        let _tree = RegressionTree::fit(
            &rows,
            &targets,
            (0..12).collect(),
            &config(3),
            &mut rng,
            &mut importance,
        );
        assert!(importance[0] > 0.0);
        assert_eq!(importance[1], 0.0);
    }
}
