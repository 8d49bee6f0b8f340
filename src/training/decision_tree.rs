//! Decision tree classifier

use crate::error::{GradecastError, Result};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Node of a fitted tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Terminal node carrying the majority class
    Leaf { class: f64, n_samples: usize },
    /// Binary split on one feature
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Impurity criterion for split selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criterion {
    Gini,
    Entropy,
}

/// CART-style classification tree.
///
/// Labels are integer class codes carried as `f64`, matching the feature
/// matrix pipeline. Fitting is deterministic: ties in split gain resolve by
/// feature order and ties in leaf votes resolve toward the lowest class code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth; `None` grows until pure
    pub max_depth: Option<usize>,
    /// Minimum samples required to attempt a split
    pub min_samples_split: usize,
    /// Minimum samples each child must keep
    pub min_samples_leaf: usize,
    /// Impurity criterion
    pub criterion: Criterion,
    n_features: usize,
    classes: Vec<f64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::Gini,
            n_features: 0,
            classes: Vec::new(),
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Distinct classes seen at fit time, ascending
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(GradecastError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(GradecastError::InvalidInput(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }

        self.n_features = x.ncols();

        let mut classes: Vec<f64> = y.iter().copied().collect();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        classes.dedup();
        self.classes = classes;

        // Work with class indices rather than raw label values; integer
        // comparisons keep purity checks and vote counts exact.
        let class_ids: Vec<usize> = y.iter().map(|&v| self.class_index(v)).collect();

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, &class_ids, &indices, 0));
        Ok(self)
    }

    /// Predict class codes for each row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(GradecastError::NotFitted)?;
        if x.ncols() != self.n_features {
            return Err(GradecastError::Shape {
                expected: format!("{} feature columns", self.n_features),
                actual: format!("{} feature columns", x.ncols()),
            });
        }

        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| Self::predict_sample(root, &x.row(i).to_vec()))
            .collect();
        Ok(Array1::from_vec(predictions))
    }

    /// Depth of the fitted tree (0 before fitting)
    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }

    fn class_index(&self, value: f64) -> usize {
        self.classes
            .binary_search_by(|c| c.partial_cmp(&value).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(0)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        class_ids: &[usize],
        indices: &[usize],
        depth: usize,
    ) -> TreeNode {
        let n_samples = indices.len();

        let should_stop = n_samples < self.min_samples_split
            || self.max_depth.map_or(false, |d| depth >= d)
            || Self::is_pure(class_ids, indices);

        if should_stop {
            return self.leaf(class_ids, indices);
        }

        match self.find_best_split(x, class_ids, indices) {
            Some((feature_idx, threshold)) => {
                let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, feature_idx]] <= threshold);

                if left_indices.len() < self.min_samples_leaf
                    || right_indices.len() < self.min_samples_leaf
                {
                    return self.leaf(class_ids, indices);
                }

                let left = Box::new(self.build_tree(x, class_ids, &left_indices, depth + 1));
                let right = Box::new(self.build_tree(x, class_ids, &right_indices, depth + 1));
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    n_samples,
                }
            }
            None => self.leaf(class_ids, indices),
        }
    }

    /// Best (feature, threshold) by impurity gain. Features scan in parallel;
    /// within a feature, candidate thresholds are midpoints between
    /// consecutive distinct values and class counts update incrementally over
    /// the sorted samples.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        class_ids: &[usize],
        indices: &[usize],
    ) -> Option<(usize, f64)> {
        let n = indices.len() as f64;
        let n_classes = self.classes.len();

        let mut parent_counts = vec![0usize; n_classes];
        for &i in indices {
            parent_counts[class_ids[i]] += 1;
        }
        let parent_impurity = self.impurity(&parent_counts, indices.len());

        let feature_results: Vec<Option<(usize, f64, f64)>> = (0..x.ncols())
            .into_par_iter()
            .map(|feature_idx| {
                let mut samples: Vec<(f64, usize)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], class_ids[i]))
                    .collect();
                samples
                    .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

                let mut left_counts = vec![0usize; n_classes];
                let mut right_counts = parent_counts.clone();
                let mut best_gain = 0.0f64;
                let mut best_threshold = 0.0f64;

                for split_at in 1..samples.len() {
                    let (prev_value, prev_class) = samples[split_at - 1];
                    left_counts[prev_class] += 1;
                    right_counts[prev_class] -= 1;

                    let value = samples[split_at].0;
                    if value <= prev_value {
                        continue;
                    }
                    if split_at < self.min_samples_leaf
                        || samples.len() - split_at < self.min_samples_leaf
                    {
                        continue;
                    }

                    let weighted = (split_at as f64 * self.impurity(&left_counts, split_at)
                        + (samples.len() - split_at) as f64
                            * self.impurity(&right_counts, samples.len() - split_at))
                        / n;
                    let gain = parent_impurity - weighted;
                    if gain > best_gain {
                        best_gain = gain;
                        best_threshold = (prev_value + value) / 2.0;
                    }
                }

                if best_gain > 1e-12 {
                    Some((feature_idx, best_threshold, best_gain))
                } else {
                    None
                }
            })
            .collect();

        // Equal gains keep the earliest feature
        feature_results
            .into_iter()
            .flatten()
            .max_by(|a, b| {
                a.2.partial_cmp(&b.2)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.0.cmp(&a.0))
            })
            .map(|(feature_idx, threshold, _)| (feature_idx, threshold))
    }

    fn impurity(&self, counts: &[usize], total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let n = total as f64;
        match self.criterion {
            Criterion::Gini => {
                1.0 - counts
                    .iter()
                    .map(|&c| (c as f64 / n).powi(2))
                    .sum::<f64>()
            }
            Criterion::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        }
    }

    fn is_pure(class_ids: &[usize], indices: &[usize]) -> bool {
        match indices.first() {
            None => true,
            Some(&first) => indices.iter().all(|&i| class_ids[i] == class_ids[first]),
        }
    }

    /// Majority-vote leaf; ties go to the lowest class code
    fn leaf(&self, class_ids: &[usize], indices: &[usize]) -> TreeNode {
        let mut counts = vec![0usize; self.classes.len()];
        for &i in indices {
            counts[class_ids[i]] += 1;
        }
        let majority = counts
            .iter()
            .enumerate()
            .max_by_key(|&(idx, &c)| (c, std::cmp::Reverse(idx)))
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        TreeNode::Leaf {
            class: self.classes.get(majority).copied().unwrap_or(0.0),
            n_samples: indices.len(),
        }
    }

    fn predict_sample(node: &TreeNode, sample: &[f64]) -> f64 {
        match node {
            TreeNode::Leaf { class, .. } => *class,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[*feature_idx] <= *threshold {
                    Self::predict_sample(left, sample)
                } else {
                    Self::predict_sample(right, sample)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn banded_data() -> (Array2<f64>, Array1<f64>) {
        // class follows the first feature; second is noise
        let x = array![
            [100.0, 1.0],
            [110.0, 0.0],
            [120.0, 1.0],
            [200.0, 0.0],
            [210.0, 1.0],
            [220.0, 0.0],
            [300.0, 1.0],
            [310.0, 0.0],
            [320.0, 1.0],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];
        (x, y)
    }

    #[test]
    fn test_fit_predict_separable() {
        let (x, y) = banded_data();
        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        for (p, a) in predictions.iter().zip(y.iter()) {
            assert_eq!(*p, *a);
        }
        assert_eq!(tree.classes(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = banded_data();
        let mut first = DecisionTree::new();
        first.fit(&x, &y).unwrap();
        let mut second = DecisionTree::new();
        second.fit(&x, &y).unwrap();

        let probe = array![[115.0, 0.5], [215.0, 0.5], [305.0, 0.5]];
        assert_eq!(
            first.predict(&probe).unwrap().to_vec(),
            second.predict(&probe).unwrap().to_vec()
        );
    }

    #[test]
    fn test_max_depth_bounds_tree() {
        let (x, y) = banded_data();
        let mut tree = DecisionTree::new().with_max_depth(1);
        tree.fit(&x, &y).unwrap();
        // one split level plus its leaves
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_predict_before_fit() {
        let tree = DecisionTree::new();
        let err = tree.predict(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, GradecastError::NotFitted));
    }

    #[test]
    fn test_shape_mismatch() {
        let mut tree = DecisionTree::new();
        let err = tree
            .fit(&array![[1.0], [2.0]], &array![0.0, 1.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, GradecastError::Shape { .. }));
    }

    #[test]
    fn test_entropy_criterion() {
        let (x, y) = banded_data();
        let mut tree = DecisionTree::new().with_criterion(Criterion::Entropy);
        tree.fit(&x, &y).unwrap();
        let predictions = tree.predict(&x).unwrap();
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| p == a)
            .count();
        assert_eq!(correct, y.len());
    }

    #[test]
    fn test_leaf_tie_prefers_lowest_class() {
        // forced leaf: no split allowed, two classes tied
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![3.0, 1.0, 3.0, 1.0];
        let mut tree = DecisionTree::new().with_max_depth(0);
        tree.fit(&x, &y).unwrap();
        let predictions = tree.predict(&array![[2.5]]).unwrap();
        assert_eq!(predictions[0], 1.0);
    }
}
