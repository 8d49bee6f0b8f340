//! Random forest classifier

use super::decision_tree::{Criterion, DecisionTree};
use crate::error::{GradecastError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Bagged ensemble of [`DecisionTree`]s with majority voting.
///
/// Each tree fits a bootstrap resample drawn from a per-tree seed, so a fixed
/// `random_state` reproduces the same forest on every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Base seed for bootstrap sampling
    pub random_state: Option<u64>,
    n_features: usize,
    classes: Vec<f64>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::Gini,
            random_state: None,
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

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the forest to training data
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
                "cannot fit a forest on zero samples".to_string(),
            ));
        }
        if self.n_estimators == 0 {
            return Err(GradecastError::InvalidInput(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        self.n_features = x.ncols();

        let mut classes: Vec<f64> = y.iter().copied().collect();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        classes.dedup();
        self.classes = classes;

        let base_seed = self.random_state.unwrap_or(42);

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                // Bootstrap resample with replacement
                let sample_indices: Vec<usize> = (0..n_samples)
                    .map(|_| (rng.next_u64() as usize) % n_samples)
                    .collect();

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Array1<f64> =
                    Array1::from_vec(sample_indices.iter().map(|&i| y[i]).collect());

                let mut tree = DecisionTree::new()
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_criterion(self.criterion);
                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }

                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        Ok(self)
    }

    /// Predict class codes by majority vote over all trees.
    ///
    /// Vote ties resolve toward the lowest class code so repeated runs agree.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(GradecastError::NotFitted);
        }

        let all_predictions: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let n_samples = x.nrows();
        let predictions: Vec<f64> = (0..n_samples)
            .map(|i| {
                let mut votes = vec![0usize; self.classes.len()];
                for preds in &all_predictions {
                    if let Some(class_idx) = self.class_index(preds[i]) {
                        votes[class_idx] += 1;
                    }
                }
                let winner = votes
                    .iter()
                    .enumerate()
                    .max_by_key(|&(idx, &count)| (count, std::cmp::Reverse(idx)))
                    .map(|(idx, _)| idx)
                    .unwrap_or(0);
                self.classes.get(winner).copied().unwrap_or(0.0)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Distinct classes seen at fit time, ascending
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn class_index(&self, value: f64) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.partial_cmp(&value).unwrap_or(std::cmp::Ordering::Equal))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_cluster_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.2, 0.2],
            [1.0, 1.0],
            [1.1, 1.1],
            [1.2, 1.2],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_classifier_accuracy() {
        let (x, y) = two_cluster_data();
        let mut rf = RandomForest::new(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();
        let accuracy = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| (*p - *a).abs() < 0.5)
            .count() as f64
            / y.len() as f64;
        assert!(accuracy >= 0.8, "accuracy too low: {}", accuracy);
        assert_eq!(rf.n_trees(), 10);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = two_cluster_data();
        let probe = array![[0.05, 0.15], [1.05, 1.15], [0.6, 0.6]];

        let mut first = RandomForest::new(15).with_random_state(7);
        first.fit(&x, &y).unwrap();
        let mut second = RandomForest::new(15).with_random_state(7);
        second.fit(&x, &y).unwrap();

        assert_eq!(
            first.predict(&probe).unwrap().to_vec(),
            second.predict(&probe).unwrap().to_vec()
        );
    }

    #[test]
    fn test_predict_before_fit() {
        let rf = RandomForest::new(5);
        let err = rf.predict(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, GradecastError::NotFitted));
    }

    #[test]
    fn test_zero_estimators_rejected() {
        let (x, y) = two_cluster_data();
        let mut rf = RandomForest::new(0);
        let err = rf.fit(&x, &y).unwrap_err();
        assert!(matches!(err, GradecastError::InvalidInput(_)));
    }
}
