//! Trainer configuration

use super::decision_tree::DecisionTree;
use super::models::TrainedClassifier;
use super::random_forest::RandomForest;
use crate::error::{GradecastError, Result};
use serde::{Deserialize, Serialize};

/// Which classifier the trainer builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifierKind {
    DecisionTree,
    RandomForest,
}

impl ClassifierKind {
    /// Parse a CLI-style name
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "decision_tree" | "tree" => Some(Self::DecisionTree),
            "random_forest" | "forest" => Some(Self::RandomForest),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DecisionTree => write!(f, "decision_tree"),
            Self::RandomForest => write!(f, "random_forest"),
        }
    }
}

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Classifier to train
    pub classifier: ClassifierKind,
    /// Fraction of rows used for training; the rest is the holdout
    pub train_fraction: f64,
    /// Seed for the shuffle before splitting (and for forest bootstraps)
    pub seed: u64,
    /// Maximum tree depth
    pub max_depth: Option<usize>,
    /// Number of trees when training a forest
    pub n_trees: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierKind::DecisionTree,
            train_fraction: 0.8,
            seed: 42,
            max_depth: None,
            n_trees: 100,
        }
    }
}

impl TrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the classifier kind
    pub fn with_classifier(mut self, classifier: ClassifierKind) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the train fraction
    pub fn with_train_fraction(mut self, fraction: f64) -> Self {
        self.train_fraction = fraction;
        self
    }

    /// Set the shuffle seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set maximum tree depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set forest size
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    /// Reject configurations the trainer cannot honor
    pub fn validate(&self) -> Result<()> {
        if !(self.train_fraction > 0.0 && self.train_fraction <= 1.0) {
            return Err(GradecastError::InvalidInput(format!(
                "train_fraction must be in (0, 1], got {}",
                self.train_fraction
            )));
        }
        if self.classifier == ClassifierKind::RandomForest && self.n_trees == 0 {
            return Err(GradecastError::InvalidInput(
                "n_trees must be at least 1 for a random forest".to_string(),
            ));
        }
        Ok(())
    }

    /// Build an unfitted classifier from this configuration
    pub fn build_classifier(&self) -> TrainedClassifier {
        match self.classifier {
            ClassifierKind::DecisionTree => {
                let mut tree = DecisionTree::new();
                if let Some(depth) = self.max_depth {
                    tree = tree.with_max_depth(depth);
                }
                TrainedClassifier::DecisionTree(tree)
            }
            ClassifierKind::RandomForest => {
                let mut forest = RandomForest::new(self.n_trees).with_random_state(self.seed);
                if let Some(depth) = self.max_depth {
                    forest = forest.with_max_depth(depth);
                }
                TrainedClassifier::RandomForest(forest)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classifier_kind() {
        assert_eq!(
            ClassifierKind::parse("decision_tree"),
            Some(ClassifierKind::DecisionTree)
        );
        assert_eq!(
            ClassifierKind::parse("FOREST"),
            Some(ClassifierKind::RandomForest)
        );
        assert_eq!(ClassifierKind::parse("svm"), None);
    }

    #[test]
    fn test_validate_rejects_bad_fraction() {
        let config = TrainerConfig::new().with_train_fraction(0.0);
        assert!(config.validate().is_err());
        let config = TrainerConfig::new().with_train_fraction(1.2);
        assert!(config.validate().is_err());
        let config = TrainerConfig::new().with_train_fraction(1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_build_classifier_honors_kind() {
        let config = TrainerConfig::new()
            .with_classifier(ClassifierKind::RandomForest)
            .with_n_trees(7);
        match config.build_classifier() {
            TrainedClassifier::RandomForest(forest) => assert_eq!(forest.n_estimators, 7),
            other => panic!("unexpected classifier: {}", other.kind()),
        }
    }
}
