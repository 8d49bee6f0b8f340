//! Classifier trait and the serializable model wrapper

use super::decision_tree::DecisionTree;
use super::random_forest::RandomForest;
use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Trait for classification models
pub trait Classifier: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict class codes for each row
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

impl Classifier for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        DecisionTree::fit(self, x, y)?;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        DecisionTree::predict(self, x)
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        RandomForest::fit(self, x, y)?;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        RandomForest::predict(self, x)
    }
}

/// A fitted classifier in a form the artifact can serialize.
///
/// Enum dispatch keeps the stored model concrete; loading an artifact
/// recovers the exact tree structure without trait objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedClassifier {
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl TrainedClassifier {
    /// Short name for logs and run records
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DecisionTree(_) => "decision_tree",
            Self::RandomForest(_) => "random_forest",
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Self::DecisionTree(tree) => {
                DecisionTree::fit(tree, x, y)?;
            }
            Self::RandomForest(forest) => {
                RandomForest::fit(forest, x, y)?;
            }
        }
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Self::DecisionTree(tree) => DecisionTree::predict(tree, x),
            Self::RandomForest(forest) => RandomForest::predict(forest, x),
        }
    }
}
