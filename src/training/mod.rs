//! Model training module
//!
//! Provides the label codec, the tree-based classifiers and the trainer that
//! turns a labeled table into a stored model artifact:
//! - Decision tree (CART, gini or entropy)
//! - Random forest (bagged trees with majority voting)

mod config;
mod encoder;
mod engine;
mod metrics;
mod models;
pub mod decision_tree;
pub mod random_forest;

pub use config::{ClassifierKind, TrainerConfig};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use encoder::LabelCodec;
pub use engine::{TrainOutcome, Trainer};
pub use metrics::{ClassMetrics, ClassificationReport};
pub use models::{Classifier, TrainedClassifier};
pub use random_forest::RandomForest;

pub(crate) use engine::feature_matrix;
