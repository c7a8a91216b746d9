//! Model-assisted scoring: categorical encoding, feature vectors, the
//! classifier artifact, and local explanations.

pub mod adapter;
pub mod encoding;
pub mod explain;
pub mod features;
pub mod model;

pub use adapter::{FeatureImportance, ModelScore, ModelScoringAdapter};
pub use encoding::{EncodingError, EncodingTable};
pub use explain::{Attribution, Direction, Explainer, Explanation};
pub use features::{FeatureVector, ModelFeature, FEATURE_COUNT};
pub use model::{Classifier, DecisionTree, ForestClassifier, ModelError};
