//! Model resolution, feature encoding, and verdict mapping for loan eligibility.

pub mod batch;
pub mod features;
pub mod model;
pub mod resolver;
pub mod router;
pub mod service;
pub mod verdict;

#[cfg(test)]
mod tests;

pub use batch::{BatchError, BatchOutcome, BatchScorer};
pub use features::{encode, ApplicantInput, FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
pub use model::{
    ArtifactError, Classifier, EstimatorSpec, ModelArtifact, ModelHandle, PredictionError,
    ProbabilityEstimator, TreeNode,
};
pub use resolver::{ModelLoadError, ModelSearch, DEFAULT_MODEL_EXTENSIONS, DEFAULT_MODEL_NAMES};
pub use router::{eligibility_router, PredictionResponse};
pub use service::{
    EligibilityError, EligibilityService, ModelNotice, ModelStatusView, NoticeSeverity,
};
pub use verdict::{map_prediction, EligibilityLabel, EligibilityVerdict};
