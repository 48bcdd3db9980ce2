//! Typed model artifacts and the classifier capabilities they expose.
//!
//! An artifact is a JSON document carrying a format marker, a schema version, the feature
//! columns it was trained on, and one estimator. Anything that does not match exactly is
//! rejected at load time so a stale or foreign file never reaches the predict path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::features::{FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};

pub const ARTIFACT_FORMAT: &str = "loan-status-model";
pub const ARTIFACT_VERSION: u32 = 1;

/// Label predicting capability every loaded model provides.
pub trait Classifier: Send + Sync + fmt::Debug {
    fn predict(&self, features: &FeatureVector) -> Result<i64, PredictionError>;
}

/// Optional class probability capability, `[P(label = 0), P(label = 1)]`.
pub trait ProbabilityEstimator: Send + Sync + fmt::Debug {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, PredictionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("feature {column} is not a finite number ({value})")]
    NonFiniteFeature { column: &'static str, value: f64 },
    /// Failure reported by a `Classifier` or `ProbabilityEstimator` implemented outside this
    /// crate. The built-in estimators only fail on non-finite input.
    #[error("{0}")]
    Estimator(String),
}

/// Reasons a file that exists cannot be turned into a model.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("unable to read artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact is not valid model JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported artifact format '{0}' (expected '{}')", ARTIFACT_FORMAT)]
    UnsupportedFormat(String),
    #[error("unsupported artifact version {0} (expected {})", ARTIFACT_VERSION)]
    UnsupportedVersion(u32),
    #[error("artifact was trained on columns {found:?}, expected {expected:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("expected {expected} coefficients, found {found}")]
    CoefficientCount { expected: usize, found: usize },
    #[error("parameter {0} must be finite")]
    NonFiniteParameter(&'static str),
    #[error("decision threshold {0} must lie within [0, 1]")]
    ThresholdOutOfRange(f64),
    #[error("invalid decision tree: {0}")]
    InvalidTree(String),
}

/// On-disk artifact layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelArtifact {
    pub format: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub features: Vec<String>,
    pub estimator: EstimatorSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorSpec {
    LogisticRegression {
        coefficients: Vec<f64>,
        intercept: f64,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    LinearSvc {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    DecisionTree {
        nodes: Vec<TreeNode>,
    },
}

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        counts: [f64; 2],
    },
}

impl ModelArtifact {
    /// Wraps an estimator in the current artifact envelope.
    pub fn new(estimator: EstimatorSpec) -> Self {
        Self {
            format: ARTIFACT_FORMAT.to_string(),
            version: ARTIFACT_VERSION,
            name: None,
            features: FEATURE_COLUMNS.iter().map(|name| name.to_string()).collect(),
            estimator,
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let artifact: Self = serde_json::from_slice(bytes)?;
        artifact.validate_envelope()?;
        Ok(artifact)
    }

    fn validate_envelope(&self) -> Result<(), ArtifactError> {
        if self.format != ARTIFACT_FORMAT {
            return Err(ArtifactError::UnsupportedFormat(self.format.clone()));
        }
        if self.version != ARTIFACT_VERSION {
            return Err(ArtifactError::UnsupportedVersion(self.version));
        }
        if self.features.iter().map(String::as_str).ne(FEATURE_COLUMNS) {
            return Err(ArtifactError::FeatureMismatch {
                expected: FEATURE_COLUMNS.iter().map(|name| name.to_string()).collect(),
                found: self.features.clone(),
            });
        }
        Ok(())
    }
}

/// A loaded model. Capabilities are fixed when the handle is built and never change.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    name: String,
    source: Option<PathBuf>,
    classifier: Arc<dyn Classifier>,
    probabilities: Option<Arc<dyn ProbabilityEstimator>>,
}

impl ModelHandle {
    pub fn new(name: impl Into<String>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            name: name.into(),
            source: None,
            classifier,
            probabilities: None,
        }
    }

    pub fn with_probabilities(mut self, estimator: Arc<dyn ProbabilityEstimator>) -> Self {
        self.probabilities = Some(estimator);
        self
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Builds the estimator described by `artifact`, validating its parameters.
    pub fn from_artifact(artifact: ModelArtifact, source: &Path) -> Result<Self, ArtifactError> {
        let name = artifact.name.unwrap_or_else(|| {
            source
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "model".to_string())
        });

        let handle = match artifact.estimator {
            EstimatorSpec::LogisticRegression {
                coefficients,
                intercept,
                threshold,
            } => {
                let model = Arc::new(LogisticRegression::new(&coefficients, intercept, threshold)?);
                Self::new(name, model.clone()).with_probabilities(model)
            }
            EstimatorSpec::LinearSvc {
                coefficients,
                intercept,
            } => Self::new(name, Arc::new(LinearSvc::new(&coefficients, intercept)?)),
            EstimatorSpec::DecisionTree { nodes } => {
                let model = Arc::new(DecisionTree::new(nodes)?);
                Self::new(name, model.clone()).with_probabilities(model)
            }
        };

        Ok(handle.with_source(source))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn supports_probabilities(&self) -> bool {
        self.probabilities.is_some()
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<i64, PredictionError> {
        self.classifier.predict(features)
    }

    /// Best effort: a missing capability and a failing estimator both yield `None`.
    pub fn predict_proba(&self, features: &FeatureVector) -> Option<Vec<f64>> {
        let estimator = self.probabilities.as_ref()?;
        match estimator.predict_proba(features) {
            Ok(probabilities) => Some(probabilities),
            Err(err) => {
                debug!(model = %self.name, error = %err, "probability estimate unavailable");
                None
            }
        }
    }
}

fn ensure_finite(features: &FeatureVector) -> Result<(), PredictionError> {
    match features.columns().find(|(_, value)| !value.is_finite()) {
        Some((column, value)) => Err(PredictionError::NonFiniteFeature { column, value }),
        None => Ok(()),
    }
}

fn weights_from(coefficients: &[f64]) -> Result<[f64; FEATURE_COUNT], ArtifactError> {
    let weights: [f64; FEATURE_COUNT] =
        coefficients
            .try_into()
            .map_err(|_| ArtifactError::CoefficientCount {
                expected: FEATURE_COUNT,
                found: coefficients.len(),
            })?;
    if weights.iter().any(|weight| !weight.is_finite()) {
        return Err(ArtifactError::NonFiniteParameter("coefficients"));
    }
    Ok(weights)
}

#[derive(Debug)]
pub struct LogisticRegression {
    weights: [f64; FEATURE_COUNT],
    intercept: f64,
    threshold: f64,
}

impl LogisticRegression {
    pub fn new(coefficients: &[f64], intercept: f64, threshold: f64) -> Result<Self, ArtifactError> {
        let weights = weights_from(coefficients)?;
        if !intercept.is_finite() {
            return Err(ArtifactError::NonFiniteParameter("intercept"));
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ArtifactError::ThresholdOutOfRange(threshold));
        }
        Ok(Self {
            weights,
            intercept,
            threshold,
        })
    }

    fn positive_probability(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        ensure_finite(features)?;
        let margin = features.dot(&self.weights) + self.intercept;
        Ok(1.0 / (1.0 + (-margin).exp()))
    }
}

impl Classifier for LogisticRegression {
    fn predict(&self, features: &FeatureVector) -> Result<i64, PredictionError> {
        let positive = self.positive_probability(features)?;
        Ok(i64::from(positive >= self.threshold))
    }
}

impl ProbabilityEstimator for LogisticRegression {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, PredictionError> {
        let positive = self.positive_probability(features)?;
        Ok(vec![1.0 - positive, positive])
    }
}

/// Margin classifier without calibrated probabilities.
#[derive(Debug)]
pub struct LinearSvc {
    weights: [f64; FEATURE_COUNT],
    intercept: f64,
}

impl LinearSvc {
    pub fn new(coefficients: &[f64], intercept: f64) -> Result<Self, ArtifactError> {
        let weights = weights_from(coefficients)?;
        if !intercept.is_finite() {
            return Err(ArtifactError::NonFiniteParameter("intercept"));
        }
        Ok(Self { weights, intercept })
    }
}

impl Classifier for LinearSvc {
    fn predict(&self, features: &FeatureVector) -> Result<i64, PredictionError> {
        ensure_finite(features)?;
        let margin = features.dot(&self.weights) + self.intercept;
        Ok(i64::from(margin > 0.0))
    }
}

/// Binary decision tree stored as a flat node table rooted at index 0.
#[derive(Debug)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Children must point forward in the table, which rules out cycles and guarantees
    /// every walk terminates at a leaf.
    pub fn new(nodes: Vec<TreeNode>) -> Result<Self, ArtifactError> {
        if nodes.is_empty() {
            return Err(ArtifactError::InvalidTree("tree has no nodes".to_string()));
        }

        for (index, node) in nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(ArtifactError::InvalidTree(format!(
                            "node {index} splits on unknown feature {feature}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ArtifactError::InvalidTree(format!(
                            "node {index} has a non-finite threshold"
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= nodes.len() {
                            return Err(ArtifactError::InvalidTree(format!(
                                "node {index} points to invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { counts } => {
                    let valid = counts.iter().all(|count| count.is_finite() && *count >= 0.0)
                        && counts.iter().sum::<f64>() > 0.0;
                    if !valid {
                        return Err(ArtifactError::InvalidTree(format!(
                            "leaf {index} needs non-negative class counts with a positive total"
                        )));
                    }
                }
            }
        }

        Ok(Self { nodes })
    }

    fn leaf_counts(&self, features: &FeatureVector) -> Result<[f64; 2], PredictionError> {
        ensure_finite(features)?;
        let values = features.values();
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if values[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { counts } => return Ok(*counts),
            }
        }
    }
}

impl Classifier for DecisionTree {
    fn predict(&self, features: &FeatureVector) -> Result<i64, PredictionError> {
        let [negative, positive] = self.leaf_counts(features)?;
        Ok(i64::from(positive > negative))
    }
}

impl ProbabilityEstimator for DecisionTree {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, PredictionError> {
        let [negative, positive] = self.leaf_counts(features)?;
        let total = negative + positive;
        Ok(vec![negative / total, positive / total])
    }
}
