use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;

use crate::eligibility::{
    ApplicantInput, Classifier, EligibilityService, EstimatorSpec, FeatureVector, ModelArtifact,
    ModelHandle, PredictionError, ProbabilityEstimator,
};

/// Approves applicants with a clean credit history, largely independent of the rest.
pub(super) fn credit_history_model() -> ModelArtifact {
    ModelArtifact::new(EstimatorSpec::LogisticRegression {
        coefficients: vec![0.4, -0.1, -0.002, 3.1],
        intercept: -1.5,
        threshold: 0.5,
    })
}

pub(super) fn margin_model() -> ModelArtifact {
    ModelArtifact::new(EstimatorSpec::LinearSvc {
        coefficients: vec![0.0, 0.0, 0.0, 2.0],
        intercept: -1.0,
    })
}

pub(super) fn write_artifact(dir: &Path, file_name: &str, artifact: &ModelArtifact) -> PathBuf {
    let path = dir.join(file_name);
    let bytes = serde_json::to_vec_pretty(artifact).expect("artifact serializes");
    std::fs::write(&path, bytes).expect("artifact written");
    path
}

pub(super) fn write_raw(dir: &Path, file_name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, contents).expect("file written");
    path
}

pub(super) fn applicant() -> ApplicantInput {
    ApplicantInput::new("Yes", "1", 120.0, "1")
}

pub(super) fn risky_applicant() -> ApplicantInput {
    ApplicantInput::new("No", "3+", 300.0, "0")
}

/// Classifier returning a fixed label and recording nothing.
#[derive(Debug)]
pub(super) struct FixedLabel(pub(super) i64);

impl Classifier for FixedLabel {
    fn predict(&self, _features: &FeatureVector) -> Result<i64, PredictionError> {
        Ok(self.0)
    }
}

#[derive(Debug)]
pub(super) struct BrokenClassifier;

impl Classifier for BrokenClassifier {
    fn predict(&self, _features: &FeatureVector) -> Result<i64, PredictionError> {
        Err(PredictionError::Estimator(
            "estimator raised during predict".to_string(),
        ))
    }
}

#[derive(Debug)]
pub(super) struct BrokenProbabilities;

impl ProbabilityEstimator for BrokenProbabilities {
    fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>, PredictionError> {
        Err(PredictionError::Estimator("probabilities unavailable".to_string()))
    }
}

#[derive(Debug)]
pub(super) struct FixedProbabilities(pub(super) Vec<f64>);

impl ProbabilityEstimator for FixedProbabilities {
    fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>, PredictionError> {
        Ok(self.0.clone())
    }
}

pub(super) fn service_with(handle: ModelHandle) -> Arc<EligibilityService> {
    Arc::new(EligibilityService::with_model(handle))
}

pub(super) async fn json_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}
