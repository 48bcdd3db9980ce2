use serde::Serialize;
use tracing::{debug, warn};

use super::features::{encode, ApplicantInput};
use super::model::{ModelHandle, PredictionError};
use super::resolver::{ModelLoadError, ModelSearch, DEFAULT_MODEL_NAMES};
use super::verdict::{map_prediction, EligibilityVerdict};

/// Owns the model resolved at startup and runs the encode, predict, map cycle.
///
/// The resolution outcome is captured once. A failed lookup is never retried; the service
/// keeps answering with the same explanatory error for the life of the process.
#[derive(Debug)]
pub struct EligibilityService {
    model: Result<ModelHandle, ModelLoadError>,
    primary_name: String,
}

impl EligibilityService {
    pub fn new(model: Result<ModelHandle, ModelLoadError>) -> Self {
        Self {
            model,
            primary_name: DEFAULT_MODEL_NAMES[0].to_string(),
        }
    }

    pub fn with_model(model: ModelHandle) -> Self {
        Self::new(Ok(model))
    }

    pub fn from_search(search: &ModelSearch) -> Self {
        let mut service = Self::new(search.resolve());
        if let Some(name) = search.primary_name() {
            service.primary_name = name.to_string();
        }
        service
    }

    pub fn model(&self) -> Option<&ModelHandle> {
        self.model.as_ref().ok()
    }

    pub fn load_error(&self) -> Option<&ModelLoadError> {
        self.model.as_ref().err()
    }

    pub fn into_model(self) -> Result<ModelHandle, ModelLoadError> {
        self.model
    }

    /// Banner the presentation host shows while prediction is disabled.
    pub fn notice(&self) -> Option<ModelNotice> {
        match &self.model {
            Ok(_) => None,
            Err(ModelLoadError::NotFound { .. }) => Some(ModelNotice {
                severity: NoticeSeverity::Warning,
                message: format!(
                    "Model '{name}' not found in the model directory. Place the model artifact (e.g. '{name}.sav') there and restart.",
                    name = self.primary_name
                ),
            }),
            Err(err @ ModelLoadError::Broken { .. }) => Some(ModelNotice {
                severity: NoticeSeverity::Error,
                message: err.to_string(),
            }),
        }
    }

    pub fn status(&self) -> ModelStatusView {
        match &self.model {
            Ok(handle) => ModelStatusView::Loaded {
                name: handle.name().to_string(),
                source: handle.source().map(|path| path.display().to_string()),
                probabilities: handle.supports_probabilities(),
            },
            Err(ModelLoadError::NotFound { tried }) => ModelStatusView::Missing {
                tried: tried.iter().map(|path| path.display().to_string()).collect(),
                message: self
                    .notice()
                    .map(|notice| notice.message)
                    .unwrap_or_default(),
            },
            Err(err @ ModelLoadError::Broken { path, .. }) => ModelStatusView::Broken {
                path: path.display().to_string(),
                message: err.to_string(),
            },
        }
    }

    pub fn predict(&self, input: &ApplicantInput) -> Result<EligibilityVerdict, EligibilityError> {
        let model = self
            .model
            .as_ref()
            .map_err(|_| EligibilityError::ModelUnavailable)?;

        let features = encode(input);
        let raw_label = model.predict(&features).map_err(|err| {
            warn!(model = %model.name(), error = %err, "prediction failed");
            EligibilityError::Prediction(err)
        })?;
        let probabilities = model.predict_proba(&features);
        let label = map_prediction(raw_label);

        debug!(
            model = %model.name(),
            raw_label,
            label = %label,
            "prediction computed"
        );

        Ok(EligibilityVerdict {
            label,
            raw_label,
            probabilities,
            features,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error("Cannot make prediction because the model wasn't loaded.")]
    ModelUnavailable,
    #[error("Prediction failed: {0}")]
    Prediction(#[from] PredictionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelNotice {
    pub severity: NoticeSeverity,
    pub message: String,
}

/// Serializable snapshot of the resolution outcome. Paths are carried in display form, so
/// directories that are not valid UTF-8 still render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelStatusView {
    Loaded {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        probabilities: bool,
    },
    Missing {
        tried: Vec<String>,
        message: String,
    },
    Broken {
        path: String,
        message: String,
    },
}
