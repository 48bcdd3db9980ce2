use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use super::features::{ApplicantInput, FeatureVector};
use super::service::{EligibilityError, EligibilityService};
use super::verdict::EligibilityLabel;

/// JSON view of a single prediction.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub label: EligibilityLabel,
    pub eligible: bool,
    pub raw_label: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<f64>>,
    pub features: FeatureVector,
    pub evaluated_at: DateTime<Utc>,
}

/// Router builder exposing the prediction API.
pub fn eligibility_router(service: Arc<EligibilityService>) -> Router {
    Router::new()
        .route("/api/v1/loan/predict", post(predict_handler))
        .route("/api/v1/loan/model", get(model_status_handler))
        .with_state(service)
}

pub(crate) async fn predict_handler(
    State(service): State<Arc<EligibilityService>>,
    Json(input): Json<ApplicantInput>,
) -> Response {
    match service.predict(&input) {
        Ok(verdict) => {
            let body = PredictionResponse {
                eligible: verdict.label.is_eligible(),
                label: verdict.label,
                raw_label: verdict.raw_label,
                probabilities: verdict.probabilities,
                features: verdict.features,
                evaluated_at: Utc::now(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err @ EligibilityError::ModelUnavailable) => {
            let payload = json!({
                "error": err.to_string(),
                "model": service.status(),
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response()
        }
        Err(err @ EligibilityError::Prediction(_)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn model_status_handler(
    State(service): State<Arc<EligibilityService>>,
) -> impl IntoResponse {
    Json(service.status())
}
