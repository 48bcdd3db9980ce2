use crate::infra::{parse_loan_amount, AppState};
use crate::page::{self, FormValues, Message, PageView, Tone};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Extension, Form, Json, Router};
use loan_status::eligibility::{
    eligibility_router, ApplicantInput, EligibilityError, EligibilityService,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_loan_routes(service: Arc<EligibilityService>) -> Router {
    let pages = Router::new()
        .route("/", get(form_page))
        .route("/predict", post(submit_form))
        .with_state(service.clone());

    eligibility_router(service)
        .merge(pages)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn form_page(State(service): State<Arc<EligibilityService>>) -> Html<String> {
    let values = FormValues::default();
    Html(page::render(&PageView {
        notice: service.notice(),
        values: &values,
        results: Vec::new(),
    }))
}

pub(crate) async fn submit_form(
    State(service): State<Arc<EligibilityService>>,
    Form(values): Form<FormValues>,
) -> Html<String> {
    let results = evaluate_submission(&service, &values);
    Html(page::render(&PageView {
        notice: service.notice(),
        values: &values,
        results,
    }))
}

/// Turns one form submission into the messages rendered under the form.
fn evaluate_submission(service: &EligibilityService, values: &FormValues) -> Vec<Message> {
    if service.model().is_none() {
        return vec![Message::new(
            Tone::Error,
            format!("{} See warning above.", EligibilityError::ModelUnavailable),
        )];
    }

    let loan_amount = match parse_loan_amount(&values.loan_amount) {
        Ok(amount) => amount,
        Err(message) => return vec![Message::new(Tone::Error, message)],
    };

    let input = ApplicantInput::new(
        values.married.clone(),
        values.dependents.clone(),
        loan_amount,
        values.credit_history.clone(),
    );

    match service.predict(&input) {
        Ok(verdict) => {
            let tone = if verdict.label.is_eligible() {
                Tone::Success
            } else {
                Tone::Error
            };
            let mut messages = vec![Message::new(tone, verdict.summary())];
            if let Some(probabilities) = verdict.probability_summary() {
                messages.push(Message::new(Tone::Info, probabilities));
            }
            messages
        }
        Err(err) => vec![Message::new(Tone::Error, err.to_string())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use loan_status::eligibility::model::{LinearSvc, LogisticRegression};
    use loan_status::eligibility::{ModelHandle, ModelLoadError};
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn logistic_service() -> Arc<EligibilityService> {
        let model = Arc::new(
            LogisticRegression::new(&[0.4, -0.1, -0.002, 3.1], -1.5, 0.5).expect("valid model"),
        );
        Arc::new(EligibilityService::with_model(
            ModelHandle::new("logistic", model.clone()).with_probabilities(model),
        ))
    }

    fn margin_service() -> Arc<EligibilityService> {
        let model = LinearSvc::new(&[0.0, 0.0, 0.0, 2.0], -1.0).expect("valid model");
        Arc::new(EligibilityService::with_model(ModelHandle::new(
            "margin",
            Arc::new(model),
        )))
    }

    fn missing_service() -> Arc<EligibilityService> {
        Arc::new(EligibilityService::new(Err(ModelLoadError::NotFound {
            tried: vec![PathBuf::from("loan_staus_model")],
        })))
    }

    async fn body_text(router: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn form_post(body: &'static str) -> Request<Body> {
        Request::post("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn form_page_renders_without_notice_when_model_loaded() {
        let (status, html) = body_text(
            with_loan_routes(logistic_service()),
            Request::get("/").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Enter applicant details"));
        assert!(!html.contains("msg warning"));
    }

    #[tokio::test]
    async fn form_page_warns_when_model_missing() {
        let (_, html) = body_text(
            with_loan_routes(missing_service()),
            Request::get("/").body(Body::empty()).unwrap(),
        )
        .await;
        assert!(html.contains("msg warning"));
        assert!(html.contains("Model &#39;loan_staus_model&#39; not found"));
    }

    #[tokio::test]
    async fn submission_renders_eligible_verdict_with_probabilities() {
        let (status, html) = body_text(
            with_loan_routes(logistic_service()),
            form_post("Married=Yes&Dependents=3%2B&LoanAmount=250&Credit_History=1"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<div class=\"msg success\">Prediction: ELIGIBLE</div>"));
        assert!(html.contains("msg info\">Probabilities: ["));
        assert!(html.contains("<option value=\"3+\" selected>3+</option>"));
    }

    #[tokio::test]
    async fn submission_renders_rejection_without_probabilities() {
        let (_, html) = body_text(
            with_loan_routes(margin_service()),
            form_post("Married=No&Dependents=0&LoanAmount=100.0&Credit_History=0"),
        )
        .await;
        assert!(html.contains("<div class=\"msg error\">Prediction: NOT ELIGIBLE</div>"));
        assert!(!html.contains("Probabilities"));
    }

    #[tokio::test]
    async fn submission_is_rejected_when_model_missing() {
        let (_, html) = body_text(
            with_loan_routes(missing_service()),
            form_post("Married=Yes&Dependents=1&LoanAmount=100&Credit_History=1"),
        )
        .await;
        assert!(html.contains(
            "Cannot make prediction because the model wasn&#39;t loaded. See warning above."
        ));
    }

    #[tokio::test]
    async fn submission_rejects_negative_loan_amount() {
        let (_, html) = body_text(
            with_loan_routes(logistic_service()),
            form_post("Married=Yes&Dependents=1&LoanAmount=-5&Credit_History=1"),
        )
        .await;
        assert!(html.contains("LoanAmount must be a non-negative number"));
        assert!(!html.contains("Prediction:"));
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let (status, body) = body_text(
            with_loan_routes(missing_service()),
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{\"status\":\"ok\"}");
    }
}
