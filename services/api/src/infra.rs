use loan_status::config::AppConfig;
use loan_status::eligibility::{EligibilityService, NoticeSeverity};
use loan_status::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn load_config(model_dir: Option<PathBuf>) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(dir) = model_dir {
        config.model.directory = dir;
    }
    Ok(config)
}

/// Resolves the model once; the outcome is kept by the service for the process lifetime.
pub(crate) fn build_service(config: &AppConfig) -> EligibilityService {
    let service = EligibilityService::from_search(&config.model.search());
    if let Some(notice) = service.notice() {
        match notice.severity {
            NoticeSeverity::Warning => warn!(message = %notice.message, "prediction disabled"),
            NoticeSeverity::Error => error!(message = %notice.message, "prediction disabled"),
        }
    }
    service
}

/// Mirrors the form widget: a finite, non-negative amount.
pub(crate) fn parse_loan_amount(raw: &str) -> Result<f64, String> {
    let amount = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("LoanAmount '{raw}' is not a number"))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("LoanAmount must be a non-negative number, got '{raw}'"));
    }
    Ok(amount)
}
