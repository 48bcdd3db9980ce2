use crate::infra::{load_config, parse_loan_amount};
use clap::Args;
use loan_status::eligibility::{
    ApplicantInput, BatchOutcome, BatchScorer, EligibilityService,
    EligibilityVerdict, ModelStatusView,
};
use loan_status::error::AppError;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Marital status (Yes/No)
    #[arg(long, default_value = "No")]
    pub(crate) married: String,
    /// Number of dependents (0, 1, 2, 3+)
    #[arg(long, default_value = "0")]
    pub(crate) dependents: String,
    /// Requested loan amount (non-negative)
    #[arg(long, default_value = "100.0", value_parser = parse_loan_amount_arg)]
    pub(crate) loan_amount: f64,
    /// Credit history flag (0 or 1)
    #[arg(long, default_value = "0")]
    pub(crate) credit_history: String,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV file with Married, Dependents, LoanAmount, Credit_History columns
    pub(crate) input: PathBuf,
}

fn parse_loan_amount_arg(raw: &str) -> Result<f64, String> {
    parse_loan_amount(raw)
}

fn open_service(model_dir: Option<PathBuf>) -> Result<EligibilityService, AppError> {
    let config = load_config(model_dir)?;
    let service = EligibilityService::from_search(&config.model.search());
    if let Some(notice) = service.notice() {
        eprintln!("{}", notice.message);
    }
    Ok(service)
}

pub(crate) fn run_predict(args: PredictArgs, model_dir: Option<PathBuf>) -> Result<(), AppError> {
    let service = open_service(model_dir)?;
    let input = ApplicantInput::new(
        args.married,
        args.dependents,
        args.loan_amount,
        args.credit_history,
    );

    let verdict = service.predict(&input)?;
    render_verdict(&verdict);
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs, model_dir: Option<PathBuf>) -> Result<(), AppError> {
    let service = open_service(model_dir)?;
    let outcomes = BatchScorer::new(&service).score_path(&args.input)?;

    println!("Scored {} applicant(s) from {}", outcomes.len(), args.input.display());
    let mut eligible = 0;
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(verdict) if verdict.label.is_eligible() => eligible += 1,
            Ok(_) => {}
            Err(_) => failed += 1,
        }
        render_batch_row(outcome);
    }
    println!(
        "\n{} eligible, {} not eligible, {} failed",
        eligible,
        outcomes.len() - eligible - failed,
        failed
    );
    Ok(())
}

pub(crate) fn run_model_status(model_dir: Option<PathBuf>) -> Result<(), AppError> {
    let config = load_config(model_dir)?;
    let service = EligibilityService::from_search(&config.model.search());

    println!("Model directory: {}", config.model.directory.display());
    for line in status_lines(&service.status()) {
        println!("{line}");
    }
    service.into_model()?;
    Ok(())
}

fn status_lines(status: &ModelStatusView) -> Vec<String> {
    match status {
        ModelStatusView::Loaded {
            name,
            source,
            probabilities,
        } => {
            let mut lines = vec![format!("Model: {name}")];
            if let Some(source) = source {
                lines.push(format!("Source: {source}"));
            }
            lines.push(format!(
                "Probabilities: {}",
                if *probabilities { "available" } else { "not provided" }
            ));
            lines
        }
        ModelStatusView::Missing { tried, message } => {
            let mut lines = vec![message.clone(), "Tried:".to_string()];
            lines.extend(tried.iter().map(|path| format!("- {path}")));
            lines
        }
        ModelStatusView::Broken { message, .. } => vec![message.clone()],
    }
}

fn render_verdict(verdict: &EligibilityVerdict) {
    println!("{}", verdict.summary());
    if let Some(probabilities) = verdict.probability_summary() {
        println!("{probabilities}");
    }
    let features = verdict
        .features
        .columns()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(", ");
    println!("Features: {features}");
}

fn render_batch_row(outcome: &BatchOutcome) {
    let reference = match &outcome.loan_id {
        Some(id) => format!("row {} ({id})", outcome.row),
        None => format!("row {}", outcome.row),
    };
    match &outcome.result {
        Ok(verdict) => {
            let probability_note = verdict
                .probabilities
                .as_ref()
                .map(|probabilities| format!(" {probabilities:?}"))
                .unwrap_or_default();
            println!("- {reference}: {}{probability_note}", verdict.label);
        }
        Err(err) => println!("- {reference}: {err}"),
    }
}
