use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::features::ApplicantInput;
use super::service::{EligibilityError, EligibilityService};
use super::verdict::EligibilityVerdict;

/// Scores every applicant row of a CSV export.
///
/// Header names match the training data (`Married,Dependents,LoanAmount,Credit_History`),
/// with an optional `Loan_ID` column carried through for reference. Extra columns are ignored.
pub struct BatchScorer<'a> {
    service: &'a EligibilityService,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub row: usize,
    pub loan_id: Option<String>,
    pub result: Result<EligibilityVerdict, EligibilityError>,
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to read applicant file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid applicant CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Eligibility(#[from] EligibilityError),
}

#[derive(Debug, Deserialize)]
struct ApplicantRow {
    #[serde(rename = "Loan_ID", default)]
    loan_id: Option<String>,
    #[serde(rename = "Married")]
    married: String,
    #[serde(rename = "Dependents")]
    dependents: String,
    #[serde(rename = "LoanAmount")]
    loan_amount: f64,
    #[serde(rename = "Credit_History")]
    credit_history: String,
}

impl<'a> BatchScorer<'a> {
    pub fn new(service: &'a EligibilityService) -> Self {
        Self { service }
    }

    pub fn score_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<BatchOutcome>, BatchError> {
        let file = std::fs::File::open(path)?;
        self.score_reader(file)
    }

    /// Malformed rows abort the batch. Per-row prediction failures are reported inline.
    pub fn score_reader<R: Read>(&self, reader: R) -> Result<Vec<BatchOutcome>, BatchError> {
        if self.service.model().is_none() {
            return Err(EligibilityError::ModelUnavailable.into());
        }

        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut outcomes = Vec::new();

        for (index, record) in csv_reader.deserialize::<ApplicantRow>().enumerate() {
            let row = record?;
            let input = ApplicantInput::new(
                row.married,
                row.dependents,
                row.loan_amount,
                row.credit_history,
            );
            outcomes.push(BatchOutcome {
                row: index + 1,
                loan_id: row.loan_id.filter(|id| !id.is_empty()),
                result: self.service.predict(&input),
            });
        }

        Ok(outcomes)
    }
}
