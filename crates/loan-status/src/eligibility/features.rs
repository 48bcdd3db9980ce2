//! Normalization of raw form values into the model's input schema.
//!
//! Encoding is total: every field has a fallback, so a submission always yields a vector.
//! The column order is fixed by the training data and must never change.

use serde::{Deserialize, Deserializer, Serialize};

/// Column order the classifier was trained on.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] =
    ["Married", "Dependents", "LoanAmount", "Credit_History"];

pub const FEATURE_COUNT: usize = 4;

const MARRIED_TRUTHY: [&str; 4] = ["yes", "y", "true", "1"];

/// Applicant attributes exactly as captured by the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantInput {
    #[serde(
        rename = "Married",
        alias = "married",
        deserialize_with = "scalar_as_string"
    )]
    pub married: String,
    #[serde(
        rename = "Dependents",
        alias = "dependents",
        deserialize_with = "scalar_as_string"
    )]
    pub dependents: String,
    #[serde(
        rename = "LoanAmount",
        alias = "loan_amount",
        deserialize_with = "number_or_numeric_string"
    )]
    pub loan_amount: f64,
    #[serde(
        rename = "Credit_History",
        alias = "credit_history",
        deserialize_with = "scalar_as_string"
    )]
    pub credit_history: String,
}

impl ApplicantInput {
    pub fn new(
        married: impl Into<String>,
        dependents: impl Into<String>,
        loan_amount: f64,
        credit_history: impl Into<String>,
    ) -> Self {
        Self {
            married: married.into(),
            dependents: dependents.into(),
            loan_amount,
            credit_history: credit_history.into(),
        }
    }
}

/// Numeric model input in [`FEATURE_COLUMNS`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    /// Pairs every value with its column name.
    pub fn columns(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_COLUMNS.iter().copied().zip(self.0.iter().copied())
    }

    pub fn dot(&self, weights: &[f64; FEATURE_COUNT]) -> f64 {
        self.0
            .iter()
            .zip(weights.iter())
            .map(|(value, weight)| value * weight)
            .sum()
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }
}

pub fn encode(input: &ApplicantInput) -> FeatureVector {
    FeatureVector([
        f64::from(encode_married(&input.married)),
        encode_dependents(&input.dependents),
        input.loan_amount,
        encode_credit_history(&input.credit_history),
    ])
}

pub fn encode_married(value: &str) -> u8 {
    let lowered = value.to_lowercase();
    u8::from(MARRIED_TRUTHY.contains(&lowered.as_str()))
}

/// "3+" style buckets keep their numeric prefix. Values outside the trained domain, such as
/// "10", are passed through without clamping.
pub fn encode_dependents(value: &str) -> f64 {
    if value.ends_with('+') {
        return parse_integer(value.trim_end_matches('+')).unwrap_or(3.0);
    }
    parse_integer(value).unwrap_or(0.0)
}

pub fn encode_credit_history(value: &str) -> f64 {
    parse_integer(value).unwrap_or(0.0)
}

/// Signed decimal integer literal. Magnitudes past `i64` still encode, as the nearest `f64`.
fn parse_integer(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(parsed as f64);
    }
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl RawScalar {
    fn into_text(self) -> String {
        match self {
            RawScalar::Text(value) => value,
            RawScalar::Integer(value) => value.to_string(),
            RawScalar::Float(value) => value.to_string(),
            RawScalar::Flag(value) => value.to_string(),
        }
    }
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawScalar::deserialize(deserializer).map(RawScalar::into_text)
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawScalar::deserialize(deserializer)? {
        RawScalar::Integer(value) => Ok(value as f64),
        RawScalar::Float(value) => Ok(value),
        RawScalar::Text(value) => value.trim().parse::<f64>().map_err(|_| {
            serde::de::Error::custom(format!("LoanAmount '{value}' is not a number"))
        }),
        RawScalar::Flag(value) => Err(serde::de::Error::custom(format!(
            "LoanAmount must be numeric, got {value}"
        ))),
    }
}
