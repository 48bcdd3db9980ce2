use std::fmt;

use serde::{Deserialize, Serialize};

use super::features::FeatureVector;

/// Human readable outcome of a binary eligibility prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EligibilityLabel {
    #[serde(rename = "ELIGIBLE")]
    Eligible,
    #[serde(rename = "NOT ELIGIBLE")]
    NotEligible,
}

impl EligibilityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EligibilityLabel::Eligible => "ELIGIBLE",
            EligibilityLabel::NotEligible => "NOT ELIGIBLE",
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, EligibilityLabel::Eligible)
    }
}

impl fmt::Display for EligibilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only label `1` is eligible; every other value is treated as a rejection.
pub fn map_prediction(raw_label: i64) -> EligibilityLabel {
    if raw_label == 1 {
        EligibilityLabel::Eligible
    } else {
        EligibilityLabel::NotEligible
    }
}

/// Result of one submission, ready for a presentation host to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityVerdict {
    pub label: EligibilityLabel,
    pub raw_label: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<f64>>,
    pub features: FeatureVector,
}

impl EligibilityVerdict {
    pub fn summary(&self) -> String {
        format!("Prediction: {}", self.label)
    }

    pub fn probability_summary(&self) -> Option<String> {
        self.probabilities
            .as_ref()
            .map(|probabilities| format!("Probabilities: {probabilities:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_label_one_is_eligible() {
        assert_eq!(map_prediction(1), EligibilityLabel::Eligible);
        assert_eq!(map_prediction(0), EligibilityLabel::NotEligible);
        for other in [-1, 2, 7, i64::MAX] {
            assert_eq!(map_prediction(other), EligibilityLabel::NotEligible);
        }
    }

    #[test]
    fn labels_serialize_as_display_text() {
        assert_eq!(
            serde_json::to_value(EligibilityLabel::NotEligible).expect("serializes"),
            serde_json::json!("NOT ELIGIBLE")
        );
        assert_eq!(EligibilityLabel::Eligible.to_string(), "ELIGIBLE");
    }

    #[test]
    fn summaries_match_rendered_messages() {
        let verdict = EligibilityVerdict {
            label: EligibilityLabel::Eligible,
            raw_label: 1,
            probabilities: Some(vec![0.25, 0.75]),
            features: FeatureVector::new([1.0, 0.0, 100.0, 1.0]),
        };
        assert_eq!(verdict.summary(), "Prediction: ELIGIBLE");
        assert_eq!(
            verdict.probability_summary().as_deref(),
            Some("Probabilities: [0.25, 0.75]")
        );
    }
}
