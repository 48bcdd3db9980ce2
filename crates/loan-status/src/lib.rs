//! Loan eligibility prediction.
//!
//! A pre-trained binary classifier is resolved from disk once at startup, raw form values
//! are encoded into the fixed feature order the model was trained on, and the model output
//! is mapped to an eligibility label for a presentation host to render.

pub mod config;
pub mod eligibility;
pub mod error;
pub mod telemetry;
