//! Diagnosis outcomes and their wire representation.
//!
//! `DiagnosisResult` is the pipeline's sole output type: every call
//! produces exactly one of the three variants. `DiagnosisReport` is the
//! flat shape the result serializes to for callers.

use serde::{Deserialize, Serialize};

use crate::knowledge::KnowledgeEntry;

/// Treatment text carried by error reports.
pub const ERROR_TREATMENT: &str = "Check image format and model files";
/// Prevention text carried by error reports.
pub const ERROR_PREVENTION: &str = "Ensure proper setup";

/// Round a probability to 4 decimal places for presentation.
pub fn round_confidence(confidence: f32) -> f32 {
    (confidence * 10_000.0).round() / 10_000.0
}

/// Outcome of one diagnosis call.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosisResult {
    /// Accepted diagnosis with its knowledge entry.
    Success {
        label: String,
        confidence: f32,
        entry: KnowledgeEntry,
    },
    /// Deliberate non-diagnosis: the input is unsuitable, recapture.
    Rejected {
        reason_label: String,
        confidence: f32,
        message: String,
        suggestion: String,
        advice: String,
    },
    /// Internal fault, surfaced with the raw message for diagnosability.
    Error { message: String },
}

impl DiagnosisResult {
    pub fn success(label: impl Into<String>, confidence: f32, entry: KnowledgeEntry) -> Self {
        Self::Success {
            label: label.into(),
            confidence: round_confidence(confidence),
            entry,
        }
    }

    pub fn rejected(
        reason_label: impl Into<String>,
        confidence: f32,
        message: impl Into<String>,
        suggestion: impl Into<String>,
        advice: impl Into<String>,
    ) -> Self {
        Self::Rejected {
            reason_label: reason_label.into(),
            confidence: round_confidence(confidence),
            message: message.into(),
            suggestion: suggestion.into(),
            advice: advice.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// The wire status literal for this variant.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Rejected { .. } => "rejected",
            Self::Error { .. } => "error",
        }
    }
}

/// Flat report consumed by callers:
/// `{ status, predicted_label, confidence, cause, treatment, prevention }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub status: String,
    pub predicted_label: String,
    pub confidence: f32,
    pub cause: String,
    pub treatment: String,
    pub prevention: String,
}

impl From<&DiagnosisResult> for DiagnosisReport {
    fn from(result: &DiagnosisResult) -> Self {
        match result {
            DiagnosisResult::Success {
                label,
                confidence,
                entry,
            } => Self {
                status: result.status().to_string(),
                predicted_label: label.clone(),
                confidence: *confidence,
                cause: entry.cause.clone(),
                treatment: entry.treatment.clone(),
                prevention: entry.prevention.clone(),
            },
            DiagnosisResult::Rejected {
                reason_label,
                confidence,
                message,
                suggestion,
                advice,
            } => Self {
                status: result.status().to_string(),
                predicted_label: reason_label.clone(),
                confidence: *confidence,
                cause: message.clone(),
                treatment: suggestion.clone(),
                prevention: advice.clone(),
            },
            DiagnosisResult::Error { message } => Self {
                status: result.status().to_string(),
                predicted_label: "Error".to_string(),
                confidence: 0.0,
                cause: message.clone(),
                treatment: ERROR_TREATMENT.to_string(),
                prevention: ERROR_PREVENTION.to_string(),
            },
        }
    }
}
