//! Confidence-gated decision policy.
//!
//! Turns the classifier's winning label and probability into exactly one
//! of three outcomes: accepted diagnosis, rejection, or (upstream of
//! here) an error. The thresholds are empirically tuned policy values,
//! overridable per deployment, never derived from data at runtime.

use serde::Deserialize;

use crate::diagnosis::DiagnosisResult;
use crate::knowledge::{HEALTHY_LABEL, KnowledgeBase};

/// Reason label for the universal low-confidence rejection.
pub const NO_LEAF_LABEL: &str = "No Valid Leaf Detected";
pub const NO_LEAF_MESSAGE: &str =
    "Image does not appear to be a mango leaf or confidence too low.";
pub const NO_LEAF_SUGGESTION: &str = "Please capture a clear image of a mango leaf";
pub const NO_LEAF_ADVICE: &str = "Ensure proper lighting and leaf is clearly visible";

/// Reason label for the healthy-but-uncertain rejection.
pub const UNCLEAR_LABEL: &str = "Unclear Image";
pub const UNCLEAR_MESSAGE: &str = "Image quality insufficient for accurate diagnosis.";
pub const UNCLEAR_SUGGESTION: &str = "Recapture with better focus on the leaf";
pub const UNCLEAR_ADVICE: &str = "Hold camera steady and ensure good lighting";

/// Tunable acceptance thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    /// Reject every prediction below this confidence, whatever the label.
    pub reject_below: f32,
    /// Reject "Healthy" predictions below this confidence. Low-signal
    /// input scores spuriously high on the least distinctive class, so
    /// that label is held to a higher bar.
    pub healthy_reject_below: f32,
    /// The label the raised bar applies to.
    pub healthy_label: String,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            reject_below: 0.50,
            healthy_reject_below: 0.60,
            healthy_label: HEALTHY_LABEL.to_string(),
        }
    }
}

impl DecisionPolicy {
    /// Classify a winning (label, confidence) pair into an outcome.
    ///
    /// The checks apply in order: universal rejection first, then the
    /// healthy-specific rejection, then acceptance with a knowledge
    /// lookup. Total: never panics, never returns an error.
    pub fn decide(
        &self,
        label: &str,
        confidence: f32,
        knowledge: &KnowledgeBase,
    ) -> DiagnosisResult {
        if confidence < self.reject_below {
            return DiagnosisResult::rejected(
                NO_LEAF_LABEL,
                confidence,
                NO_LEAF_MESSAGE,
                NO_LEAF_SUGGESTION,
                NO_LEAF_ADVICE,
            );
        }

        if label == self.healthy_label && confidence < self.healthy_reject_below {
            return DiagnosisResult::rejected(
                UNCLEAR_LABEL,
                confidence,
                UNCLEAR_MESSAGE,
                UNCLEAR_SUGGESTION,
                UNCLEAR_ADVICE,
            );
        }

        let entry = knowledge.lookup(label);
        DiagnosisResult::success(label, confidence, entry.clone())
    }
}
