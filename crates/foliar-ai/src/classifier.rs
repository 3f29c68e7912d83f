//! Probability head over image embeddings.
//!
//! The training pipeline exports one JSON bundle holding the fitted
//! feature scaler, the per-class linear head, and the ordered label
//! list. The three travel together so the transform applied at
//! inference is the one applied at fit time; the bundle is validated
//! for internal consistency at load and never reshaped silently.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use foliar_core::{Error, Result};

/// Serialized classifier artifact (`classifier.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierBundle {
    /// Embedding dimension the head was fitted on.
    pub embedding_dim: usize,
    pub scaler: Scaler,
    pub head: LinearHead,
    /// Ordered label list; row i of the head scores `labels[i]`.
    pub labels: Vec<String>,
}

/// Per-feature standardization fitted on the training embeddings.
#[derive(Debug, Clone, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

/// Per-class linear logits over the scaled embedding.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearHead {
    /// One row per label, each `embedding_dim` long.
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

/// Categorical distribution over the label list, in label order.
///
/// Produced once per call and immutable after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassProbabilities(Vec<f32>);

impl ClassProbabilities {
    /// Winning index and its probability. Ties resolve to the earliest
    /// index.
    pub fn top(&self) -> (usize, f32) {
        let mut best_idx = 0;
        let mut best_prob = self.0[0];
        for (idx, &prob) in self.0.iter().enumerate().skip(1) {
            if prob > best_prob {
                best_idx = idx;
                best_prob = prob;
            }
        }
        (best_idx, best_prob)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Stateless classifier over loaded parameters.
#[derive(Debug)]
pub struct Classifier {
    bundle: ClassifierBundle,
}

impl Classifier {
    /// Load and validate `classifier.json`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        let bundle: ClassifierBundle = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("parse {}: {e}", path.display())))?;
        Self::from_bundle(bundle)
    }

    /// Validate a deserialized bundle.
    pub fn from_bundle(bundle: ClassifierBundle) -> Result<Self> {
        let dim = bundle.embedding_dim;
        let classes = bundle.labels.len();

        if classes == 0 {
            return Err(Error::Config("classifier bundle has no labels".to_string()));
        }
        if dim == 0 {
            return Err(Error::Config(
                "classifier bundle declares embedding_dim 0".to_string(),
            ));
        }
        if bundle.scaler.mean.len() != dim || bundle.scaler.scale.len() != dim {
            return Err(Error::Config(format!(
                "scaler arrays must be {dim} long, got mean {} and scale {}",
                bundle.scaler.mean.len(),
                bundle.scaler.scale.len()
            )));
        }
        if bundle.scaler.scale.iter().any(|&s| s == 0.0) {
            return Err(Error::Config(
                "scaler has a zero scale entry".to_string(),
            ));
        }
        if bundle.head.weights.len() != classes || bundle.head.bias.len() != classes {
            return Err(Error::Config(format!(
                "head must have one row and bias per label ({classes}), got {} rows and {} biases",
                bundle.head.weights.len(),
                bundle.head.bias.len()
            )));
        }
        if let Some(row) = bundle.head.weights.iter().find(|row| row.len() != dim) {
            return Err(Error::Config(format!(
                "head row must be {dim} long, got {}",
                row.len()
            )));
        }

        Ok(Self { bundle })
    }

    /// Embedding dimension the head was fitted on.
    pub fn dim(&self) -> usize {
        self.bundle.embedding_dim
    }

    /// Ordered label list.
    pub fn labels(&self) -> &[String] {
        &self.bundle.labels
    }

    /// Label at a probability index.
    pub fn label_at(&self, index: usize) -> Option<&str> {
        self.bundle.labels.get(index).map(String::as_str)
    }

    /// Map an embedding to a probability distribution over the labels.
    ///
    /// Applies the fitted scaler, then the linear head with a softmax.
    pub fn classify(&self, embedding: &[f32]) -> Result<ClassProbabilities> {
        if embedding.len() != self.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.dim(),
                actual: embedding.len(),
            });
        }

        let scaled: Vec<f32> = embedding
            .iter()
            .zip(&self.bundle.scaler.mean)
            .zip(&self.bundle.scaler.scale)
            .map(|((&x, &mean), &scale)| (x - mean) / scale)
            .collect();

        let logits: Vec<f32> = self
            .bundle
            .head
            .weights
            .iter()
            .zip(&self.bundle.head.bias)
            .map(|(row, &bias)| {
                row.iter().zip(&scaled).map(|(&w, &x)| w * x).sum::<f32>() + bias
            })
            .collect();

        Ok(ClassProbabilities(softmax(&logits)))
    }
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}
