//! Diagnosis pipeline: image to embedding to probabilities to outcome.
//!
//! The pipeline is strictly linear and synchronous. Model artifacts are
//! loaded once and never mutated; each call creates and discards its
//! own intermediate values, so one pipeline per worker is safe without
//! locking. Faults never escape: every call yields exactly one
//! `DiagnosisResult`.

use std::path::Path;

use image::DynamicImage;
use tracing::debug;

use foliar_core::{DecisionPolicy, DiagnosisResult, Error, KnowledgeBase, Result};

use crate::classifier::Classifier;

/// Maps a decoded image to a fixed-length embedding vector.
///
/// Seam over the concrete inference runtime; the pipeline and its tests
/// do not care whether the embedding comes from an ONNX session.
pub trait FeatureExtractor {
    /// Declared embedding dimension of the loaded model.
    fn dim(&self) -> usize;

    /// Extract an embedding. Stateless given the loaded model; takes
    /// `&mut self` because inference runtimes run sessions mutably.
    fn extract(&mut self, image: &DynamicImage) -> Result<Vec<f32>>;
}

/// The composed diagnosis pipeline: extractor, classifier, policy, and
/// knowledge base, built once at startup.
#[derive(Debug)]
pub struct Pipeline<E> {
    extractor: E,
    classifier: Classifier,
    policy: DecisionPolicy,
    knowledge: KnowledgeBase,
}

impl<E: FeatureExtractor> Pipeline<E> {
    /// Compose a pipeline, cross-checking the model's declared embedding
    /// dimension against the dimension the classifier was fitted on.
    pub fn new(
        extractor: E,
        classifier: Classifier,
        policy: DecisionPolicy,
        knowledge: KnowledgeBase,
    ) -> Result<Self> {
        if extractor.dim() != classifier.dim() {
            return Err(Error::Config(format!(
                "classifier was fitted on {}-dim embeddings but the model produces {}",
                classifier.dim(),
                extractor.dim()
            )));
        }
        Ok(Self {
            extractor,
            classifier,
            policy,
            knowledge,
        })
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Diagnose a decoded image.
    ///
    /// Total: extraction or classification faults come back as the
    /// `Error` variant, never as a panic or an `Err`.
    pub fn diagnose(&mut self, image: &DynamicImage) -> DiagnosisResult {
        match self.try_diagnose(image) {
            Ok(result) => result,
            Err(e) => DiagnosisResult::error(e.to_string()),
        }
    }

    /// Diagnose an encoded image (PNG, JPEG, ...).
    pub fn diagnose_bytes(&mut self, bytes: &[u8]) -> DiagnosisResult {
        match image::load_from_memory(bytes) {
            Ok(image) => self.diagnose(&image),
            Err(e) => DiagnosisResult::error(Error::Input(e.to_string()).to_string()),
        }
    }

    /// Diagnose an image file.
    pub fn diagnose_path(&mut self, path: &Path) -> DiagnosisResult {
        match image::open(path) {
            Ok(image) => self.diagnose(&image),
            Err(e) => DiagnosisResult::error(Error::Input(e.to_string()).to_string()),
        }
    }

    fn try_diagnose(&mut self, image: &DynamicImage) -> Result<DiagnosisResult> {
        let embedding = self.extractor.extract(image)?;
        if embedding.len() != self.classifier.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.classifier.dim(),
                actual: embedding.len(),
            });
        }

        let probabilities = self.classifier.classify(&embedding)?;
        let (index, confidence) = probabilities.top();
        let label = self
            .classifier
            .label_at(index)
            .ok_or_else(|| Error::Internal(format!("no label at index {index}")))?;

        debug!(label, confidence = confidence as f64, "classified");
        Ok(self.policy.decide(label, confidence, &self.knowledge))
    }
}

/// Pipeline backed by the ONNX feature extractor.
#[cfg(feature = "onnx")]
pub type OnnxPipeline = Pipeline<crate::extractor::OnnxExtractor>;

#[cfg(feature = "onnx")]
impl Pipeline<crate::extractor::OnnxExtractor> {
    /// Load every artifact from one model directory: `model.onnx`,
    /// `classifier.json`, and an optional `knowledge.json` override.
    ///
    /// A missing artifact is fatal here, not a per-call error.
    pub fn load(model_dir: &Path, policy: DecisionPolicy) -> Result<Self> {
        let extractor = crate::extractor::OnnxExtractor::load(model_dir)?;
        let classifier = Classifier::load(&model_dir.join("classifier.json"))?;

        let knowledge_path = model_dir.join("knowledge.json");
        let knowledge = if knowledge_path.exists() {
            KnowledgeBase::from_json_file(&knowledge_path)?
        } else {
            KnowledgeBase::builtin()
        };

        Self::new(extractor, classifier, policy, knowledge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierBundle, LinearHead, Scaler};
    use foliar_core::DiagnosisReport;
    use foliar_core::policy::{NO_LEAF_LABEL, UNCLEAR_LABEL};
    use std::io::Cursor;

    const DIM: usize = 2;

    /// Fixed-output extractor standing in for the ONNX session.
    #[derive(Debug)]
    struct StubExtractor {
        dim: usize,
        output: Vec<f32>,
    }

    impl FeatureExtractor for StubExtractor {
        fn dim(&self) -> usize {
            self.dim
        }

        fn extract(&mut self, _image: &DynamicImage) -> Result<Vec<f32>> {
            Ok(self.output.clone())
        }
    }

    /// Bias-only classifier: the embedding is ignored and the softmax of
    /// `bias` is the produced distribution, which pins exact confidences.
    fn bias_only_classifier(labels: &[&str], bias: Vec<f32>) -> Classifier {
        let classes = labels.len();
        Classifier::from_bundle(ClassifierBundle {
            embedding_dim: DIM,
            scaler: Scaler {
                mean: vec![0.0; DIM],
                scale: vec![1.0; DIM],
            },
            head: LinearHead {
                weights: vec![vec![0.0; DIM]; classes],
                bias,
            },
            labels: labels.iter().map(|s| s.to_string()).collect(),
        })
        .unwrap()
    }

    fn pipeline_with(labels: &[&str], bias: Vec<f32>) -> Pipeline<StubExtractor> {
        let extractor = StubExtractor {
            dim: DIM,
            output: vec![0.0; DIM],
        };
        Pipeline::new(
            extractor,
            bias_only_classifier(labels, bias),
            DecisionPolicy::default(),
            KnowledgeBase::builtin(),
        )
        .unwrap()
    }

    fn leaf_image() -> DynamicImage {
        DynamicImage::new_rgb8(16, 16)
    }

    // softmax([ln(11/9), 0]) = [0.55, 0.45]
    const LOGIT_55: f32 = 0.200_670_7;
    // softmax([0, ln(17/3)]) = [0.15, 0.85]
    const LOGIT_85: f32 = 1.734_601_1;

    #[test]
    fn mid_confidence_healthy_is_rejected_as_unclear() {
        let mut pipeline = pipeline_with(&["Healthy", "Anthracnose"], vec![LOGIT_55, 0.0]);
        let result = pipeline.diagnose(&leaf_image());

        let report = DiagnosisReport::from(&result);
        assert_eq!(report.status, "rejected");
        assert_eq!(report.predicted_label, UNCLEAR_LABEL);
        assert_eq!(report.confidence, 0.55);
    }

    #[test]
    fn confident_disease_is_a_success_with_its_entry() {
        let mut pipeline = pipeline_with(&["Healthy", "Anthracnose"], vec![0.0, LOGIT_85]);
        let result = pipeline.diagnose(&leaf_image());

        let report = DiagnosisReport::from(&result);
        assert_eq!(report.status, "success");
        assert_eq!(report.predicted_label, "Anthracnose");
        assert_eq!(report.confidence, 0.85);
        assert_eq!(
            report.cause,
            "Fungal infection causing dark sunken lesions on leaves and fruits."
        );
        assert_eq!(
            report.treatment,
            "Spray Carbendazim 0.1% or Copper Oxychloride 0.3%"
        );
    }

    #[test]
    fn near_uniform_distribution_is_rejected_as_non_leaf() {
        let mut pipeline = pipeline_with(
            &["Healthy", "Anthracnose", "Die Back"],
            vec![0.0, 0.0, 0.0],
        );
        let result = pipeline.diagnose(&leaf_image());

        let report = DiagnosisReport::from(&result);
        assert_eq!(report.status, "rejected");
        assert_eq!(report.predicted_label, NO_LEAF_LABEL);
        assert_eq!(report.confidence, 0.3333);
    }

    #[test]
    fn label_outside_the_knowledge_table_uses_the_healthy_entry() {
        let mut pipeline = pipeline_with(&["Healthy", "Red Rust"], vec![0.0, 2.0]);
        let result = pipeline.diagnose(&leaf_image());

        let report = DiagnosisReport::from(&result);
        assert_eq!(report.status, "success");
        assert_eq!(report.predicted_label, "Red Rust");
        assert_eq!(report.cause, "No disease detected.");
        assert_eq!(report.treatment, "No treatment required");
    }

    #[test]
    fn wrong_embedding_length_yields_an_error_result() {
        let extractor = StubExtractor {
            dim: DIM,
            output: vec![0.0; DIM + 1], // misconfigured model output
        };
        let mut pipeline = Pipeline::new(
            extractor,
            bias_only_classifier(&["Healthy", "Anthracnose"], vec![0.0, 3.0]),
            DecisionPolicy::default(),
            KnowledgeBase::builtin(),
        )
        .unwrap();

        let result = pipeline.diagnose(&leaf_image());
        let report = DiagnosisReport::from(&result);
        assert_eq!(report.status, "error");
        assert_eq!(report.predicted_label, "Error");
        assert_eq!(report.confidence, 0.0);
        assert!(report.cause.contains("dimension mismatch"), "{}", report.cause);
    }

    #[test]
    fn declared_dimension_mismatch_fails_at_composition() {
        let extractor = StubExtractor {
            dim: 384,
            output: vec![0.0; 384],
        };
        let err = Pipeline::new(
            extractor,
            bias_only_classifier(&["Healthy", "Anthracnose"], vec![0.0, 0.0]),
            DecisionPolicy::default(),
            KnowledgeBase::builtin(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn diagnosis_is_idempotent() {
        let mut pipeline = pipeline_with(&["Healthy", "Anthracnose"], vec![0.2, 1.3]);
        let image = leaf_image();
        assert_eq!(pipeline.diagnose(&image), pipeline.diagnose(&image));
    }

    #[test]
    fn undecodable_bytes_yield_an_error_result() {
        let mut pipeline = pipeline_with(&["Healthy", "Anthracnose"], vec![0.0, 3.0]);
        let result = pipeline.diagnose_bytes(b"definitely not an image");

        let report = DiagnosisReport::from(&result);
        assert_eq!(report.status, "error");
        assert!(report.cause.contains("invalid input image"), "{}", report.cause);
    }

    #[test]
    fn encoded_bytes_match_the_decoded_image() {
        let image = leaf_image();
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let mut pipeline = pipeline_with(&["Healthy", "Anthracnose"], vec![0.0, LOGIT_85]);
        assert_eq!(pipeline.diagnose_bytes(&bytes), pipeline.diagnose(&image));
    }

    #[test]
    fn missing_file_yields_an_error_result() {
        let mut pipeline = pipeline_with(&["Healthy", "Anthracnose"], vec![0.0, 3.0]);
        let result = pipeline.diagnose_path(Path::new("/nonexistent/leaf.jpg"));
        assert_eq!(result.status(), "error");
    }
}
