//! AI inference layer: ONNX Runtime feature extraction, the probability
//! head, and the composed diagnosis pipeline.

pub mod classifier;
#[cfg(feature = "onnx")]
mod extractor;
pub mod pipeline;
pub mod preprocess;

pub use classifier::{ClassProbabilities, Classifier, ClassifierBundle};
#[cfg(feature = "onnx")]
pub use extractor::OnnxExtractor;
#[cfg(feature = "onnx")]
pub use pipeline::OnnxPipeline;
pub use pipeline::{FeatureExtractor, Pipeline};
