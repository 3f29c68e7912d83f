//! ONNX Runtime feature extraction for the frozen visual model.
//!
//! Loads an EfficientNetV2-B0 embedding export from `model.onnx` and
//! produces 512-dimensional feature vectors from leaf photographs. The
//! model takes channels-last `[1, 224, 224, 3]` input rescaled to
//! [-1, 1]; see [`crate::preprocess`].

use std::path::Path;

use image::DynamicImage;
use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use foliar_core::{Error, Result};

use crate::pipeline::FeatureExtractor;
use crate::preprocess::{INPUT_SIZE, preprocess};

/// Embedding dimension the bundled model was exported with; used when
/// the ONNX output shape leaves the last dimension dynamic.
const DEFAULT_EMBED_DIM: usize = 512;

/// Image embedding generator over an ONNX Runtime session.
#[derive(Debug)]
pub struct OnnxExtractor {
    session: Session,
    input_name: String,
    dim: usize,
}

impl OnnxExtractor {
    /// Load the embedding model from a directory containing `model.onnx`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        if !model_path.exists() {
            return Err(Error::Config(format!(
                "model.onnx not found in {}",
                model_dir.display()
            )));
        }

        let session = Session::builder()
            .and_then(|mut builder| builder.commit_from_file(&model_path))
            .map_err(|e| Error::Config(format!("load {}: {e}", model_path.display())))?;

        let input_name = session.inputs()[0].name().to_string();

        // Infer embedding dimension from the model output shape.
        let dim = infer_dim(session.outputs()[0].dtype()).unwrap_or(DEFAULT_EMBED_DIM);

        info!(dim, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            session,
            input_name,
            dim,
        })
    }
}

impl FeatureExtractor for OnnxExtractor {
    fn dim(&self) -> usize {
        self.dim
    }

    /// Preprocess and run the session, returning one embedding vector.
    ///
    /// A produced vector of the wrong length means the wrong model
    /// artifact is loaded; that aborts the call rather than reshaping.
    fn extract(&mut self, image: &DynamicImage) -> Result<Vec<f32>> {
        let pixels = preprocess(image);
        let shape = [1i64, INPUT_SIZE as i64, INPUT_SIZE as i64, 3];

        let input = Tensor::from_array((shape, pixels.into_boxed_slice()))
            .map_err(|e| Error::Internal(format!("build input tensor: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| Error::Internal(format!("inference: {e}")))?;

        let (_, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Internal(format!("read output tensor: {e}")))?;

        let embedding = data.to_vec();
        if embedding.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: embedding.len(),
            });
        }

        Ok(embedding)
    }
}

/// Try to infer the embedding dimension from the ONNX model output type.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => {
            // Last dimension is the embedding dim; negative means dynamic.
            shape
                .last()
                .and_then(|&d| if d > 0 { Some(d as usize) } else { None })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_without_model_is_a_config_error() {
        let err = OnnxExtractor::load(Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("model.onnx"));
    }
}
