use std::path::Path;

use tracing::info;

use crate::engine::{InferenceEngine, IoBinding, TensorMap, DEFAULT_INPUT_NAME, DEFAULT_OUTPUT_NAME};
use crate::error::{ClassifyError, Result};
use crate::network::{ModelMetadata, Network};
use crate::tensor::Tensor;

/// Evaluates a dense network loaded from a JSON model file.
///
/// The input tensor is flattened in its stored (planar) order and must have
/// exactly as many elements as the first layer's fan-in. The output is a
/// `[1, N]` score tensor.
#[derive(Debug, Clone)]
pub struct DenseEngine {
    network: Network,
    binding: IoBinding,
}

impl DenseEngine {
    pub fn new(network: Network) -> Result<Self> {
        network.validate()?;
        let metadata = network.metadata.clone().unwrap_or_default();
        let binding = IoBinding {
            input: metadata.input_name.unwrap_or_else(|| DEFAULT_INPUT_NAME.to_owned()),
            output: metadata.output_name.unwrap_or_else(|| DEFAULT_OUTPUT_NAME.to_owned()),
        };
        Ok(DenseEngine { network, binding })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let network = Network::load_json(path)?;
        info!(
            model = %path.display(),
            layers = network.layers.len(),
            inputs = network.input_size(),
            outputs = network.output_size(),
            "loaded dense model"
        );
        DenseEngine::new(network)
    }

    /// Overrides the slot names taken from the model metadata.
    pub fn with_binding(mut self, binding: IoBinding) -> Self {
        self.binding = binding;
        self
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.network.metadata.as_ref()
    }
}

impl InferenceEngine for DenseEngine {
    fn evaluate(&self, inputs: &TensorMap) -> Result<TensorMap> {
        let input = inputs.get(&self.binding.input).ok_or_else(|| {
            ClassifyError::engine(format!("no tensor bound to input '{}'", self.binding.input))
        })?;
        if input.len() != self.network.input_size() {
            return Err(ClassifyError::ShapeMismatch {
                context: "model input",
                expected: self.network.input_size(),
                actual: input.len(),
            });
        }

        let x: Vec<f64> = input.data().iter().map(|&v| v as f64).collect();
        let y = self.network.forward(&x)?;
        let scores: Vec<f32> = y.into_iter().map(|v| v as f32).collect();

        let mut outputs = TensorMap::new();
        outputs.insert(
            self.binding.output.clone(),
            Tensor::new(vec![1, scores.len()], scores)?,
        );
        Ok(outputs)
    }

    fn binding(&self) -> Option<IoBinding> {
        Some(self.binding.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::layers::Layer;
    use crate::math::Matrix;

    /// 3 inputs -> 2 scores; output 0 reads the first plane, output 1 the last.
    fn picker() -> Network {
        Network {
            layers: vec![Layer {
                size: 2,
                weights: Matrix { rows: 3, cols: 2, data: vec![vec![1.0, 0.0], vec![0.0, 0.0], vec![0.0, 1.0]] },
                biases: Matrix::zeros(1, 2),
                activator: ActivationFunction::Identity,
            }],
            metadata: None,
        }
    }

    fn bind(name: &str, tensor: Tensor) -> TensorMap {
        let mut map = TensorMap::new();
        map.insert(name.to_owned(), tensor);
        map
    }

    #[test]
    fn test_evaluate_uses_default_slots() {
        let engine = DenseEngine::new(picker()).unwrap();
        let input = Tensor::new(vec![1, 3, 1, 1], vec![0.25, 0.5, 0.75]).unwrap();
        let out = engine.evaluate(&bind("inputs", input)).unwrap();
        let scores = &out["predictions"];
        assert_eq!(scores.shape(), &[1, 2]);
        assert_eq!(scores.data(), &[0.25, 0.75]);
    }

    #[test]
    fn test_metadata_renames_slots() {
        let net = picker().with_metadata(ModelMetadata {
            input_name: Some("data".into()),
            output_name: Some("logits".into()),
            ..Default::default()
        });
        let engine = DenseEngine::new(net).unwrap();
        assert_eq!(engine.binding().unwrap().input, "data");

        let out = engine.evaluate(&bind("data", Tensor::zeros(vec![1, 3, 1, 1]))).unwrap();
        assert!(out.contains_key("logits"));
    }

    #[test]
    fn test_missing_input_slot() {
        let engine = DenseEngine::new(picker()).unwrap();
        let err = engine.evaluate(&bind("image", Tensor::zeros(vec![1, 3, 1, 1]))).unwrap_err();
        assert!(matches!(err, ClassifyError::Engine { .. }));
    }

    #[test]
    fn test_wrong_input_size() {
        let engine = DenseEngine::new(picker()).unwrap();
        let err = engine.evaluate(&bind("inputs", Tensor::zeros(vec![1, 3, 2, 2]))).unwrap_err();
        assert!(matches!(err, ClassifyError::ShapeMismatch { expected: 3, actual: 12, .. }));
    }
}
