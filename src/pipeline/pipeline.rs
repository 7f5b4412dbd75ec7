use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::engine::{DenseEngine, InferenceEngine, IoBinding, TensorMap};
use crate::error::{ClassifyError, Result};
use crate::pipeline::config::PipelineConfig;
use crate::pixel::PixelBuffer;
use crate::postprocess::{ClassLabelTable, ClassificationResult, ResultExtractor};
use crate::preprocess::{Normalizer, NormalizerConfig, DEFAULT_TARGET_SIZE};
use crate::tensor::Tensor;

/// Normalizer -> engine -> extractor, one request at a time.
///
/// The pipeline holds no per-request state. Its only mutable resource is the
/// in-flight slot: [`classify`](Pipeline::classify) waits for it,
/// [`try_classify`](Pipeline::try_classify) gives up with `Busy`.
pub struct Pipeline {
    normalizer: Normalizer,
    engine: Box<dyn InferenceEngine>,
    extractor: ResultExtractor,
    binding: IoBinding,
    in_flight: Mutex<()>,
}

impl Pipeline {
    /// Slot names come from the engine when it reports them, else the defaults.
    pub fn new<E>(normalizer: Normalizer, engine: E, labels: Arc<ClassLabelTable>) -> Self
    where
        E: InferenceEngine + 'static,
    {
        let binding = engine.binding().unwrap_or_default();
        Pipeline {
            normalizer,
            engine: Box::new(engine),
            extractor: ResultExtractor::new(labels),
            binding,
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_binding(mut self, binding: IoBinding) -> Self {
        self.binding = binding;
        self
    }

    /// Loads the model and labels named by `config` and resolves every unset
    /// value from the model metadata or the defaults.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let model_path = config
            .model_path
            .as_ref()
            .ok_or_else(|| ClassifyError::config("no model path configured"))?;
        let engine = DenseEngine::load(model_path)?;
        let metadata = engine.metadata().cloned().unwrap_or_default();

        let labels = match (&config.labels_path, metadata.output_labels) {
            (Some(path), _) => ClassLabelTable::load(path)?,
            (None, Some(labels)) => ClassLabelTable::from_labels(labels)?,
            (None, None) => {
                return Err(ClassifyError::config(
                    "no label file configured and the model carries no output labels",
                ))
            }
        };
        if labels.len() < engine.network().output_size() {
            warn!(
                labels = labels.len(),
                outputs = engine.network().output_size(),
                "label table is shorter than the model output"
            );
        }

        let input = metadata.input;
        let normalizer = Normalizer::new(NormalizerConfig {
            target_width: config
                .target_width
                .or(input.map(|i| i.width))
                .unwrap_or(DEFAULT_TARGET_SIZE),
            target_height: config
                .target_height
                .or(input.map(|i| i.height))
                .unwrap_or(DEFAULT_TARGET_SIZE),
            channel_order: config
                .channel_order
                .or(input.map(|i| i.channel_order))
                .unwrap_or_default(),
        })?;

        let model_binding = engine.binding().unwrap_or_default();
        let binding = IoBinding {
            input: config.input_name.clone().unwrap_or(model_binding.input),
            output: config.output_name.clone().unwrap_or(model_binding.output),
        };
        let engine = engine.with_binding(binding.clone());

        info!(
            width = normalizer.config().target_width,
            height = normalizer.config().target_height,
            classes = labels.len(),
            input = %binding.input,
            output = %binding.output,
            "pipeline ready"
        );
        Ok(Pipeline::new(normalizer, engine, Arc::new(labels)).with_binding(binding))
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn labels(&self) -> &Arc<ClassLabelTable> {
        self.extractor.labels()
    }

    pub fn binding(&self) -> &IoBinding {
        &self.binding
    }

    /// Classifies one image, waiting for any in-flight request to finish.
    pub fn classify(&self, image: &PixelBuffer) -> Result<ClassificationResult> {
        let _slot = self.acquire();
        let output = self.run(image)?;
        self.extractor.classify(&output)
    }

    /// Like [`classify`](Pipeline::classify) but rejects with `Busy` instead
    /// of queueing.
    pub fn try_classify(&self, image: &PixelBuffer) -> Result<ClassificationResult> {
        let _slot = self.try_acquire()?;
        let output = self.run(image)?;
        self.extractor.classify(&output)
    }

    /// The `k` highest-scoring classes, best first.
    pub fn classify_top_k(&self, image: &PixelBuffer, k: usize) -> Result<Vec<ClassificationResult>> {
        let _slot = self.acquire();
        let output = self.run(image)?;
        self.extractor.top_k(&output, k)
    }

    /// Decodes an encoded image and classifies it. Decoding happens before
    /// the in-flight slot is taken.
    pub fn classify_encoded(&self, encoded: &[u8]) -> Result<ClassificationResult> {
        let image = PixelBuffer::decode(encoded)?;
        self.classify(&image)
    }

    pub fn classify_encoded_top_k(&self, encoded: &[u8], k: usize) -> Result<Vec<ClassificationResult>> {
        let image = PixelBuffer::decode(encoded)?;
        self.classify_top_k(&image, k)
    }

    fn acquire(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_acquire(&self) -> Result<MutexGuard<'_, ()>> {
        match self.in_flight.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {
                warn!("rejecting request: pipeline busy");
                Err(ClassifyError::Busy)
            }
        }
    }

    /// Normalizes and evaluates; returns the raw output tensor.
    fn run(&self, image: &PixelBuffer) -> Result<Tensor> {
        let started = Instant::now();
        let input = self.normalizer.normalize(image)?;
        debug!(
            width = image.width(),
            height = image.height(),
            shape = ?input.shape(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "normalized"
        );

        let mut inputs = TensorMap::with_capacity(1);
        inputs.insert(self.binding.input.clone(), input);

        let started = Instant::now();
        let mut outputs = self.engine.evaluate(&inputs)?;
        let output = outputs.remove(&self.binding.output).ok_or_else(|| {
            ClassifyError::engine(format!(
                "engine produced no '{}' output",
                self.binding.output
            ))
        })?;
        debug!(
            shape = ?output.shape(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "evaluated"
        );
        Ok(output)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("normalizer", &self.normalizer)
            .field("classes", &self.labels().len())
            .field("binding", &self.binding)
            .finish()
    }
}
