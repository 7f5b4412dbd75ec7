use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use ferrite_classify::layers::Layer;
use ferrite_classify::math::Matrix;
use ferrite_classify::{
    ActivationFunction, ChannelOrder, ClassLabelTable, ClassifyError, ImageInput,
    InferenceEngine, ModelMetadata, Network, Normalizer, NormalizerConfig, Pipeline,
    PipelineConfig, PixelBuffer, TargetOrder, Tensor, TensorMap,
};

fn labels() -> Arc<ClassLabelTable> {
    Arc::new(ClassLabelTable::from_labels(["falldown", "none"]).unwrap())
}

fn normalizer(size: u32) -> Normalizer {
    Normalizer::new(NormalizerConfig {
        target_width: size,
        target_height: size,
        channel_order: TargetOrder::Rgb,
    })
    .unwrap()
}

fn solid_bgra(size: u32, bgra: [u8; 4]) -> PixelBuffer {
    let bytes = bgra.repeat((size * size) as usize);
    PixelBuffer::new(size, size, ChannelOrder::Bgra, 4, bytes).unwrap()
}

fn predictions(scores: Vec<f32>) -> TensorMap {
    let mut out = TensorMap::new();
    out.insert("predictions".to_owned(), Tensor::new(vec![1, scores.len()], scores).unwrap());
    out
}

/// Blocks inside `evaluate` until the test releases it.
struct GateEngine {
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl InferenceEngine for GateEngine {
    fn evaluate(&self, _inputs: &TensorMap) -> ferrite_classify::Result<TensorMap> {
        self.entered.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        Ok(predictions(vec![0.9, 0.1]))
    }
}

/// Records the highest number of overlapping evaluations.
#[derive(Default)]
struct OverlapEngine {
    active: AtomicUsize,
    max_seen: Arc<AtomicUsize>,
}

impl InferenceEngine for OverlapEngine {
    fn evaluate(&self, _inputs: &TensorMap) -> ferrite_classify::Result<TensorMap> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(predictions(vec![0.2, 0.8]))
    }
}

#[test]
fn try_classify_rejects_while_a_request_is_in_flight() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let engine = GateEngine {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };
    let pipeline = Arc::new(Pipeline::new(normalizer(2), engine, labels()));
    let image = solid_bgra(2, [0, 0, 255, 255]);

    let first = {
        let pipeline = Arc::clone(&pipeline);
        let image = image.clone();
        thread::spawn(move || pipeline.classify(&image))
    };
    entered_rx.recv().unwrap();

    let err = pipeline.try_classify(&image).unwrap_err();
    assert!(matches!(err, ClassifyError::Busy));
    assert!(err.is_input_error());

    release_tx.send(()).unwrap();
    let result = first.join().unwrap().unwrap();
    assert_eq!(result.label, "falldown");
    assert!((result.confidence - 0.9).abs() < 1e-6);

    // The slot is free again.
    release_tx.send(()).unwrap();
    assert_eq!(pipeline.try_classify(&image).unwrap().label, "falldown");
}

#[test]
fn concurrent_classify_calls_queue() {
    let max_seen = Arc::new(AtomicUsize::new(0));
    let engine = OverlapEngine { max_seen: Arc::clone(&max_seen), ..Default::default() };
    let pipeline = Arc::new(Pipeline::new(normalizer(2), engine, labels()));
    let image = solid_bgra(2, [10, 20, 30, 255]);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let image = image.clone();
            thread::spawn(move || pipeline.classify(&image))
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap().unwrap().label, "none");
    }
    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
}

/// 2x2 RGB input, two identity outputs: mean red and mean blue.
fn red_vs_blue_model() -> Network {
    let mut weights = Matrix::zeros(12, 2);
    for i in 0..4 {
        weights.data[i][0] = 0.25; // R plane
        weights.data[8 + i][1] = 0.25; // B plane
    }
    Network {
        layers: vec![Layer {
            size: 2,
            weights,
            biases: Matrix::zeros(1, 2),
            activator: ActivationFunction::Identity,
        }],
        metadata: Some(ModelMetadata {
            description: Some("red vs blue".to_owned()),
            input: Some(ImageInput { width: 2, height: 2, channel_order: TargetOrder::Rgb }),
            output_labels: Some(vec!["red".to_owned(), "blue".to_owned()]),
            input_name: None,
            output_name: None,
        }),
    }
}

#[test]
fn from_config_runs_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("model.json");
    red_vs_blue_model().save_json(&model_path).unwrap();

    let config = PipelineConfig { model_path: Some(model_path), ..Default::default() };
    let pipeline = Pipeline::from_config(&config).unwrap();
    assert_eq!(pipeline.normalizer().output_shape(), [1, 3, 2, 2]);
    assert_eq!(pipeline.binding().input, "inputs");
    assert_eq!(pipeline.binding().output, "predictions");

    // BGRA bytes: pure blue, then pure red.
    let blue = pipeline.classify(&solid_bgra(2, [255, 0, 0, 255])).unwrap();
    assert_eq!(blue.label, "blue");
    assert!((blue.confidence - 1.0).abs() < 1e-6);
    assert_eq!(blue.class_index, Some(1));

    let red = pipeline.classify(&solid_bgra(2, [0, 0, 255, 255])).unwrap();
    assert_eq!(red.label, "red");

    let ranked = pipeline.classify_top_k(&solid_bgra(2, [0, 0, 128, 255]), 2).unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].label, "red");
    assert_eq!(ranked[1].label, "blue");
    assert!(ranked[1].confidence.abs() < 1e-6);
}

#[test]
fn label_file_overrides_model_labels() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("model.json");
    let labels_path = dir.path().join("labels.txt");
    red_vs_blue_model().save_json(&model_path).unwrap();
    std::fs::write(&labels_path, "warm\ncold\n").unwrap();

    let config = PipelineConfig {
        model_path: Some(model_path),
        labels_path: Some(labels_path),
        ..Default::default()
    };
    let pipeline = Pipeline::from_config(&config).unwrap();
    let result = pipeline.classify(&solid_bgra(2, [255, 0, 0, 255])).unwrap();
    assert_eq!(result.label, "cold");
}

#[test]
fn classify_encoded_resizes_a_decoded_png() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("model.json");
    red_vs_blue_model().save_json(&model_path).unwrap();
    let pipeline = Pipeline::from_config(&PipelineConfig {
        model_path: Some(model_path),
        ..Default::default()
    })
    .unwrap();

    let img = image::RgbImage::from_pixel(6, 6, image::Rgb([200, 0, 10]));
    let mut png = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut png, image::ImageOutputFormat::Png)
        .unwrap();

    let result = pipeline.classify_encoded(&png.into_inner()).unwrap();
    assert_eq!(result.label, "red");
    assert!((result.confidence - 200.0 / 255.0).abs() < 1e-3);
}

#[test]
fn undecodable_upload_is_an_input_error() {
    let pipeline = Pipeline::new(normalizer(2), OverlapEngine::default(), labels());
    let err = pipeline.classify_encoded(b"not an image").unwrap_err();
    assert!(err.is_input_error());
}

#[test]
fn missing_labels_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("model.json");
    let mut model = red_vs_blue_model();
    model.metadata = None;
    model.save_json(&model_path).unwrap();

    let err = Pipeline::from_config(&PipelineConfig {
        model_path: Some(model_path),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, ClassifyError::Config { .. }));
}
