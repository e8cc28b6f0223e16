//! Shared fixtures for the integration tests: in-memory images and models
//! whose completions the test controls.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use glimpse_core::math::{softmax, top_k};
use glimpse_core::{
    ClassificationModel, DecodedImage, ModelProvider, PipelineError, Prediction,
    SessionController,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tokio::sync::{mpsc, oneshot};

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// Solid 8x8 PNG whose red channel identifies it to [`ScriptedModel`].
pub fn keyed_png(key: u8) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([key, 0, 0])));
    encode(&img, ImageFormat::Png)
}

/// A golden-coated "dog" photo: warm gold with light per-pixel noise.
pub fn golden_dog_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let jitter = ((x * 7 + y * 13) % 9) as u8;
        Rgb([206 + jitter, 156 + jitter, 76 + jitter])
    });
    encode(&DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

// ---------------------------------------------------------------------------
// Palette model: classifies by mean color against reference swatches
// ---------------------------------------------------------------------------

const PALETTE: &[(&str, [f32; 3])] = &[
    ("golden retriever", [212.0, 160.0, 80.0]),
    ("Labrador retriever", [35.0, 30.0, 28.0]),
    ("Siberian husky", [200.0, 200.0, 210.0]),
    ("tabby cat", [120.0, 100.0, 80.0]),
    ("goldfish", [255.0, 120.0, 0.0]),
    ("lawn mower", [60.0, 140.0, 50.0]),
];

/// Deterministic stand-in for a real network.
pub struct PaletteModel {
    top_k: usize,
}

impl PaletteModel {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }
}

#[async_trait]
impl ClassificationModel for PaletteModel {
    fn name(&self) -> &str {
        "palette"
    }

    async fn classify(&self, image: &DecodedImage) -> Result<Vec<Prediction>, PipelineError> {
        let rgb = image.image.to_rgb8();
        let count = (rgb.width() * rgb.height()).max(1) as f32;
        let mut mean = [0.0f32; 3];
        for pixel in rgb.pixels() {
            for c in 0..3 {
                mean[c] += pixel[c] as f32;
            }
        }
        for value in &mut mean {
            *value /= count;
        }

        let logits: Vec<f32> = PALETTE
            .iter()
            .map(|(_, swatch)| {
                let dist = (0..3)
                    .map(|c| (mean[c] - swatch[c]).powi(2))
                    .sum::<f32>()
                    .sqrt();
                -dist / 20.0
            })
            .collect();

        Ok(top_k(&softmax(&logits), self.top_k)
            .into_iter()
            .map(|(idx, p)| Prediction::new(PALETTE[idx].0, p))
            .collect())
    }
}

pub struct PaletteProvider;

#[async_trait]
impl ModelProvider for PaletteProvider {
    fn name(&self) -> &str {
        "palette"
    }

    async fn load(&self) -> Result<Arc<dyn ClassificationModel>, PipelineError> {
        Ok(Arc::new(PaletteModel::new(3)))
    }
}

// ---------------------------------------------------------------------------
// Scripted model: each classification waits until the test releases it
// ---------------------------------------------------------------------------

/// Labels an image `image-{key}` where `key` is the red channel of its
/// first pixel. A classification for a gated key blocks until released.
pub struct ScriptedModel {
    gates: Mutex<HashMap<u8, oneshot::Receiver<()>>>,
    entered: mpsc::UnboundedSender<u8>,
}

impl ScriptedModel {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<u8>) {
        let (entered, rx) = mpsc::unbounded_channel();
        let model = Arc::new(Self {
            gates: Mutex::new(HashMap::new()),
            entered,
        });
        (model, rx)
    }

    /// Hold classifications of `key` until the returned sender fires.
    pub fn gate(&self, key: u8) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(key, rx);
        tx
    }
}

#[async_trait]
impl ClassificationModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn classify(&self, image: &DecodedImage) -> Result<Vec<Prediction>, PipelineError> {
        let key = image.image.to_rgb8().get_pixel(0, 0)[0];
        let gate = self.gates.lock().unwrap().remove(&key);
        let _ = self.entered.send(key);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(vec![
            Prediction::new(format!("image-{}", key), 0.75),
            Prediction::new("other", 0.25),
        ])
    }
}

/// Hands out a [`ScriptedModel`]; loading can be gated and made to fail.
pub struct ScriptedProvider {
    model: Arc<ScriptedModel>,
    load_gate: Mutex<Option<oneshot::Receiver<()>>>,
    failing: AtomicBool,
    loads: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(model: Arc<ScriptedModel>) -> Arc<Self> {
        Arc::new(Self {
            model,
            load_gate: Mutex::new(None),
            failing: AtomicBool::new(false),
            loads: AtomicUsize::new(0),
        })
    }

    /// Hold the next load until the returned sender fires.
    pub fn gate_load(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.load_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn load(&self) -> Result<Arc<dyn ClassificationModel>, PipelineError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let gate = self.load_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(PipelineError::ModelLoad {
                path: PathBuf::from("/models/scripted/model.onnx"),
                message: "weights missing".to_string(),
            });
        }
        let model: Arc<dyn ClassificationModel> = self.model.clone();
        Ok(model)
    }
}

/// A session over a fresh scripted model.
pub struct Fixture {
    pub session: Arc<SessionController>,
    pub provider: Arc<ScriptedProvider>,
    pub model: Arc<ScriptedModel>,
    pub entered: mpsc::UnboundedReceiver<u8>,
}

impl Fixture {
    pub fn new() -> Self {
        let (model, entered) = ScriptedModel::new();
        let provider = ScriptedProvider::new(model.clone());
        let session = Arc::new(SessionController::from_provider(provider.clone()));
        Self {
            session,
            provider,
            model,
            entered,
        }
    }

    /// Fixture whose model is already loaded.
    pub async fn ready() -> Self {
        let fixture = Self::new();
        fixture.session.startup().await.unwrap();
        fixture
    }
}
