//! ONNX Runtime image classifier.
//!
//! Loads `{variant_dir}/model.onnx` plus its class labels and runs a single
//! image per call. The network's output row (logits or probabilities) is
//! turned into the top-K predictions here, so callers only ever see the
//! ranked list.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::config::ModelConfig;
use crate::error::PipelineError;
use crate::math::{softmax, top_k};
use crate::pipeline::DecodedImage;
use crate::types::Prediction;

use super::labels::load_labels;
use super::preprocess::preprocess;
use super::{ClassificationModel, ModelProvider};

/// The classifier ONNX model filename.
pub const MODEL_FILENAME: &str = "model.onnx";

/// Loads an [`OnnxClassifier`] from a model variant directory.
pub struct OnnxModelProvider {
    config: ModelConfig,
    variant_dir: PathBuf,
}

impl OnnxModelProvider {
    pub fn new(config: &ModelConfig, variant_dir: impl Into<PathBuf>) -> Self {
        Self {
            config: config.clone(),
            variant_dir: variant_dir.into(),
        }
    }

    /// Get the expected model file path.
    pub fn model_path(&self) -> PathBuf {
        self.variant_dir.join(MODEL_FILENAME)
    }

    /// Check whether the model file exists on disk.
    pub fn model_exists(&self) -> bool {
        self.model_path().exists()
    }
}

#[async_trait]
impl ModelProvider for OnnxModelProvider {
    fn name(&self) -> &str {
        "onnx"
    }

    async fn load(&self) -> Result<Arc<dyn ClassificationModel>, PipelineError> {
        let model_path = self.model_path();
        if !model_path.exists() {
            return Err(PipelineError::ModelLoad {
                path: model_path,
                message: "Model not found. Run `glimpse models download` first.".to_string(),
            });
        }

        let config = self.config.clone();
        let variant_dir = self.variant_dir.clone();
        let classifier = tokio::task::spawn_blocking(move || {
            OnnxClassifier::load(&model_path, &variant_dir, config)
        })
        .await
        .map_err(|e| PipelineError::ModelLoad {
            path: self.model_path(),
            message: format!("Task join error: {e}"),
        })??;

        Ok(Arc::new(classifier))
    }
}

/// Wraps an ONNX Runtime session for image classification.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
struct OnnxSession {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
}

/// A loaded ONNX classification model.
pub struct OnnxClassifier {
    name: String,
    session: Arc<OnnxSession>,
    labels: Arc<Vec<String>>,
    config: ModelConfig,
}

impl OnnxClassifier {
    /// Load the session and labels (blocking).
    pub fn load(
        model_path: &Path,
        variant_dir: &Path,
        config: ModelConfig,
    ) -> Result<Self, PipelineError> {
        let labels = load_labels(variant_dir)?;

        tracing::info!("Loading ONNX model from {:?}", model_path);
        let session = Session::builder()
            .map_err(|e| PipelineError::ModelLoad {
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .with_intra_threads(config.intra_threads)
            .map_err(|e| PipelineError::ModelLoad {
                path: model_path.to_path_buf(),
                message: format!("Failed to set intra threads: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| PipelineError::ModelLoad {
                path: model_path.to_path_buf(),
                message: format!("Failed to load ONNX model: {e}"),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "input".to_string());

        tracing::debug!(
            "Loaded {} (input: {:?}, {} labels)",
            config.name,
            input_name,
            labels.len()
        );

        Ok(Self {
            name: config.name.clone(),
            session: Arc::new(OnnxSession {
                session: Mutex::new(session),
                input_name,
            }),
            labels: Arc::new(labels),
            config,
        })
    }
}

#[async_trait]
impl ClassificationModel for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, image: &DecodedImage) -> Result<Vec<Prediction>, PipelineError> {
        let tensor = preprocess(&image.image, &self.config);
        let session = Arc::clone(&self.session);

        let scores = tokio::task::spawn_blocking(move || session.run(&tensor))
            .await
            .map_err(|e| PipelineError::Inference {
                message: format!("Task join error: {e}"),
            })??;

        rank(&scores, &self.labels, &self.config)
    }
}

impl OnnxSession {
    /// Run inference and return the single output row.
    fn run(&self, preprocessed: &Array4<f32>) -> Result<Vec<f32>, PipelineError> {
        let shape: Vec<i64> = preprocessed.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = preprocessed.iter().copied().collect();

        let input_value =
            Value::from_array((shape, flat_data)).map_err(|e| PipelineError::Inference {
                message: format!("Failed to create input tensor: {e}"),
            })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self.session.lock().map_err(|e| PipelineError::Inference {
            message: format!("Session lock poisoned: {e}"),
        })?;

        let outputs = session.run(inputs).map_err(|e| PipelineError::Inference {
            message: format!("ONNX inference failed: {e}"),
        })?;

        let (_, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| PipelineError::Inference {
                message: "Model produced no outputs".to_string(),
            })?;

        let (shape, data) =
            output
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::Inference {
                    message: format!("Failed to extract output tensor: {e}"),
                })?;

        // Output is [1, classes] or [classes].
        match shape.len() {
            1 => Ok(data.to_vec()),
            2 if shape[0] == 1 => Ok(data[..shape[1] as usize].to_vec()),
            _ => Err(PipelineError::Inference {
                message: format!("Unexpected output shape: {:?}", shape),
            }),
        }
    }
}

/// Turn one output row into the top-K labelled predictions.
fn rank(
    scores: &[f32],
    labels: &[String],
    config: &ModelConfig,
) -> Result<Vec<Prediction>, PipelineError> {
    if scores.is_empty() {
        return Err(PipelineError::Inference {
            message: "Model output is empty".to_string(),
        });
    }
    if scores.len() != labels.len() {
        tracing::warn!(
            "Model produced {} scores but {} labels are loaded",
            scores.len(),
            labels.len()
        );
    }

    let probabilities = if config.apply_softmax {
        softmax(scores)
    } else {
        scores.to_vec()
    };

    Ok(top_k(&probabilities, config.top_k)
        .into_iter()
        .map(|(idx, probability)| {
            let label = labels
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", idx));
            Prediction::new(label, probability)
        })
        .collect())
}
