//! Classification model capability and its lifecycle.
//!
//! The numeric work happens behind two object-safe traits:
//! [`ModelProvider`] loads a model once, [`ClassificationModel`] turns a
//! decoded image into ranked predictions. [`ModelManager`] makes sure the
//! load happens exactly once per session.
//!
//! ```rust,ignore
//! use glimpse_core::model::{ModelManager, OnnxModelProvider};
//!
//! let provider = OnnxModelProvider::new(&config.model, config.variant_dir());
//! let models = ModelManager::new(Arc::new(provider));
//! models.initialize().await?;
//! ```

pub mod labels;
pub mod lifecycle;
pub mod onnx;
pub mod preprocess;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::pipeline::DecodedImage;
use crate::types::Prediction;

pub use lifecycle::ModelManager;
pub use onnx::{OnnxClassifier, OnnxModelProvider};

/// A loaded model that can classify images.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Arc<dyn ClassificationModel>` for dynamic dispatch).
#[async_trait]
pub trait ClassificationModel: Send + Sync {
    /// Model name for logging (e.g., "mobilenet-v2").
    fn name(&self) -> &str;

    /// Classify an image.
    ///
    /// Returns predictions ranked by descending probability, already
    /// truncated to the model's top-K.
    async fn classify(&self, image: &DecodedImage) -> Result<Vec<Prediction>, PipelineError>;
}

/// Something that can produce a [`ClassificationModel`].
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Load the model. May be slow; may fail.
    async fn load(&self) -> Result<Arc<dyn ClassificationModel>, PipelineError>;
}

/// Lifecycle of the session's model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelStatus {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Failed {
        message: String,
    },
}

impl ModelStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelStatus::Ready)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ModelStatus::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ModelStatus::Failed { .. })
    }
}

impl std::fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelStatus::Uninitialized => write!(f, "uninitialized"),
            ModelStatus::Loading => write!(f, "loading"),
            ModelStatus::Ready => write!(f, "ready"),
            ModelStatus::Failed { .. } => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_status_serde() {
        let json = serde_json::to_string(&ModelStatus::Failed {
            message: "missing model.onnx".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"state":"failed","message":"missing model.onnx"}"#);

        let ready: ModelStatus = serde_json::from_str(r#"{"state":"ready"}"#).unwrap();
        assert!(ready.is_ready());
    }

    #[test]
    fn test_model_status_display() {
        assert_eq!(ModelStatus::Loading.to_string(), "loading");
        assert_eq!(ModelStatus::default().to_string(), "uninitialized");
    }
}
