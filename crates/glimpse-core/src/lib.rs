//! Glimpse Core - embeddable single-image classification pipeline.
//!
//! Glimpse takes one image at a time, from a file picker or a drop payload,
//! and turns it into a ranked list of labels from a pre-trained
//! classification model.
//!
//! # Architecture
//!
//! ```text
//! Pick / Drop → ImageResource → Decode → Classify (model) → Present → SessionState
//! ```
//!
//! The [`SessionController`] drives the pipeline and publishes every state
//! change over a `tokio::sync::watch` channel. Rendering is left to the
//! caller.
//!
//! # Usage
//!
//! ```rust,ignore
//! use glimpse_core::{Config, Glimpse, PickedFile};
//!
//! #[tokio::main]
//! async fn main() -> glimpse_core::Result<()> {
//!     let glimpse = Glimpse::new(Config::load()?);
//!     let session = glimpse.session();
//!     session.startup().await?;
//!
//!     let file = PickedFile::from_path("./dog.jpg".as_ref(), &glimpse.config().limits)?;
//!     session.pick_file(Some(file)).await;
//!     for row in session.snapshot().results {
//!         println!("{} {}", row.label, row.display);
//!     }
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod classify;
pub mod config;
pub mod error;
pub mod intake;
pub mod math;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod present;
pub mod session;
pub mod types;

use std::sync::Arc;

// Re-exports for convenient access
pub use classify::Classifier;
pub use config::Config;
pub use error::{ConfigError, FailureKind, GlimpseError, PipelineError, PipelineResult, Result};
pub use intake::{DroppedItem, ImageOrigin, ImageResource, PickedFile};
pub use model::{ClassificationModel, ModelManager, ModelProvider, ModelStatus};
pub use output::{ClassificationReport, OutputFormat, OutputWriter};
pub use pipeline::{DecodedImage, ImageDecoder};
pub use present::{format_percent, present, DisplayPrediction};
pub use session::{CurrentImage, Failure, SessionController, SessionState, SubmitOutcome};
pub use types::{Prediction, PredictionSet};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Entry point wiring configuration to the ONNX model provider.
pub struct Glimpse {
    config: Config,
}

impl Glimpse {
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing Glimpse v{}", VERSION);
        Self { config }
    }

    /// Create a Glimpse instance from the config file on disk.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(Config::load()?))
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start a new session backed by the configured ONNX model.
    ///
    /// The model is not loaded until [`SessionController::startup`].
    pub fn session(&self) -> Arc<SessionController> {
        let provider = model::OnnxModelProvider::new(&self.config.model, self.config.variant_dir());
        Arc::new(SessionController::from_provider(Arc::new(provider)))
    }
}
