//! Session state controller.
//!
//! Coordinates intake, decoding, the model lifecycle and classification for
//! one user session, and publishes every state change over a `watch`
//! channel.
//!
//! Each submission is tagged with a sequence number. The counter is bumped
//! under the state channel's write lock, and completions are applied under
//! the same lock only if their number is still the latest, so a slow
//! submission can never overwrite a newer one and `reset` invalidates
//! whatever is in flight.

pub mod state;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::classify::Classifier;
use crate::error::{FailureKind, PipelineError, PipelineResult};
use crate::intake::{DroppedItem, ImageResource, PickedFile};
use crate::model::{ModelManager, ModelProvider, ModelStatus};
use crate::pipeline::ImageDecoder;
use crate::present::present;
use crate::types::PredictionSet;

pub use state::{CurrentImage, Failure, SessionState};

/// How a submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Predictions were published
    Classified(PredictionSet),
    /// The failure was published
    Failed(Failure),
    /// A newer submission or a reset took over; nothing was published
    Superseded,
}

impl SubmitOutcome {
    pub fn is_classified(&self) -> bool {
        matches!(self, SubmitOutcome::Classified(_))
    }
}

/// Owns one session's state and drives the pipeline.
pub struct SessionController {
    models: Arc<ModelManager>,
    decoder: ImageDecoder,
    classifier: Classifier,
    state: watch::Sender<SessionState>,
    latest: AtomicU64,
}

impl SessionController {
    pub fn new(models: Arc<ModelManager>) -> Self {
        let (state, _) = watch::channel(SessionState {
            model: models.status(),
            ..SessionState::default()
        });
        Self {
            classifier: Classifier::new(Arc::clone(&models)),
            decoder: ImageDecoder::new(),
            models,
            state,
            latest: AtomicU64::new(0),
        }
    }

    pub fn from_provider(provider: Arc<dyn ModelProvider>) -> Self {
        Self::new(Arc::new(ModelManager::new(provider)))
    }

    /// Load the model. Call once when the session starts.
    pub async fn startup(&self) -> PipelineResult<()> {
        self.load_model(false).await
    }

    /// Re-attempt a failed model load.
    pub async fn retry_model(&self) -> PipelineResult<()> {
        self.load_model(true).await
    }

    async fn load_model(&self, retry: bool) -> PipelineResult<()> {
        let will_load = match self.models.status() {
            ModelStatus::Ready => false,
            ModelStatus::Failed { .. } => retry,
            ModelStatus::Uninitialized | ModelStatus::Loading => true,
        };
        if will_load {
            self.state.send_modify(|s| {
                s.model = ModelStatus::Loading;
                s.busy = true;
            });
        }

        let result = if retry {
            self.models.retry().await
        } else {
            self.models.initialize().await
        };

        let status = self.models.status();
        self.state.send_modify(|s| {
            s.model = status;
            match &result {
                Ok(_) => {
                    if s.failure_kind() == Some(FailureKind::ModelLoadFailure) {
                        s.failure = None;
                    }
                }
                Err(err) => s.failure = Some(Failure::from(err)),
            }
            s.busy = s.submission.is_some();
        });

        result.map(|_| ())
    }

    /// Run a resource through decode, classify and present.
    ///
    /// While the model has failed to load the submission is rejected and
    /// the current image stays.
    pub async fn submit(&self, resource: ImageResource) -> SubmitOutcome {
        if let ModelStatus::Failed { message } = self.models.status() {
            let failure = Failure::new(FailureKind::ModelLoadFailure, message);
            self.state.send_modify(|s| s.failure = Some(failure.clone()));
            return SubmitOutcome::Failed(failure);
        }

        let mut seq = 0;
        self.state.send_modify(|s| {
            seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            s.image = Some(CurrentImage::new(resource.clone()));
            s.predictions = PredictionSet::empty();
            s.results.clear();
            s.failure = None;
            s.busy = true;
            s.submission = Some(seq);
        });
        tracing::info!(
            "Submission {}: {} ({}, {} bytes)",
            seq,
            resource.display_name(),
            resource.mime_type(),
            resource.len()
        );

        let decoded = match self.decoder.decode(&resource).await {
            Ok(decoded) => Arc::new(decoded),
            Err(err) => return self.finish(seq, Err(err)),
        };

        let attached = self.apply(seq, |s| {
            if let Some(image) = s.image.as_mut() {
                image.attach_decoded(Arc::clone(&decoded));
            }
        });
        if !attached {
            return SubmitOutcome::Superseded;
        }

        let result = self.classifier.classify(&decoded).await;
        self.finish(seq, result)
    }

    /// Submit a picker selection. `None` means the picker was cancelled.
    pub async fn pick_file(&self, file: Option<PickedFile>) -> SubmitOutcome {
        match ImageResource::from_pick(file) {
            Ok(resource) => self.submit(resource).await,
            Err(err) => self.reject(&err),
        }
    }

    /// Submit the first image of a drop payload.
    pub async fn drop_items(&self, items: Vec<DroppedItem>) -> SubmitOutcome {
        match ImageResource::from_drop(items) {
            Ok(resource) => self.submit(resource).await,
            Err(err) => self.reject(&err),
        }
    }

    /// Clear the image, predictions and failure. The model is untouched and
    /// any submission still running is discarded when it completes.
    pub fn reset(&self) {
        self.state.send_modify(|s| {
            self.latest.fetch_add(1, Ordering::SeqCst);
            s.image = None;
            s.predictions = PredictionSet::empty();
            s.results.clear();
            s.busy = false;
            s.failure = None;
            s.submission = None;
        });
        tracing::debug!("Session reset");
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Record an intake error. Image, predictions and busy stay as they are.
    fn reject(&self, err: &PipelineError) -> SubmitOutcome {
        tracing::debug!("Intake rejected: {}", err);
        let failure = Failure::from(err);
        self.state.send_modify(|s| s.failure = Some(failure.clone()));
        SubmitOutcome::Failed(failure)
    }

    /// Publish a completion. `busy` stays set while a model load is running.
    fn finish(&self, seq: u64, result: PipelineResult<PredictionSet>) -> SubmitOutcome {
        match result {
            Ok(predictions) => {
                let results = present(&predictions);
                let published = predictions.clone();
                let applied = self.apply(seq, move |s| {
                    s.predictions = published;
                    s.results = results;
                    s.failure = None;
                    s.busy = s.model.is_loading();
                    s.submission = None;
                });
                if applied {
                    tracing::debug!("Submission {}: {} predictions", seq, predictions.len());
                    SubmitOutcome::Classified(predictions)
                } else {
                    SubmitOutcome::Superseded
                }
            }
            Err(err) => {
                let failure = Failure::from(&err);
                let published = failure.clone();
                let applied = self.apply(seq, move |s| {
                    s.predictions = PredictionSet::empty();
                    s.results.clear();
                    s.failure = Some(published);
                    s.busy = s.model.is_loading();
                    s.submission = None;
                });
                if applied {
                    tracing::warn!("Submission {} failed: {}", seq, err);
                    SubmitOutcome::Failed(failure)
                } else {
                    SubmitOutcome::Superseded
                }
            }
        }
    }

    /// Apply `update` only if `seq` is still the latest submission.
    fn apply(&self, seq: u64, update: impl FnOnce(&mut SessionState)) -> bool {
        let mut applied = false;
        self.state.send_if_modified(|s| {
            if self.latest.load(Ordering::SeqCst) != seq {
                return false;
            }
            update(s);
            applied = true;
            true
        });
        if !applied {
            tracing::warn!("Discarding result of stale submission {}", seq);
        }
        applied
    }
}
