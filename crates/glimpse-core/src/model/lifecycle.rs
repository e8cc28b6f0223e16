//! Once-per-session model loading.
//!
//! `Uninitialized → Loading → Ready` or `Uninitialized → Loading → Failed`.
//! Concurrent `initialize()` calls share one in-flight load. `Failed` is
//! sticky until [`ModelManager::retry`] is called explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;

use crate::error::PipelineError;

use super::{ClassificationModel, ModelProvider, ModelStatus};

type LoadResult = Result<Arc<dyn ClassificationModel>, PipelineError>;

enum Slot {
    Idle,
    Loading {
        attempt: u64,
        load: Shared<BoxFuture<'static, LoadResult>>,
    },
    Ready(Arc<dyn ClassificationModel>),
    Failed(PipelineError),
}

/// Owns the session's single model instance.
pub struct ModelManager {
    provider: Arc<dyn ModelProvider>,
    slot: Mutex<Slot>,
    status: watch::Sender<ModelStatus>,
    attempts: AtomicU64,
}

impl ModelManager {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        let (status, _) = watch::channel(ModelStatus::Uninitialized);
        Self {
            provider,
            slot: Mutex::new(Slot::Idle),
            status,
            attempts: AtomicU64::new(0),
        }
    }

    /// Load the model, or join the load already in flight.
    ///
    /// Once settled, every later call returns the same outcome without
    /// touching the provider again.
    pub async fn initialize(&self) -> LoadResult {
        let (attempt, load) = {
            let mut slot = self.lock_slot();
            match &*slot {
                Slot::Ready(model) => return Ok(Arc::clone(model)),
                Slot::Failed(err) => return Err(err.clone()),
                Slot::Loading { attempt, load } => (*attempt, load.clone()),
                Slot::Idle => {
                    let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    let provider = Arc::clone(&self.provider);
                    tracing::info!(
                        "Loading classification model via {} (attempt {})",
                        provider.name(),
                        attempt
                    );
                    let load = async move { provider.load().await }.boxed().shared();
                    *slot = Slot::Loading {
                        attempt,
                        load: load.clone(),
                    };
                    self.status.send_replace(ModelStatus::Loading);
                    (attempt, load)
                }
            }
        };

        let start = std::time::Instant::now();
        let result = load.await;
        self.settle(attempt, &result);
        if let Ok(model) = &result {
            tracing::debug!("Model {} available after {:?}", model.name(), start.elapsed());
        }
        result
    }

    /// Re-attempt initialization after a failed load.
    ///
    /// Outside of `Failed` this behaves exactly like [`initialize`](Self::initialize).
    pub async fn retry(&self) -> LoadResult {
        {
            let mut slot = self.lock_slot();
            if matches!(&*slot, Slot::Failed(_)) {
                tracing::info!("Retrying model load");
                *slot = Slot::Idle;
                self.status.send_replace(ModelStatus::Uninitialized);
            }
        }
        self.initialize().await
    }

    /// The loaded model, or `ModelNotReady` if it isn't loaded yet.
    pub fn model(&self) -> Result<Arc<dyn ClassificationModel>, PipelineError> {
        match &*self.lock_slot() {
            Slot::Ready(model) => Ok(Arc::clone(model)),
            _ => Err(PipelineError::ModelNotReady {
                status: self.status().to_string(),
            }),
        }
    }

    /// Current lifecycle status.
    pub fn status(&self) -> ModelStatus {
        self.status.borrow().clone()
    }

    /// Receive every status change.
    pub fn subscribe(&self) -> watch::Receiver<ModelStatus> {
        self.status.subscribe()
    }

    /// Number of load attempts started so far.
    pub fn load_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn settle(&self, attempt: u64, result: &LoadResult) {
        let mut slot = self.lock_slot();
        // Only the first finisher of this attempt records the outcome.
        if !matches!(&*slot, Slot::Loading { attempt: a, .. } if *a == attempt) {
            return;
        }
        match result {
            Ok(model) => {
                tracing::info!("Model {} ready", model.name());
                *slot = Slot::Ready(Arc::clone(model));
                self.status.send_replace(ModelStatus::Ready);
            }
            Err(err) => {
                tracing::error!("Model load failed: {}", err);
                *slot = Slot::Failed(err.clone());
                self.status.send_replace(ModelStatus::Failed {
                    message: err.to_string(),
                });
            }
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
