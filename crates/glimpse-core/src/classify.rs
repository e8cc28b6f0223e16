//! Classification invoker.
//!
//! Hands a decoded image to the session's model and checks what comes back.
//! The model's order is kept exactly as returned.

use std::sync::Arc;

use crate::error::{PipelineError, PipelineResult};
use crate::model::ModelManager;
use crate::pipeline::DecodedImage;
use crate::types::{Prediction, PredictionSet};

/// Runs the session's model against decoded images.
#[derive(Clone)]
pub struct Classifier {
    models: Arc<ModelManager>,
}

impl Classifier {
    pub fn new(models: Arc<ModelManager>) -> Self {
        Self { models }
    }

    /// Classify one image.
    ///
    /// Fails with `ModelNotReady` until the model has loaded, and with
    /// `Inference` if the model errors or returns malformed output.
    pub async fn classify(&self, image: &DecodedImage) -> PipelineResult<PredictionSet> {
        let model = self.models.model()?;

        let start = std::time::Instant::now();
        let predictions = model.classify(image).await.map_err(|e| match e {
            PipelineError::Inference { .. } => e,
            other => PipelineError::Inference {
                message: other.to_string(),
            },
        })?;
        tracing::debug!(
            "{} classified {}x{} image in {:?}",
            model.name(),
            image.width,
            image.height,
            start.elapsed()
        );

        check_output(&predictions)?;

        let set = PredictionSet::new(predictions);
        if !set.is_ranked() {
            tracing::warn!(
                "{} returned predictions out of descending order; showing them as returned",
                model.name()
            );
        }
        Ok(set)
    }
}

/// Reject output that cannot be shown as a ranked list.
fn check_output(predictions: &[Prediction]) -> PipelineResult<()> {
    if predictions.is_empty() {
        return Err(PipelineError::Inference {
            message: "Model returned no predictions".to_string(),
        });
    }
    for (rank, prediction) in predictions.iter().enumerate() {
        if prediction.label.trim().is_empty() {
            return Err(PipelineError::Inference {
                message: format!("Prediction {} has an empty label", rank + 1),
            });
        }
        let p = prediction.probability;
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(PipelineError::Inference {
                message: format!(
                    "Prediction {:?} has probability {} outside [0, 1]",
                    prediction.label, p
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassificationModel, ModelProvider};
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, RgbImage};

    /// Returns a fixed prediction list.
    struct FixedModel(Result<Vec<Prediction>, PipelineError>);

    #[async_trait]
    impl ClassificationModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn classify(&self, _image: &DecodedImage) -> Result<Vec<Prediction>, PipelineError> {
            self.0.clone()
        }
    }

    struct FixedProvider(Result<Vec<Prediction>, PipelineError>);

    #[async_trait]
    impl ModelProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn load(&self) -> Result<Arc<dyn ClassificationModel>, PipelineError> {
            Ok(Arc::new(FixedModel(self.0.clone())))
        }
    }

    async fn classifier(output: Result<Vec<Prediction>, PipelineError>) -> Classifier {
        let models = Arc::new(ModelManager::new(Arc::new(FixedProvider(output))));
        models.initialize().await.unwrap();
        Classifier::new(models)
    }

    fn image() -> DecodedImage {
        DecodedImage::from_image(
            DynamicImage::ImageRgb8(RgbImage::new(8, 8)),
            ImageFormat::Png,
        )
    }

    #[tokio::test]
    async fn test_classify_before_ready() {
        let models = Arc::new(ModelManager::new(Arc::new(FixedProvider(Ok(vec![])))));
        let err = Classifier::new(models).classify(&image()).await.unwrap_err();
        assert!(matches!(err, PipelineError::ModelNotReady { .. }));
    }

    #[tokio::test]
    async fn test_classify_keeps_model_order() {
        let output = vec![
            Prediction::new("tabby", 0.2),
            Prediction::new("beagle", 0.7),
        ];
        let set = classifier(Ok(output.clone()))
            .await
            .classify(&image())
            .await
            .unwrap();
        assert_eq!(set.as_slice(), output.as_slice());
        assert!(!set.is_ranked());
    }

    #[tokio::test]
    async fn test_classify_empty_output_fails() {
        let err = classifier(Ok(vec![]))
            .await
            .classify(&image())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Inference { .. }));
    }

    #[tokio::test]
    async fn test_classify_rejects_bad_probability() {
        for p in [f32::NAN, 1.5, -0.1] {
            let err = classifier(Ok(vec![Prediction::new("beagle", p)]))
                .await
                .classify(&image())
                .await
                .unwrap_err();
            assert!(matches!(err, PipelineError::Inference { .. }), "p = {}", p);
        }
    }

    #[tokio::test]
    async fn test_classify_rejects_empty_label() {
        let err = classifier(Ok(vec![Prediction::new("  ", 0.5)]))
            .await
            .classify(&image())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty label"));
    }

    #[tokio::test]
    async fn test_model_errors_become_inference_failures() {
        let err = classifier(Err(PipelineError::Decode {
            source_name: "tensor".into(),
            message: "bad shape".into(),
        }))
        .await
        .classify(&image())
        .await
        .unwrap_err();
        assert!(matches!(err, PipelineError::Inference { .. }));
        assert!(err.to_string().contains("bad shape"));
    }
}
