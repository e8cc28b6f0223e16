//! Session state published to the presentation layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FailureKind, PipelineError};
use crate::intake::{ImageOrigin, ImageResource};
use crate::model::ModelStatus;
use crate::pipeline::decode::format_to_string;
use crate::pipeline::DecodedImage;
use crate::present::DisplayPrediction;
use crate::types::PredictionSet;

/// Everything a renderer needs to draw the session.
///
/// Only the [`SessionController`](super::SessionController) mutates it;
/// everyone else gets snapshots.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    /// Model lifecycle status
    pub model: ModelStatus,

    /// The image of the latest submission
    pub image: Option<CurrentImage>,

    /// Predictions for `image`, in model order
    pub predictions: PredictionSet,

    /// `predictions` formatted for display
    pub results: Vec<DisplayPrediction>,

    /// A model load or a submission is in progress
    pub busy: bool,

    /// Most recent failure, if any
    pub failure: Option<Failure>,

    /// Sequence number of the submission currently in flight
    pub submission: Option<u64>,
}

impl SessionState {
    /// No image, no predictions, nothing running, nothing failed.
    pub fn is_clear(&self) -> bool {
        self.image.is_none()
            && self.predictions.is_empty()
            && self.results.is_empty()
            && !self.busy
            && self.failure.is_none()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }
}

/// The image currently shown by the session.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentImage {
    #[serde(skip)]
    pub resource: ImageResource,

    /// Pixels, once decoding succeeded
    #[serde(skip)]
    pub decoded: Option<Arc<DecodedImage>>,

    pub name: String,
    pub mime_type: String,
    pub origin: ImageOrigin,
    pub content_hash: String,
    pub byte_size: usize,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<String>,
}

impl CurrentImage {
    pub fn new(resource: ImageResource) -> Self {
        Self {
            name: resource.display_name().to_string(),
            mime_type: resource.mime_type().to_string(),
            origin: resource.origin(),
            content_hash: resource.content_hash().to_string(),
            byte_size: resource.len(),
            resource,
            decoded: None,
            width: None,
            height: None,
            format: None,
        }
    }

    pub(crate) fn attach_decoded(&mut self, decoded: Arc<DecodedImage>) {
        self.width = Some(decoded.width);
        self.height = Some(decoded.height);
        self.format = Some(format_to_string(decoded.format));
        self.decoded = Some(decoded);
    }

    pub fn is_decoded(&self) -> bool {
        self.decoded.is_some()
    }
}

/// A failure as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&PipelineError> for Failure {
    fn from(err: &PipelineError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
