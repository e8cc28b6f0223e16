//! Core data types for classification output.

use serde::{Deserialize, Serialize};

/// A single label predicted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Human-readable class label (e.g., "golden retriever")
    pub label: String,

    /// Model confidence from 0.0 to 1.0
    pub probability: f32,
}

impl Prediction {
    /// Create a new prediction.
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

/// Predictions from a single classification call, in the model's output order.
///
/// The model ranks its own output by descending probability; this type keeps
/// that order as-is and never re-sorts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionSet(Vec<Prediction>);

impl PredictionSet {
    /// Wrap model output without reordering it.
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self(predictions)
    }

    /// An empty set (no classification yet, or cleared).
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The highest-ranked prediction, if any.
    pub fn top(&self) -> Option<&Prediction> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prediction> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Prediction] {
        &self.0
    }

    /// Whether probabilities are non-increasing from first to last.
    pub fn is_ranked(&self) -> bool {
        self.0
            .windows(2)
            .all(|pair| pair[0].probability >= pair[1].probability)
    }
}

impl<'a> IntoIterator for &'a PredictionSet {
    type Item = &'a Prediction;
    type IntoIter = std::slice::Iter<'a, Prediction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
