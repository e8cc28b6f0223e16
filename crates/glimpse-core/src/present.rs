//! Display formatting for predictions.
//!
//! Probabilities are shown as percentages with one decimal place. Nothing is
//! renormalized or reordered.

use serde::{Deserialize, Serialize};

use crate::types::{Prediction, PredictionSet};

/// One row of the result list, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayPrediction {
    /// 1-based position in the model's output
    pub rank: usize,

    pub label: String,

    /// Raw model probability
    pub probability: f32,

    /// `probability × 100`
    pub percent: f64,

    /// Percentage string, e.g. `"82.3%"`
    pub display: String,

    /// Bar fill in percent, clamped to `[0, 100]`
    pub bar_width: f64,
}

impl DisplayPrediction {
    fn from_prediction(rank: usize, prediction: &Prediction) -> Self {
        let percent = prediction.probability as f64 * 100.0;
        Self {
            rank,
            label: prediction.label.clone(),
            probability: prediction.probability,
            percent,
            display: format_percent(prediction.probability),
            bar_width: if percent.is_finite() {
                percent.clamp(0.0, 100.0)
            } else {
                0.0
            },
        }
    }
}

/// `0.8234` → `"82.3%"`.
pub fn format_percent(probability: f32) -> String {
    format!("{:.1}%", probability as f64 * 100.0)
}

/// Map predictions to display rows, keeping their order.
pub fn present(predictions: &PredictionSet) -> Vec<DisplayPrediction> {
    predictions
        .iter()
        .enumerate()
        .map(|(i, p)| DisplayPrediction::from_prediction(i + 1, p))
        .collect()
}
