//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.glimpse/models"),
        }
    }
}

/// Classification model settings.
///
/// Defaults describe MobileNetV2 (1.0, 224) with 1001 ImageNet classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model variant name; also the subdirectory under `model_dir`
    pub name: String,

    /// Square input size the network expects
    pub input_size: u32,

    /// Shortest-edge resize applied before the center crop
    pub resize_size: u32,

    /// Per-channel normalization mean (RGB)
    pub mean: [f32; 3],

    /// Per-channel normalization std (RGB)
    pub std: [f32; 3],

    /// Number of ranked predictions the model returns
    pub top_k: usize,

    /// Apply softmax to raw output (set false if the graph already ends in one)
    pub apply_softmax: bool,

    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "mobilenet-v2".to_string(),
            input_size: 224,
            resize_size: 256,
            mean: [0.5, 0.5, 0.5],
            std: [0.5, 0.5, 0.5],
            top_k: 3,
            apply_softmax: true,
            intra_threads: 4,
        }
    }
}

/// Resource limits applied when reading picked files from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("text" or "json")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
