//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.model.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.name must not be empty".into(),
            ));
        }
        if self.model.input_size == 0 {
            return Err(ConfigError::ValidationError(
                "model.input_size must be > 0".into(),
            ));
        }
        if self.model.resize_size < self.model.input_size {
            return Err(ConfigError::ValidationError(
                "model.resize_size must be >= model.input_size".into(),
            ));
        }
        if self.model.std.iter().any(|s| *s <= 0.0) {
            return Err(ConfigError::ValidationError(
                "model.std components must be > 0".into(),
            ));
        }
        if self.model.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "model.top_k must be > 0".into(),
            ));
        }
        if self.model.intra_threads == 0 {
            return Err(ConfigError::ValidationError(
                "model.intra_threads must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if !matches!(self.output.format.as_str(), "text" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be \"text\" or \"json\", got {:?}",
                self.output.format
            )));
        }
        Ok(())
    }
}
