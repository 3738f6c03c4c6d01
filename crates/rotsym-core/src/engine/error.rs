use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::ModelLoadError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Rotation geometry is undefined: {reason}")]
    GeometryUndefined { reason: String },

    #[error("Detector '{detector}' failed: {reason}")]
    DetectionFailed {
        detector: &'static str,
        reason: String,
    },

    #[error("Invalid unit pairing: {reason}")]
    InvalidPairing { reason: String },

    #[error("No symmetry axis registered at index {index}")]
    AxisNotFound { index: usize },

    #[error("Invalid decision model: {reason}")]
    InvalidModel { reason: String },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Failed to load model data: {source}")]
    ModelLoad {
        #[from]
        source: ModelLoadError,
    },
}

impl EngineError {
    pub(crate) fn geometry(reason: impl Into<String>) -> Self {
        Self::GeometryUndefined {
            reason: reason.into(),
        }
    }

    pub(crate) fn detection(detector: &'static str, reason: impl ToString) -> Self {
        Self::DetectionFailed {
            detector,
            reason: reason.to_string(),
        }
    }
}
