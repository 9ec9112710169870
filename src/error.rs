//! Error types for model loading and inference

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by [`ModelLoader`](crate::models::ModelLoader).
#[derive(Debug, Error)]
pub enum ModelError {
    /// The runtime could not deserialize a model from the given file.
    #[error("failed to load model from {}: {reason:#}", .path.display())]
    Load { path: PathBuf, reason: anyhow::Error },

    /// Inference was requested before any model was loaded.
    #[error("model not loaded")]
    Unloaded,

    /// The forward pass raised an error inside the runtime.
    #[error("inference failed: {0:#}")]
    Inference(anyhow::Error),
}

impl ModelError {
    /// True for the "called before load" contract violation.
    pub fn is_unloaded(&self) -> bool {
        matches!(self, ModelError::Unloaded)
    }
}
