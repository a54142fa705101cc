//! Viewer error types

use thiserror::Error;

/// Viewer-specific errors
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Renderer creation error
    #[error("failed to create renderer '{name}': {message}")]
    RendererCreation { name: String, message: String },

    /// Renderer type compiled out
    #[error("renderer '{name}' needs the '{feature}' feature")]
    FeatureDisabled { name: String, feature: &'static str },

    /// Render loop built without any sensor
    #[error("render loop has no sensors to display")]
    NoSensors,

    /// Renderer error (from contract)
    #[error("renderer error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ViewerError {
    /// Create a renderer creation error
    pub fn renderer_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RendererCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
