//! Error types shared across Vigil crates.

use std::path::PathBuf;

/// Top-level error type for Vigil operations.
#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Camera error: {message}")]
    Camera { message: String },

    #[error("Vision error: {message}")]
    Vision { message: String },

    #[error("Display error: {message}")]
    Display { message: String },

    #[error("Notification error: {message}")]
    Notify { message: String },

    #[error("Audio error: {message}")]
    Audio { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using VigilError.
pub type VigilResult<T> = Result<T, VigilError>;

impl VigilError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn camera(msg: impl Into<String>) -> Self {
        Self::Camera {
            message: msg.into(),
        }
    }

    pub fn vision(msg: impl Into<String>) -> Self {
        Self::Vision {
            message: msg.into(),
        }
    }

    pub fn display(msg: impl Into<String>) -> Self {
        Self::Display {
            message: msg.into(),
        }
    }

    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify {
            message: msg.into(),
        }
    }

    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio {
            message: msg.into(),
        }
    }
}
