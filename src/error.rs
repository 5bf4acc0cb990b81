use std::time::Duration;
use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scheduler Error: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("Gallery Error: {0}")]
    Gallery(#[from] GalleryLoadError),
    #[error("Coordinator Error: {0}")]
    Coordinator(String),
    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),
}

// Raised by a single classifier port for one cycle. Never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("classifier is not loaded")]
    Unavailable,
    #[error("classifier failed: {0}")]
    Failure(String),
    #[error("classifier did not answer within {0:?}")]
    TimedOut(Duration),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("no frame available")]
    Unavailable,
}

#[derive(Error, Debug)]
pub enum GalleryLoadError {
    #[error("no reference descriptors found for '{0}'")]
    MissingReference(String),
    #[error("no face detected in the references for '{0}'")]
    Undetectable(String),
    #[error("failed to read references for '{label}': {source}")]
    Io {
        label: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse references for '{label}': {source}")]
    Parse {
        label: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GalleryLoadError {
    pub fn label(&self) -> &str {
        match self {
            GalleryLoadError::MissingReference(label) | GalleryLoadError::Undetectable(label) => {
                label
            }
            GalleryLoadError::Io { label, .. } | GalleryLoadError::Parse { label, .. } => label,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("The scheduler is already running.")]
    AlreadyRunning,
    #[error("The scheduler is not running.")]
    NotRunning,
    #[error("The cycle period must be greater than zero.")]
    InvalidPeriod,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
