use std::path::PathBuf;

use qrm::Engine;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QrmError>;

/// Application-level failures, one variant per way a command can go
/// wrong. Anything below this level arrives as [`qrm::Error`].
#[derive(Debug, Error)]
pub enum QrmError {
    #[error("could not open image: {path}")]
    InvalidImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("QR code not found or not recognized")]
    QrNotFound,

    #[error("camera error: {0}")]
    Camera(String),

    #[error("device profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("could not install browser engine '{engine}'")]
    Provision {
        engine: Engine,
        #[source]
        source: qrm::Error,
    },

    #[error("navigation to {url} failed")]
    Navigation {
        url: String,
        #[source]
        source: qrm::Error,
    },

    #[error("browser session failed: {0}")]
    Session(String),

    #[error("another operation is already running")]
    Busy,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Playwright(#[from] qrm::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
