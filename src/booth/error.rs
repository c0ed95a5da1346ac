//! Capture pipeline errors

use thiserror::Error;

/// Errors raised while capturing, compositing or uploading a session
#[derive(Error, Debug)]
pub enum BoothError {
    #[error("Camera failed: {0}")]
    CameraUnavailable(String),
    #[error("Camera not ready yet")]
    FrameUnavailable,
    #[error("All {total} shots already captured")]
    ShotLimit { total: usize },
    #[error("Collage needs {total} shots, only {captured} captured")]
    CaptureIncomplete { captured: usize, total: usize },
    #[error("Invalid template index: {0}")]
    InvalidTemplate(usize),
    #[error("Failed to load asset {path}: {reason}")]
    Asset { path: String, reason: String },
    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Upload request failed: {0}")]
    Upload(#[from] reqwest::Error),
    #[error("Failed to save photos on server ({status}): {body}")]
    UploadRejected { status: u16, body: String },
    #[error("Action not available on the {0:?} screen")]
    WrongScreen(super::Screen),
}

pub type Result<T> = std::result::Result<T, BoothError>;
