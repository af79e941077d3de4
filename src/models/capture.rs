// Data structures for camera capture and hand detection

use std::path::PathBuf;

/// A captured camera frame
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub index: u64,
    pub timestamp: i64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Error types for capture sources and the recording loop
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Detection failed: {0}")]
    Detection(#[from] PoseError),

    #[error("Failed to persist sample: {0}")]
    Storage(#[from] crate::models::dataset::DatasetError),
}

pub type CaptureResult<T> = Result<T, CaptureError>;

/// Error types for hand landmark detectors
#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    #[error("Model loading failed: {0}")]
    ModelLoadFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Malformed detector output at {}:{line}: {reason}", path.display())]
    MalformedOutput {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

pub type PoseResult<T> = Result<T, PoseError>;
