use std::path::PathBuf;

use super::target::RenderError;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Frame {index} is out of range (frame count: {frame_count})")]
    OutOfRange { index: usize, frame_count: usize },

    #[error("Renderer unavailable: {0}")]
    RendererUnavailable(#[from] RenderError),

    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f32),

    #[error("Playback session is closed")]
    SessionClosed,

    #[error("Playback thread panicked")]
    WorkerPanicked,
}

#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported motion file: {0}")]
    UnsupportedFile(PathBuf),

    #[error("Not a NumPy array file")]
    NotNpy,

    #[error("Unsupported .npy format version {0}.{1}")]
    UnsupportedVersion(u8, u8),

    #[error("Malformed .npy header: {0}")]
    Header(String),

    #[error("Unsupported dtype {0:?}, expected '<f4' or '<f8'")]
    UnsupportedDtype(String),

    #[error("Fortran ordered arrays are not supported")]
    FortranOrder,

    #[error("Expected motion shaped (1, 22, 3, N) or (22, 3, N), got {0:?}")]
    Shape(Vec<usize>),

    #[error("Expected {expected} values, found {found}")]
    ValueCount { expected: usize, found: usize },

    #[error("Motion contains no frames")]
    Empty,
}
