//! Error types for batch prediction over many frames.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParallelPredictError {
    #[error(
        "Input buffer size mismatch: expected {expected} f32 values ({num_frames} frames * {feature_size} features), got {actual}"
    )]
    InputBufferSizeMismatch {
        expected: usize,
        actual: usize,
        num_frames: usize,
        feature_size: usize,
    },

    #[error("Thread count must be at least 1, got {count}")]
    InvalidThreadCount { count: usize },

    #[error("Frame index {index} is out of bounds for {num_frames} frames")]
    FrameIndexOutOfBounds { index: usize, num_frames: usize },

    #[error("Model prediction failed for frame {frame_index}: {message}")]
    PredictionFailed { frame_index: usize, message: String },

    #[error("Destination buffer size mismatch: expected {expected} f32 values, got {actual}")]
    DestinationBufferSizeMismatch { expected: usize, actual: usize },

    #[error("Thread panicked during parallel execution")]
    ThreadPanicked,
}

pub type ParallelPredictResult<T> = std::result::Result<T, ParallelPredictError>;
