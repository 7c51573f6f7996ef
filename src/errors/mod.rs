//! Error types for the lip-sync inference library.
//!
//! This module contains specific error types used throughout the library,
//! avoiding generic error wrappers like `anyhow` or `Box<dyn Error>` for better
//! error handling and debugging.

mod kernel_error;
mod model_error;
mod parallel_predict_error;

pub use kernel_error::KernelError;
pub use model_error::ModelError;
pub use parallel_predict_error::{ParallelPredictError, ParallelPredictResult};

/// Result type alias for layer construction and kernel invocation.
pub type KernelResult<T> = std::result::Result<T, KernelError>;

/// Result type alias for model assembly and prediction.
pub type ModelResult<T> = std::result::Result<T, ModelError>;
