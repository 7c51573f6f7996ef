//! Error types for benchmark operations.

use std::error::Error;
use std::fmt;

use crate::backend::Backend;
use crate::errors::{KernelError, ModelError, ParallelPredictError};

#[derive(Debug)]
pub enum BenchmarkError {
    ConfigParseError {
        path: String,
        source: serde_json::Error,
    },
    ConfigValidationError {
        field: String,
        message: String,
    },
    InvalidNumExecutions {
        value: u32,
    },
    UnknownBenchmark {
        name: String,
    },
    Kernel {
        source: KernelError,
    },
    Model {
        source: ModelError,
    },
    ParallelPredict {
        source: ParallelPredictError,
    },
    OutputMismatch {
        benchmark_name: String,
        backend: Backend,
    },
    BenchmarkExecutionError {
        benchmark_name: String,
        message: String,
    },
}

impl fmt::Display for BenchmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchmarkError::ConfigParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse configuration file '{}': {}",
                    path, source
                )
            }
            BenchmarkError::ConfigValidationError { field, message } => {
                write!(
                    f,
                    "Configuration validation error for field '{}': {}",
                    field, message
                )
            }
            BenchmarkError::InvalidNumExecutions { value } => {
                write!(
                    f,
                    "Invalid number of executions: {}. Must be greater than 0",
                    value
                )
            }
            BenchmarkError::UnknownBenchmark { name } => {
                write!(f, "Unknown benchmark name: '{}'", name)
            }
            BenchmarkError::Kernel { source } => write!(f, "Layer error: {}", source),
            BenchmarkError::Model { source } => write!(f, "Model error: {}", source),
            BenchmarkError::ParallelPredict { source } => {
                write!(f, "Parallel prediction error: {}", source)
            }
            BenchmarkError::OutputMismatch {
                benchmark_name,
                backend,
            } => {
                write!(
                    f,
                    "Benchmark '{}': {} backend output does not match the scalar reference",
                    benchmark_name,
                    backend.name()
                )
            }
            BenchmarkError::BenchmarkExecutionError {
                benchmark_name,
                message,
            } => {
                write!(
                    f,
                    "Benchmark '{}' execution error: {}",
                    benchmark_name, message
                )
            }
        }
    }
}

impl Error for BenchmarkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BenchmarkError::ConfigParseError { source, .. } => Some(source),
            BenchmarkError::Kernel { source } => Some(source),
            BenchmarkError::Model { source } => Some(source),
            BenchmarkError::ParallelPredict { source } => Some(source),
            _ => None,
        }
    }
}

impl From<KernelError> for BenchmarkError {
    fn from(error: KernelError) -> Self {
        BenchmarkError::Kernel { source: error }
    }
}

impl From<ModelError> for BenchmarkError {
    fn from(error: ModelError) -> Self {
        BenchmarkError::Model { source: error }
    }
}

impl From<ParallelPredictError> for BenchmarkError {
    fn from(error: ParallelPredictError) -> Self {
        BenchmarkError::ParallelPredict { source: error }
    }
}

pub type BenchmarkResult<T> = Result<T, BenchmarkError>;
