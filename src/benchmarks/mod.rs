//! Benchmark suite for the lip-sync kernels.
//!
//! Times every kernel family and a representative lip-sync graph on each
//! backend the CPU supports, after checking each backend reproduces the
//! scalar reference output.

pub mod benchmark_errors;
pub mod benchmark_runner;
pub mod benchmark_types;
pub mod performance_metrics;
pub mod synthetic;

pub use benchmark_errors::{BenchmarkError, BenchmarkResult};
pub use benchmark_runner::{BenchmarkRunner, ConfigLoader};
pub use benchmark_types::{
    BenchmarkConfig, KernelsConfig, LipsyncGraphConfig, PerformanceResults,
};
pub use synthetic::{
    build_kernel_layers, build_lipsync_graph, create_frame_inputs, synthetic_values,
};
