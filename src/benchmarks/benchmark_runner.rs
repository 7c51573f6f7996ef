//! Core benchmark execution logic.

use log::{error, info, warn};
use std::fs;

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use super::benchmark_types::{KernelsConfig, LipsyncGraphConfig, PerformanceResults};
use super::performance_metrics::{
    benchmark_method, print_frame_budget, print_performance_analysis, verify_outputs_match,
};
use super::synthetic::{
    build_kernel_layers, build_lipsync_graph, create_frame_inputs, synthetic_values,
};
use crate::backend::{Backend, KernelSet};
use crate::layers::Layer;
use crate::model::LipsyncModel;
use crate::parallel_predict::PredictConfig;

/// Configuration loader that handles JSON files with fallbacks
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a configuration file with fallback to defaults
    pub fn load_config<T>(path: &str, config_name: &str) -> BenchmarkResult<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match fs::read_to_string(path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| BenchmarkError::ConfigParseError {
                    path: path.to_string(),
                    source: e,
                })
            }
            Err(_) => {
                warn!(
                    "Config file '{}' not found, using default configuration for {}",
                    path, config_name
                );
                Ok(T::default())
            }
        }
    }

    pub fn load_kernels_config() -> BenchmarkResult<KernelsConfig> {
        Self::load_config("configs/kernels.json", "kernels")
    }

    pub fn load_lipsync_graph_config() -> BenchmarkResult<LipsyncGraphConfig> {
        Self::load_config("configs/lipsync_graph.json", "lipsync_graph")
    }
}

/// Main benchmark runner
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    /// Run all available benchmarks
    pub fn run_all_benchmarks() -> BenchmarkResult<()> {
        info!("Starting benchmark suite on backends {:?}", Backend::supported());

        let mut errors = Vec::new();

        if let Err(e) = Self::run_kernels_benchmark() {
            error!("Kernels benchmark failed: {}", e);
            errors.push(e);
        }

        if let Err(e) = Self::run_lipsync_graph_benchmark() {
            error!("Lip-sync graph benchmark failed: {}", e);
            errors.push(e);
        }

        if errors.is_empty() {
            info!("All benchmarks completed successfully");
            Ok(())
        } else {
            Err(BenchmarkError::BenchmarkExecutionError {
                benchmark_name: "all".to_string(),
                message: format!("Some benchmarks failed: {} errors", errors.len()),
            })
        }
    }

    /// Run a specific benchmark by name
    pub fn run_benchmark(benchmark_name: &str) -> BenchmarkResult<()> {
        match benchmark_name {
            "kernels" => Self::run_kernels_benchmark(),
            "lipsync_graph" => Self::run_lipsync_graph_benchmark(),
            _ => Err(BenchmarkError::UnknownBenchmark {
                name: benchmark_name.to_string(),
            }),
        }
    }

    /// List available benchmarks
    pub fn list_benchmarks() {
        println!("Available benchmarks:");
        println!("  kernels       - Every kernel family on every supported backend");
        println!("  lipsync_graph - Representative lip-sync network, single frame and parallel");
    }

    /// Times each kernel variant on every supported backend after checking
    /// the backend reproduces the scalar output.
    fn run_kernels_benchmark() -> BenchmarkResult<()> {
        let config = ConfigLoader::load_kernels_config()?;
        config.validate()?;

        info!("{}", "=".repeat(80));
        info!("Kernel Performance Benchmark ({} executions)", config.num_executions);
        info!("{}", "=".repeat(80));

        for (label, layer) in build_kernel_layers(&config)? {
            let input = synthetic_values(layer.input_len(), 0.25, 1.0);
            let mut scratch = vec![0.0f32; layer.scratch_len()];

            let mut reference = vec![0.0f32; layer.output_len()];
            layer.forward(KernelSet::scalar(), &input, &mut reference, &mut scratch)?;

            let mut results = Vec::new();
            for backend in Backend::supported() {
                let kernels = KernelSet::new(backend)?;
                let mut output = vec![0.0f32; layer.output_len()];
                layer.forward(kernels, &input, &mut output, &mut scratch)?;
                if !verify_outputs_match(&reference, &output) {
                    return Err(BenchmarkError::OutputMismatch {
                        benchmark_name: label,
                        backend,
                    });
                }

                results.push(time_layer(&*layer, kernels, &input, config.num_executions)?);
            }

            print_performance_analysis(&label, &results);
        }

        Ok(())
    }

    /// Times one frame of the lip-sync graph per backend against the frame
    /// budget, then a parallel pass over many frames on the detected backend.
    fn run_lipsync_graph_benchmark() -> BenchmarkResult<()> {
        let config = ConfigLoader::load_lipsync_graph_config()?;
        config.validate()?;

        info!("{}", "=".repeat(80));
        info!("Lip-sync Graph Benchmark");
        info!(
            "Features: {} channels x {} samples -> {} hidden channels -> {} visemes",
            config.feature_channels, config.feature_len, config.hidden_channels, config.visemes
        );
        info!("{}", "=".repeat(80));

        let (info, parameters) = build_lipsync_graph(&config)?;
        let reference_model =
            LipsyncModel::from_info_with_kernels(&info, &parameters, KernelSet::scalar())?;
        let frame = create_frame_inputs(reference_model.get_feature_size(), 1);
        let reference = reference_model.predict(&frame)?;

        let mut results = Vec::new();
        for backend in Backend::supported() {
            let model =
                LipsyncModel::from_info_with_kernels(&info, &parameters, KernelSet::new(backend)?)?;
            if !verify_outputs_match(&reference, &model.predict(&frame)?) {
                return Err(BenchmarkError::OutputMismatch {
                    benchmark_name: config.name.clone(),
                    backend,
                });
            }

            let mut buffer = vec![0.0f32; model.required_memory()];
            buffer[..frame.len()].copy_from_slice(&frame);
            let mut failure = None;
            let result = benchmark_method(backend.name(), config.num_executions, || {
                if let Err(e) = model.predict_with_buffer(&mut buffer) {
                    failure = Some(e);
                }
            });
            if let Some(e) = failure {
                return Err(e.into());
            }
            results.push(result);
        }

        print_performance_analysis("Single frame", &results);
        print_frame_budget(&results, config.frame_budget_ms);

        let model = LipsyncModel::from_info_with_kernels(&info, &parameters, KernelSet::detect())?;
        let frames = create_frame_inputs(model.get_feature_size(), config.num_frames);
        let mut predict_config = PredictConfig::new();
        if let Some(threads) = config.threads {
            predict_config = predict_config.with_threads(threads);
        }

        let mut output = None;
        let parallel = benchmark_method("parallel", 1, || {
            output = Some(model.predict_parallel(&frames, &predict_config));
        });
        if let Some(result) = output {
            let output = result?;
            println!(
                "\nParallel: {} frames on {} threads in {:.3} ms ({:.4} ms per frame)",
                output.num_frames(),
                predict_config.get_threads(),
                parallel.average_time_ms,
                parallel.average_time_ms / output.num_frames().max(1) as f64
            );
        }

        println!("\n{}", "=".repeat(80));
        println!("Benchmark Complete");
        println!("{}", "=".repeat(80));

        Ok(())
    }
}

fn time_layer(
    layer: &dyn Layer,
    kernels: KernelSet,
    input: &[f32],
    num_executions: u32,
) -> BenchmarkResult<PerformanceResults> {
    let mut output = vec![0.0f32; layer.output_len()];
    let mut scratch = vec![0.0f32; layer.scratch_len()];
    let mut failure = None;
    let result = benchmark_method(kernels.backend().name(), num_executions, || {
        if let Err(e) = layer.forward(kernels, input, &mut output, &mut scratch) {
            failure = Some(e);
        }
    });
    match failure {
        Some(e) => Err(e.into()),
        None => Ok(result),
    }
}
