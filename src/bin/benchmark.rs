//! Benchmark CLI: times the kernels and the lip-sync graph on every backend.

use lipsync_inference::Backend;
use lipsync_inference::benchmarks::{BenchmarkResult, BenchmarkRunner};
use log::{error, info};
use std::env;

fn main() {
    env_logger::init();

    if let Err(e) = run_benchmarks() {
        error!("Benchmark execution failed: {}", e);
        std::process::exit(1);
    }
}

fn run_benchmarks() -> BenchmarkResult<()> {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => BenchmarkRunner::run_all_benchmarks(),
        2 => match args[1].as_str() {
            "--list" => {
                BenchmarkRunner::list_benchmarks();
                Ok(())
            }
            "--backends" => {
                for backend in Backend::supported() {
                    println!("{} ({} lanes)", backend.name(), backend.lane_width());
                }
                info!("Detected backend: {}", Backend::detect().name());
                Ok(())
            }
            benchmark_name => BenchmarkRunner::run_benchmark(benchmark_name),
        },
        3 if args[1] == "--benchmark" => BenchmarkRunner::run_benchmark(&args[2]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("Usage:");
    println!("  cargo run --bin benchmark --release                    # Run all benchmarks");
    println!("  cargo run --bin benchmark --release -- --list         # List available benchmarks");
    println!("  cargo run --bin benchmark --release -- --backends     # List supported backends");
    println!("  cargo run --bin benchmark --release -- <benchmark>    # Run specific benchmark");
    println!("  cargo run --bin benchmark --release -- --benchmark <benchmark>");
    println!();
    println!("Available benchmarks:");
    println!("  kernels       - Every kernel family on every supported backend");
    println!("  lipsync_graph - Representative lip-sync network, single frame and parallel");
}
