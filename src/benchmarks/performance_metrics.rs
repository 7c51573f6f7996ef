//! Performance measurement utilities for benchmarks.

use log::{info, warn};
use std::time::Instant;

use super::benchmark_types::PerformanceResults;

/// Relative tolerance between a vectorized backend and the scalar reference.
pub const BACKEND_TOLERANCE: f32 = 1e-4;

/// Benchmark execution function that measures performance
pub fn benchmark_method<F>(
    name: &str,
    num_executions: u32,
    mut benchmark_fn: F,
) -> PerformanceResults
where
    F: FnMut(),
{
    info!("Benchmarking {} ({} executions)...", name, num_executions);

    for _ in 0..5 {
        benchmark_fn();
    }

    let progress_step = (num_executions / 10).max(1);
    let start = Instant::now();
    for i in 0..num_executions {
        benchmark_fn();
        if (i + 1) % progress_step == 0 {
            info!("  Progress: {}/{}", i + 1, num_executions);
        }
    }
    let duration = start.elapsed();

    PerformanceResults::new(name.to_string(), duration.as_nanos(), num_executions)
}

/// Prints per-backend timings, with speedups relative to the first result
/// (the scalar reference).
pub fn print_performance_analysis(title: &str, results: &[PerformanceResults]) {
    let Some(baseline) = results.first() else {
        return;
    };

    println!("\n{}", "=".repeat(80));
    println!("{}", title);
    println!("{}", "=".repeat(80));

    for result in results {
        println!(
            "   {:<12} {:>10.4} ms ({} ns)  {:>6.2}x",
            result.method,
            result.average_time_ms,
            result.average_time_ns,
            result.speedup_over(baseline)
        );
    }
}

/// Prints how much of the per-frame latency budget each result consumes.
pub fn print_frame_budget(results: &[PerformanceResults], frame_budget_ms: f64) {
    println!("\nFrame budget ({:.2} ms):", frame_budget_ms);
    for result in results {
        let share = result.budget_percentage(frame_budget_ms);
        println!("   {:<12} {:>7.2}% of budget", result.method, share);
        if share > 100.0 {
            warn!(
                "{} backend exceeds the frame budget: {:.4} ms > {:.2} ms",
                result.method, result.average_time_ms, frame_budget_ms
            );
        }
    }
}

/// Checks two outputs agree within [`BACKEND_TOLERANCE`] relative to the
/// reference magnitude (at least 1).
pub fn verify_outputs_match(reference: &[f32], candidate: &[f32]) -> bool {
    if reference.len() != candidate.len() {
        return false;
    }
    for (index, (expected, computed)) in reference.iter().zip(candidate).enumerate() {
        let diff = (expected - computed).abs();
        if diff.is_nan() || diff > BACKEND_TOLERANCE * expected.abs().max(1.0) {
            warn!(
                "Output mismatch at {}: reference={}, candidate={}, diff={}",
                index, expected, computed, diff
            );
            return false;
        }
    }
    true
}
