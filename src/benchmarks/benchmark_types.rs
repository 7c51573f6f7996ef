//! Benchmark type definitions and configuration structures.

use serde::{Deserialize, Serialize};

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use crate::shapes::{Conv1dShape, KernelSize, LinearShape, PoolShape};

/// Configuration for the per-kernel benchmark: every kernel family timed on
/// every supported backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelsConfig {
    pub name: String,
    pub description: String,
    pub linear: LinearShape,
    pub conv1d: Vec<Conv1dShape>,
    pub avg_pool: PoolShape,
    pub softmax: LinearShape,
    pub num_executions: u32,
}

impl Default for KernelsConfig {
    fn default() -> Self {
        let conv = |kernel_size, stride, padding_size| Conv1dShape {
            in_ch: 64,
            o_ch: 64,
            in_phi: 32,
            kernel_size,
            stride,
            padding_size,
        };
        Self {
            name: "kernels".to_string(),
            description: "Per-kernel timing across instruction-set backends".to_string(),
            linear: LinearShape::new(256, 256, 8),
            conv1d: vec![
                conv(KernelSize::One, 1, 0),
                conv(KernelSize::Three, 1, 1),
                conv(KernelSize::Five, 2, 2),
            ],
            avg_pool: PoolShape::new(64, 64, 2, 2, 0),
            softmax: LinearShape::new(256, 14, 4),
            num_executions: 1000,
        }
    }
}

impl KernelsConfig {
    pub fn validate(&self) -> BenchmarkResult<()> {
        if self.num_executions == 0 {
            return Err(BenchmarkError::InvalidNumExecutions {
                value: self.num_executions,
            });
        }
        if self.conv1d.is_empty() {
            return Err(BenchmarkError::ConfigValidationError {
                field: "conv1d".to_string(),
                message: "At least one conv1d shape is required".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration for the end-to-end benchmark of a representative lip-sync
/// graph: conv1d stack, pooling, residual linear block and viseme softmax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LipsyncGraphConfig {
    pub name: String,
    pub description: String,
    pub feature_channels: usize,
    pub feature_len: usize,
    pub hidden_channels: usize,
    pub visemes: usize,
    pub num_executions: u32,
    /// Frames predicted by the parallel pass.
    pub num_frames: usize,
    #[serde(default)]
    pub threads: Option<usize>,
    /// Per-frame latency budget in milliseconds.
    pub frame_budget_ms: f64,
}

impl Default for LipsyncGraphConfig {
    fn default() -> Self {
        Self {
            name: "lipsync_graph".to_string(),
            description: "Representative lip-sync network on one feature frame".to_string(),
            feature_channels: 26,
            feature_len: 16,
            hidden_channels: 64,
            visemes: 14,
            num_executions: 2000,
            num_frames: 512,
            threads: None,
            frame_budget_ms: 10.0,
        }
    }
}

impl LipsyncGraphConfig {
    pub fn validate(&self) -> BenchmarkResult<()> {
        if self.num_executions == 0 {
            return Err(BenchmarkError::InvalidNumExecutions {
                value: self.num_executions,
            });
        }

        for (field, value) in [
            ("feature_channels", self.feature_channels),
            ("feature_len", self.feature_len),
            ("hidden_channels", self.hidden_channels),
            ("visemes", self.visemes),
        ] {
            if value == 0 {
                return Err(BenchmarkError::ConfigValidationError {
                    field: field.to_string(),
                    message: "Must be greater than 0".to_string(),
                });
            }
        }

        // Strided conv then pooling by two must leave at least one sample
        if self.feature_len < 3 {
            return Err(BenchmarkError::ConfigValidationError {
                field: "feature_len".to_string(),
                message: "Must be at least 3".to_string(),
            });
        }

        if self.frame_budget_ms <= 0.0 {
            return Err(BenchmarkError::ConfigValidationError {
                field: "frame_budget_ms".to_string(),
                message: "Must be positive".to_string(),
            });
        }

        Ok(())
    }
}

/// Enum representing all available benchmark types
#[derive(Debug, Clone)]
pub enum BenchmarkConfig {
    Kernels(KernelsConfig),
    LipsyncGraph(LipsyncGraphConfig),
}

impl BenchmarkConfig {
    pub fn name(&self) -> &str {
        match self {
            BenchmarkConfig::Kernels(config) => &config.name,
            BenchmarkConfig::LipsyncGraph(config) => &config.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            BenchmarkConfig::Kernels(config) => &config.description,
            BenchmarkConfig::LipsyncGraph(config) => &config.description,
        }
    }

    pub fn num_executions(&self) -> u32 {
        match self {
            BenchmarkConfig::Kernels(config) => config.num_executions,
            BenchmarkConfig::LipsyncGraph(config) => config.num_executions,
        }
    }

    pub fn validate(&self) -> BenchmarkResult<()> {
        match self {
            BenchmarkConfig::Kernels(config) => config.validate(),
            BenchmarkConfig::LipsyncGraph(config) => config.validate(),
        }
    }
}

/// Performance measurement structure
#[derive(Debug, Clone)]
pub struct PerformanceResults {
    pub method: String,
    pub total_time_ns: u128,
    pub average_time_ns: u128,
    pub average_time_ms: f64,
    pub num_executions: u32,
}

impl PerformanceResults {
    pub fn new(method: String, total_time_ns: u128, num_executions: u32) -> Self {
        let average_time_ns = total_time_ns / num_executions.max(1) as u128;
        let average_time_ms = average_time_ns as f64 / 1_000_000.0;

        Self {
            method,
            total_time_ns,
            average_time_ns,
            average_time_ms,
            num_executions,
        }
    }

    /// How many times faster than `baseline` this result ran.
    pub fn speedup_over(&self, baseline: &PerformanceResults) -> f64 {
        baseline.average_time_ns as f64 / self.average_time_ns.max(1) as f64
    }

    /// Share of a per-frame budget one execution consumes, in percent.
    pub fn budget_percentage(&self, frame_budget_ms: f64) -> f64 {
        self.average_time_ms / frame_budget_ms * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs_are_valid() {
        assert!(KernelsConfig::default().validate().is_ok());
        assert!(LipsyncGraphConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_executions_rejected() {
        let config = LipsyncGraphConfig {
            num_executions: 0,
            ..LipsyncGraphConfig::default()
        };
        assert!(matches!(
            BenchmarkConfig::LipsyncGraph(config).validate(),
            Err(BenchmarkError::InvalidNumExecutions { value: 0 })
        ));
    }

    #[test]
    fn test_speedup_and_budget() {
        let scalar = PerformanceResults::new("scalar".to_string(), 8_000_000, 4);
        let avx = PerformanceResults::new("avx".to_string(), 2_000_000, 4);
        assert_eq!(avx.speedup_over(&scalar), 4.0);
        // 0.5 ms of a 10 ms budget
        assert!((avx.budget_percentage(10.0) - 5.0).abs() < 1e-9);
    }
}
