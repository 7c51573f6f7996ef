//! Activation and normalization primitives shared by every kernel.
//!
//! These are scalar, elementwise functions. All backends apply them in the
//! kernel epilogues, so the numeric definition here is the single source of
//! truth for every instruction-set family.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Variance epsilon used by the batch-norm fold.
pub const BATCH_NORM_EPSILON: f32 = 0.00001;

/// Logistic sigmoid: `1 / (1 + e^-x)`.
#[inline(always)]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Leaky ReLU: `max(0, x) + gamma * min(0, x)`.
#[inline(always)]
pub fn leaky_relu(x: f32, gamma: f32) -> f32 {
    x.max(0.0) + gamma * x.min(0.0)
}

/// Hard-swish: `x * clamp(x + 3, 0, 6) / 6`.
#[inline(always)]
pub fn hard_swish(x: f32) -> f32 {
    x * (x + 3.0).clamp(0.0, 6.0) / 6.0
}

/// Batch-norm affine transform: `gamma * (x - mean) / sqrt(var + eps) + beta`.
#[inline(always)]
pub fn batch_norm(x: f32, mean: f32, gamma: f32, var: f32, beta: f32) -> f32 {
    gamma * (x - mean) / (var + BATCH_NORM_EPSILON).sqrt() + beta
}

/// Activation applied by a layer after its bias (and skip) add.
/// Note: `None` leaves the raw affine output untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Activation {
    /// Identity.
    #[default]
    None,
    /// Plain hard-swish.
    HardSwish,
    /// Batch-norm fold followed by hard-swish. Requires the layer's parameter
    /// bundle to carry batch-norm statistics.
    BatchNormHardSwish,
}

impl Activation {
    /// Get activation by string name.
    pub fn get_by_name(type_name: &str) -> Option<Self> {
        let map: HashMap<&str, Activation> = [
            ("NONE", Activation::None),
            ("HARD_SWISH", Activation::HardSwish),
            ("BATCH_NORM_HARD_SWISH", Activation::BatchNormHardSwish),
        ]
        .iter()
        .cloned()
        .collect();

        map.get(type_name).copied()
    }
}
