//! Read-only parameter bundles shared by every frame and every backend.

use std::sync::Arc;

use crate::activation;
use crate::errors::{KernelError, KernelResult};

/// Per-index batch-norm statistics.
///
/// Linear layers index these by output node, the pointwise conv1d layer by
/// output position.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchNorm {
    mean: Arc<[f32]>,
    gamma: Arc<[f32]>,
    var: Arc<[f32]>,
    beta: Arc<[f32]>,
}

impl BatchNorm {
    pub fn new(
        mean: Vec<f32>,
        gamma: Vec<f32>,
        var: Vec<f32>,
        beta: Vec<f32>,
    ) -> KernelResult<Self> {
        let len = mean.len();
        for (parameter, values) in [("gamma", &gamma), ("var", &var), ("beta", &beta)] {
            if values.len() != len {
                return Err(KernelError::ParameterSizeMismatch {
                    layer: "batch_norm",
                    parameter,
                    expected: len,
                    actual: values.len(),
                });
            }
        }
        Ok(Self {
            mean: mean.into(),
            gamma: gamma.into(),
            var: var.into(),
            beta: beta.into(),
        })
    }

    /// Statistics that leave values unchanged up to the variance epsilon.
    pub fn identity(len: usize) -> Self {
        Self {
            mean: vec![0.0; len].into(),
            gamma: vec![1.0; len].into(),
            var: vec![1.0 - activation::BATCH_NORM_EPSILON; len].into(),
            beta: vec![0.0; len].into(),
        }
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    #[inline(always)]
    pub fn apply(&self, index: usize, value: f32) -> f32 {
        activation::batch_norm(
            value,
            self.mean[index],
            self.gamma[index],
            self.var[index],
            self.beta[index],
        )
    }
}

/// Weights, bias and optional batch-norm statistics of one layer invocation.
///
/// Cloning is cheap: all arrays are reference counted and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBundle {
    weights: Arc<[f32]>,
    bias: Arc<[f32]>,
    batch_norm: Option<BatchNorm>,
}

impl ParameterBundle {
    pub fn new(weights: Vec<f32>, bias: Vec<f32>) -> Self {
        Self {
            weights: weights.into(),
            bias: bias.into(),
            batch_norm: None,
        }
    }

    /// A bundle for layers without learned parameters (pooling).
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn with_batch_norm(mut self, batch_norm: BatchNorm) -> Self {
        self.batch_norm = Some(batch_norm);
        self
    }

    /// Builds a bundle from the positional layout
    /// `[weights, bias]` or `[weights, bias, mean, gamma, var, beta]`.
    pub fn from_arrays(arrays: Vec<Vec<f32>>) -> KernelResult<Self> {
        let count = arrays.len();
        let mut arrays = arrays.into_iter();
        match (count, arrays.next(), arrays.next()) {
            (2, Some(weights), Some(bias)) => Ok(Self::new(weights, bias)),
            (6, Some(weights), Some(bias)) => {
                let mut stats = arrays;
                let (Some(mean), Some(gamma), Some(var), Some(beta)) =
                    (stats.next(), stats.next(), stats.next(), stats.next())
                else {
                    return Err(KernelError::ParameterCountMismatch {
                        expected: "2 or 6".to_string(),
                        actual: count,
                    });
                };
                let batch_norm = BatchNorm::new(mean, gamma, var, beta)?;
                Ok(Self::new(weights, bias).with_batch_norm(batch_norm))
            }
            _ => Err(KernelError::ParameterCountMismatch {
                expected: "2 or 6".to_string(),
                actual: count,
            }),
        }
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn bias(&self) -> &[f32] {
        &self.bias
    }

    pub fn batch_norm(&self) -> Option<&BatchNorm> {
        self.batch_norm.as_ref()
    }

    pub(crate) fn check_len(
        &self,
        layer: &'static str,
        weights_len: usize,
        bias_len: usize,
    ) -> KernelResult<()> {
        if self.weights.len() != weights_len {
            return Err(KernelError::ParameterSizeMismatch {
                layer,
                parameter: "weights",
                expected: weights_len,
                actual: self.weights.len(),
            });
        }
        if self.bias.len() != bias_len {
            return Err(KernelError::ParameterSizeMismatch {
                layer,
                parameter: "bias",
                expected: bias_len,
                actual: self.bias.len(),
            });
        }
        Ok(())
    }

    /// Returns the batch-norm statistics after checking they cover `len` indices.
    pub(crate) fn require_batch_norm(
        &self,
        layer: &'static str,
        len: usize,
    ) -> KernelResult<&BatchNorm> {
        let batch_norm = self
            .batch_norm
            .as_ref()
            .ok_or(KernelError::MissingBatchNorm { layer })?;
        if batch_norm.len() != len {
            return Err(KernelError::ParameterSizeMismatch {
                layer,
                parameter: "batch_norm",
                expected: len,
                actual: batch_norm.len(),
            });
        }
        Ok(batch_norm)
    }
}
