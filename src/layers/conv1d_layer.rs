//! 1-D convolution layer.

use crate::activation::Activation;
use crate::backend::KernelSet;
use crate::errors::KernelResult;
use crate::kernels::Conv1dArgs;
use crate::layers::{Layer, check_buffers, resolve_epilogue};
use crate::params::ParameterBundle;
use crate::shapes::Conv1dShape;

const NAME: &str = "conv1d";

/// `output[j][m] = activation(bias[j] + Σ_k Σ_t input[k][m·stride + t]·weight[j][k][t])`.
///
/// Reads the padded input layout described by [`Conv1dShape`]. Batch-norm
/// statistics, when used, are indexed by output position, so they must hold
/// exactly `output_len` values.
#[derive(Debug, Clone)]
pub struct Conv1dLayer {
    shape: Conv1dShape,
    output_len: usize,
    params: ParameterBundle,
    activation: Activation,
}

impl Conv1dLayer {
    pub fn new(
        shape: Conv1dShape,
        params: ParameterBundle,
        activation: Activation,
    ) -> KernelResult<Self> {
        let output_len = shape.validate(NAME)?;
        params.check_len(NAME, shape.weights_len(), shape.o_ch)?;
        resolve_epilogue(NAME, activation, &params, output_len)?;

        Ok(Self {
            shape,
            output_len,
            params,
            activation,
        })
    }

    pub fn shape(&self) -> Conv1dShape {
        self.shape
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Output samples per channel.
    pub fn output_positions(&self) -> usize {
        self.output_len
    }
}

impl Layer for Conv1dLayer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn input_len(&self) -> usize {
        self.shape.input_len()
    }

    fn output_len(&self) -> usize {
        self.shape.o_ch * self.output_len
    }

    fn forward(
        &self,
        kernels: KernelSet,
        input: &[f32],
        output: &mut [f32],
        scratch: &mut [f32],
    ) -> KernelResult<()> {
        check_buffers(self, input, output, scratch)?;
        kernels.conv1d(Conv1dArgs {
            shape: self.shape,
            output_len: self.output_len,
            weights: self.params.weights(),
            bias: self.params.bias(),
            epilogue: resolve_epilogue(NAME, self.activation, &self.params, self.output_len)?,
            input,
            output,
        });
        Ok(())
    }
}
