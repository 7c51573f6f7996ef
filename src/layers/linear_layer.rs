//! Fully-connected layer with optional skip connection and fused epilogue.

use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::backend::KernelSet;
use crate::errors::{KernelError, KernelResult};
use crate::kernels::LinearArgs;
use crate::layers::{Layer, check_buffers, resolve_epilogue};
use crate::params::ParameterBundle;
use crate::shapes::LinearShape;

const NAME: &str = "linear";

/// Memory layout of a linear layer's input and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinearLayout {
    /// Input `(n_ch, in_nodes)`, output `(n_ch, o_nodes)`.
    #[default]
    RowMajor,
    /// Input `(in_nodes, n_ch)`, output `(o_nodes, n_ch)`.
    Transposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinearOptions {
    #[serde(default)]
    pub layout: LinearLayout,
    /// Adds the input back onto the output. Requires `in_nodes == o_nodes`.
    #[serde(default)]
    pub skip_connection: bool,
    #[serde(default)]
    pub activation: Activation,
}

/// `output[i][j] = epilogue(bias[j] + W[j]·input[i] (+ input[i][j]))`.
///
/// Batch-norm statistics, when used, are indexed by output node.
#[derive(Debug, Clone)]
pub struct LinearLayer {
    shape: LinearShape,
    params: ParameterBundle,
    options: LinearOptions,
}

impl LinearLayer {
    pub fn new(
        shape: LinearShape,
        params: ParameterBundle,
        options: LinearOptions,
    ) -> KernelResult<Self> {
        shape.validate(NAME)?;
        if options.skip_connection && shape.in_nodes != shape.o_nodes {
            return Err(KernelError::SkipShapeMismatch {
                in_nodes: shape.in_nodes,
                o_nodes: shape.o_nodes,
            });
        }
        params.check_len(NAME, shape.weights_len(), shape.o_nodes)?;
        resolve_epilogue(NAME, options.activation, &params, shape.o_nodes)?;

        Ok(Self {
            shape,
            params,
            options,
        })
    }

    /// Row-major residual block: `W·x + b + x`.
    pub fn with_skip(shape: LinearShape, params: ParameterBundle) -> KernelResult<Self> {
        Self::new(
            shape,
            params,
            LinearOptions {
                skip_connection: true,
                ..LinearOptions::default()
            },
        )
    }

    /// The laughter branch projection: row-major, no skip, batch-norm then
    /// hard-swish on every output node.
    pub fn laughter_head(shape: LinearShape, params: ParameterBundle) -> KernelResult<Self> {
        Self::new(
            shape,
            params,
            LinearOptions {
                activation: Activation::BatchNormHardSwish,
                ..LinearOptions::default()
            },
        )
    }

    pub fn shape(&self) -> LinearShape {
        self.shape
    }

    pub fn options(&self) -> LinearOptions {
        self.options
    }
}

impl Layer for LinearLayer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn input_len(&self) -> usize {
        self.shape.input_len()
    }

    fn output_len(&self) -> usize {
        self.shape.output_len()
    }

    fn forward(
        &self,
        kernels: KernelSet,
        input: &[f32],
        output: &mut [f32],
        scratch: &mut [f32],
    ) -> KernelResult<()> {
        check_buffers(self, input, output, scratch)?;
        let args = LinearArgs {
            shape: self.shape,
            weights: self.params.weights(),
            bias: self.params.bias(),
            skip: self.options.skip_connection,
            epilogue: resolve_epilogue(
                NAME,
                self.options.activation,
                &self.params,
                self.shape.o_nodes,
            )?,
            input,
            output,
        };
        match self.options.layout {
            LinearLayout::RowMajor => kernels.linear_row_major(args),
            LinearLayout::Transposed => kernels.linear_transposed(args),
        }
        Ok(())
    }
}
