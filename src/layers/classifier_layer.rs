//! Softmax classifier layer.

use serde::{Deserialize, Serialize};

use crate::backend::KernelSet;
use crate::errors::KernelResult;
use crate::kernels::{SoftmaxArgs, SoftmaxNumerics};
use crate::layers::{Layer, check_buffers};
use crate::params::ParameterBundle;
use crate::shapes::LinearShape;

const NAME: &str = "softmax";

/// Which projection kernel a classifier uses. Both produce the same
/// probabilities within round-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassifierHead {
    /// Input-major, vectorized across classes.
    #[default]
    General,
    /// Output-major, vectorized across the input.
    Laughter,
}

/// `prob = softmax(W·input + b)` applied to each of the `n_ch` input rows.
#[derive(Debug, Clone)]
pub struct SoftmaxLayer {
    shape: LinearShape,
    params: ParameterBundle,
    head: ClassifierHead,
    numerics: SoftmaxNumerics,
}

impl SoftmaxLayer {
    pub fn new(
        shape: LinearShape,
        params: ParameterBundle,
        head: ClassifierHead,
    ) -> KernelResult<Self> {
        shape.validate(NAME)?;
        params.check_len(NAME, shape.weights_len(), shape.o_nodes)?;

        Ok(Self {
            shape,
            params,
            head,
            numerics: SoftmaxNumerics::default(),
        })
    }

    pub fn with_numerics(mut self, numerics: SoftmaxNumerics) -> Self {
        self.numerics = numerics;
        self
    }

    pub fn shape(&self) -> LinearShape {
        self.shape
    }

    pub fn head(&self) -> ClassifierHead {
        self.head
    }

    pub fn numerics(&self) -> SoftmaxNumerics {
        self.numerics
    }
}

impl Layer for SoftmaxLayer {
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
        let args = SoftmaxArgs {
            shape: self.shape,
            weights: self.params.weights(),
            bias: self.params.bias(),
            numerics: self.numerics,
            input,
            output,
        };
        match self.head {
            ClassifierHead::General => kernels.softmax_general(args),
            ClassifierHead::Laughter => kernels.softmax_laughter(args),
        }
        Ok(())
    }
}
