//! 1-D average pooling layer.

use crate::backend::KernelSet;
use crate::errors::KernelResult;
use crate::kernels::PoolArgs;
use crate::layers::{Layer, check_buffers};
use crate::shapes::PoolShape;

const NAME: &str = "avg_pool1d";

/// Averages windows of `kernel_size` samples taken every `stride` samples.
/// Only unpadded pooling is supported.
#[derive(Debug, Clone)]
pub struct AvgPool1dLayer {
    shape: PoolShape,
    output_len: usize,
}

impl AvgPool1dLayer {
    pub fn new(shape: PoolShape) -> KernelResult<Self> {
        let output_len = shape.validate(NAME)?;
        Ok(Self { shape, output_len })
    }

    pub fn shape(&self) -> PoolShape {
        self.shape
    }

    /// Output samples per channel.
    pub fn output_positions(&self) -> usize {
        self.output_len
    }
}

impl Layer for AvgPool1dLayer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn input_len(&self) -> usize {
        self.shape.input_len()
    }

    fn output_len(&self) -> usize {
        self.shape.ch * self.output_len
    }

    fn scratch_len(&self) -> usize {
        self.shape.lin + 1
    }

    fn forward(
        &self,
        kernels: KernelSet,
        input: &[f32],
        output: &mut [f32],
        scratch: &mut [f32],
    ) -> KernelResult<()> {
        check_buffers(self, input, output, scratch)?;
        kernels.avg_pool(PoolArgs {
            shape: self.shape,
            output_len: self.output_len,
            input,
            output,
            scratch,
        });
        Ok(())
    }
}
