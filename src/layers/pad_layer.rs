//! Zero-padding stage in front of a padded convolution.

use crate::backend::KernelSet;
use crate::errors::KernelResult;
use crate::layers::{Layer, check_buffers};
use crate::shapes::Conv1dShape;

const NAME: &str = "pad1d";

/// Copies an `(in_ch, in_phi)` tensor into the `(in_ch, in_phi + 2 * padding)`
/// layout a padded [`crate::layers::Conv1dLayer`] reads.
#[derive(Debug, Clone)]
pub struct Pad1dLayer {
    shape: Conv1dShape,
}

impl Pad1dLayer {
    pub fn for_conv(shape: Conv1dShape) -> Self {
        Self { shape }
    }
}

impl Layer for Pad1dLayer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn input_len(&self) -> usize {
        self.shape.in_ch * self.shape.in_phi
    }

    fn output_len(&self) -> usize {
        self.shape.input_len()
    }

    fn forward(
        &self,
        _kernels: KernelSet,
        input: &[f32],
        output: &mut [f32],
        scratch: &mut [f32],
    ) -> KernelResult<()> {
        check_buffers(self, input, output, scratch)?;
        self.shape.pad_input(input, output)
    }
}
