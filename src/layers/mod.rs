//! Layers: validated shapes and parameters bound to one kernel family.
//!
//! A layer checks everything about its shape and parameters when it is
//! constructed. Its `forward` only checks the lengths of the buffers it is
//! handed, then runs the kernel of the given [`KernelSet`].

use crate::activation::Activation;
use crate::backend::KernelSet;
use crate::errors::{KernelError, KernelResult};
use crate::kernels::Epilogue;
use crate::params::ParameterBundle;

pub mod avg_pool_layer;
pub mod classifier_layer;
pub mod conv1d_layer;
pub mod linear_layer;
pub mod pad_layer;

pub use avg_pool_layer::AvgPool1dLayer;
pub use classifier_layer::{ClassifierHead, SoftmaxLayer};
pub use conv1d_layer::Conv1dLayer;
pub use linear_layer::{LinearLayer, LinearLayout, LinearOptions};
pub use pad_layer::Pad1dLayer;

/// Base trait for all layer types.
///
/// Layers are immutable after construction and can be shared across threads;
/// every call writes only the caller's output and scratch buffers.
pub trait Layer: Send + Sync {
    /// Short layer type name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Number of values `forward` reads.
    fn input_len(&self) -> usize;

    /// Number of values `forward` writes.
    fn output_len(&self) -> usize;

    /// Minimum scratch buffer length `forward` needs.
    fn scratch_len(&self) -> usize {
        0
    }

    /// Runs the layer on `input`, overwriting `output`.
    fn forward(
        &self,
        kernels: KernelSet,
        input: &[f32],
        output: &mut [f32],
        scratch: &mut [f32],
    ) -> KernelResult<()>;
}

pub(crate) fn check_buffers(
    layer: &dyn Layer,
    input: &[f32],
    output: &[f32],
    scratch: &[f32],
) -> KernelResult<()> {
    if input.len() != layer.input_len() {
        return Err(KernelError::InputBufferSizeMismatch {
            layer: layer.name(),
            expected: layer.input_len(),
            actual: input.len(),
        });
    }
    if output.len() != layer.output_len() {
        return Err(KernelError::OutputBufferSizeMismatch {
            layer: layer.name(),
            expected: layer.output_len(),
            actual: output.len(),
        });
    }
    if scratch.len() < layer.scratch_len() {
        return Err(KernelError::ScratchBufferTooSmall {
            layer: layer.name(),
            required: layer.scratch_len(),
            actual: scratch.len(),
        });
    }
    Ok(())
}

/// Maps an activation onto a kernel epilogue, checking that batch-norm
/// statistics cover `len` indices when the activation reads them.
pub(crate) fn resolve_epilogue<'a>(
    layer: &'static str,
    activation: Activation,
    params: &'a ParameterBundle,
    len: usize,
) -> KernelResult<Epilogue<'a>> {
    Ok(match activation {
        Activation::None => Epilogue::None,
        Activation::HardSwish => Epilogue::HardSwish,
        Activation::BatchNormHardSwish => {
            Epilogue::BatchNormHardSwish(params.require_batch_norm(layer, len)?)
        }
    })
}
