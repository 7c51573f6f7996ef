//! Error types for layer construction and kernel invocation.

use thiserror::Error;

use crate::backend::Backend;

/// Errors raised while building a layer or handing buffers to it.
///
/// Every shape-related variant is detected when the layer is constructed;
/// only the buffer size variants can surface on a per-frame call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("The {field} of a {layer} layer must be greater than 0")]
    InvalidDimension {
        layer: &'static str,
        field: &'static str,
    },

    #[error("Unsupported conv1d kernel size {size}, expected one of 1, 3 or 5")]
    UnsupportedKernelSize { size: usize },

    #[error(
        "A skip connection requires matching input and output widths: {in_nodes} != {o_nodes}"
    )]
    SkipShapeMismatch { in_nodes: usize, o_nodes: usize },

    #[error(
        "Output length is not positive for input length {in_len}, padding {padding}, kernel size {kernel_size} and stride {stride}"
    )]
    NonPositiveOutputLength {
        in_len: usize,
        padding: usize,
        kernel_size: usize,
        stride: usize,
    },

    #[error("Average pooling does not support a padding of {padding}, only 0")]
    UnsupportedPoolPadding { padding: usize },

    #[error("The {parameter} of a {layer} layer has {actual} values, expected {expected}")]
    ParameterSizeMismatch {
        layer: &'static str,
        parameter: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("A {layer} layer with a batch-norm activation requires batch-norm parameters")]
    MissingBatchNorm { layer: &'static str },

    #[error("A parameter bundle needs {expected} arrays, got {actual}")]
    ParameterCountMismatch { expected: String, actual: usize },

    #[error("Input buffer has {actual} values, the {layer} layer expects {expected}")]
    InputBufferSizeMismatch {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Output buffer has {actual} values, the {layer} layer expects {expected}")]
    OutputBufferSizeMismatch {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Scratch buffer has {actual} values, the {layer} layer needs at least {required}")]
    ScratchBufferTooSmall {
        layer: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("The {backend:?} backend is not supported on this CPU")]
    UnsupportedBackend { backend: Backend },
}
