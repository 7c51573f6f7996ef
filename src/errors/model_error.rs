//! Error types for model assembly and prediction.

use thiserror::Error;

use super::KernelError;

/// Errors that can occur during model creation, validation, or execution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("At least one layer is required")]
    NoLayersProvided,

    #[error(
        "Layer {index} ({layer}) expects {expected} input values but the previous stage produces {actual}"
    )]
    LayerChainMismatch {
        index: usize,
        layer: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("The parameters {index} must be within the number of parameter bundles")]
    ParametersIndexOutOfBounds { index: usize },

    #[error("The parameters at index {index} are not used")]
    UnusedParameters { index: usize },

    #[error("Layer {index} could not be built: {source}")]
    InvalidLayer {
        index: usize,
        #[source]
        source: KernelError,
    },

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(
        "The number of inputs provided must match the feature size of the model: {provided} != {expected}"
    )]
    InputSizeMismatch { provided: usize, expected: usize },

    #[error(
        "Computation buffer is not large enough to compute the result: {buffer_size} < {required_size}"
    )]
    ComputationBufferTooSmall {
        buffer_size: usize,
        required_size: usize,
    },

    #[error("The number of inputs must match the number of outputs in the validation data")]
    ValidationInputOutputMismatch,

    #[error(
        "Expected output {index} of the validation data has {provided} values, the model produces {expected}"
    )]
    ValidationOutputSizeMismatch {
        index: usize,
        provided: usize,
        expected: usize,
    },

    #[error(
        "In validation case number {case_number}, applying inference on the following inputs: {inputs:?}, the expected outputs were: {expected:?}, the computed outputs were: {computed:?}"
    )]
    ValidationMismatch {
        case_number: usize,
        inputs: Vec<f32>,
        expected: Vec<f32>,
        computed: Vec<f32>,
    },
}
