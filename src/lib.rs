//! Real-time inference kernels for a lip-sync and laughter-detection network.
//!
//! The library computes the forward pass of a small 1-D convolutional network
//! directly on caller-owned feature buffers: linear layers with residual skip
//! connections, convolutions with fused batch-norm and hard-swish, softmax
//! classifiers and average pooling. Every kernel is written once against a
//! lane abstraction and runs on a scalar reference or on SSE3, AVX or NEON,
//! selected once per model session through a [`KernelSet`].

pub mod activation;
pub mod backend;
pub mod benchmarks;
pub mod errors;
mod kernels;
pub mod layers;
pub mod model;
pub mod model_info;
pub mod parallel_predict;
pub mod params;
pub mod shapes;

pub use activation::Activation;
pub use backend::{Backend, KernelSet};
pub use errors::{KernelError, KernelResult, ModelError, ModelResult};
pub use kernels::SoftmaxNumerics;
pub use layers::{
    AvgPool1dLayer, ClassifierHead, Conv1dLayer, Layer, LinearLayer, LinearLayout, LinearOptions,
    Pad1dLayer, SoftmaxLayer,
};
pub use model::LipsyncModel;
pub use model_info::{LayerInfo, ModelInfo, ValidationData};
pub use parallel_predict::{ParallelPredictOutput, PredictConfig, predict_parallel};
pub use params::{BatchNorm, ParameterBundle};
pub use shapes::{Conv1dShape, KernelSize, LinearShape, PoolShape, output_len};
