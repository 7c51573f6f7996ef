//! JSON-describable model topology.
//!
//! A [`ModelInfo`] lists the layers of a model in execution order. Weights are
//! never part of the document: each layer with learned parameters names a
//! position in the list of [`crate::ParameterBundle`]s supplied alongside it.

use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::backend::Backend;
use crate::kernels::SoftmaxNumerics;
use crate::layers::{ClassifierHead, LinearLayout};

/// Inputs with the outputs the model must reproduce when it is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationData {
    /// List of input frames, each `feature_size` values long.
    pub inputs: Vec<Vec<f32>>,
    /// List of expected outputs corresponding to the input frames.
    pub expected_outputs: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Kernel family to run on. Detected from the CPU when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
    pub layers: Vec<LayerInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_data: Option<ValidationData>,
}

/// One layer of the model. Tagged by `"type"` in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LayerInfo {
    #[serde(rename = "LINEAR")]
    Linear(LinearLayerInfo),
    #[serde(rename = "CONV1D")]
    Conv1d(Conv1dLayerInfo),
    #[serde(rename = "SOFTMAX")]
    Softmax(SoftmaxLayerInfo),
    #[serde(rename = "AVG_POOL1D")]
    AvgPool1d(AvgPool1dLayerInfo),
}

impl LayerInfo {
    /// Index of the parameter bundle the layer reads, if it has parameters.
    pub fn parameters(&self) -> Option<usize> {
        match self {
            LayerInfo::Linear(info) => Some(info.parameters),
            LayerInfo::Conv1d(info) => Some(info.parameters),
            LayerInfo::Softmax(info) => Some(info.parameters),
            LayerInfo::AvgPool1d(_) => None,
        }
    }
}

fn one() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearLayerInfo {
    pub in_nodes: usize,
    pub o_nodes: usize,
    /// Number of independent rows (or columns, when transposed).
    #[serde(default = "one")]
    pub n_ch: usize,
    #[serde(default)]
    pub layout: LinearLayout,
    #[serde(default)]
    pub skip_connection: bool,
    #[serde(default)]
    pub activation: Activation,
    /// Index of the parameter bundle holding weights and bias.
    pub parameters: usize,
}

/// Padding is applied by the model: the layer consumes the unpadded
/// `(in_ch, in_phi)` output of the previous stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conv1dLayerInfo {
    pub in_ch: usize,
    pub o_ch: usize,
    pub in_phi: usize,
    pub kernel_size: usize,
    #[serde(default = "one")]
    pub stride: usize,
    #[serde(default)]
    pub padding_size: usize,
    #[serde(default)]
    pub activation: Activation,
    pub parameters: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxLayerInfo {
    pub in_nodes: usize,
    pub o_nodes: usize,
    /// Number of rows, each normalized on its own.
    #[serde(default = "one")]
    pub n_ch: usize,
    #[serde(default)]
    pub head: ClassifierHead,
    #[serde(default)]
    pub numerics: SoftmaxNumerics,
    pub parameters: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvgPool1dLayerInfo {
    pub lin: usize,
    pub ch: usize,
    pub kernel_size: usize,
    #[serde(default = "one")]
    pub stride: usize,
    #[serde(default)]
    pub padding: usize,
}
