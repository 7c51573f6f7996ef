//! Lip-sync model: an ordered chain of layers bound to one kernel family.
//!
//! All intermediate tensors live in one unified computation buffer laid out
//! as `[input | stage 1 | ... | output | scratch]`. Each layer reads the stage
//! before it and overwrites the stage after it, so a single buffer per thread
//! is enough to run any number of frames.

use log::debug;

use crate::backend::{Backend, KernelSet};
use crate::errors::{ModelError, ModelResult};
use crate::layers::{
    AvgPool1dLayer, Conv1dLayer, Layer, LinearLayer, LinearOptions, Pad1dLayer, SoftmaxLayer,
};
use crate::model_info::{LayerInfo, ModelInfo};
use crate::params::ParameterBundle;
use crate::shapes::{Conv1dShape, LinearShape, PoolShape};

/// Relative tolerance used when checking validation data at construction.
pub const VALIDATION_DELTA: f32 = 1e-5;

pub struct LipsyncModel {
    layers: Vec<Box<dyn Layer>>,
    kernels: KernelSet,
    stage_indexes: Vec<usize>,
    scratch_index: usize,
    required_memory: usize,
}

impl LipsyncModel {
    /// Chains `layers` in order, checking that every layer consumes exactly
    /// what the previous one produces.
    pub fn new(layers: Vec<Box<dyn Layer>>, kernels: KernelSet) -> ModelResult<Self> {
        if layers.is_empty() {
            return Err(ModelError::NoLayersProvided);
        }

        let mut stage_indexes = vec![0, layers[0].input_len()];
        for (index, pair) in layers.windows(2).enumerate() {
            let (previous, layer) = (&pair[0], &pair[1]);
            if layer.input_len() != previous.output_len() {
                return Err(ModelError::LayerChainMismatch {
                    index: index + 1,
                    layer: layer.name(),
                    expected: layer.input_len(),
                    actual: previous.output_len(),
                });
            }
        }
        for layer in &layers {
            let end = stage_indexes[stage_indexes.len() - 1] + layer.output_len();
            stage_indexes.push(end);
        }
        stage_indexes.pop();

        let scratch_index =
            stage_indexes[stage_indexes.len() - 1] + layers[layers.len() - 1].output_len();
        let scratch_len = layers.iter().map(|layer| layer.scratch_len()).max().unwrap_or(0);
        let required_memory = scratch_index + scratch_len;

        debug!(
            "Assembled model with {} layers on the {} backend, {} values of working memory",
            layers.len(),
            kernels.backend().name(),
            required_memory
        );

        Ok(Self {
            layers,
            kernels,
            stage_indexes,
            scratch_index,
            required_memory,
        })
    }

    /// Builds a model from its topology and the parameter bundles its layers
    /// refer to, then checks the validation data if any.
    ///
    /// Uses `info.backend` when set, the widest supported backend otherwise.
    pub fn from_info(info: &ModelInfo, parameters: &[ParameterBundle]) -> ModelResult<Self> {
        let kernels = match info.backend {
            Some(backend) => KernelSet::new(backend)?,
            None => KernelSet::new(Backend::detect())?,
        };
        Self::from_info_with_kernels(info, parameters, kernels)
    }

    /// Same as [`LipsyncModel::from_info`], ignoring `info.backend`.
    pub fn from_info_with_kernels(
        info: &ModelInfo,
        parameters: &[ParameterBundle],
        kernels: KernelSet,
    ) -> ModelResult<Self> {
        if let Some(validation_data) = &info.validation_data
            && validation_data.inputs.len() != validation_data.expected_outputs.len()
        {
            return Err(ModelError::ValidationInputOutputMismatch);
        }

        let layers = build_layers(&info.layers, parameters)?;
        let model = Self::new(layers, kernels)?;

        if let Some(validation_data) = &info.validation_data {
            model.validate_model(
                &validation_data.inputs,
                &validation_data.expected_outputs,
                VALIDATION_DELTA,
            )?;
        }

        Ok(model)
    }

    /// Runs every input and compares against the expected output with a
    /// tolerance of `delta` scaled by the expected magnitude (at least 1).
    pub fn validate_model(
        &self,
        inputs: &[Vec<f32>],
        outputs: &[Vec<f32>],
        delta: f32,
    ) -> ModelResult<()> {
        if inputs.len() != outputs.len() {
            return Err(ModelError::ValidationInputOutputMismatch);
        }

        let output_size = self.get_output_size();
        let mut temporary_buffer = vec![0.0f32; self.required_memory];
        for (case_number, (input, expected)) in inputs.iter().zip(outputs).enumerate() {
            if expected.len() != output_size {
                return Err(ModelError::ValidationOutputSizeMismatch {
                    index: case_number,
                    provided: expected.len(),
                    expected: output_size,
                });
            }

            let computed = self.predict_into(input, &mut temporary_buffer)?;
            let mismatch = expected
                .iter()
                .zip(computed)
                .any(|(e, c)| (e - c).abs() > delta * e.abs().max(1.0) || c.is_nan());
            if mismatch {
                return Err(ModelError::ValidationMismatch {
                    case_number,
                    inputs: input.clone(),
                    expected: expected.clone(),
                    computed: computed.to_vec(),
                });
            }
        }

        Ok(())
    }

    /// Runs the model on the buffer, whose first `get_feature_size()` values
    /// must hold the input frame. The result is left at
    /// `get_output_index_start()`.
    pub fn predict_with_buffer(&self, unified_computation_buffer: &mut [f32]) -> ModelResult<()> {
        if unified_computation_buffer.len() < self.required_memory {
            return Err(ModelError::ComputationBufferTooSmall {
                buffer_size: unified_computation_buffer.len(),
                required_size: self.required_memory,
            });
        }

        let (stages, scratch) =
            unified_computation_buffer[..self.required_memory].split_at_mut(self.scratch_index);
        for (i, layer) in self.layers.iter().enumerate() {
            let input_start = self.stage_indexes[i];
            let output_start = self.stage_indexes[i + 1];
            let (head, tail) = stages.split_at_mut(output_start);
            layer.forward(
                self.kernels,
                &head[input_start..],
                &mut tail[..layer.output_len()],
                scratch,
            )?;
        }

        Ok(())
    }

    /// Predicts one frame, allocating a new computation buffer.
    pub fn predict(&self, input: &[f32]) -> ModelResult<Vec<f32>> {
        let mut unified_computation_buffer = vec![0.0f32; self.required_memory];
        Ok(self.predict_into(input, &mut unified_computation_buffer)?.to_vec())
    }

    /// Copies `input` into the buffer, runs the model and returns the output slice.
    fn predict_into<'a>(
        &self,
        input: &[f32],
        unified_computation_buffer: &'a mut [f32],
    ) -> ModelResult<&'a [f32]> {
        let feature_size = self.get_feature_size();
        if input.len() != feature_size {
            return Err(ModelError::InputSizeMismatch {
                provided: input.len(),
                expected: feature_size,
            });
        }
        if unified_computation_buffer.len() < self.required_memory {
            return Err(ModelError::ComputationBufferTooSmall {
                buffer_size: unified_computation_buffer.len(),
                required_size: self.required_memory,
            });
        }

        unified_computation_buffer[..feature_size].copy_from_slice(input);
        self.predict_with_buffer(unified_computation_buffer)?;
        let start = self.get_output_index_start();
        Ok(&unified_computation_buffer[start..start + self.get_output_size()])
    }

    /// Size of the unified computation buffer one prediction needs.
    pub fn required_memory(&self) -> usize {
        self.required_memory
    }

    pub fn get_feature_size(&self) -> usize {
        self.stage_indexes[1]
    }

    pub fn get_output_size(&self) -> usize {
        self.scratch_index - self.get_output_index_start()
    }

    pub fn get_output_index_start(&self) -> usize {
        self.stage_indexes[self.stage_indexes.len() - 1]
    }

    pub fn kernels(&self) -> KernelSet {
        self.kernels
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }
}

/// Creates the layers a topology describes. Padded convolutions get a
/// [`Pad1dLayer`] in front so they can consume the unpadded previous stage.
fn build_layers(
    infos: &[LayerInfo],
    parameters: &[ParameterBundle],
) -> ModelResult<Vec<Box<dyn Layer>>> {
    let mut used_parameters = vec![false; parameters.len()];
    let mut layers: Vec<Box<dyn Layer>> = Vec::with_capacity(infos.len());

    for (index, info) in infos.iter().enumerate() {
        let params = match info.parameters() {
            Some(position) => {
                let bundle = parameters
                    .get(position)
                    .ok_or(ModelError::ParametersIndexOutOfBounds { index: position })?;
                used_parameters[position] = true;
                bundle.clone()
            }
            None => ParameterBundle::empty(),
        };
        let invalid = |source| ModelError::InvalidLayer { index, source };

        match info {
            LayerInfo::Linear(linear) => {
                let shape = LinearShape::new(linear.in_nodes, linear.o_nodes, linear.n_ch);
                let options = LinearOptions {
                    layout: linear.layout,
                    skip_connection: linear.skip_connection,
                    activation: linear.activation,
                };
                layers.push(Box::new(LinearLayer::new(shape, params, options).map_err(invalid)?));
            }
            LayerInfo::Conv1d(conv) => {
                let shape = Conv1dShape::new(
                    conv.in_ch,
                    conv.o_ch,
                    conv.in_phi,
                    conv.kernel_size,
                    conv.stride,
                    conv.padding_size,
                )
                .map_err(invalid)?;
                let layer = Conv1dLayer::new(shape, params, conv.activation).map_err(invalid)?;
                if shape.padding_size > 0 {
                    layers.push(Box::new(Pad1dLayer::for_conv(shape)));
                }
                layers.push(Box::new(layer));
            }
            LayerInfo::Softmax(softmax) => {
                let shape = LinearShape::new(softmax.in_nodes, softmax.o_nodes, softmax.n_ch);
                let layer = SoftmaxLayer::new(shape, params, softmax.head)
                    .map_err(invalid)?
                    .with_numerics(softmax.numerics);
                layers.push(Box::new(layer));
            }
            LayerInfo::AvgPool1d(pool) => {
                let shape =
                    PoolShape::new(pool.lin, pool.ch, pool.kernel_size, pool.stride, pool.padding);
                layers.push(Box::new(AvgPool1dLayer::new(shape).map_err(invalid)?));
            }
        }
    }

    if let Some(index) = used_parameters.iter().position(|&used| !used) {
        return Err(ModelError::UnusedParameters { index });
    }

    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::ClassifierHead;

    fn identity_linear(nodes: usize) -> Box<dyn Layer> {
        let shape = LinearShape::new(nodes, nodes, 1);
        let params = ParameterBundle::new(vec![0.0; nodes * nodes], vec![0.0; nodes]);
        Box::new(LinearLayer::with_skip(shape, params).unwrap())
    }

    #[test]
    fn test_buffer_layout() {
        let pool = AvgPool1dLayer::new(PoolShape::new(4, 1, 2, 2, 0)).unwrap();
        let model = LipsyncModel::new(
            vec![identity_linear(4), Box::new(pool), identity_linear(2)],
            KernelSet::scalar(),
        )
        .unwrap();

        assert_eq!(model.get_feature_size(), 4);
        assert_eq!(model.get_output_size(), 2);
        assert_eq!(model.get_output_index_start(), 4 + 4 + 2);
        // Stages plus the pooling prefix-sum scratch
        assert_eq!(model.required_memory(), 12 + 5);

        let output = model.predict(&[1.0, 3.0, 5.0, 7.0]).unwrap();
        assert_eq!(output, vec![2.0, 6.0]);
    }

    #[test]
    fn test_chain_mismatch() {
        let result =
            LipsyncModel::new(vec![identity_linear(4), identity_linear(3)], KernelSet::scalar());
        assert!(matches!(
            result,
            Err(ModelError::LayerChainMismatch {
                index: 1,
                expected: 3,
                actual: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_no_layers() {
        assert!(matches!(
            LipsyncModel::new(Vec::new(), KernelSet::scalar()),
            Err(ModelError::NoLayersProvided)
        ));
    }

    #[test]
    fn test_validate_model_relative_tolerance() {
        let params = ParameterBundle::new(vec![0.0; 4], vec![2.0, 0.0]);
        let softmax =
            SoftmaxLayer::new(LinearShape::new(2, 2, 1), params, ClassifierHead::Laughter)
                .unwrap();
        let model = LipsyncModel::new(vec![Box::new(softmax)], KernelSet::scalar()).unwrap();

        let e2 = 2.0f32.exp();
        let expected = vec![e2 / (e2 + 1.0), 1.0 / (e2 + 1.0)];
        assert!(
            model
                .validate_model(&[vec![0.5, 0.5]], &[expected.clone()], VALIDATION_DELTA)
                .is_ok()
        );

        let wrong = vec![expected[1], expected[0]];
        assert!(matches!(
            model.validate_model(&[vec![0.5, 0.5]], &[wrong], VALIDATION_DELTA),
            Err(ModelError::ValidationMismatch { case_number: 0, .. })
        ));
    }
}
